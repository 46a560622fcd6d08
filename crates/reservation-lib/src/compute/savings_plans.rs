//! Compute savings-plan pricing and reconciliation
//!
//! Running capacity is expressed in hourly USD: each resource's offering rate
//! times the number of instances guaranteed to run. The total is compared with
//! the hourly commitments of active compute savings plans.

use crate::error::{ReservationError, Result};
use crate::models::{CoverageStatus, PricedCapacity, SavingsPlan, SavingsPlanOffering};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::ComputeResources;

/// Duration of the offerings the engine prices against
pub const ONE_YEAR_SECS: u64 = 31_536_000;

/// Offering catalog keyed by instance type
#[derive(Debug, Clone, Default)]
pub struct OfferingMap {
    offerings: HashMap<String, SavingsPlanOffering>,
}

impl OfferingMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an offering. A later offering for the same type replaces the earlier one.
    pub fn insert(&mut self, offering: SavingsPlanOffering) {
        self.offerings
            .insert(offering.instance_type.clone(), offering);
    }

    pub fn get(&self, instance_type: &str) -> Option<&SavingsPlanOffering> {
        self.offerings.get(instance_type)
    }

    pub fn len(&self) -> usize {
        self.offerings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offerings.is_empty()
    }
}

impl FromIterator<SavingsPlanOffering> for OfferingMap {
    fn from_iter<I: IntoIterator<Item = SavingsPlanOffering>>(iter: I) -> Self {
        let mut map = Self::new();
        for offering in iter {
            map.insert(offering);
        }
        map
    }
}

/// Kind of compute resource, for report sections and error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Ec2Instance,
    AutoScalingGroup,
    EksNodeGroup,
}

impl ResourceKind {
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Ec2Instance => "the EC2 instance",
            ResourceKind::AutoScalingGroup => "the Auto Scaling Group",
            ResourceKind::EksNodeGroup => "the EKS Nodegroup",
        }
    }
}

/// A resource with its hourly savings-plan cost attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedResource {
    pub kind: ResourceKind,
    pub label: String,
    pub instance_type: String,
    pub rate: Decimal,
    pub units: u32,
    pub hourly_cost: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricedResources {
    pub ec2: Vec<PricedResource>,
    pub asg: Vec<PricedResource>,
    pub eks: Vec<PricedResource>,
}

impl PricedResources {
    pub fn iter(&self) -> impl Iterator<Item = &PricedResource> {
        self.ec2.iter().chain(self.asg.iter()).chain(self.eks.iter())
    }

    /// Hourly cost summed across all three kinds
    pub fn total(&self) -> Decimal {
        self.iter().map(|r| r.hourly_cost).sum()
    }
}

fn price<R: PricedCapacity>(
    kind: ResourceKind,
    resource: &R,
    offerings: &OfferingMap,
) -> Result<PricedResource> {
    let instance_type = resource.instance_type().as_str();
    let label = resource.identity_label();
    let offering = offerings
        .get(instance_type)
        .ok_or_else(|| ReservationError::OfferingNotFound {
            instance_type: instance_type.to_string(),
            resource: format!("{} {}", kind.label(), label),
        })?;

    let units = resource.concurrent_unit_count();
    Ok(PricedResource {
        kind,
        label,
        instance_type: instance_type.to_string(),
        rate: offering.rate,
        units,
        hourly_cost: offering.rate * Decimal::from(units),
    })
}

/// Attach an hourly cost to every resource in the bucket.
///
/// Fails on the first resource whose instance type has no offering; no
/// partial result is returned.
pub fn price_resources(
    resources: &ComputeResources,
    offerings: &OfferingMap,
) -> Result<PricedResources> {
    Ok(PricedResources {
        ec2: resources
            .ec2
            .iter()
            .map(|r| price(ResourceKind::Ec2Instance, r, offerings))
            .collect::<Result<_>>()?,
        asg: resources
            .asg
            .iter()
            .map(|r| price(ResourceKind::AutoScalingGroup, r, offerings))
            .collect::<Result<_>>()?,
        eks: resources
            .eks
            .iter()
            .map(|r| price(ResourceKind::EksNodeGroup, r, offerings))
            .collect::<Result<_>>()?,
    })
}

/// Running vs. held hourly cost for compute savings plans
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsPlanReconciliation {
    pub running: PricedResources,
    pub active: Vec<SavingsPlan>,
    pub running_total: Decimal,
    pub held_total: Decimal,
    /// `running_total - held_total`; positive means more must be purchased
    pub delta: Decimal,
    pub status: CoverageStatus,
}

pub fn reconcile_savings_plans(
    running: PricedResources,
    active: Vec<SavingsPlan>,
) -> SavingsPlanReconciliation {
    let running_total = running.total();
    let held_total: Decimal = active.iter().map(|p| p.commitment).sum();
    let delta = running_total - held_total;

    SavingsPlanReconciliation {
        running,
        active,
        running_total,
        held_total,
        delta,
        status: CoverageStatus::from_delta(delta),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AutoScalingGroup, Ec2Instance, EksNodeGroup, InstanceType};
    use crate::purchase_method::Ec2PurchaseMethod;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn offering(instance_type: &str, rate: Decimal) -> SavingsPlanOffering {
        SavingsPlanOffering {
            instance_type: instance_type.to_string(),
            rate,
        }
    }

    fn plan(id: &str, commitment: Decimal) -> SavingsPlan {
        SavingsPlan {
            id: id.to_string(),
            commitment,
            end: Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn instance(name: &str, instance_type: &str) -> Ec2Instance {
        Ec2Instance {
            id: format!("i-{}", name),
            name: name.to_string(),
            instance_type: InstanceType::parse(instance_type).unwrap(),
            purchase_method: Ec2PurchaseMethod::ComputeSavingsPlans,
        }
    }

    fn asg(name: &str, instance_type: &str, min_size: u32) -> AutoScalingGroup {
        AutoScalingGroup {
            name: name.to_string(),
            min_size,
            instance_type: InstanceType::parse(instance_type).unwrap(),
            purchase_method: Ec2PurchaseMethod::ComputeSavingsPlans,
        }
    }

    fn node_group(name: &str, instance_type: &str, min_size: u32) -> EksNodeGroup {
        EksNodeGroup {
            name: name.to_string(),
            cluster_name: "prod".to_string(),
            instance_type: InstanceType::parse(instance_type).unwrap(),
            alternate_instance_types: Vec::new(),
            min_size,
            purchase_method: Ec2PurchaseMethod::ComputeSavingsPlans,
        }
    }

    #[test]
    fn test_scaling_group_priced_by_min_size() {
        let offerings: OfferingMap = vec![offering("m5.2xlarge", dec!(0.30))].into_iter().collect();
        let resources = ComputeResources {
            asg: vec![asg("workers", "m5.2xlarge", 3)],
            ..Default::default()
        };

        let priced = price_resources(&resources, &offerings).unwrap();
        assert_eq!(priced.asg.len(), 1);
        assert_eq!(priced.asg[0].units, 3);
        assert_eq!(priced.asg[0].hourly_cost, dec!(0.90));
        assert_eq!(priced.total(), dec!(0.90));
    }

    #[test]
    fn test_total_sums_all_kinds() {
        let offerings: OfferingMap = vec![
            offering("m5.large", dec!(0.07)),
            offering("c5.xlarge", dec!(0.12)),
        ]
        .into_iter()
        .collect();
        let resources = ComputeResources {
            ec2: vec![instance("web", "m5.large"), instance("api", "m5.large")],
            asg: vec![asg("batch", "c5.xlarge", 2)],
            eks: vec![node_group("default", "c5.xlarge", 4)],
        };

        let priced = price_resources(&resources, &offerings).unwrap();
        // 0.07 * 2 + 0.12 * 2 + 0.12 * 4
        assert_eq!(priced.total(), dec!(0.86));
        assert_eq!(priced.iter().count(), 4);
    }

    #[test]
    fn test_missing_offering_is_fatal() {
        let offerings: OfferingMap = vec![offering("m5.large", dec!(0.07))].into_iter().collect();
        let resources = ComputeResources {
            ec2: vec![instance("web", "m5.large"), instance("gpu", "p3.2xlarge")],
            ..Default::default()
        };

        let err = price_resources(&resources, &offerings).unwrap_err();
        match err {
            ReservationError::OfferingNotFound { instance_type, resource } => {
                assert_eq!(instance_type, "p3.2xlarge");
                assert!(resource.contains("gpu"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_missing_offering_for_node_group_is_fatal() {
        let offerings = OfferingMap::new();
        let resources = ComputeResources {
            eks: vec![node_group("default", "c5.xlarge", 1)],
            ..Default::default()
        };
        let err = price_resources(&resources, &offerings).unwrap_err();
        assert!(err.to_string().contains("prod/default"));
    }

    #[test]
    fn test_later_offering_overwrites() {
        let offerings: OfferingMap = vec![
            offering("m5.large", dec!(0.07)),
            offering("m5.large", dec!(0.08)),
        ]
        .into_iter()
        .collect();
        assert_eq!(offerings.len(), 1);
        assert_eq!(offerings.get("m5.large").unwrap().rate, dec!(0.08));
    }

    #[test]
    fn test_reconcile_shortfall() {
        let offerings: OfferingMap = vec![offering("m5.2xlarge", dec!(0.30))].into_iter().collect();
        let resources = ComputeResources {
            asg: vec![asg("workers", "m5.2xlarge", 3)],
            ..Default::default()
        };
        let priced = price_resources(&resources, &offerings).unwrap();
        let result = reconcile_savings_plans(priced, vec![plan("sp-1", dec!(0.50))]);

        assert_eq!(result.running_total, dec!(0.90));
        assert_eq!(result.held_total, dec!(0.50));
        assert_eq!(result.delta, dec!(0.40));
        assert_eq!(result.status, CoverageStatus::Shortfall);
    }

    #[test]
    fn test_reconcile_exact_and_surplus() {
        let priced = PricedResources::default();
        let result = reconcile_savings_plans(priced.clone(), Vec::new());
        assert_eq!(result.delta, Decimal::ZERO);
        assert_eq!(result.status, CoverageStatus::Covered);

        let result = reconcile_savings_plans(
            priced,
            vec![plan("sp-1", dec!(1.25)), plan("sp-2", dec!(0.75))],
        );
        assert_eq!(result.held_total, dec!(2.00));
        assert_eq!(result.delta, dec!(-2.00));
        assert_eq!(result.status, CoverageStatus::Surplus);
    }

    #[test]
    fn test_decimal_sums_are_exact() {
        let offerings: OfferingMap = vec![offering("t3.micro", dec!(0.1))].into_iter().collect();
        let resources = ComputeResources {
            ec2: vec![
                instance("a", "t3.micro"),
                instance("b", "t3.micro"),
                instance("c", "t3.micro"),
            ],
            ..Default::default()
        };
        let priced = price_resources(&resources, &offerings).unwrap();
        let result = reconcile_savings_plans(priced, vec![plan("sp-1", dec!(0.3))]);
        assert_eq!(result.status, CoverageStatus::Covered);
    }
}
