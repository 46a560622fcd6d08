//! Partitioning of compute resources by purchase method and instance family

use crate::error::{ReservationError, Result};
use crate::models::{AutoScalingGroup, ComputeResource, Ec2Instance, EksNodeGroup, PricedCapacity};
use crate::purchase_method::Ec2PurchaseMethod;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resources of one bucket, kept apart by kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComputeResources {
    pub ec2: Vec<Ec2Instance>,
    pub asg: Vec<AutoScalingGroup>,
    pub eks: Vec<EksNodeGroup>,
}

impl ComputeResources {
    pub fn push(&mut self, resource: ComputeResource) {
        match resource {
            ComputeResource::Instance(r) => self.ec2.push(r),
            ComputeResource::ScalingGroup(r) => self.asg.push(r),
            ComputeResource::NodeGroup(r) => self.eks.push(r),
        }
    }

    pub fn len(&self) -> usize {
        self.ec2.len() + self.asg.len() + self.eks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One value per EC2 purchase method
///
/// Fields are named after the methods so every method always has a bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ec2Buckets<B> {
    #[serde(rename = "ComputeSavingsPlans")]
    pub compute_savings_plans: B,
    #[serde(rename = "EC2InstanceSavingsPlans")]
    pub ec2_instance_savings_plans: B,
    #[serde(rename = "SpotInstances")]
    pub spot_instances: B,
    #[serde(rename = "Needless")]
    pub needless: B,
    #[serde(rename = "Undefined")]
    pub undefined: B,
}

impl<B> Ec2Buckets<B> {
    pub fn bucket(&self, method: Ec2PurchaseMethod) -> &B {
        match method {
            Ec2PurchaseMethod::ComputeSavingsPlans => &self.compute_savings_plans,
            Ec2PurchaseMethod::Ec2InstanceSavingsPlans => &self.ec2_instance_savings_plans,
            Ec2PurchaseMethod::SpotInstances => &self.spot_instances,
            Ec2PurchaseMethod::Needless => &self.needless,
            Ec2PurchaseMethod::Undefined => &self.undefined,
        }
    }

    pub fn bucket_mut(&mut self, method: Ec2PurchaseMethod) -> &mut B {
        match method {
            Ec2PurchaseMethod::ComputeSavingsPlans => &mut self.compute_savings_plans,
            Ec2PurchaseMethod::Ec2InstanceSavingsPlans => &mut self.ec2_instance_savings_plans,
            Ec2PurchaseMethod::SpotInstances => &mut self.spot_instances,
            Ec2PurchaseMethod::Needless => &mut self.needless,
            Ec2PurchaseMethod::Undefined => &mut self.undefined,
        }
    }
}

pub type GroupedComputeResources = Ec2Buckets<ComputeResources>;

/// Partition resources into one bucket per purchase method.
///
/// Relative order within each bucket follows the input order.
pub fn group_by_purchase_method(
    resources: impl IntoIterator<Item = ComputeResource>,
) -> GroupedComputeResources {
    let mut grouped = GroupedComputeResources::default();
    for resource in resources {
        grouped.bucket_mut(resource.purchase_method()).push(resource);
    }
    grouped
}

/// Split an EC2-instance-savings-plan bucket by instance family.
///
/// Only stand-alone instances are supported; any auto scaling group or node
/// group in the bucket is a known gap and fails the run.
pub fn group_by_instance_family(
    resources: &ComputeResources,
) -> Result<BTreeMap<String, ComputeResources>> {
    if let Some(asg) = resources.asg.first() {
        return Err(ReservationError::not_implemented(format!(
            "Calculation for Auto Scaling Group with EC2 Instance Savings Plans: {}",
            asg.name
        )));
    }
    if let Some(node_group) = resources.eks.first() {
        return Err(ReservationError::not_implemented(format!(
            "Calculation for EKS Nodegroup with EC2 Instance Savings Plans: {}/{}",
            node_group.cluster_name, node_group.name
        )));
    }

    let mut families: BTreeMap<String, ComputeResources> = BTreeMap::new();
    for instance in &resources.ec2 {
        families
            .entry(instance.instance_type.family().to_string())
            .or_default()
            .ec2
            .push(instance.clone());
    }
    Ok(families)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InstanceType;
    use crate::purchase_method::PurchaseMethod;

    fn instance(id: &str, instance_type: &str, method: Ec2PurchaseMethod) -> ComputeResource {
        ComputeResource::Instance(Ec2Instance {
            id: id.to_string(),
            name: id.to_string(),
            instance_type: InstanceType::parse(instance_type).unwrap(),
            purchase_method: method,
        })
    }

    fn asg(name: &str, method: Ec2PurchaseMethod) -> ComputeResource {
        ComputeResource::ScalingGroup(AutoScalingGroup {
            name: name.to_string(),
            min_size: 2,
            instance_type: InstanceType::parse("m5.large").unwrap(),
            purchase_method: method,
        })
    }

    fn node_group(name: &str, method: Ec2PurchaseMethod) -> ComputeResource {
        let instance_type = InstanceType::parse("c5.xlarge").unwrap();
        ComputeResource::NodeGroup(EksNodeGroup {
            name: name.to_string(),
            cluster_name: "prod".to_string(),
            instance_type,
            alternate_instance_types: Vec::new(),
            min_size: 1,
            purchase_method: method,
        })
    }

    #[test]
    fn test_partition_is_exact() {
        let input = vec![
            instance("a", "m5.large", Ec2PurchaseMethod::ComputeSavingsPlans),
            asg("b", Ec2PurchaseMethod::SpotInstances),
            node_group("c", Ec2PurchaseMethod::Undefined),
            instance("d", "c5.large", Ec2PurchaseMethod::Needless),
            instance("e", "r5.large", Ec2PurchaseMethod::Ec2InstanceSavingsPlans),
            asg("f", Ec2PurchaseMethod::ComputeSavingsPlans),
        ];
        let grouped = group_by_purchase_method(input.clone());

        let total: usize = Ec2PurchaseMethod::ALL
            .iter()
            .map(|m| grouped.bucket(*m).len())
            .sum();
        assert_eq!(total, input.len());

        for resource in &input {
            let bucket = grouped.bucket(resource.purchase_method());
            let found = match resource {
                ComputeResource::Instance(r) => bucket.ec2.iter().filter(|x| *x == r).count(),
                ComputeResource::ScalingGroup(r) => bucket.asg.iter().filter(|x| *x == r).count(),
                ComputeResource::NodeGroup(r) => bucket.eks.iter().filter(|x| *x == r).count(),
            };
            assert_eq!(found, 1, "resource should appear exactly once in its bucket");
        }
    }

    #[test]
    fn test_partition_preserves_order() {
        let input = vec![
            instance("z", "m5.large", Ec2PurchaseMethod::Needless),
            instance("a", "m5.large", Ec2PurchaseMethod::Needless),
            instance("m", "m5.large", Ec2PurchaseMethod::Needless),
        ];
        let grouped = group_by_purchase_method(input);
        let ids: Vec<_> = grouped.needless.ec2.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_empty_input_has_all_buckets() {
        let grouped = group_by_purchase_method(Vec::new());
        for method in Ec2PurchaseMethod::ALL {
            assert!(grouped.bucket(*method).is_empty());
        }
    }

    #[test]
    fn test_group_by_instance_family() {
        let grouped = group_by_purchase_method(vec![
            instance("a", "m5.large", Ec2PurchaseMethod::Ec2InstanceSavingsPlans),
            instance("b", "m5.4xlarge", Ec2PurchaseMethod::Ec2InstanceSavingsPlans),
            instance("c", "c6g.medium", Ec2PurchaseMethod::Ec2InstanceSavingsPlans),
        ]);
        let families = group_by_instance_family(&grouped.ec2_instance_savings_plans).unwrap();

        assert_eq!(families.len(), 2);
        assert_eq!(families["m5"].ec2.len(), 2);
        assert_eq!(families["c6g"].ec2.len(), 1);
    }

    #[test]
    fn test_instance_family_rejects_scaling_groups() {
        let grouped = group_by_purchase_method(vec![
            instance("a", "m5.large", Ec2PurchaseMethod::Ec2InstanceSavingsPlans),
            asg("workers", Ec2PurchaseMethod::Ec2InstanceSavingsPlans),
        ]);
        let err = group_by_instance_family(&grouped.ec2_instance_savings_plans).unwrap_err();
        assert!(err.is_not_implemented());
        assert!(err.to_string().contains("workers"));
    }

    #[test]
    fn test_instance_family_rejects_node_groups() {
        let grouped = group_by_purchase_method(vec![node_group(
            "default",
            Ec2PurchaseMethod::Ec2InstanceSavingsPlans,
        )]);
        let err = group_by_instance_family(&grouped.ec2_instance_savings_plans).unwrap_err();
        assert!(err.is_not_implemented());
    }
}
