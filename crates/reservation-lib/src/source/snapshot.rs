//! Point-in-time inventory snapshot read from a JSON document
//!
//! Records mirror the shape the provider APIs return: every field optional,
//! tags as key/value maps. Conversion enforces required fields and the
//! inclusion rules of each inventory kind.

use super::{async_trait, InventorySource};
use crate::compute::{OfferingMap, ONE_YEAR_SECS};
use crate::error::{ReservationError, Result};
use crate::models::{
    AutoScalingGroup, DbInstance, Ec2Instance, EksNodeGroup, InstanceType, ReservedDbInstance,
    SavingsPlan, SavingsPlanOffering,
};
use crate::purchase_method::{Ec2PurchaseMethod, PurchaseMethod, RdsPurchaseMethod, Tags};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Tag set by EC2 on instances launched by an auto scaling group
const ASG_NAME_TAG: &str = "aws:autoscaling:groupName";

/// Tag set on auto scaling groups backing an EKS managed node group
const EKS_NODEGROUP_TAG: &str = "eks:nodegroup-name";

const NAME_TAG: &str = "Name";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEc2Instance {
    pub instance_id: Option<String>,
    pub instance_type: Option<String>,
    pub state: Option<String>,
    #[serde(default)]
    pub tags: Tags,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAutoScalingGroup {
    pub name: Option<String>,
    pub min_size: Option<u32>,
    /// Resolved from the launch template or launch configuration
    pub instance_type: Option<String>,
    #[serde(default)]
    pub tags: Tags,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEksNodeGroup {
    pub name: Option<String>,
    pub min_size: Option<u32>,
    pub instance_types: Option<Vec<String>>,
    #[serde(default)]
    pub tags: Tags,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEksCluster {
    pub name: Option<String>,
    #[serde(default)]
    pub tags: Tags,
    #[serde(default)]
    pub node_groups: Vec<RawEksNodeGroup>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDbInstance {
    pub identifier: Option<String>,
    pub instance_class: Option<String>,
    pub engine: Option<String>,
    pub multi_az: Option<bool>,
    #[serde(default)]
    pub tags: Tags,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawReservedDbInstance {
    pub lease_id: Option<String>,
    pub instance_class: Option<String>,
    pub instance_count: Option<u32>,
    pub multi_az: Option<bool>,
    pub product_description: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawOfferingRate {
    pub instance_type: Option<String>,
    pub region: Option<String>,
    /// Hourly rate as a decimal string
    pub rate: Option<String>,
    pub duration_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSavingsPlan {
    pub id: Option<String>,
    pub savings_plan_type: Option<String>,
    pub state: Option<String>,
    /// Hourly commitment as a decimal string
    pub commitment: Option<String>,
    pub end: Option<String>,
}

/// Raw inventory document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub ec2_instances: Vec<RawEc2Instance>,
    #[serde(default)]
    pub auto_scaling_groups: Vec<RawAutoScalingGroup>,
    #[serde(default)]
    pub eks_clusters: Vec<RawEksCluster>,
    #[serde(default)]
    pub db_instances: Vec<RawDbInstance>,
    #[serde(default)]
    pub reserved_db_instances: Vec<RawReservedDbInstance>,
    #[serde(default)]
    pub savings_plan_offering_rates: Vec<RawOfferingRate>,
    #[serde(default)]
    pub savings_plans: Vec<RawSavingsPlan>,
}

impl Snapshot {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Filters applied while reading a snapshot
#[derive(Debug, Clone, Default)]
pub struct SnapshotOptions {
    /// Region offerings are priced in; required for the offering catalog
    pub region: Option<String>,
    /// Tags an EKS cluster must carry to be included (empty = all clusters)
    pub cluster_selector: Tags,
}

pub struct SnapshotSource {
    snapshot: Snapshot,
    options: SnapshotOptions,
}

impl SnapshotSource {
    pub fn new(snapshot: Snapshot, options: SnapshotOptions) -> Self {
        Self { snapshot, options }
    }

    /// Read and parse a snapshot file
    pub async fn open(path: impl AsRef<Path>, options: SnapshotOptions) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await?;
        let snapshot = Snapshot::from_json(&content)?;
        info!(
            path = %path.display(),
            ec2_instances = snapshot.ec2_instances.len(),
            auto_scaling_groups = snapshot.auto_scaling_groups.len(),
            eks_clusters = snapshot.eks_clusters.len(),
            db_instances = snapshot.db_instances.len(),
            "Loaded inventory snapshot"
        );
        Ok(Self::new(snapshot, options))
    }

    fn cluster_selected(&self, cluster: &RawEksCluster) -> bool {
        self.options
            .cluster_selector
            .iter()
            .all(|(key, value)| cluster.tags.get(key) == Some(value))
    }
}

fn required<T: Clone>(value: &Option<T>, field: &'static str, resource: &str) -> Result<T> {
    value
        .clone()
        .ok_or_else(|| ReservationError::missing(field, resource))
}

fn parse_decimal(value: &str, field: &'static str) -> Result<Decimal> {
    value
        .trim()
        .parse::<Decimal>()
        .map_err(|_| ReservationError::InvalidValue {
            field,
            value: value.to_string(),
        })
}

impl RawEc2Instance {
    fn is_running(&self) -> bool {
        self.state.as_deref() == Some("running")
    }

    fn to_instance(&self) -> Result<Ec2Instance> {
        let id = required(&self.instance_id, "InstanceId", "EC2 instance")?;
        let instance_type = required(&self.instance_type, "InstanceType", &id)?;
        Ok(Ec2Instance {
            name: self.tags.get(NAME_TAG).cloned().unwrap_or_default(),
            instance_type: InstanceType::parse(instance_type)?,
            purchase_method: Ec2PurchaseMethod::from_tags(&self.tags)?,
            id,
        })
    }
}

impl RawAutoScalingGroup {
    fn to_group(&self) -> Result<AutoScalingGroup> {
        let name = required(&self.name, "AutoScalingGroupName", "Auto Scaling Group")?;
        Ok(AutoScalingGroup {
            min_size: required(&self.min_size, "MinSize", &name)?,
            instance_type: InstanceType::parse(required(&self.instance_type, "InstanceType", &name)?)?,
            purchase_method: Ec2PurchaseMethod::from_tags(&self.tags)?,
            name,
        })
    }
}

impl RawEksNodeGroup {
    fn to_node_group(&self, cluster_name: &str) -> Result<EksNodeGroup> {
        let name = required(&self.name, "NodegroupName", cluster_name)?;
        let label = format!("{}/{}", cluster_name, name);
        let mut instance_types = self
            .instance_types
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|t| InstanceType::parse(t.clone()));
        let instance_type = instance_types
            .next()
            .ok_or_else(|| ReservationError::missing("InstanceTypes", &label))??;
        let alternate_instance_types = instance_types.collect::<Result<Vec<_>>>()?;

        Ok(EksNodeGroup {
            min_size: required(&self.min_size, "MinSize", &label)?,
            purchase_method: Ec2PurchaseMethod::from_tags(&self.tags)?,
            cluster_name: cluster_name.to_string(),
            name,
            instance_type,
            alternate_instance_types,
        })
    }
}

impl RawDbInstance {
    fn to_instance(&self) -> Result<DbInstance> {
        let identifier = required(&self.identifier, "DBInstanceIdentifier", "DB instance")?;
        Ok(DbInstance {
            instance_class: required(&self.instance_class, "DBInstanceClass", &identifier)?,
            engine: required(&self.engine, "Engine", &identifier)?,
            multi_az: required(&self.multi_az, "MultiAZ", &identifier)?,
            purchase_method: RdsPurchaseMethod::from_tags(&self.tags)?,
            identifier,
        })
    }
}

impl RawReservedDbInstance {
    fn is_active(&self) -> bool {
        self.state.as_deref() == Some("active")
    }

    fn to_reservation(&self) -> Result<ReservedDbInstance> {
        let lease_id = required(&self.lease_id, "LeaseId", "reserved DB instance")?;
        ReservedDbInstance::new(
            lease_id.as_str(),
            required(&self.instance_class, "DBInstanceClass", &lease_id)?,
            required(&self.instance_count, "DBInstanceCount", &lease_id)?,
            required(&self.multi_az, "MultiAZ", &lease_id)?,
            required(&self.product_description, "ProductDescription", &lease_id)?,
        )
    }
}

impl RawOfferingRate {
    fn to_offering(&self) -> Result<SavingsPlanOffering> {
        let instance_type = self.instance_type.clone().ok_or_else(|| {
            ReservationError::InvalidValue {
                field: "Savings Plans Offering",
                value: format!("{:?}", self),
            }
        })?;
        let rate = required(&self.rate, "rate", &instance_type)?;
        Ok(SavingsPlanOffering {
            rate: parse_decimal(&rate, "rate")?,
            instance_type,
        })
    }
}

impl RawSavingsPlan {
    fn is_active_compute(&self) -> bool {
        self.state.as_deref() == Some("active")
            && self.savings_plan_type.as_deref() == Some("Compute")
    }

    fn to_plan(&self) -> Result<SavingsPlan> {
        let id = required(&self.id, "savingsPlanId", "Savings Plan")?;
        let commitment = required(&self.commitment, "commitment", &id)?;
        let end = required(&self.end, "end", &id)?;
        let end = DateTime::parse_from_rfc3339(&end)
            .map_err(|_| ReservationError::InvalidValue {
                field: "end",
                value: end.clone(),
            })?
            .with_timezone(&Utc);

        Ok(SavingsPlan {
            commitment: parse_decimal(&commitment, "commitment")?,
            id,
            end,
        })
    }
}

#[async_trait]
impl InventorySource for SnapshotSource {
    async fn ec2_instances(&self) -> Result<Vec<Ec2Instance>> {
        let mut instances = Vec::new();
        for raw in &self.snapshot.ec2_instances {
            // Validate every record, even those filtered out below
            let instance = raw.to_instance()?;
            if !raw.is_running() || raw.tags.contains_key(ASG_NAME_TAG) {
                debug!(instance_id = %instance.id, "Skipping instance");
                continue;
            }
            instances.push(instance);
        }
        instances.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(instances)
    }

    async fn auto_scaling_groups(&self) -> Result<Vec<AutoScalingGroup>> {
        self.snapshot
            .auto_scaling_groups
            .iter()
            .filter(|raw| !raw.tags.contains_key(EKS_NODEGROUP_TAG))
            .map(RawAutoScalingGroup::to_group)
            .collect()
    }

    async fn eks_node_groups(&self) -> Result<Vec<EksNodeGroup>> {
        let mut node_groups = Vec::new();
        for cluster in &self.snapshot.eks_clusters {
            let cluster_name = required(&cluster.name, "name", "EKS cluster")?;
            if !self.cluster_selected(cluster) {
                debug!(cluster = %cluster_name, "Skipping cluster not matching selector");
                continue;
            }
            for raw in &cluster.node_groups {
                node_groups.push(raw.to_node_group(&cluster_name)?);
            }
        }
        Ok(node_groups)
    }

    async fn db_instances(&self) -> Result<Vec<DbInstance>> {
        self.snapshot
            .db_instances
            .iter()
            .map(RawDbInstance::to_instance)
            .collect()
    }

    async fn reserved_db_instances(&self) -> Result<Vec<ReservedDbInstance>> {
        self.snapshot
            .reserved_db_instances
            .iter()
            .filter(|raw| raw.is_active())
            .map(RawReservedDbInstance::to_reservation)
            .collect()
    }

    async fn savings_plan_offerings(&self) -> Result<OfferingMap> {
        let region = self
            .options
            .region
            .as_deref()
            .ok_or_else(|| ReservationError::missing("region", "Savings Plans Offering lookup"))?;

        let mut offerings = OfferingMap::new();
        for raw in &self.snapshot.savings_plan_offering_rates {
            if raw.duration_seconds != Some(ONE_YEAR_SECS) || raw.region.as_deref() != Some(region) {
                continue;
            }
            offerings.insert(raw.to_offering()?);
        }
        debug!(region = %region, offerings = offerings.len(), "Built offering map");
        Ok(offerings)
    }

    async fn active_savings_plans(&self) -> Result<Vec<SavingsPlan>> {
        self.snapshot
            .savings_plans
            .iter()
            .filter(|raw| raw.is_active_compute())
            .map(RawSavingsPlan::to_plan)
            .collect()
    }
}
