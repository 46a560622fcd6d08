//! Inventory sources
//!
//! The engine consumes fully materialised collections. Sources fetch them,
//! possibly concurrently, and convert raw provider records into validated
//! domain records (purchase methods resolved, required fields checked).

mod snapshot;


pub use snapshot::{
    RawAutoScalingGroup, RawDbInstance, RawEc2Instance, RawEksCluster, RawEksNodeGroup,
    RawOfferingRate, RawReservedDbInstance, RawSavingsPlan, Snapshot, SnapshotOptions,
    SnapshotSource,
};

use crate::compute::OfferingMap;
use crate::error::Result;
use crate::models::{
    AutoScalingGroup, ComputeResource, DbInstance, Ec2Instance, EksNodeGroup, ReservedDbInstance,
    SavingsPlan,
};
use serde::Serialize;

pub use async_trait::async_trait;

/// Provider of validated inventory records
#[async_trait]
pub trait InventorySource: Send + Sync {
    /// Running EC2 instances not owned by an auto scaling group
    async fn ec2_instances(&self) -> Result<Vec<Ec2Instance>>;

    /// Auto scaling groups not managed by EKS
    async fn auto_scaling_groups(&self) -> Result<Vec<AutoScalingGroup>>;

    async fn eks_node_groups(&self) -> Result<Vec<EksNodeGroup>>;

    async fn db_instances(&self) -> Result<Vec<DbInstance>>;

    /// Reservations in `active` state
    async fn reserved_db_instances(&self) -> Result<Vec<ReservedDbInstance>>;

    /// One-year compute savings-plan offerings for the operator's region
    async fn savings_plan_offerings(&self) -> Result<OfferingMap>;

    /// Compute savings plans in `active` state
    async fn active_savings_plans(&self) -> Result<Vec<SavingsPlan>>;
}

/// Compute capacity, one collection per kind
#[derive(Debug, Clone, Default, Serialize)]
pub struct ComputeInventory {
    pub ec2: Vec<Ec2Instance>,
    pub asg: Vec<AutoScalingGroup>,
    pub eks: Vec<EksNodeGroup>,
}

impl ComputeInventory {
    pub fn into_resources(self) -> impl Iterator<Item = ComputeResource> {
        self.ec2
            .into_iter()
            .map(ComputeResource::Instance)
            .chain(self.asg.into_iter().map(ComputeResource::ScalingGroup))
            .chain(self.eks.into_iter().map(ComputeResource::NodeGroup))
    }

    pub fn len(&self) -> usize {
        self.ec2.len() + self.asg.len() + self.eks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DatabaseInventory {
    pub db_instances: Vec<DbInstance>,
    pub reserved_db_instances: Vec<ReservedDbInstance>,
}

/// Fetch the three compute collections concurrently
pub async fn load_compute_inventory(source: &dyn InventorySource) -> Result<ComputeInventory> {
    let (ec2, asg, eks) = tokio::try_join!(
        source.ec2_instances(),
        source.auto_scaling_groups(),
        source.eks_node_groups()
    )?;
    tracing::debug!(
        ec2 = ec2.len(),
        asg = asg.len(),
        eks = eks.len(),
        "Loaded compute inventory"
    );
    Ok(ComputeInventory { ec2, asg, eks })
}

/// Fetch running DB instances and active reservations concurrently
pub async fn load_database_inventory(source: &dyn InventorySource) -> Result<DatabaseInventory> {
    let (db_instances, reserved_db_instances) =
        tokio::try_join!(source.db_instances(), source.reserved_db_instances())?;
    tracing::debug!(
        db_instances = db_instances.len(),
        reserved_db_instances = reserved_db_instances.len(),
        "Loaded database inventory"
    );
    Ok(DatabaseInventory {
        db_instances,
        reserved_db_instances,
    })
}

/// Everything the compute-savings-plan report needs
#[derive(Debug)]
pub struct SavingsPlanInventory {
    pub compute: ComputeInventory,
    pub offerings: OfferingMap,
    pub active: Vec<SavingsPlan>,
}

pub async fn load_savings_plan_inventory(
    source: &dyn InventorySource,
) -> Result<SavingsPlanInventory> {
    let (compute, offerings, active) = tokio::try_join!(
        load_compute_inventory(source),
        source.savings_plan_offerings(),
        source.active_savings_plans()
    )?;
    tracing::debug!(
        offerings = offerings.len(),
        active_savings_plans = active.len(),
        "Loaded savings plan inventory"
    );
    Ok(SavingsPlanInventory {
        compute,
        offerings,
        active,
    })
}

/// A fully materialised point-in-time inventory
#[derive(Debug)]
pub struct Inventory {
    pub compute: ComputeInventory,
    pub database: DatabaseInventory,
    pub offerings: OfferingMap,
    pub active_savings_plans: Vec<SavingsPlan>,
}

/// Fetch all seven collections concurrently; the first failure aborts the load
pub async fn load_inventory(source: &dyn InventorySource) -> Result<Inventory> {
    let (compute, database, offerings, active_savings_plans) = tokio::try_join!(
        load_compute_inventory(source),
        load_database_inventory(source),
        source.savings_plan_offerings(),
        source.active_savings_plans()
    )?;
    Ok(Inventory {
        compute,
        database,
        offerings,
        active_savings_plans,
    })
}
