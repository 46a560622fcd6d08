//! EC2 capacity: grouping by purchase method and savings-plan reconciliation
//!
//! Instances, auto scaling groups and EKS node groups are bucketed by the
//! purchase method they claim. The compute-savings-plan bucket is priced
//! against the offering catalog and compared with active savings plans; the
//! EC2-instance-savings-plan bucket is further split by instance family.

mod grouping;
mod savings_plans;

pub use grouping::{
    group_by_instance_family, group_by_purchase_method, ComputeResources, Ec2Buckets,
    GroupedComputeResources,
};
pub use savings_plans::{
    price_resources, reconcile_savings_plans, OfferingMap, PricedResource, PricedResources,
    ResourceKind, SavingsPlanReconciliation, ONE_YEAR_SECS,
};
