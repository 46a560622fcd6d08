//! Core data models for the reconciliation engine
//!
//! All records are built once from provider data and never mutated.

use crate::database::GroupKey;
use crate::error::{ReservationError, Result};
use crate::purchase_method::{Ec2PurchaseMethod, RdsPurchaseMethod};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// EC2 instance type in `family.size` form, e.g. `m5.2xlarge`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InstanceType(String);

impl InstanceType {
    pub fn parse(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        match value.split_once('.') {
            Some((family, size)) if !family.is_empty() && !size.is_empty() => Ok(Self(value)),
            _ => Err(ReservationError::InvalidInstanceType {
                instance_type: value,
            }),
        }
    }

    /// Substring before the first `.`
    pub fn family(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for InstanceType {
    type Error = ReservationError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<InstanceType> for String {
    fn from(value: InstanceType) -> Self {
        value.0
    }
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A running, stand-alone EC2 instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ec2Instance {
    pub id: String,
    /// Value of the `Name` tag, empty when untagged
    pub name: String,
    pub instance_type: InstanceType,
    pub purchase_method: Ec2PurchaseMethod,
}

/// An auto scaling group not managed by EKS
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoScalingGroup {
    pub name: String,
    pub min_size: u32,
    pub instance_type: InstanceType,
    pub purchase_method: Ec2PurchaseMethod,
}

/// An EKS managed node group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EksNodeGroup {
    pub name: String,
    pub cluster_name: String,
    /// The type the node group is priced by (first declared type)
    pub instance_type: InstanceType,
    /// Declared types after the priced one
    pub alternate_instance_types: Vec<InstanceType>,
    pub min_size: u32,
    pub purchase_method: Ec2PurchaseMethod,
}

impl EksNodeGroup {
    /// All declared instance types, priced type first
    pub fn instance_types(&self) -> impl Iterator<Item = &InstanceType> {
        std::iter::once(&self.instance_type).chain(self.alternate_instance_types.iter())
    }
}

/// Any EC2-backed compute resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ComputeResource {
    Instance(Ec2Instance),
    ScalingGroup(AutoScalingGroup),
    NodeGroup(EksNodeGroup),
}

/// Capacity that can be priced against a savings-plan offering
///
/// Implemented by each compute resource kind so enrichment and totals are
/// written once.
pub trait PricedCapacity {
    fn instance_type(&self) -> &InstanceType;

    /// Number of instances guaranteed to run concurrently
    fn concurrent_unit_count(&self) -> u32;

    /// Human-readable identity for reports and errors
    fn identity_label(&self) -> String;

    fn purchase_method(&self) -> Ec2PurchaseMethod;
}

impl PricedCapacity for Ec2Instance {
    fn instance_type(&self) -> &InstanceType {
        &self.instance_type
    }

    fn concurrent_unit_count(&self) -> u32 {
        1
    }

    fn identity_label(&self) -> String {
        if self.name.is_empty() {
            self.id.clone()
        } else {
            self.name.clone()
        }
    }

    fn purchase_method(&self) -> Ec2PurchaseMethod {
        self.purchase_method
    }
}

impl PricedCapacity for AutoScalingGroup {
    fn instance_type(&self) -> &InstanceType {
        &self.instance_type
    }

    fn concurrent_unit_count(&self) -> u32 {
        self.min_size
    }

    fn identity_label(&self) -> String {
        self.name.clone()
    }

    fn purchase_method(&self) -> Ec2PurchaseMethod {
        self.purchase_method
    }
}

impl PricedCapacity for EksNodeGroup {
    fn instance_type(&self) -> &InstanceType {
        &self.instance_type
    }

    fn concurrent_unit_count(&self) -> u32 {
        self.min_size
    }

    fn identity_label(&self) -> String {
        format!("{}/{}", self.cluster_name, self.name)
    }

    fn purchase_method(&self) -> Ec2PurchaseMethod {
        self.purchase_method
    }
}

impl ComputeResource {
    fn capacity(&self) -> &dyn PricedCapacity {
        match self {
            ComputeResource::Instance(r) => r,
            ComputeResource::ScalingGroup(r) => r,
            ComputeResource::NodeGroup(r) => r,
        }
    }
}

impl PricedCapacity for ComputeResource {
    fn instance_type(&self) -> &InstanceType {
        self.capacity().instance_type()
    }

    fn concurrent_unit_count(&self) -> u32 {
        self.capacity().concurrent_unit_count()
    }

    fn identity_label(&self) -> String {
        self.capacity().identity_label()
    }

    fn purchase_method(&self) -> Ec2PurchaseMethod {
        self.capacity().purchase_method()
    }
}

/// A running RDS instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbInstance {
    pub identifier: String,
    /// Vendor class, e.g. `db.r5.large`
    pub instance_class: String,
    pub engine: String,
    pub multi_az: bool,
    pub purchase_method: RdsPurchaseMethod,
}

/// An active, already-purchased RDS reservation
///
/// The group key is derived from the class, description and Multi-AZ flag
/// at construction, so the fields are read-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReservedDbInstance {
    lease_id: String,
    group_key: GroupKey,
    instance_class: String,
    instance_count: u32,
    multi_az: bool,
    product_description: String,
}

impl ReservedDbInstance {
    pub fn new(
        lease_id: impl Into<String>,
        instance_class: impl Into<String>,
        instance_count: u32,
        multi_az: bool,
        product_description: impl Into<String>,
    ) -> Result<Self> {
        let instance_class = instance_class.into();
        let product_description = product_description.into();
        Ok(Self {
            group_key: GroupKey::for_reservation(&instance_class, &product_description, multi_az)?,
            lease_id: lease_id.into(),
            instance_class,
            instance_count,
            multi_az,
            product_description,
        })
    }

    pub fn lease_id(&self) -> &str {
        &self.lease_id
    }

    pub fn group_key(&self) -> &GroupKey {
        &self.group_key
    }

    pub fn instance_class(&self) -> &str {
        &self.instance_class
    }

    pub fn instance_count(&self) -> u32 {
        self.instance_count
    }

    pub fn multi_az(&self) -> bool {
        self.multi_az
    }

    pub fn product_description(&self) -> &str {
        &self.product_description
    }
}

/// Hourly rate of a 1-year, all-upfront, shared-tenancy compute savings plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsPlanOffering {
    pub instance_type: String,
    pub rate: Decimal,
}

/// An active compute savings plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsPlan {
    pub id: String,
    /// Hourly commitment in USD
    pub commitment: Decimal,
    pub end: DateTime<Utc>,
}

/// Outcome of comparing running capacity with held commitments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageStatus {
    /// Running exceeds held, more must be purchased
    Shortfall,
    /// Held exceeds running
    Surplus,
    Covered,
}

impl CoverageStatus {
    /// Classify a `running - held` delta
    pub fn from_delta<T: PartialOrd + Default>(delta: T) -> Self {
        let zero = T::default();
        if delta > zero {
            CoverageStatus::Shortfall
        } else if delta < zero {
            CoverageStatus::Surplus
        } else {
            CoverageStatus::Covered
        }
    }
}
