//! Purchase-method classification
//!
//! Each taggable resource declares how its capacity should be paid for via the
//! `ReservationPurchaseMethod` tag. The method is resolved once when the
//! resource record is built and is the sole partition key for grouping.

use crate::error::{ReservationError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Tag key holding the purchase method
pub const PURCHASE_METHOD_TAG: &str = "ReservationPurchaseMethod";

/// Resource tags as key/value pairs
pub type Tags = BTreeMap<String, String>;

/// A closed set of purchase methods for one resource domain
pub trait PurchaseMethod: Copy + Eq + fmt::Display + Sized + 'static {
    /// Every variant, in report order
    const ALL: &'static [Self];

    /// Method used when the tag is absent
    const UNDEFINED: Self;

    /// Parse an explicit tag value. `Undefined` is never a valid literal.
    fn from_tag_value(value: &str) -> Option<Self>;

    fn as_str(&self) -> &'static str;

    /// Classify a resource by its tag set.
    ///
    /// An absent tag yields `UNDEFINED`; a present tag with an unexpected
    /// value is an operator typo and fails the run.
    fn from_tags(tags: &Tags) -> Result<Self> {
        match tags.get(PURCHASE_METHOD_TAG) {
            None => Ok(Self::UNDEFINED),
            Some(value) => {
                Self::from_tag_value(value).ok_or_else(|| ReservationError::UnknownPurchaseMethod {
                    value: value.clone(),
                })
            }
        }
    }
}

/// Purchase method for EC2 capacity (instances, ASGs, EKS node groups)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Ec2PurchaseMethod {
    ComputeSavingsPlans,
    #[serde(rename = "EC2InstanceSavingsPlans")]
    Ec2InstanceSavingsPlans,
    SpotInstances,
    Needless,
    Undefined,
}

impl PurchaseMethod for Ec2PurchaseMethod {
    const ALL: &'static [Self] = &[
        Ec2PurchaseMethod::ComputeSavingsPlans,
        Ec2PurchaseMethod::Ec2InstanceSavingsPlans,
        Ec2PurchaseMethod::SpotInstances,
        Ec2PurchaseMethod::Needless,
        Ec2PurchaseMethod::Undefined,
    ];

    const UNDEFINED: Self = Ec2PurchaseMethod::Undefined;

    fn from_tag_value(value: &str) -> Option<Self> {
        match value {
            "ComputeSavingsPlans" => Some(Ec2PurchaseMethod::ComputeSavingsPlans),
            "EC2InstanceSavingsPlans" => Some(Ec2PurchaseMethod::Ec2InstanceSavingsPlans),
            "SpotInstances" => Some(Ec2PurchaseMethod::SpotInstances),
            "Needless" => Some(Ec2PurchaseMethod::Needless),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Ec2PurchaseMethod::ComputeSavingsPlans => "ComputeSavingsPlans",
            Ec2PurchaseMethod::Ec2InstanceSavingsPlans => "EC2InstanceSavingsPlans",
            Ec2PurchaseMethod::SpotInstances => "SpotInstances",
            Ec2PurchaseMethod::Needless => "Needless",
            Ec2PurchaseMethod::Undefined => "Undefined",
        }
    }
}

/// Purchase method for RDS instances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RdsPurchaseMethod {
    ReservedInstance,
    Needless,
    Undefined,
}

impl PurchaseMethod for RdsPurchaseMethod {
    const ALL: &'static [Self] = &[
        RdsPurchaseMethod::ReservedInstance,
        RdsPurchaseMethod::Needless,
        RdsPurchaseMethod::Undefined,
    ];

    const UNDEFINED: Self = RdsPurchaseMethod::Undefined;

    fn from_tag_value(value: &str) -> Option<Self> {
        match value {
            "ReservedInstance" => Some(RdsPurchaseMethod::ReservedInstance),
            "Needless" => Some(RdsPurchaseMethod::Needless),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            RdsPurchaseMethod::ReservedInstance => "ReservedInstance",
            RdsPurchaseMethod::Needless => "Needless",
            RdsPurchaseMethod::Undefined => "Undefined",
        }
    }
}

impl fmt::Display for Ec2PurchaseMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for RdsPurchaseMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
