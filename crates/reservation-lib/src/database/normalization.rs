//! Normalized capacity units for RDS instance sizes
//!
//! Reservations within one instance family are size-flexible, so capacity is
//! compared in normalized units rather than instance counts.

use crate::error::{ReservationError, Result};
use crate::models::{DbInstance, ReservedDbInstance};
use serde::{Deserialize, Serialize};

/// Instance sizes with a known normalization factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstanceSize {
    Micro,
    Small,
    Medium,
    Large,
    XLarge,
    X2Large,
    X4Large,
    X8Large,
    X10Large,
    X16Large,
}

impl InstanceSize {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "micro" => Some(InstanceSize::Micro),
            "small" => Some(InstanceSize::Small),
            "medium" => Some(InstanceSize::Medium),
            "large" => Some(InstanceSize::Large),
            "xlarge" => Some(InstanceSize::XLarge),
            "2xlarge" => Some(InstanceSize::X2Large),
            "4xlarge" => Some(InstanceSize::X4Large),
            "8xlarge" => Some(InstanceSize::X8Large),
            "10xlarge" => Some(InstanceSize::X10Large),
            "16xlarge" => Some(InstanceSize::X16Large),
            _ => None,
        }
    }

    pub fn normalized_unit(self) -> f64 {
        match self {
            InstanceSize::Micro => 0.5,
            InstanceSize::Small => 1.0,
            InstanceSize::Medium => 2.0,
            InstanceSize::Large => 4.0,
            InstanceSize::XLarge => 8.0,
            InstanceSize::X2Large => 16.0,
            InstanceSize::X4Large => 32.0,
            InstanceSize::X8Large => 64.0,
            InstanceSize::X10Large => 80.0,
            InstanceSize::X16Large => 128.0,
        }
    }
}

/// Size of an instance class: the token after the last `.`
pub fn instance_size(instance_class: &str) -> Result<InstanceSize> {
    instance_class
        .rsplit_once('.')
        .and_then(|(_, token)| InstanceSize::from_token(token))
        .ok_or_else(|| ReservationError::UnknownInstanceSize {
            instance_class: instance_class.to_string(),
        })
}

/// Normalized unit of one instance of `instance_class`, doubled for Multi-AZ
pub fn normalized_unit(instance_class: &str, multi_az: bool) -> Result<f64> {
    let unit = instance_size(instance_class)?.normalized_unit();
    Ok(if multi_az { unit * 2.0 } else { unit })
}

impl DbInstance {
    pub fn normalized_unit(&self) -> Result<f64> {
        normalized_unit(&self.instance_class, self.multi_az)
    }
}

impl ReservedDbInstance {
    /// Units covered by the whole reservation (all instances in the lease)
    pub fn normalized_unit(&self) -> Result<f64> {
        Ok(normalized_unit(self.instance_class(), self.multi_az())? * f64::from(self.instance_count()))
    }
}
