//! Error taxonomy for the reconciliation engine
//!
//! Every variant is fatal: the run aborts and no partial report is produced.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReservationError>;

#[derive(Debug, Error)]
pub enum ReservationError {
    /// Source data is structurally invalid
    #[error("{field} is not set: {resource}")]
    MissingField {
        resource: String,
        field: &'static str,
    },

    /// `ReservationPurchaseMethod` tag holds a literal outside the domain's enum
    #[error("Unknown ReservationPurchaseMethod detected: {value}")]
    UnknownPurchaseMethod { value: String },

    /// The pricing catalog has no offering for a resource that needs one
    #[error("Savings Plans Offering is not found for {resource}: {instance_type}")]
    OfferingNotFound {
        instance_type: String,
        resource: String,
    },

    /// Size token outside the normalization table
    #[error("Not implemented: unknown instance size in {instance_class}")]
    UnknownInstanceSize { instance_class: String },

    /// Instance type that does not follow the `family.size` format
    #[error("Invalid instance type: {instance_type}")]
    InvalidInstanceType { instance_type: String },

    /// Known gap in the engine
    #[error("Not implemented: {detail}")]
    NotImplemented { detail: String },

    /// Field present but not parseable
    #[error("Invalid {field}: {value}")]
    InvalidValue { field: &'static str, value: String },

    #[error("Failed to read inventory snapshot: {0}")]
    Snapshot(#[from] std::io::Error),

    #[error("Failed to parse inventory snapshot: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ReservationError {
    pub fn missing(field: &'static str, resource: impl Into<String>) -> Self {
        ReservationError::MissingField {
            resource: resource.into(),
            field,
        }
    }

    pub fn not_implemented(detail: impl Into<String>) -> Self {
        ReservationError::NotImplemented {
            detail: detail.into(),
        }
    }

    /// Check if this error comes from a gap in the engine rather than from bad data
    pub fn is_not_implemented(&self) -> bool {
        matches!(
            self,
            ReservationError::NotImplemented { .. } | ReservationError::UnknownInstanceSize { .. }
        )
    }
}
