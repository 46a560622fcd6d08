//! Reservation reconciliation engine
//!
//! This crate provides:
//! - Purchase-method classification from resource tags
//! - Grouping of compute and database resources by purchase method
//! - Normalized-unit reconciliation of RDS reserved instances
//! - Hourly-cost reconciliation of compute savings plans
//! - Inventory sources that feed the engine

pub mod compute;
pub mod database;
pub mod error;
pub mod models;
pub mod observability;
pub mod purchase_method;
pub mod source;

pub use error::{ReservationError, Result};
pub use models::*;
pub use observability::StructuredLogger;
pub use purchase_method::{Ec2PurchaseMethod, PurchaseMethod, RdsPurchaseMethod, Tags};
