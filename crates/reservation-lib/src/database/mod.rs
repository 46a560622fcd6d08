//! RDS reserved-instance reconciliation
//!
//! Running instances tagged `ReservedInstance` and active reservations are
//! matched by equivalence class (instance family, engine, AZ mode) and compared
//! in normalized units.

mod group_key;
mod normalization;
mod reconcile;

pub use group_key::{instance_class_family, EngineMapping, GroupKey};
pub use normalization::{instance_size, normalized_unit, InstanceSize};
pub use reconcile::{
    group_by_purchase_method, group_calculation_units, reconcile_reserved_instances,
    CalculationUnit, GroupedDbInstances, KeyReconciliation, NormalizedDbInstance,
    NormalizedReservation, RdsBuckets,
};
