//! Per-key reconciliation of running RDS instances against reservations

use crate::error::Result;
use crate::models::{CoverageStatus, DbInstance, ReservedDbInstance};
use crate::purchase_method::RdsPurchaseMethod;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{EngineMapping, GroupKey};

/// One value per RDS purchase method
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RdsBuckets<B> {
    #[serde(rename = "ReservedInstance")]
    pub reserved_instance: B,
    #[serde(rename = "Needless")]
    pub needless: B,
    #[serde(rename = "Undefined")]
    pub undefined: B,
}

impl<B> RdsBuckets<B> {
    pub fn bucket(&self, method: RdsPurchaseMethod) -> &B {
        match method {
            RdsPurchaseMethod::ReservedInstance => &self.reserved_instance,
            RdsPurchaseMethod::Needless => &self.needless,
            RdsPurchaseMethod::Undefined => &self.undefined,
        }
    }

    pub fn bucket_mut(&mut self, method: RdsPurchaseMethod) -> &mut B {
        match method {
            RdsPurchaseMethod::ReservedInstance => &mut self.reserved_instance,
            RdsPurchaseMethod::Needless => &mut self.needless,
            RdsPurchaseMethod::Undefined => &mut self.undefined,
        }
    }
}

pub type GroupedDbInstances = RdsBuckets<Vec<DbInstance>>;

pub fn group_by_purchase_method(instances: &[DbInstance]) -> GroupedDbInstances {
    let mut grouped = GroupedDbInstances::default();
    for instance in instances {
        grouped
            .bucket_mut(instance.purchase_method)
            .push(instance.clone());
    }
    grouped
}

/// Running instances and reservations sharing one group key
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CalculationUnit {
    pub db_instances: Vec<DbInstance>,
    pub reserved_db_instances: Vec<ReservedDbInstance>,
}

/// Bucket `ReservedInstance`-tagged instances and active reservations by key.
///
/// The result is keyed by the union of both sides: a key with only
/// reservations or only running instances is still present.
pub fn group_calculation_units(
    instances: &[DbInstance],
    reserved: &[ReservedDbInstance],
    mapping: &EngineMapping,
) -> Result<BTreeMap<GroupKey, CalculationUnit>> {
    let mut units: BTreeMap<GroupKey, CalculationUnit> = BTreeMap::new();

    for instance in instances
        .iter()
        .filter(|i| i.purchase_method == RdsPurchaseMethod::ReservedInstance)
    {
        let key = GroupKey::for_db_instance(instance, mapping)?;
        units.entry(key).or_default().db_instances.push(instance.clone());
    }

    for reservation in reserved {
        units
            .entry(reservation.group_key().clone())
            .or_default()
            .reserved_db_instances
            .push(reservation.clone());
    }

    Ok(units)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedDbInstance {
    pub identifier: String,
    pub instance_class: String,
    pub units: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedReservation {
    pub lease_id: String,
    pub instance_class: String,
    pub instance_count: u32,
    pub units: f64,
}

/// Running vs. held normalized units for one group key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyReconciliation {
    pub key: GroupKey,
    pub running: Vec<NormalizedDbInstance>,
    pub held: Vec<NormalizedReservation>,
    pub running_units: f64,
    pub held_units: f64,
    /// `running_units - held_units`; positive means more must be purchased
    pub delta: f64,
    pub status: CoverageStatus,
}

/// Compute totals and deltas for every key, in key order.
///
/// Fails if any instance class has a size outside the normalization table.
pub fn reconcile_reserved_instances(
    units: &BTreeMap<GroupKey, CalculationUnit>,
) -> Result<Vec<KeyReconciliation>> {
    units
        .iter()
        .map(|(key, unit)| {
            let running = unit
                .db_instances
                .iter()
                .map(|i| {
                    Ok(NormalizedDbInstance {
                        identifier: i.identifier.clone(),
                        instance_class: i.instance_class.clone(),
                        units: i.normalized_unit()?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            let held = unit
                .reserved_db_instances
                .iter()
                .map(|r| {
                    Ok(NormalizedReservation {
                        lease_id: r.lease_id().to_string(),
                        instance_class: r.instance_class().to_string(),
                        instance_count: r.instance_count(),
                        units: r.normalized_unit()?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            let running_units: f64 = running.iter().map(|i| i.units).sum();
            let held_units: f64 = held.iter().map(|r| r.units).sum();
            let delta = running_units - held_units;

            Ok(KeyReconciliation {
                key: key.clone(),
                running,
                held,
                running_units,
                held_units,
                delta,
                status: CoverageStatus::from_delta(delta),
            })
        })
        .collect()
}
