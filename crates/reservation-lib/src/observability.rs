//! Structured logging for reconciliation runs
//!
//! Each significant pipeline step emits one event with an `event` field so
//! runs can be followed in JSON log output.

use crate::compute::{GroupedComputeResources, SavingsPlanReconciliation};
use crate::database::KeyReconciliation;
use crate::models::CoverageStatus;
use crate::purchase_method::{Ec2PurchaseMethod, PurchaseMethod};
use crate::source::ComputeInventory;
use tracing::{debug, info, warn};

/// Structured logger for reconciliation events
#[derive(Clone)]
pub struct StructuredLogger {
    region: String,
}

impl StructuredLogger {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
        }
    }

    /// Log the start of a report
    pub fn log_run_start(&self, report: &str, version: &str) {
        info!(
            event = "run_started",
            region = %self.region,
            report = %report,
            version = %version,
            "Reconciliation run started"
        );
    }

    /// Log collection sizes after the inventory is loaded
    pub fn log_inventory_loaded(&self, compute: &ComputeInventory) {
        info!(
            event = "inventory_loaded",
            region = %self.region,
            ec2 = compute.ec2.len(),
            asg = compute.asg.len(),
            eks = compute.eks.len(),
            "Loaded compute inventory"
        );
    }

    /// Log bucket sizes after grouping compute resources
    pub fn log_compute_grouped(&self, grouped: &GroupedComputeResources) {
        for method in Ec2PurchaseMethod::ALL {
            let bucket = grouped.bucket(*method);
            debug!(
                event = "resources_grouped",
                region = %self.region,
                purchase_method = %method,
                ec2 = bucket.ec2.len(),
                asg = bucket.asg.len(),
                eks = bucket.eks.len(),
                "Grouped compute resources"
            );
        }
    }

    /// Log one equivalence-class result
    pub fn log_key_reconciliation(&self, result: &KeyReconciliation) {
        info!(
            event = "reserved_instances_reconciled",
            region = %self.region,
            key = %result.key,
            running = result.running_units,
            held = result.held_units,
            delta = result.delta,
            "Reconciled reserved DB instances"
        );
    }

    /// Log savings-plan totals
    pub fn log_savings_plans(&self, result: &SavingsPlanReconciliation) {
        let running = result.running_total.to_string();
        let held = result.held_total.to_string();
        let delta = result.delta.to_string();
        match result.status {
            CoverageStatus::Surplus => warn!(
                event = "savings_plans_reconciled",
                region = %self.region,
                running = %running,
                held = %held,
                delta = %delta,
                "Savings Plans are over purchased"
            ),
            _ => info!(
                event = "savings_plans_reconciled",
                region = %self.region,
                running = %running,
                held = %held,
                delta = %delta,
                "Reconciled compute Savings Plans"
            ),
        }
    }

    /// Log an aborted run
    pub fn log_failure(&self, report: &str, error: &dyn std::error::Error) {
        warn!(
            event = "run_failed",
            region = %self.region,
            report = %report,
            error = %error,
            "Reconciliation run aborted"
        );
    }
}
