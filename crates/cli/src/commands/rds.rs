//! Reserved DB instance report

use anyhow::Result;
use colored::Colorize;
use reservation_lib::database::{
    group_by_purchase_method, group_calculation_units, reconcile_reserved_instances,
    EngineMapping, KeyReconciliation,
};
use reservation_lib::source::{load_database_inventory, InventorySource};
use reservation_lib::{DbInstance, StructuredLogger};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{
    color_status, format_units, print_coverage, print_heading, print_json, print_table,
    OutputFormat,
};

#[derive(Tabled)]
struct UnitRow {
    #[tabled(rename = "Identifier")]
    identifier: String,
    #[tabled(rename = "Instance Class")]
    instance_class: String,
    #[tabled(rename = "Count")]
    count: u32,
    #[tabled(rename = "Normalized Units")]
    units: String,
}

#[derive(Tabled)]
struct DbInstanceRow {
    #[tabled(rename = "Identifier")]
    identifier: String,
    #[tabled(rename = "Instance Class")]
    instance_class: String,
    #[tabled(rename = "Engine")]
    engine: String,
    #[tabled(rename = "Multi-AZ")]
    multi_az: bool,
}

impl From<&DbInstance> for DbInstanceRow {
    fn from(instance: &DbInstance) -> Self {
        Self {
            identifier: instance.identifier.clone(),
            instance_class: instance.instance_class.clone(),
            engine: instance.engine.clone(),
            multi_az: instance.multi_az,
        }
    }
}

#[derive(Serialize)]
struct RdsReport<'a> {
    reserved_instances: &'a [KeyReconciliation],
    needless: &'a [DbInstance],
    undefined: &'a [DbInstance],
}

fn print_key(result: &KeyReconciliation) {
    print_heading(&format!("{} [{}]", result.key, color_status(result.status)));

    let mut rows: Vec<UnitRow> = result
        .running
        .iter()
        .map(|i| UnitRow {
            identifier: i.identifier.clone(),
            instance_class: i.instance_class.clone(),
            count: 1,
            units: format_units(i.units),
        })
        .collect();
    rows.extend(result.held.iter().map(|r| UnitRow {
        identifier: format!("{} (reserved)", r.lease_id),
        instance_class: r.instance_class.clone(),
        count: r.instance_count,
        units: format_units(r.units),
    }));
    print_table(&rows);

    println!("Running:                {}", format_units(result.running_units));
    println!("Purchased:              {}", format_units(result.held_units));
    print_coverage(
        result.status,
        &format!("{} normalized units", format_units(result.delta.abs())),
    );
}

fn print_instances(title: &str, instances: &[DbInstance]) {
    print_heading(title);
    let rows: Vec<DbInstanceRow> = instances.iter().map(DbInstanceRow::from).collect();
    print_table(&rows);
}

/// Reconcile running DB instances against active reservations per group key
pub async fn show_reserved_instances(
    source: &dyn InventorySource,
    mapping: &EngineMapping,
    logger: &StructuredLogger,
    format: OutputFormat,
) -> Result<()> {
    let inventory = load_database_inventory(source).await?;
    let grouped = group_by_purchase_method(&inventory.db_instances);

    let units = group_calculation_units(
        &inventory.db_instances,
        &inventory.reserved_db_instances,
        mapping,
    )?;
    let results = reconcile_reserved_instances(&units)?;
    for result in &results {
        logger.log_key_reconciliation(result);
    }

    match format {
        OutputFormat::Json => print_json(&RdsReport {
            reserved_instances: &results,
            needless: &grouped.needless,
            undefined: &grouped.undefined,
        })?,
        OutputFormat::Table => {
            println!("{}", "Reserved DB Instances".bold());
            for result in &results {
                print_key(result);
            }
            print_instances("Needless", &grouped.needless);
            print_instances("Undefined", &grouped.undefined);
        }
    }

    Ok(())
}
