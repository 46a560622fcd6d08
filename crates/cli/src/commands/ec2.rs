//! EC2 capacity reports

use anyhow::Result;
use colored::Colorize;
use reservation_lib::compute::{
    group_by_instance_family, group_by_purchase_method, ComputeResources,
};
use reservation_lib::source::{load_compute_inventory, InventorySource};
use reservation_lib::{Ec2PurchaseMethod, PricedCapacity, PurchaseMethod, StructuredLogger};
use tabled::Tabled;

use crate::output::{print_heading, print_info, print_json, print_table, OutputFormat};

/// Row for a compute resource
#[derive(Tabled)]
struct ResourceRow {
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Instance Type")]
    instance_type: String,
    #[tabled(rename = "Min Size")]
    units: u32,
}

fn row(kind: &'static str, resource: &impl PricedCapacity) -> ResourceRow {
    ResourceRow {
        kind,
        name: resource.identity_label(),
        instance_type: resource.instance_type().to_string(),
        units: resource.concurrent_unit_count(),
    }
}

fn rows(resources: &ComputeResources) -> Vec<ResourceRow> {
    resources
        .ec2
        .iter()
        .map(|r| row("EC2", r))
        .chain(resources.asg.iter().map(|r| row("ASG", r)))
        .chain(resources.eks.iter().map(|r| row("EKS", r)))
        .collect()
}

/// Show every running compute resource grouped by purchase method
pub async fn show_all(
    source: &dyn InventorySource,
    logger: &StructuredLogger,
    format: OutputFormat,
) -> Result<()> {
    let inventory = load_compute_inventory(source).await?;
    logger.log_inventory_loaded(&inventory);

    let grouped = group_by_purchase_method(inventory.into_resources());
    logger.log_compute_grouped(&grouped);

    match format {
        OutputFormat::Json => print_json(&grouped)?,
        OutputFormat::Table => {
            for method in Ec2PurchaseMethod::ALL {
                let bucket = grouped.bucket(*method);
                print_heading(&format!("{} ({})", method, bucket.len()));
                print_table(&rows(bucket));
            }
        }
    }

    Ok(())
}

/// Show EC2-instance-savings-plan resources split by instance family
pub async fn show_instance_savings_plans(
    source: &dyn InventorySource,
    logger: &StructuredLogger,
    format: OutputFormat,
) -> Result<()> {
    let inventory = load_compute_inventory(source).await?;
    logger.log_inventory_loaded(&inventory);

    let grouped = group_by_purchase_method(inventory.into_resources());
    logger.log_compute_grouped(&grouped);
    let families = group_by_instance_family(&grouped.ec2_instance_savings_plans)?;

    match format {
        OutputFormat::Json => print_json(&families)?,
        OutputFormat::Table => {
            if families.is_empty() {
                print_info("No resources use EC2 Instance Savings Plans");
                return Ok(());
            }
            for (family, resources) in &families {
                print_heading(&format!("Instance family {}", family.cyan()));
                print_table(&rows(resources));
            }
        }
    }

    Ok(())
}
