//! Compute Savings Plans report

use anyhow::Result;
use reservation_lib::compute::{
    group_by_purchase_method, price_resources, reconcile_savings_plans, PricedResource,
};
use reservation_lib::source::{load_savings_plan_inventory, InventorySource};
use reservation_lib::{SavingsPlan, StructuredLogger};
use tabled::Tabled;

use crate::output::{
    format_hourly, print_coverage, print_heading, print_json, print_table, OutputFormat,
};

#[derive(Tabled)]
struct PricedRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Instance Type")]
    instance_type: String,
    #[tabled(rename = "Rate")]
    rate: String,
    #[tabled(rename = "Units")]
    units: u32,
    #[tabled(rename = "Hourly Cost")]
    hourly_cost: String,
}

impl From<&PricedResource> for PricedRow {
    fn from(resource: &PricedResource) -> Self {
        Self {
            name: resource.label.clone(),
            instance_type: resource.instance_type.clone(),
            rate: format_hourly(resource.rate),
            units: resource.units,
            hourly_cost: format_hourly(resource.hourly_cost),
        }
    }
}

#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "Savings Plan")]
    id: String,
    #[tabled(rename = "Commitment")]
    commitment: String,
    #[tabled(rename = "End")]
    end: String,
}

impl From<&SavingsPlan> for PlanRow {
    fn from(plan: &SavingsPlan) -> Self {
        Self {
            id: plan.id.clone(),
            commitment: format_hourly(plan.commitment),
            end: plan.end.format("%Y-%m-%d").to_string(),
        }
    }
}

fn priced_rows(resources: &[PricedResource]) -> Vec<PricedRow> {
    resources.iter().map(PricedRow::from).collect()
}

/// Compare running capacity priced at offering rates with active commitments
pub async fn show_compute_savings_plans(
    source: &dyn InventorySource,
    logger: &StructuredLogger,
    format: OutputFormat,
) -> Result<()> {
    let inventory = load_savings_plan_inventory(source).await?;
    logger.log_inventory_loaded(&inventory.compute);

    let grouped = group_by_purchase_method(inventory.compute.into_resources());
    logger.log_compute_grouped(&grouped);

    let priced = price_resources(&grouped.compute_savings_plans, &inventory.offerings)?;
    let result = reconcile_savings_plans(priced, inventory.active);
    logger.log_savings_plans(&result);

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            print_heading("EC2 Instances");
            print_table(&priced_rows(&result.running.ec2));
            print_heading("Auto Scaling Groups");
            print_table(&priced_rows(&result.running.asg));
            print_heading("EKS Nodegroups");
            print_table(&priced_rows(&result.running.eks));

            print_heading("Active Compute Savings Plans");
            let plans: Vec<PlanRow> = result.active.iter().map(PlanRow::from).collect();
            print_table(&plans);

            println!();
            println!("Running:                {}", format_hourly(result.running_total));
            println!("Purchased:              {}", format_hourly(result.held_total));
            print_coverage(result.status, &format_hourly(result.delta.abs()));
        }
    }

    Ok(())
}
