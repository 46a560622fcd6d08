//! Report commands

pub mod ec2;
pub mod rds;
pub mod savings_plans;
