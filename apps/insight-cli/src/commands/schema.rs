use super::util::print_json;
use anyhow::Result;
use clap::{Args, ValueEnum};
use insight_contracts::{ENVELOPE_SCHEMA, PLAN_DAILY_SCHEMA};

#[derive(Clone, Copy, ValueEnum)]
pub enum SchemaName {
    Envelope,
    #[value(name = "plan_daily")]
    PlanDaily,
}

#[derive(Args)]
pub struct SchemaArgs {
    /// Which schema to print
    #[arg(value_enum)]
    pub name: SchemaName,
    /// Emit compact JSON
    #[arg(long)]
    pub compact: bool,
}

pub fn run(args: SchemaArgs) -> Result<()> {
    let schema = match args.name {
        SchemaName::Envelope => &*ENVELOPE_SCHEMA,
        SchemaName::PlanDaily => &*PLAN_DAILY_SCHEMA,
    };
    print_json(&schema.to_json(), !args.compact)
}
