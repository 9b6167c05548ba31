use super::util::print_json;
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Print the config file JSON schema
    Schema(ConfigSchemaArgs),
}

#[derive(Args)]
pub struct ConfigSchemaArgs {
    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

pub fn execute(cmd: ConfigCmd) -> Result<()> {
    match cmd {
        ConfigCmd::Schema(args) => print_json(&insight_core::config_schema_json(), args.pretty),
    }
}
