use super::util::{print_json, Context};
use anyhow::Result;
use clap::Args;
use insight_core::effective_paths;

#[derive(Args)]
pub struct PathsArgs {
    /// Pretty-print JSON
    #[arg(long)]
    pub pretty: bool,
}

pub fn run(ctx: &Context, args: PathsArgs) -> Result<()> {
    let v = effective_paths(&ctx.config, Some(&ctx.state_dir));
    print_json(&v, args.pretty)
}
