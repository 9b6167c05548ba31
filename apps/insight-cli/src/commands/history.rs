use super::util::{print_json, Context};
use anyhow::Result;
use clap::Args;
use insight_core::{render, render_text};

#[derive(Args)]
pub struct HistoryArgs {
    /// Earliest payload date to include (YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub from: Option<String>,
    /// Latest payload date to include (YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub to: Option<String>,
    /// Emit JSON rows instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ListArgs {
    /// Pretty-print JSON
    #[arg(long)]
    pub pretty: bool,
}

pub fn run(ctx: &Context, args: HistoryArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let records = if args.from.is_some() || args.to.is_some() {
        let from = args.from.as_deref().unwrap_or("");
        let to = args.to.as_deref().unwrap_or("9999-12-31");
        store.list_between(from, to)?
    } else {
        store.list_all()?
    };
    let rows = render(&records);
    if args.json {
        return print_json(&rows, true);
    }
    print!("{}", render_text(&rows));
    Ok(())
}

pub fn list(ctx: &Context, args: ListArgs) -> Result<()> {
    let records = ctx.open_store()?.list_all()?;
    print_json(&records, args.pretty)
}

pub fn clear(ctx: &Context) -> Result<()> {
    let removed = ctx.open_store()?.clear_all()?;
    println!("Cleared local data ({removed} removed)");
    Ok(())
}
