use super::util::{runtime, Context};
use anyhow::{Context as _, Result};
use clap::Args;
use std::io::Read as _;
use std::path::PathBuf;

#[derive(Args)]
pub struct ImportArgs {
    /// Read the packet from a file
    #[arg(long, conflicts_with = "text")]
    pub file: Option<PathBuf>,
    /// Packet JSON given inline
    #[arg(long)]
    pub text: Option<String>,
}

pub fn run(ctx: &Context, args: ImportArgs) -> Result<()> {
    let raw = match (args.file, args.text) {
        (Some(path), _) => std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?,
        (None, Some(text)) => text,
        (None, None) => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading packet from stdin")?;
            buf
        }
    };
    let importer = ctx.importer()?;
    let imported = runtime()?.block_on(importer.import_text(&raw))?;
    if imported.written {
        println!("Imported {}", imported.key);
    } else {
        println!("Imported {} (a newer record was already stored)", imported.key);
    }
    Ok(())
}
