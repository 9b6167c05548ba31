use anyhow::Result;
use chrono::Utc;
use clap::Args;
use insight_core::sample::{sample_envelope, sample_text};

#[derive(Args)]
pub struct SampleArgs {
    /// Emit compact single-line JSON (suitable for QR encoders)
    #[arg(long)]
    pub compact: bool,
}

pub fn run(args: SampleArgs) -> Result<()> {
    let now = Utc::now();
    if args.compact {
        println!("{}", serde_json::to_string(&sample_envelope(now)?)?);
    } else {
        println!("{}", sample_text(now)?);
    }
    Ok(())
}
