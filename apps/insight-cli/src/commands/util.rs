use anyhow::{Context as _, Result};
use insight_core::{Config, Importer};
use insight_kernel::Store;
use serde::Serialize;
use std::path::PathBuf;

/// Loaded configuration plus command-line overrides shared by every command.
pub struct Context {
    pub config: Config,
    pub state_dir: PathBuf,
}

impl Context {
    pub fn new(config: Config, state_dir: Option<PathBuf>) -> Self {
        let state_dir = state_dir.unwrap_or_else(|| config.state_dir());
        Self { config, state_dir }
    }

    pub fn open_store(&self) -> Result<Store> {
        Store::open(&self.state_dir, self.config.store_options())
            .with_context(|| format!("opening store in {}", self.state_dir.display()))
    }

    pub fn importer(&self) -> Result<Importer> {
        Ok(Importer::new(self.open_store()?))
    }
}

pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting async runtime")
}

pub fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{rendered}");
    Ok(())
}
