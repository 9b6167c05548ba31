//! Import pipeline and application surface for insight packets.
//!
//! Raw text goes through [`pipeline::Importer`] (parse, envelope schema,
//! version, payload schema) before it reaches the store; [`history`] projects
//! stored records for display and [`capture`] polls a camera for QR codes.

pub mod app;
pub mod capture;
pub mod config;
pub mod history;
pub mod paths;
pub mod pipeline;
pub mod sample;
pub mod status;
pub mod util;

pub use app::{App, Command};
pub use capture::{
    BarcodeDecoder, Camera, CaptureError, Frame, FrameSource, Handoff, ScanEnd, Scanner,
    ScannerState,
};
pub use config::{config_schema_json, discover_config, load_config, Config};
pub use history::{render, render_text, HistoryRow};
pub use paths::effective_paths;
pub use pipeline::{ImportError, Imported, Importer};
pub use status::{Status, StatusLevel};
