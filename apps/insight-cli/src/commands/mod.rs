pub mod config;
pub mod history;
pub mod import;
pub mod paths;
pub mod sample;
pub mod scan;
pub mod schema;
pub mod serve;
pub mod util;

pub use config::ConfigCmd;
pub use history::{HistoryArgs, ListArgs};
pub use import::ImportArgs;
pub use paths::PathsArgs;
pub use sample::SampleArgs;
pub use scan::ScanArgs;
pub use schema::SchemaArgs;
pub use serve::ServeArgs;
