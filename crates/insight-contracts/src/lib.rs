//! Wire contracts for insight packets.
//!
//! An insight packet is a small versioned JSON envelope carrying a typed payload
//! (`plan_daily`, `adherence_daily`). This crate owns the envelope types, the
//! declarative schema subset used to describe them, the built-in schema
//! registry, and the validator that checks arbitrary JSON against a schema node.

mod envelope;
mod registry;
mod schema;
mod validator;

pub use envelope::*;
pub use registry::*;
pub use schema::*;
pub use validator::*;

/// Protocol version accepted by this build.
pub const SUPPORTED_VERSION: &str = "v1";

/// Shared error type for contract decoding routines.
#[derive(thiserror::Error, Debug)]
pub enum ContractError {
    #[error("unknown insight type '{0}'")]
    UnknownType(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
