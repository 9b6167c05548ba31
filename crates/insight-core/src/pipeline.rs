use insight_contracts::{
    validate, validate_at, ContractError, Envelope, InsightType, Registry, SUPPORTED_VERSION,
};
use insight_kernel::{Store, StoreError};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(thiserror::Error, Debug)]
pub enum ImportError {
    /// Malformed JSON; the parser message is surfaced verbatim.
    #[error("{0}")]
    Parse(String),
    #[error("{label} invalid: {}", first_error(.errors))]
    Validation {
        label: &'static str,
        errors: Vec<String>,
    },
    #[error("Unsupported version '{0}'")]
    UnsupportedVersion(String),
    #[error(transparent)]
    Contract(#[from] ContractError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn first_error(errors: &[String]) -> &str {
    errors.first().map(String::as_str).unwrap_or("no details")
}

/// Result of a successful import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Imported {
    pub key: String,
    pub kind: InsightType,
    /// False when the store already held a newer record for this key.
    pub written: bool,
}

fn payload_label(kind: InsightType) -> &'static str {
    match kind {
        InsightType::PlanDaily => "Plan payload",
        InsightType::AdherenceDaily => "Adherence payload",
    }
}

/// Parse, validate and upsert raw packet text. Nothing reaches the store
/// unless every check passes.
#[derive(Clone)]
pub struct Importer {
    store: Store,
    registry: Arc<Registry>,
}

impl Importer {
    pub fn new(store: Store) -> Self {
        Self::with_registry(store, Registry::builtin())
    }

    pub fn with_registry(store: Store, registry: Registry) -> Self {
        Self {
            store,
            registry: Arc::new(registry),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Run every check without touching the store.
    pub fn check(&self, raw: &str) -> Result<Envelope, ImportError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| ImportError::Parse(e.to_string()))?;

        let envelope_check = validate(&value, self.registry.envelope());
        if !envelope_check.valid {
            return Err(ImportError::Validation {
                label: "Envelope",
                errors: envelope_check.errors,
            });
        }

        let version = value.get("version").and_then(Value::as_str).unwrap_or_default();
        if version != SUPPORTED_VERSION {
            return Err(ImportError::UnsupportedVersion(version.to_string()));
        }

        let envelope = Envelope::from_value(value)?;
        if let Some(schema) = self.registry.payload(envelope.kind) {
            let payload_check = validate_at(&envelope.payload, schema, "payload");
            if !payload_check.valid {
                return Err(ImportError::Validation {
                    label: payload_label(envelope.kind),
                    errors: payload_check.errors,
                });
            }
        }
        Ok(envelope)
    }

    pub async fn import_text(&self, raw: &str) -> Result<Imported, ImportError> {
        let envelope = match self.check(raw) {
            Ok(envelope) => envelope,
            Err(err) => {
                debug!(target: "insight::import", error = %err, "packet rejected");
                return Err(err);
            }
        };
        let outcome = self.store.upsert_async(&envelope).await?;
        info!(
            target: "insight::import",
            key = %outcome.key,
            kind = %envelope.kind,
            written = outcome.written,
            "packet imported"
        );
        Ok(Imported {
            key: outcome.key,
            kind: envelope.kind,
            written: outcome.written,
        })
    }
}
