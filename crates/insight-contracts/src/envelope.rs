use crate::ContractError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Discriminant carried in the envelope `type` field; selects the payload schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    PlanDaily,
    AdherenceDaily,
}

impl InsightType {
    pub const ALL: [InsightType; 2] = [InsightType::PlanDaily, InsightType::AdherenceDaily];

    pub fn as_str(self) -> &'static str {
        match self {
            InsightType::PlanDaily => "plan_daily",
            InsightType::AdherenceDaily => "adherence_daily",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, ContractError> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == raw)
            .ok_or_else(|| ContractError::UnknownType(raw.to_string()))
    }
}

impl fmt::Display for InsightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The unit of import and storage.
///
/// Fields outside the documented set are kept in `extra` so a stored record
/// round-trips whatever the producer sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub version: String,
    #[serde(rename = "type")]
    pub kind: InsightType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    pub created_at: String,
    pub payload: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Envelope {
    pub fn from_value(value: Value) -> Result<Self, ContractError> {
        Ok(serde_json::from_value(value)?)
    }

    /// `payload.date` when present and a string.
    pub fn payload_date(&self) -> Option<&str> {
        self.payload.get("date").and_then(Value::as_str)
    }

    /// Identity of this envelope in the store: `insight:<payload.date>:<type>`.
    pub fn storage_key(&self) -> String {
        storage_key(self.payload_date().unwrap_or_default(), self.kind)
    }

    /// Typed view of the payload for `plan_daily` envelopes; `None` for other types.
    pub fn plan_daily(&self) -> Result<Option<PlanDailyPayload>, ContractError> {
        match self.kind {
            InsightType::PlanDaily => Ok(Some(serde_json::from_value(self.payload.clone())?)),
            _ => Ok(None),
        }
    }
}

pub fn storage_key(date: &str, kind: InsightType) -> String {
    format!("insight:{date}:{kind}")
}

/// Adherence category reported by the plan engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Band {
    #[serde(rename = "Take it easy")]
    TakeItEasy,
    Maintain,
    #[serde(rename = "Go for it")]
    GoForIt,
}

impl Band {
    pub const ALL: [Band; 3] = [Band::TakeItEasy, Band::Maintain, Band::GoForIt];

    pub fn as_str(self) -> &'static str {
        match self {
            Band::TakeItEasy => "Take it easy",
            Band::Maintain => "Maintain",
            Band::GoForIt => "Go for it",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanKind {
    Easy,
    Maintain,
    Hard,
}

impl PlanKind {
    pub const ALL: [PlanKind; 3] = [PlanKind::Easy, PlanKind::Maintain, PlanKind::Hard];

    pub fn as_str(self) -> &'static str {
        match self {
            PlanKind::Easy => "easy",
            PlanKind::Maintain => "maintain",
            PlanKind::Hard => "hard",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(rename = "type")]
    pub kind: PlanKind,
    pub minutes_range: String,
    pub addons: Vec<String>,
}

/// Payload shape for `plan_daily` envelopes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanDailyPayload {
    pub date: String,
    pub band: Band,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<f64>,
    pub plan: Plan,
    #[serde(default)]
    pub why: Vec<String>,
    pub schema_version: String,
}

/// An envelope as persisted: the envelope fields plus its derived key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub key: String,
    #[serde(flatten)]
    pub envelope: Envelope,
}

impl StoredRecord {
    pub fn new(mut envelope: Envelope) -> Self {
        // The derived key always wins over a producer-supplied `key` field.
        envelope.extra.remove("key");
        Self {
            key: envelope.storage_key(),
            envelope,
        }
    }

    /// Payload date used for ordering; empty when the payload has none.
    pub fn date(&self) -> &str {
        self.envelope.payload_date().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plan_envelope(date: &str) -> Envelope {
        Envelope::from_value(json!({
            "version": "v1",
            "type": "plan_daily",
            "device_id": "demo",
            "created_at": "2024-06-01T07:00:00Z",
            "payload": {
                "date": date,
                "band": "Maintain",
                "score": 65,
                "delta": -4,
                "plan": {"type": "easy", "minutes_range": "30-40", "addons": ["core10", "breath10"]},
                "why": ["sleep −1.2h", "RHR +6"],
                "schema_version": "v1.0.0"
            }
        }))
        .unwrap()
    }

    #[test]
    fn key_is_derived_from_date_and_type() {
        let env = plan_envelope("2024-06-01");
        assert_eq!(env.storage_key(), "insight:2024-06-01:plan_daily");
    }

    #[test]
    fn key_uses_empty_date_when_payload_has_none() {
        let env = Envelope::from_value(json!({
            "version": "v1",
            "type": "adherence_daily",
            "created_at": "T1",
            "payload": {}
        }))
        .unwrap();
        assert_eq!(env.storage_key(), "insight::adherence_daily");
    }

    #[test]
    fn plan_daily_view_decodes_enums() {
        let payload = plan_envelope("2024-06-01").plan_daily().unwrap().unwrap();
        assert_eq!(payload.band, Band::Maintain);
        assert_eq!(payload.plan.kind, PlanKind::Easy);
        assert_eq!(payload.delta, Some(-4.0));
        assert_eq!(payload.why.len(), 2);
    }

    #[test]
    fn stored_record_keeps_unknown_fields_but_not_foreign_key() {
        let mut env = plan_envelope("2024-06-02");
        env.extra.insert("key".into(), json!("bogus"));
        env.extra.insert("source".into(), json!("qr"));
        let record = StoredRecord::new(env);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["key"], "insight:2024-06-02:plan_daily");
        assert_eq!(value["source"], "qr");
        assert_eq!(value["type"], "plan_daily");

        let back: StoredRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn parse_rejects_unknown_type() {
        assert_eq!(InsightType::parse("plan_daily").unwrap(), InsightType::PlanDaily);
        let err = InsightType::parse("weekly").unwrap_err();
        assert!(matches!(err, ContractError::UnknownType(_)));
    }
}
