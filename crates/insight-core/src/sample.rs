//! Demo packet used to pre-fill an empty import surface.

use chrono::{DateTime, SecondsFormat, Utc};
use insight_contracts::{
    Band, ContractError, Envelope, InsightType, Plan, PlanDailyPayload, PlanKind,
    SUPPORTED_VERSION,
};
use serde_json::Map;

/// A valid `plan_daily` envelope dated `now`.
pub fn sample_envelope(now: DateTime<Utc>) -> Result<Envelope, ContractError> {
    let payload = PlanDailyPayload {
        date: now.format("%Y-%m-%d").to_string(),
        band: Band::Maintain,
        score: 65.0,
        delta: Some(-4.0),
        plan: Plan {
            kind: PlanKind::Easy,
            minutes_range: "30-40".into(),
            addons: vec!["core10".into(), "breath10".into()],
        },
        why: vec!["sleep −1.2h".into(), "RHR +6".into()],
        schema_version: "v1.0.0".into(),
    };
    Ok(Envelope {
        version: SUPPORTED_VERSION.into(),
        kind: InsightType::PlanDaily,
        device_id: Some("demo".into()),
        created_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        payload: serde_json::to_value(payload)?,
        extra: Map::new(),
    })
}

/// Pretty-printed sample, as it would appear in a paste box.
pub fn sample_text(now: DateTime<Utc>) -> Result<String, ContractError> {
    Ok(serde_json::to_string_pretty(&sample_envelope(now)?)?)
}
