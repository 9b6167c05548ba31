use crate::envelope::{Band, InsightType, PlanKind};
use crate::schema::SchemaNode;
use crate::SUPPORTED_VERSION;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Envelope schema: `{version, type, device_id?, created_at, payload}`.
pub static ENVELOPE_SCHEMA: Lazy<SchemaNode> = Lazy::new(|| {
    SchemaNode::object()
        .require(["version", "type", "payload", "created_at"])
        .property("version", SchemaNode::string().one_of([SUPPORTED_VERSION]))
        .property(
            "type",
            SchemaNode::string().one_of(InsightType::ALL.map(InsightType::as_str)),
        )
        .property("device_id", SchemaNode::string())
        .property("created_at", SchemaNode::string())
        .property("payload", SchemaNode::object())
});

/// Payload schema for `plan_daily` envelopes.
pub static PLAN_DAILY_SCHEMA: Lazy<SchemaNode> = Lazy::new(|| {
    SchemaNode::object()
        .require(["date", "band", "score", "plan", "schema_version"])
        .property("date", SchemaNode::string())
        .property("band", SchemaNode::string().one_of(Band::ALL.map(Band::as_str)))
        .property("score", SchemaNode::number())
        .property("delta", SchemaNode::number())
        .property(
            "plan",
            SchemaNode::object()
                .require(["type", "minutes_range", "addons"])
                .property(
                    "type",
                    SchemaNode::string().one_of(PlanKind::ALL.map(PlanKind::as_str)),
                )
                .property("minutes_range", SchemaNode::string())
                .property("addons", SchemaNode::array_of(SchemaNode::string())),
        )
        .property(
            "why",
            SchemaNode::array_of(SchemaNode::string()).max_items(2),
        )
        .property("schema_version", SchemaNode::string())
});

/// Envelope schema plus the `type -> payload schema` dispatch table.
///
/// Types without an entry are accepted on envelope validation alone.
#[derive(Debug, Clone)]
pub struct Registry {
    envelope: SchemaNode,
    payloads: BTreeMap<InsightType, SchemaNode>,
}

impl Registry {
    pub fn builtin() -> Self {
        Self::new(ENVELOPE_SCHEMA.clone())
            .with_payload(InsightType::PlanDaily, PLAN_DAILY_SCHEMA.clone())
    }

    pub fn new(envelope: SchemaNode) -> Self {
        Self {
            envelope,
            payloads: BTreeMap::new(),
        }
    }

    pub fn with_payload(mut self, kind: InsightType, schema: SchemaNode) -> Self {
        self.payloads.insert(kind, schema);
        self
    }

    pub fn envelope(&self) -> &SchemaNode {
        &self.envelope
    }

    pub fn payload(&self, kind: InsightType) -> Option<&SchemaNode> {
        self.payloads.get(&kind)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate;
    use serde_json::json;

    #[test]
    fn envelope_schema_constrains_version_and_type() {
        let result = validate(
            &json!({"version": "v2", "type": "weekly", "created_at": "x", "payload": {}}),
            &ENVELOPE_SCHEMA,
        );
        assert_eq!(
            result.errors,
            vec![
                "version: not in enum [v1]".to_string(),
                "type: not in enum [plan_daily, adherence_daily]".to_string(),
            ]
        );
    }

    #[test]
    fn builtin_dispatches_plan_daily_only() {
        let registry = Registry::builtin();
        assert!(registry.payload(InsightType::PlanDaily).is_some());
        assert!(registry.payload(InsightType::AdherenceDaily).is_none());
    }

    #[test]
    fn plan_schema_lists_band_and_plan_enums() {
        let doc = PLAN_DAILY_SCHEMA.to_json();
        assert_eq!(
            doc["properties"]["band"]["enum"],
            json!(["Take it easy", "Maintain", "Go for it"])
        );
        assert_eq!(
            doc["properties"]["plan"]["properties"]["type"]["enum"],
            json!(["easy", "maintain", "hard"])
        );
        assert_eq!(doc["properties"]["why"]["maxItems"], json!(2));
    }
}
