//! Projection of stored records into the chronological history view.

use insight_contracts::StoredRecord;
use serde::Serialize;
use serde_json::{Number, Value};
use std::fmt;

const MAX_ADDONS: usize = 2;
const MAX_REASONS: usize = 2;

/// One display row of the history list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRow {
    pub key: String,
    /// Payload date, empty when the payload carried none.
    pub date: String,
    pub kind: String,
    /// `<band> · <score>`
    pub summary: String,
    /// `<type> <minutes_range> + <addon> + <addon>`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    pub reasons: Vec<String>,
}

/// Sort ascending by payload date (stable, missing dates first) and project.
pub fn render(records: &[StoredRecord]) -> Vec<HistoryRow> {
    let mut ordered: Vec<&StoredRecord> = records.iter().collect();
    ordered.sort_by(|a, b| a.date().cmp(b.date()));
    ordered.into_iter().map(project).collect()
}

fn project(record: &StoredRecord) -> HistoryRow {
    let payload = &record.envelope.payload;
    let band = payload.get("band").and_then(Value::as_str).unwrap_or_default();
    let score = match payload.get("score") {
        Some(Value::Number(n)) => format_number(n),
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    };
    HistoryRow {
        key: record.key.clone(),
        date: record.date().to_string(),
        kind: record.envelope.kind.as_str().to_string(),
        summary: format!("{band} · {score}"),
        plan: payload.get("plan").and_then(plan_summary),
        reasons: strings(payload.get("why"))
            .into_iter()
            .take(MAX_REASONS)
            .collect(),
    }
}

fn plan_summary(plan: &Value) -> Option<String> {
    let plan = plan.as_object()?;
    let kind = plan.get("type").and_then(Value::as_str).unwrap_or_default();
    let minutes = plan
        .get("minutes_range")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let addons: Vec<String> = strings(plan.get("addons"))
        .into_iter()
        .take(MAX_ADDONS)
        .collect();
    let mut out = format!("{kind} {minutes}");
    if !addons.is_empty() {
        out.push_str(" + ");
        out.push_str(&addons.join(" + "));
    }
    Some(out)
}

fn strings(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn format_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 => format!("{f:.0}"),
        _ => n.to_string(),
    }
}

impl fmt::Display for HistoryRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let date = if self.date.is_empty() { "—" } else { self.date.as_str() };
        writeln!(f, "{date}  [{}]", self.kind)?;
        writeln!(f, "  {}", self.summary)?;
        if let Some(plan) = &self.plan {
            writeln!(f, "  {plan}")?;
        }
        if !self.reasons.is_empty() {
            writeln!(f, "  {}", self.reasons.join(", "))?;
        }
        Ok(())
    }
}

/// Plain-text rendering of a whole history list.
pub fn render_text(rows: &[HistoryRow]) -> String {
    if rows.is_empty() {
        return "No insights stored.\n".to_string();
    }
    rows.iter().map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use insight_contracts::Envelope;
    use serde_json::json;

    fn record(payload: Value) -> StoredRecord {
        StoredRecord::new(
            Envelope::from_value(json!({
                "version": "v1",
                "type": "plan_daily",
                "created_at": "T1",
                "payload": payload
            }))
            .unwrap(),
        )
    }

    #[test]
    fn sorts_by_date_with_missing_first() {
        let rows = render(&[
            record(json!({"date": "2024-06-02"})),
            record(json!({"date": "2024-06-01"})),
            record(json!({})),
        ]);
        let dates: Vec<&str> = rows.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, vec!["", "2024-06-01", "2024-06-02"]);
    }

    #[test]
    fn sort_is_stable_for_equal_dates() {
        let mut first = record(json!({"date": "2024-06-01", "score": 1}));
        first.key = "a".into();
        let mut second = record(json!({"date": "2024-06-01", "score": 2}));
        second.key = "b".into();
        let rows = render(&[first, second]);
        assert_eq!(rows[0].key, "a");
        assert_eq!(rows[1].key, "b");
    }

    #[test]
    fn projects_summary_plan_and_reasons() {
        let rows = render(&[record(json!({
            "date": "2024-06-01",
            "band": "Maintain",
            "score": 65,
            "plan": {"type": "easy", "minutes_range": "30-40", "addons": ["core10", "breath10", "walk"]},
            "why": ["sleep −1.2h", "RHR +6", "extra"]
        }))]);
        let row = &rows[0];
        assert_eq!(row.kind, "plan_daily");
        assert_eq!(row.summary, "Maintain · 65");
        assert_eq!(row.plan.as_deref(), Some("easy 30-40 + core10 + breath10"));
        assert_eq!(row.reasons, vec!["sleep −1.2h", "RHR +6"]);
    }

    #[test]
    fn tolerates_sparse_payloads() {
        let rows = render(&[record(json!({"score": 72.0}))]);
        let row = &rows[0];
        assert_eq!(row.summary, " · 72");
        assert!(row.plan.is_none());
        assert!(row.reasons.is_empty());
        assert!(row.to_string().starts_with("—  [plan_daily]"));
    }

    #[test]
    fn text_rendering_of_empty_history() {
        assert_eq!(render_text(&[]), "No insights stored.\n");
    }
}
