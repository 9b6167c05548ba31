use insight_contracts::{validate, validate_at, Envelope, StoredRecord, ENVELOPE_SCHEMA, PLAN_DAILY_SCHEMA};
use serde_json::{json, Value};

fn packet() -> Value {
    json!({
        "version": "v1",
        "type": "plan_daily",
        "created_at": "T1",
        "payload": {
            "date": "2024-06-01",
            "band": "Maintain",
            "score": 65,
            "delta": -4,
            "plan": {"type": "easy", "minutes_range": "30-40", "addons": ["core10", "breath10"]},
            "why": ["sleep −1.2h", "RHR +6"],
            "schema_version": "v1.0.0"
        }
    })
}

#[test]
fn reference_packet_passes_both_schemas() {
    let packet = packet();
    assert!(validate(&packet, &ENVELOPE_SCHEMA).valid);
    assert!(validate(&packet["payload"], &PLAN_DAILY_SCHEMA).valid);

    let record = StoredRecord::new(Envelope::from_value(packet).unwrap());
    assert_eq!(record.key, "insight:2024-06-01:plan_daily");
}

#[test]
fn missing_band_is_named_with_payload_path() {
    let mut packet = packet();
    packet["payload"].as_object_mut().unwrap().remove("band");
    let result = validate_at(&packet["payload"], &PLAN_DAILY_SCHEMA, "payload");
    assert_eq!(
        result.errors,
        vec!["payload.band: missing required property 'band'".to_string()]
    );
}

#[test]
fn reports_independent_violations_together() {
    let mut packet = packet();
    let payload = packet["payload"].as_object_mut().unwrap();
    payload.remove("score");
    payload.insert("why".into(), json!(["a", "b", "c"]));
    payload.insert("plan".into(), json!({"type": "brutal", "minutes_range": 30, "addons": []}));

    let result = validate_at(&packet["payload"], &PLAN_DAILY_SCHEMA, "payload");
    assert_eq!(
        result.errors,
        vec![
            "payload.score: missing required property 'score'".to_string(),
            "payload.plan.type: not in enum [easy, maintain, hard]".to_string(),
            "payload.plan.minutes_range: expected type string, got number".to_string(),
            "payload.why: has 3 items, exceeds maxItems 2".to_string(),
        ]
    );
}

#[test]
fn extra_keys_are_permitted() {
    let mut packet = packet();
    packet["payload"]["mood"] = json!("sunny");
    packet["source"] = json!("qr");
    assert!(validate(&packet, &ENVELOPE_SCHEMA).valid);
    assert!(validate(&packet["payload"], &PLAN_DAILY_SCHEMA).valid);
}

#[test]
fn payload_must_be_an_object() {
    let mut packet = packet();
    packet["payload"] = json!([1, 2]);
    assert_eq!(
        validate(&packet, &ENVELOPE_SCHEMA).errors,
        vec!["payload: expected type object, got array".to_string()]
    );
}
