use crate::schema::{NodeKind, SchemaNode, ValueKind};
use serde::Serialize;
use serde_json::Value;

/// Outcome of checking one value against one schema node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl Validation {
    pub fn first_error(&self) -> Option<&str> {
        self.errors.first().map(String::as_str)
    }
}

/// Check `value` against `schema`, collecting every violation.
pub fn validate(value: &Value, schema: &SchemaNode) -> Validation {
    validate_at(value, schema, "")
}

/// Like [`validate`], with error paths prefixed by `base` (e.g. `payload`).
pub fn validate_at(value: &Value, schema: &SchemaNode, base: &str) -> Validation {
    let mut errors = Vec::new();
    check_node(value, schema, base, &mut errors);
    Validation {
        valid: errors.is_empty(),
        errors,
    }
}

fn label<'a>(path: &'a str, fallback: &'a str) -> &'a str {
    if path.is_empty() {
        fallback
    } else {
        path
    }
}

fn child_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn check_node(value: &Value, schema: &SchemaNode, path: &str, errors: &mut Vec<String>) {
    if let Some(kind) = &schema.kind {
        let actual = ValueKind::of(value);
        if actual != kind.value_kind() {
            errors.push(format!(
                "{}: expected type {}, got {}",
                label(path, "value"),
                kind.name(),
                actual
            ));
            return;
        }
    }

    if let Some(allowed) = &schema.allowed {
        if !allowed.iter().any(|candidate| strict_eq(candidate, value)) {
            let listed: Vec<String> = allowed.iter().map(display_literal).collect();
            errors.push(format!(
                "{}: not in enum [{}]",
                label(path, "value"),
                listed.join(", ")
            ));
        }
    }

    match (&schema.kind, value) {
        (
            Some(NodeKind::Object {
                required,
                properties,
            }),
            Value::Object(map),
        ) => {
            for key in required {
                if !map.contains_key(key) {
                    errors.push(format!(
                        "{}: missing required property '{}'",
                        child_path(path, key),
                        key
                    ));
                }
            }
            for (key, node) in properties {
                if let Some(child) = map.get(key) {
                    check_node(child, node, &child_path(path, key), errors);
                }
            }
        }
        (Some(NodeKind::Array { items, max_items }), Value::Array(elements)) => {
            if let Some(bound) = max_items {
                if elements.len() > *bound {
                    errors.push(format!(
                        "{}: has {} items, exceeds maxItems {}",
                        label(path, "array"),
                        elements.len(),
                        bound
                    ));
                }
            }
            if let Some(node) = items {
                let base = label(path, "array");
                for (idx, element) in elements.iter().enumerate() {
                    check_node(element, node, &format!("{base}[{idx}]"), errors);
                }
            }
        }
        _ => {}
    }
}

/// JSON equality where numbers compare by value, so `65` matches `65.0`.
fn strict_eq(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        },
        _ => expected == actual,
    }
}

fn display_literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_schema() -> SchemaNode {
        SchemaNode::object()
            .require(["name", "tags", "level"])
            .property("name", SchemaNode::string())
            .property("level", SchemaNode::number().one_of([1, 2, 3]))
            .property(
                "tags",
                SchemaNode::array_of(SchemaNode::string()).max_items(2),
            )
            .property(
                "nested",
                SchemaNode::object()
                    .require(["on"])
                    .property("on", SchemaNode::boolean()),
            )
    }

    #[test]
    fn valid_document_has_no_errors() {
        let result = validate(
            &json!({"name": "a", "level": 2, "tags": ["x"], "extra": true}),
            &sample_schema(),
        );
        assert!(result.valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn collects_every_violation_in_preorder() {
        let result = validate(
            &json!({"name": 5, "level": 7, "tags": ["x", 1, "z"], "nested": {}}),
            &sample_schema(),
        );
        assert!(!result.valid);
        assert_eq!(
            result.errors,
            vec![
                "name: expected type string, got number".to_string(),
                "level: not in enum [1, 2, 3]".to_string(),
                "tags: has 3 items, exceeds maxItems 2".to_string(),
                "tags[1]: expected type string, got number".to_string(),
                "nested.on: missing required property 'on'".to_string(),
            ]
        );
    }

    #[test]
    fn missing_required_key_reported_once_alongside_other_errors() {
        let result = validate(&json!({"name": [], "tags": []}), &sample_schema());
        let missing: Vec<_> = result
            .errors
            .iter()
            .filter(|e| e.contains("missing required property 'level'"))
            .collect();
        assert_eq!(missing.len(), 1);
        assert!(result
            .errors
            .contains(&"name: expected type string, got array".to_string()));
    }

    #[test]
    fn type_mismatch_skips_only_that_node() {
        let schema = SchemaNode::object()
            .property("a", SchemaNode::array_of(SchemaNode::number()).max_items(0))
            .property("b", SchemaNode::string().one_of(["ok"]));
        let result = validate(&json!({"a": {"0": "x"}, "b": "nope"}), &schema);
        assert_eq!(
            result.errors,
            vec![
                "a: expected type array, got object".to_string(),
                "b: not in enum [ok]".to_string(),
            ]
        );
    }

    #[test]
    fn root_errors_use_fallback_labels() {
        assert_eq!(
            validate(&json!([1]), &SchemaNode::object()).errors,
            vec!["value: expected type object, got array".to_string()]
        );
        assert_eq!(
            validate(&json!([1, 2]), &SchemaNode::array_of(SchemaNode::string()).max_items(1))
                .errors,
            vec![
                "array: has 2 items, exceeds maxItems 1".to_string(),
                "array[0]: expected type string, got number".to_string(),
                "array[1]: expected type string, got number".to_string(),
            ]
        );
        assert_eq!(
            validate(&json!({}), &SchemaNode::object().require(["k"])).errors,
            vec!["k: missing required property 'k'".to_string()]
        );
    }

    #[test]
    fn null_is_not_an_object() {
        let result = validate(&Value::Null, &SchemaNode::object().require(["a"]));
        assert_eq!(result.errors, vec!["value: expected type object, got null".to_string()]);
    }

    #[test]
    fn untyped_node_applies_enum_only() {
        let schema = SchemaNode::any().one_of([json!(true), json!("yes")]);
        assert!(validate(&json!("yes"), &schema).valid);
        assert!(!validate(&json!(1), &schema).valid);
    }

    #[test]
    fn numeric_enum_compares_by_value() {
        let schema = SchemaNode::number().one_of([65]);
        assert!(validate(&json!(65.0), &schema).valid);
    }

    #[test]
    fn base_path_prefixes_messages() {
        let result = validate_at(&json!({}), &SchemaNode::object().require(["band"]), "payload");
        assert_eq!(
            result.first_error(),
            Some("payload.band: missing required property 'band'")
        );
    }

    #[test]
    fn deterministic_and_non_mutating() {
        let data = json!({"name": 1, "tags": "x"});
        let snapshot = data.clone();
        let first = validate(&data, &sample_schema());
        let second = validate(&data, &sample_schema());
        assert_eq!(first, second);
        assert_eq!(data, snapshot);
    }
}
