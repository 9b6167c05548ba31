use serde_json::{json, Map, Value};
use std::fmt;

/// Runtime kind of a JSON value as seen by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Boolean,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `type` keyword of a schema node, with the constraints that only make
/// sense for that kind.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Object {
        required: Vec<String>,
        properties: Vec<(String, SchemaNode)>,
    },
    Array {
        items: Option<Box<SchemaNode>>,
        max_items: Option<usize>,
    },
    String,
    Number,
    Boolean,
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        self.value_kind().as_str()
    }

    pub fn value_kind(&self) -> ValueKind {
        match self {
            NodeKind::Object { .. } => ValueKind::Object,
            NodeKind::Array { .. } => ValueKind::Array,
            NodeKind::String => ValueKind::String,
            NodeKind::Number => ValueKind::Number,
            NodeKind::Boolean => ValueKind::Boolean,
        }
    }
}

/// One node of a declarative schema.
///
/// `kind: None` accepts any value and only applies `allowed`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaNode {
    pub kind: Option<NodeKind>,
    pub allowed: Option<Vec<Value>>,
}

impl SchemaNode {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn string() -> Self {
        Self::of(NodeKind::String)
    }

    pub fn number() -> Self {
        Self::of(NodeKind::Number)
    }

    pub fn boolean() -> Self {
        Self::of(NodeKind::Boolean)
    }

    pub fn object() -> Self {
        Self::of(NodeKind::Object {
            required: Vec::new(),
            properties: Vec::new(),
        })
    }

    pub fn array() -> Self {
        Self::of(NodeKind::Array {
            items: None,
            max_items: None,
        })
    }

    pub fn array_of(items: SchemaNode) -> Self {
        Self::array().items(items)
    }

    fn of(kind: NodeKind) -> Self {
        Self {
            kind: Some(kind),
            allowed: None,
        }
    }

    /// Restrict the node to the given literal values.
    pub fn one_of<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.allowed = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Add required keys. No-op on non-object nodes.
    pub fn require<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(NodeKind::Object { required, .. }) = self.kind.as_mut() {
            required.extend(keys.into_iter().map(Into::into));
        }
        self
    }

    /// Declare a property. No-op on non-object nodes.
    pub fn property(mut self, name: impl Into<String>, node: SchemaNode) -> Self {
        if let Some(NodeKind::Object { properties, .. }) = self.kind.as_mut() {
            properties.push((name.into(), node));
        }
        self
    }

    /// Set the element schema. No-op on non-array nodes.
    pub fn items(mut self, node: SchemaNode) -> Self {
        if let Some(NodeKind::Array { items, .. }) = self.kind.as_mut() {
            *items = Some(Box::new(node));
        }
        self
    }

    /// Bound the element count. No-op on non-array nodes.
    pub fn max_items(mut self, bound: usize) -> Self {
        if let Some(NodeKind::Array { max_items, .. }) = self.kind.as_mut() {
            *max_items = Some(bound);
        }
        self
    }

    /// Declarative JSON form of this node, using the keyword vocabulary
    /// (`type`, `enum`, `required`, `properties`, `items`, `maxItems`).
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        if let Some(kind) = &self.kind {
            out.insert("type".into(), json!(kind.name()));
        }
        if let Some(allowed) = &self.allowed {
            out.insert("enum".into(), Value::Array(allowed.clone()));
        }
        match &self.kind {
            Some(NodeKind::Object {
                required,
                properties,
            }) => {
                if !required.is_empty() {
                    out.insert("required".into(), json!(required));
                }
                if !properties.is_empty() {
                    let props: Map<String, Value> = properties
                        .iter()
                        .map(|(name, node)| (name.clone(), node.to_json()))
                        .collect();
                    out.insert("properties".into(), Value::Object(props));
                }
            }
            Some(NodeKind::Array { items, max_items }) => {
                if let Some(items) = items {
                    out.insert("items".into(), items.to_json());
                }
                if let Some(bound) = max_items {
                    out.insert("maxItems".into(), json!(bound));
                }
            }
            _ => {}
        }
        Value::Object(out)
    }
}
