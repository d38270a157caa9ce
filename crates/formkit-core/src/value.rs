#![forbid(unsafe_code)]

//! Dynamic values stored in model node property fields.
//!
//! A [`Value`] is the closed set of shapes a property field can hold: scalars,
//! lists, composite records, and the [`Binding`] wrapper used by properties that
//! can carry either a literal or a runtime expression.
//!
//! "Undefined" is not a value: an unset field is simply absent from the node,
//! and APIs model it as `Option<&Value>`.
//!
//! # Example
//! ```
//! use formkit_core::value::{Binding, Value};
//!
//! let label = Value::Binding(Binding::literal("Name"));
//! assert_eq!(label.field("kind"), Some(Value::from("value")));
//!
//! let font = Value::record([("size", Value::from(12)), ("weight", Value::from("bold"))]);
//! assert_eq!(font.to_markup(), r#"{"size":12,"weight":"bold"}"#);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

/// Discriminates the two states of a binding-capable slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// The slot holds a literal value.
    Value,
    /// The slot holds an expression evaluated by the rendering host.
    Binding,
}

impl BindingKind {
    /// Wire name used in persisted documents.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::Binding => "binding",
        }
    }

    /// Parse a wire name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "value" => Some(Self::Value),
            "binding" => Some(Self::Binding),
            _ => None,
        }
    }
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `{kind, value}` record stored by binding-capable properties.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub kind: BindingKind,
    pub value: Box<Value>,
}

impl Binding {
    /// A binding slot holding a literal value.
    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        Self {
            kind: BindingKind::Value,
            value: Box::new(value.into()),
        }
    }

    /// A binding slot holding an expression such as `user.name`.
    #[must_use]
    pub fn expression(expression: impl Into<String>) -> Self {
        Self {
            kind: BindingKind::Binding,
            value: Box::new(Value::String(expression.into())),
        }
    }

    /// Whether this slot holds an expression.
    #[must_use]
    pub fn is_expression(&self) -> bool {
        self.kind == BindingKind::Binding
    }

    /// The wrapped literal or expression.
    #[must_use]
    pub fn inner(&self) -> &Value {
        &self.value
    }
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// A property field value.
///
/// Equality is structural. Floating point `NaN` is never equal to itself
/// under `==`; [`crate::compare::deep_compare`] treats two `NaN`s as equal.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
    Record(BTreeMap<String, Value>),
    Binding(Binding),
}

impl Value {
    /// Build a record from `(name, value)` pairs.
    #[must_use]
    pub fn record<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// An empty record.
    #[must_use]
    pub fn empty_record() -> Self {
        Self::Record(BTreeMap::new())
    }

    /// The `typeof`-style name of this value's shape.
    ///
    /// `Null`, lists, records and bindings all report `"object"`.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Null | Self::List(_) | Self::Record(_) | Self::Binding(_) => "object",
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// `Null` or the empty string; such values render as nothing.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) => s.is_empty(),
            _ => false,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_record(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Record(fields) => Some(fields),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_binding(&self) -> Option<&Binding> {
        match self {
            Self::Binding(b) => Some(b),
            _ => None,
        }
    }

    /// Read a named sub-field.
    ///
    /// Records expose their fields; bindings expose `kind` and `value`.
    /// Every other shape has no sub-fields.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<Value> {
        match self {
            Self::Record(fields) => fields.get(name).cloned(),
            Self::Binding(b) => match name {
                "kind" => Some(Value::String(b.kind.as_str().to_string())),
                "value" => Some((*b.value).clone()),
                _ => None,
            },
            _ => None,
        }
    }

    /// String form used when a value is spliced into markup.
    #[must_use]
    pub fn to_markup(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => format_number(*n),
            Self::String(s) => s.clone(),
            Self::List(items) => items
                .iter()
                .map(Value::to_markup)
                .collect::<Vec<_>>()
                .join(","),
            Self::Record(_) | Self::Binding(_) => serde_json::Value::from(self.clone()).to_string(),
        }
    }
}

/// Shortest script-style number formatting: `2`, `2.5`, `NaN`, `Infinity`.
fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_markup())
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl From<Binding> for Value {
    fn from(b: Binding) -> Self {
        Self::Binding(b)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(mut fields) => {
                let kind = (fields.len() == 2)
                    .then(|| fields.get("kind").and_then(serde_json::Value::as_str))
                    .flatten()
                    .and_then(BindingKind::parse);
                match (kind, fields.remove("value")) {
                    (Some(kind), Some(inner)) => Self::Binding(Binding {
                        kind,
                        value: Box::new(Value::from(inner)),
                    }),
                    (_, inner) => {
                        let mut record: BTreeMap<String, Value> = fields
                            .into_iter()
                            .map(|(k, v)| (k, Value::from(v)))
                            .collect();
                        if let Some(inner) = inner {
                            record.insert("value".to_string(), Value::from(inner));
                        }
                        Self::Record(record)
                    }
                }
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 9.0e15 {
                    serde_json::Value::from(n as i64)
                } else {
                    serde_json::Number::from_f64(n)
                        .map_or(serde_json::Value::Null, serde_json::Value::Number)
                }
            }
            Value::String(s) => serde_json::Value::String(s),
            Value::List(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
            Value::Record(fields) => serde_json::Value::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
            Value::Binding(b) => {
                let mut object = serde_json::Map::new();
                object.insert(
                    "kind".to_string(),
                    serde_json::Value::String(b.kind.as_str().to_string()),
                );
                object.insert("value".to_string(), serde_json::Value::from(*b.value));
                serde_json::Value::Object(object)
            }
        }
    }
}
