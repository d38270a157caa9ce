#![forbid(unsafe_code)]

//! Declarative value types and validation constraints.
//!
//! A [`TypeDescriptor`] pairs a primitive base type with an optional
//! [`Constraint`] tree. Enumerations derive their constraint from the value
//! domain as an `Or` of `EqualTo` leaves.
//!
//! Descriptors can also be written in a compact textual form:
//!
//! ```
//! use formkit_core::types::TypeDescriptor;
//! use formkit_core::value::Value;
//!
//! let small: TypeDescriptor = "type number < 10 > 0".parse().unwrap();
//! assert!(small.validate(&Value::from(5)));
//! assert!(!small.validate(&Value::from(12)));
//! assert!(!small.validate(&Value::from("5")));
//! ```

use std::fmt;
use std::str::FromStr;

use crate::value::Value;

// ---------------------------------------------------------------------------
// Primitive types
// ---------------------------------------------------------------------------

/// Base type of a descriptor, matched against [`Value::kind_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    String,
    Number,
    Boolean,
}

impl PrimitiveType {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }

    /// Primitive type of a scalar value, if it has one.
    #[must_use]
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::String(_) => Some(Self::String),
            Value::Number(_) => Some(Self::Number),
            Value::Bool(_) => Some(Self::Boolean),
            _ => None,
        }
    }

    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        Self::of(value) == Some(self)
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Constraints
// ---------------------------------------------------------------------------

/// A validation predicate over a single value.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// All children must hold. Stops at the first failure.
    And(Vec<Constraint>),
    /// Any child must hold. Stops at the first success.
    Or(Vec<Constraint>),
    /// String length (in chars) or list length is at most `n`.
    LengthAtMost(usize),
    LessThan(f64),
    GreaterThan(f64),
    /// Loose equality: numbers compare numerically, everything else structurally.
    EqualTo(Value),
}

impl Constraint {
    #[must_use]
    pub fn length(max: usize) -> Self {
        Self::LengthAtMost(max)
    }

    #[must_use]
    pub fn lt(bound: f64) -> Self {
        Self::LessThan(bound)
    }

    #[must_use]
    pub fn gt(bound: f64) -> Self {
        Self::GreaterThan(bound)
    }

    #[must_use]
    pub fn equals(value: impl Into<Value>) -> Self {
        Self::EqualTo(value.into())
    }

    #[must_use]
    pub fn and(constraints: impl IntoIterator<Item = Constraint>) -> Self {
        Self::And(constraints.into_iter().collect())
    }

    #[must_use]
    pub fn or(constraints: impl IntoIterator<Item = Constraint>) -> Self {
        Self::Or(constraints.into_iter().collect())
    }

    /// Evaluate the predicate. Never panics; shape mismatches evaluate to `false`.
    #[must_use]
    pub fn eval(&self, value: &Value) -> bool {
        match self {
            Self::And(children) => children.iter().all(|c| c.eval(value)),
            Self::Or(children) => children.iter().any(|c| c.eval(value)),
            Self::LengthAtMost(max) => match value {
                Value::String(s) => s.chars().count() <= *max,
                Value::List(items) => items.len() <= *max,
                _ => false,
            },
            Self::LessThan(bound) => value.as_f64().is_some_and(|n| n < *bound),
            Self::GreaterThan(bound) => value.as_f64().is_some_and(|n| n > *bound),
            Self::EqualTo(expected) => match (expected, value) {
                (Value::Number(a), Value::Number(b)) => a == b,
                (a, b) => a == b,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Type descriptors
// ---------------------------------------------------------------------------

/// Describes the acceptable values of a property.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Primitive {
        base: PrimitiveType,
        constraint: Option<Constraint>,
    },
    /// A closed set of literal values. The base type is that of the first value.
    Enum {
        base: PrimitiveType,
        values: Vec<Value>,
        constraint: Constraint,
    },
}

impl TypeDescriptor {
    #[must_use]
    pub fn primitive(base: PrimitiveType) -> Self {
        Self::Primitive {
            base,
            constraint: None,
        }
    }

    #[must_use]
    pub fn constrained(base: PrimitiveType, constraint: Constraint) -> Self {
        Self::Primitive {
            base,
            constraint: Some(constraint),
        }
    }

    /// Build an enumeration. Returns `None` when `values` is empty or its first
    /// element is not a scalar.
    #[must_use]
    pub fn enumeration(values: impl IntoIterator<Item = Value>) -> Option<Self> {
        let values: Vec<Value> = values.into_iter().collect();
        let base = PrimitiveType::of(values.first()?)?;
        let constraint = Constraint::or(values.iter().cloned().map(Constraint::EqualTo));
        Some(Self::Enum {
            base,
            values,
            constraint,
        })
    }

    /// Shorthand for an enumeration of strings.
    #[must_use]
    pub fn string_enum<'a>(values: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        Self::enumeration(values.into_iter().map(Value::from))
    }

    #[must_use]
    pub fn base(&self) -> PrimitiveType {
        match self {
            Self::Primitive { base, .. } | Self::Enum { base, .. } => *base,
        }
    }

    #[must_use]
    pub fn constraint(&self) -> Option<&Constraint> {
        match self {
            Self::Primitive { constraint, .. } => constraint.as_ref(),
            Self::Enum { constraint, .. } => Some(constraint),
        }
    }

    /// Literal domain of an enumeration; `None` for primitives.
    #[must_use]
    pub fn values(&self) -> Option<&[Value]> {
        match self {
            Self::Enum { values, .. } => Some(values),
            Self::Primitive { .. } => None,
        }
    }

    #[must_use]
    pub fn is_enum(&self) -> bool {
        matches!(self, Self::Enum { .. })
    }

    /// True iff the base type matches and the constraint (if any) holds.
    #[must_use]
    pub fn validate(&self, value: &Value) -> bool {
        self.base().matches(value) && self.constraint().is_none_or(|c| c.eval(value))
    }

    /// Parse the textual form (`type <t> [<op> <value>]...`).
    pub fn parse(source: &str) -> Result<Self, TypeParseError> {
        parse_descriptor(source).inspect_err(|err| {
            tracing::debug!(source, error = %err, "type descriptor rejected");
        })
    }
}

impl FromStr for TypeDescriptor {
    type Err = TypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

/// Error returned when parsing a textual type descriptor fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeParseError {
    /// Tokens must come in `key value` pairs.
    OddArgumentCount { count: usize },
    /// The first pair must be `type <name>`.
    MissingType,
    UnknownType { name: String },
    UnknownOperator { operator: String },
    InvalidValue { value: String, expected: &'static str },
    UnterminatedQuote { position: usize },
    /// The type parses but has no descriptor form (e.g. `boolean`).
    UnsupportedType { name: String },
}

impl fmt::Display for TypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OddArgumentCount { count } => {
                write!(f, "type expression needs key/value pairs, got {count} tokens")
            }
            Self::MissingType => write!(f, "type expression must start with 'type <name>'"),
            Self::UnknownType { name } => write!(f, "unknown type '{name}'"),
            Self::UnknownOperator { operator } => write!(f, "unknown operator '{operator}'"),
            Self::InvalidValue { value, expected } => {
                write!(f, "cannot read '{value}' as {expected}")
            }
            Self::UnterminatedQuote { position } => {
                write!(f, "unterminated quote starting at byte {position}")
            }
            Self::UnsupportedType { name } => {
                write!(f, "type '{name}' cannot carry constraints")
            }
        }
    }
}

impl std::error::Error for TypeParseError {}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Integer,
    Float,
    Text,
    Flag,
}

impl ValueKind {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "number" => Some(Self::Integer),
            "float" => Some(Self::Float),
            "string" => Some(Self::Text),
            "boolean" => Some(Self::Flag),
            _ => None,
        }
    }

    fn coerce(self, raw: &str) -> Result<Value, TypeParseError> {
        let invalid = |expected| TypeParseError::InvalidValue {
            value: raw.to_string(),
            expected,
        };
        match self {
            Self::Integer => raw
                .parse::<i64>()
                .map(|n| Value::Number(n as f64))
                .map_err(|_| invalid("an integer")),
            Self::Float => raw
                .parse::<f64>()
                .map(Value::Number)
                .map_err(|_| invalid("a number")),
            Self::Text => Ok(Value::String(raw.to_string())),
            Self::Flag => match raw {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(invalid("a boolean")),
            },
        }
    }
}

/// Split on whitespace; double-quoted tokens may contain spaces.
fn tokenize(source: &str) -> Result<Vec<String>, TypeParseError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();
    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '"' {
            chars.next();
            let mut token = String::new();
            let mut closed = false;
            for (_, c) in chars.by_ref() {
                if c == '"' {
                    closed = true;
                    break;
                }
                token.push(c);
            }
            if !closed {
                return Err(TypeParseError::UnterminatedQuote { position: start });
            }
            tokens.push(token);
        } else {
            let mut token = String::new();
            while let Some(&(_, c)) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                token.push(c);
                chars.next();
            }
            tokens.push(token);
        }
    }
    Ok(tokens)
}

fn parse_descriptor(source: &str) -> Result<TypeDescriptor, TypeParseError> {
    let tokens = tokenize(source)?;
    if tokens.len() % 2 != 0 {
        return Err(TypeParseError::OddArgumentCount {
            count: tokens.len(),
        });
    }
    let mut pairs = tokens.chunks_exact(2);
    let type_name = match pairs.next() {
        Some([key, name]) if key == "type" => name,
        _ => return Err(TypeParseError::MissingType),
    };
    let kind = ValueKind::from_name(type_name).ok_or_else(|| TypeParseError::UnknownType {
        name: type_name.clone(),
    })?;

    let mut constraints = Vec::new();
    for pair in pairs {
        let [operator, raw] = pair else { continue };
        let constraint = match operator.as_str() {
            "<" => Constraint::LessThan(number_operand(kind, raw)?),
            ">" => Constraint::GreaterThan(number_operand(kind, raw)?),
            "length" => {
                let max = raw.parse::<usize>().map_err(|_| TypeParseError::InvalidValue {
                    value: raw.clone(),
                    expected: "a length",
                })?;
                Constraint::LengthAtMost(max)
            }
            other => {
                return Err(TypeParseError::UnknownOperator {
                    operator: other.to_string(),
                });
            }
        };
        constraints.push(constraint);
    }

    let base = match kind {
        ValueKind::Integer | ValueKind::Float => PrimitiveType::Number,
        ValueKind::Text => PrimitiveType::String,
        ValueKind::Flag => {
            return Err(TypeParseError::UnsupportedType {
                name: type_name.clone(),
            });
        }
    };
    let constraint = match constraints.len() {
        0 => None,
        1 => constraints.pop(),
        _ => Some(Constraint::And(constraints)),
    };
    Ok(TypeDescriptor::Primitive { base, constraint })
}

fn number_operand(kind: ValueKind, raw: &str) -> Result<f64, TypeParseError> {
    let coerce_as = match kind {
        ValueKind::Integer => ValueKind::Integer,
        _ => ValueKind::Float,
    };
    let value = coerce_as.coerce(raw)?;
    value.as_f64().ok_or_else(|| TypeParseError::InvalidValue {
        value: raw.to_string(),
        expected: "a number",
    })
}
