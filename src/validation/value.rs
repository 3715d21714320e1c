use serde_json::{Map, Value};
use thiserror::Error;

/// A decoded JSON field as seen by the rule engine. `Absent` means the key
/// was not present at all, `Null` that it was present with a JSON `null`.
#[derive(Debug, Clone, Copy)]
pub enum RawValue<'a> {
    Absent,
    Null,
    Bool(bool),
    Number(f64),
    String(&'a str),
    Array(&'a [Value]),
    Object(&'a Map<String, Value>),
}

impl<'a> RawValue<'a> {
    pub fn lookup(data: &'a Map<String, Value>, name: &str) -> Self {
        data.get(name).map_or(RawValue::Absent, RawValue::from)
    }

    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            RawValue::String(s) => Some(*s),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, RawValue::Absent | RawValue::Null)
    }

    /// Convert into the declared scalar kind. Nil values produce `Ok(None)`
    /// so the target field keeps its default.
    pub fn coerce(&self, kind: Kind) -> Result<Option<Coerced>, CoerceError> {
        if self.is_nil() {
            return Ok(None);
        }

        let coerced = match (kind, self) {
            (Kind::String, RawValue::String(s)) => Coerced::String((*s).to_string()),
            (Kind::String, _) => return Err(CoerceError::ExpectedString),
            (Kind::Int, RawValue::Number(n)) if n.is_finite() => Coerced::Int(n.trunc() as i64),
            (Kind::Int, _) => return Err(CoerceError::ExpectedNumeric),
            (Kind::Uint, RawValue::Number(n)) if n.is_finite() && *n >= 0.0 => {
                Coerced::Uint(n.trunc() as u64)
            }
            (Kind::Uint, _) => return Err(CoerceError::ExpectedUnsigned),
            (Kind::Float, RawValue::Number(n)) => Coerced::Float(*n),
            (Kind::Float, _) => return Err(CoerceError::ExpectedFloat),
            (Kind::Bool, RawValue::Bool(b)) => Coerced::Bool(*b),
            (Kind::Bool, _) => return Err(CoerceError::ExpectedBoolean),
            (Kind::StringList, RawValue::Array(items)) => {
                Coerced::StringList(items.iter().map(stringify).collect())
            }
            (Kind::StringList, _) => return Err(CoerceError::ExpectedList),
        };

        Ok(Some(coerced))
    }
}

impl<'a> From<&'a Value> for RawValue<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Null => RawValue::Null,
            Value::Bool(b) => RawValue::Bool(*b),
            Value::Number(n) => n.as_f64().map_or(RawValue::Null, RawValue::Number),
            Value::String(s) => RawValue::String(s),
            Value::Array(items) => RawValue::Array(items),
            Value::Object(map) => RawValue::Object(map),
        }
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Scalar kinds a request field can be declared as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    String,
    Int,
    Uint,
    Float,
    Bool,
    StringList,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    String(String),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    StringList(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CoerceError {
    #[error("expected string value")]
    ExpectedString,
    #[error("expected numeric value")]
    ExpectedNumeric,
    #[error("expected unsigned numeric value")]
    ExpectedUnsigned,
    #[error("expected float value")]
    ExpectedFloat,
    #[error("expected boolean value")]
    ExpectedBoolean,
    #[error("expected slice of strings")]
    ExpectedList,
}

/// Rust types usable as request fields.
pub trait FieldType: Sized {
    const KIND: Kind;

    fn from_coerced(value: Coerced) -> Option<Self>;
}

impl FieldType for String {
    const KIND: Kind = Kind::String;

    fn from_coerced(value: Coerced) -> Option<Self> {
        match value {
            Coerced::String(s) => Some(s),
            _ => None,
        }
    }
}

impl FieldType for i64 {
    const KIND: Kind = Kind::Int;

    fn from_coerced(value: Coerced) -> Option<Self> {
        match value {
            Coerced::Int(n) => Some(n),
            _ => None,
        }
    }
}

impl FieldType for u64 {
    const KIND: Kind = Kind::Uint;

    fn from_coerced(value: Coerced) -> Option<Self> {
        match value {
            Coerced::Uint(n) => Some(n),
            _ => None,
        }
    }
}

impl FieldType for f64 {
    const KIND: Kind = Kind::Float;

    fn from_coerced(value: Coerced) -> Option<Self> {
        match value {
            Coerced::Float(n) => Some(n),
            _ => None,
        }
    }
}

impl FieldType for bool {
    const KIND: Kind = Kind::Bool;

    fn from_coerced(value: Coerced) -> Option<Self> {
        match value {
            Coerced::Bool(b) => Some(b),
            _ => None,
        }
    }
}

impl FieldType for Vec<String> {
    const KIND: Kind = Kind::StringList;

    fn from_coerced(value: Coerced) -> Option<Self> {
        match value {
            Coerced::StringList(list) => Some(list),
            _ => None,
        }
    }
}

/// Optional fields stay `None` when the value is absent or null.
impl<T: FieldType> FieldType for Option<T> {
    const KIND: Kind = T::KIND;

    fn from_coerced(value: Coerced) -> Option<Self> {
        T::from_coerced(value).map(Some)
    }
}
