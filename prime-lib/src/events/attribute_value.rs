use chrono::{DateTime, Utc};
use compact_str::CompactString;
use core::fmt::{Display, Formatter};
use std::collections::BTreeMap;

/// Kind-specific fields of an event, keyed by namespaced attribute name.
pub type Attributes = BTreeMap<CompactString, AttributeValue>;

/// The closed set of value types an event attribute can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(CompactString),
    Number(f64),
    Timestamp(DateTime<Utc>),
    Boolean(bool),
}

impl AttributeValue {
    /// Short name of the value's type, used in diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Number(_) => "number",
            Self::Timestamp(_) => "timestamp",
            Self::Boolean(_) => "boolean",
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl Display for AttributeValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.into())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value.into())
    }
}

impl From<CompactString> for AttributeValue {
    fn from(value: CompactString) -> Self {
        Self::String(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<u64> for AttributeValue {
    #[expect(clippy::cast_precision_loss, reason = "activity counters are far below 2^52")]
    fn from(value: u64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<DateTime<Utc>> for AttributeValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}
