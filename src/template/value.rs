use crate::error::{ForgeError, Result};
use chrono::{DateTime, Datelike, FixedOffset, Timelike};
use std::collections::BTreeMap;
use std::fmt;

/// Data a template can see through `.` and field chains.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Str(String),
    Time(DateTime<FixedOffset>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Build a map value from `(name, value)` pairs.
    pub fn map<K: Into<String>>(fields: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Map(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Resolve `.name` on this value.
    ///
    /// Maps resolve by key. Timestamps expose `Year`, `Month`, `Day`,
    /// `Week` (ISO week of year), `YearDay`, `Weekday`, `Hour` and `Minute`.
    pub fn field(&self, name: &str) -> Result<Value> {
        match self {
            Value::Map(fields) => fields.get(name).cloned().ok_or_else(|| {
                ForgeError::parse(format!("can't evaluate field {} in map", name))
            }),
            Value::Time(t) => {
                let value = match name {
                    "Year" => Value::Int(i64::from(t.year())),
                    "Month" => Value::Int(i64::from(t.month())),
                    "Day" => Value::Int(i64::from(t.day())),
                    "Week" => Value::Int(i64::from(t.iso_week().week())),
                    "YearDay" => Value::Int(i64::from(t.ordinal())),
                    "Weekday" => Value::Str(t.format("%A").to_string()),
                    "Hour" => Value::Int(i64::from(t.hour())),
                    "Minute" => Value::Int(i64::from(t.minute())),
                    _ => {
                        return Err(ForgeError::parse(format!(
                            "can't evaluate field {} in timestamp",
                            name
                        )))
                    }
                };
                Ok(value)
            }
            other => Err(ForgeError::parse(format!(
                "can't evaluate field {} in {}",
                name,
                other.type_name()
            ))),
        }
    }

    pub fn as_int(&self) -> Result<i64> {
        match self {
            Value::Int(n) => Ok(*n),
            other => Err(ForgeError::parse(format!(
                "expected integer, got {} '{}'",
                other.type_name(),
                other
            ))),
        }
    }

    pub fn as_time(&self) -> Result<&DateTime<FixedOffset>> {
        match self {
            Value::Time(t) => Ok(t),
            other => Err(ForgeError::parse(format!(
                "expected timestamp, got {} '{}'",
                other.type_name(),
                other
            ))),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Str(_) => "string",
            Value::Time(_) => "timestamp",
            Value::Map(_) => "map",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Str(s) => f.write_str(s),
            Value::Time(t) => f.write_str(&t.to_rfc3339()),
            Value::Map(fields) => {
                f.write_str("map[")?;
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}:{}", key, value)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(t: DateTime<FixedOffset>) -> Self {
        Value::Time(t)
    }
}
