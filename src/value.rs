use crate::{Error, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fmt::{Display, Formatter};

/// Text layout used to persist timestamps in text-typed columns.
/// Fixed width so that lexicographic order equals chronological order.
pub(crate) const DATETIME_TEXT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    NULL,
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),

    /// date-time
    DateTime(DateTime<Utc>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::NULL)
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::String(s) => Ok(s.as_str()),
            _ => Err(Error::type_mismatch()),
        }
    }

    pub fn to_i64(&self) -> Result<Option<i64>> {
        match self {
            Value::NULL => Ok(None),
            Value::Int(i) => Ok(Some(*i)),
            Value::String(s) => Ok(Some(s.parse()?)),
            _ => Err(Error::type_mismatch()),
        }
    }

    /// Reads a timestamp, accepting both native datetime values and the
    /// textual representations written by text-only backends.
    pub fn to_datetime(&self) -> Result<DateTime<Utc>> {
        match self {
            Value::DateTime(dt) => Ok(*dt),
            Value::String(s) => {
                if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                    return Ok(dt.with_timezone(&Utc));
                }

                let naive = NaiveDateTime::parse_from_str(s, DATETIME_TEXT_FORMAT)
                    .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))?;
                Ok(naive.and_utc())
            }
            _ => Err(Error::type_mismatch()),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::NULL => write!(f, "NULL"),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{}", v),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Value::DateTime(v) => write!(f, "{}", v.format(DATETIME_TEXT_FORMAT)),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::DateTime(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::NULL)
    }
}

#[cfg(test)]
mod tests {
    use crate::Value;
    use chrono::{TimeZone, Utc};

    #[test]
    fn reads_datetimes_from_text() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 10, 20, 48, 30).unwrap();

        let v = Value::String("2024-01-10 20:48:30.000000".to_string());
        assert_eq!(v.to_datetime().unwrap(), expected);

        let v = Value::String("2024-01-10T20:48:30Z".to_string());
        assert_eq!(v.to_datetime().unwrap(), expected);

        let v = Value::DateTime(expected);
        assert_eq!(v.to_datetime().unwrap(), expected);
        assert_eq!(v.to_string(), "2024-01-10 20:48:30.000000");

        assert!(Value::Int(3).to_datetime().is_err());
    }

    #[test]
    fn optional_values_map_to_null() {
        assert!(Value::from(None::<i64>).is_null());
        assert_eq!(Value::from(Some(42_i64)), Value::Int(42));
        assert_eq!(Value::Int(42).to_i64().unwrap(), Some(42));
        assert_eq!(Value::NULL.to_i64().unwrap(), None);
    }
}
