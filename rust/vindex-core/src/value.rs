//! Value representation used to carry lookup-table inputs and results.
//!
//! A [`Value`] is a typed byte string in the same spirit as a SQL wire value:
//! numbers are kept in their textual form, strings as UTF-8 and binary data
//! verbatim. The lookup vindexes only ever need to build values from raw bytes
//! and to read the raw bytes back, so the representation stays deliberately thin.

use std::fmt;

/// The SQL type tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Null,
    Int64,
    Uint64,
    VarChar,
    VarBinary,
}

impl ValueType {
    pub fn is_quoted(&self) -> bool {
        matches!(self, ValueType::VarChar | ValueType::VarBinary)
    }
}

/// A typed SQL value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Value {
    typ: ValueType,
    bytes: Vec<u8>,
}

impl Value {
    /// Builds a value without validating that `bytes` is a legal encoding of `typ`.
    ///
    /// Callers are expected to pass data that came out of a trusted source, such as
    /// a keyspace id or a result row.
    pub fn make_trusted(typ: ValueType, bytes: impl Into<Vec<u8>>) -> Value {
        if typ == ValueType::Null {
            return Value::null();
        }
        Value {
            typ,
            bytes: bytes.into(),
        }
    }

    pub fn null() -> Value {
        Value {
            typ: ValueType::Null,
            bytes: Vec::new(),
        }
    }

    pub fn varbinary(bytes: impl Into<Vec<u8>>) -> Value {
        Value::make_trusted(ValueType::VarBinary, bytes)
    }

    pub fn varchar(s: impl Into<String>) -> Value {
        Value::make_trusted(ValueType::VarChar, s.into().into_bytes())
    }

    pub fn value_type(&self) -> ValueType {
        self.typ
    }

    pub fn is_null(&self) -> bool {
        self.typ == ValueType::Null
    }

    /// Returns the raw bytes of the value without copying.
    pub fn raw(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns an owned copy of the raw bytes of the value.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::make_trusted(ValueType::Int64, v.to_string())
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::make_trusted(ValueType::Uint64, v.to_string())
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::varchar(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::varchar(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.typ {
            ValueType::Null => f.write_str("NULL"),
            ValueType::VarBinary if std::str::from_utf8(&self.bytes).is_err() => {
                f.write_str("x'")?;
                for b in &self.bytes {
                    write!(f, "{b:02x}")?;
                }
                f.write_str("'")
            }
            typ => {
                let text = String::from_utf8_lossy(&self.bytes);
                if typ.is_quoted() {
                    write!(f, "'{text}'")
                } else {
                    f.write_str(&text)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_values_are_textual() {
        let v = Value::from(42i64);
        assert_eq!(v.value_type(), ValueType::Int64);
        assert_eq!(v.raw(), b"42");
        assert_eq!(v.to_string(), "42");

        let v = Value::from(7u64);
        assert_eq!(v.value_type(), ValueType::Uint64);
        assert_eq!(v.raw(), b"7");
    }

    #[test]
    fn test_display_quotes_text() {
        assert_eq!(Value::from("a@x.com").to_string(), "'a@x.com'");
        assert_eq!(Value::varbinary(vec![0x01, 0xff]).to_string(), "x'01ff'");
        assert_eq!(Value::null().to_string(), "NULL");
    }

    #[test]
    fn test_trusted_null_drops_payload() {
        let v = Value::make_trusted(ValueType::Null, b"junk".to_vec());
        assert!(v.is_null());
        assert!(v.raw().is_empty());
    }
}
