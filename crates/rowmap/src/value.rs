//! Column values and their conversions.
//!
//! [`Value`] is the closed set of scalar kinds a column can carry. Conversions into a `Value` go
//! through `From`, conversions back into field types go through [`FromValue`], so the choice of
//! decode and narrowing logic is made at compile time by the field type.

/// A single column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    /// Arbitrary-width integer, stored as decimal text.
    BigInt(i128),
    F64(f64),
    Text(String),
    Bytes(Vec<u8>),
}

/// The variant tag of a [`Value`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    BigInt,
    F64,
    Text,
    Bytes,
}

impl ValueKind {
    /// Rust-facing name of the kind, used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::BigInt => "bigint",
            Self::F64 => "f64",
            Self::Text => "text",
            Self::Bytes => "bytes",
        }
    }

    /// Fixed-width integer kinds. These map to an integer SQL type on table creation.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Self::I8
                | Self::I16
                | Self::I32
                | Self::I64
                | Self::U8
                | Self::U16
                | Self::U32
                | Self::U64
        )
    }

    /// Narrow a wide integer into this kind.
    ///
    /// Returns `None` when `raw` does not survive the round trip back to `i64`, or when the kind
    /// is not integral. `Null` narrows to `I64` since it carries no width of its own.
    pub fn narrow(self, raw: i64) -> Option<Value> {
        match self {
            Self::I8 => i8::try_from(raw).ok().map(Value::I8),
            Self::I16 => i16::try_from(raw).ok().map(Value::I16),
            Self::I32 => i32::try_from(raw).ok().map(Value::I32),
            Self::I64 | Self::Null => Some(Value::I64(raw)),
            Self::U8 => u8::try_from(raw).ok().map(Value::U8),
            Self::U16 => u16::try_from(raw).ok().map(Value::U16),
            Self::U32 => u32::try_from(raw).ok().map(Value::U32),
            Self::U64 => u64::try_from(raw).ok().map(Value::U64),
            Self::BigInt => Some(Value::BigInt(i128::from(raw))),
            Self::Bool | Self::F64 | Self::Text | Self::Bytes => None,
        }
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::I8(_) => ValueKind::I8,
            Self::I16(_) => ValueKind::I16,
            Self::I32(_) => ValueKind::I32,
            Self::I64(_) => ValueKind::I64,
            Self::U8(_) => ValueKind::U8,
            Self::U16(_) => ValueKind::U16,
            Self::U32(_) => ValueKind::U32,
            Self::U64(_) => ValueKind::U64,
            Self::BigInt(_) => ValueKind::BigInt,
            Self::F64(_) => ValueKind::F64,
            Self::Text(_) => ValueKind::Text,
            Self::Bytes(_) => ValueKind::Bytes,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Binary blob values are never used in equality predicates.
    pub fn is_bytes(&self) -> bool {
        matches!(self, Self::Bytes(_))
    }

    /// Widen any integral value to `i64`, if it fits.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::I8(v) => Some(i64::from(v)),
            Self::I16(v) => Some(i64::from(v)),
            Self::I32(v) => Some(i64::from(v)),
            Self::I64(v) => Some(v),
            Self::U8(v) => Some(i64::from(v)),
            Self::U16(v) => Some(i64::from(v)),
            Self::U32(v) => Some(i64::from(v)),
            Self::U64(v) => i64::try_from(v).ok(),
            Self::BigInt(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    /// SQL type inferred for `CREATE TABLE` when the column declares none.
    pub fn inferred_sql_type(&self) -> &'static str {
        if self.kind().is_integer() {
            "int"
        } else {
            "varchar(255)"
        }
    }
}

// ==================== Into Value ====================

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_scalar! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    i128 => BigInt,
    f64 => F64,
    String => Text,
    Vec<u8> => Bytes,
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::F64(f64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

// ==================== From Value ====================

/// Conversion from a fetched [`Value`] into a field type.
///
/// The error is a human-readable message; [`RowReader`](crate::RowReader) attaches the column.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, String>;
}

fn mismatch(expected: &str, got: &Value) -> String {
    format!("expected {expected}, got {}", got.kind().name())
}

macro_rules! impl_from_value_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self, String> {
                    let wide: i128 = match &value {
                        Value::U64(v) => i128::from(*v),
                        Value::BigInt(v) => *v,
                        Value::Bool(v) => i128::from(*v),
                        Value::Text(s) => s
                            .trim()
                            .parse::<i128>()
                            .map_err(|_| mismatch(stringify!($ty), &value))?,
                        other => match other.as_i64() {
                            Some(v) => i128::from(v),
                            None => return Err(mismatch(stringify!($ty), &value)),
                        },
                    };
                    <$ty>::try_from(wide)
                        .map_err(|_| format!("value {wide} out of range for {}", stringify!($ty)))
                }
            }
        )*
    };
}

impl_from_value_int!(i8, i16, i32, i64, u8, u16, u32, u64, i128);

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Bool(v) => Ok(v),
            ref other => match other.as_i64() {
                Some(0) => Ok(false),
                Some(1) => Ok(true),
                _ => Err(mismatch("bool", other)),
            },
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::F64(v) => Ok(v),
            ref other => other
                .as_i64()
                .map(|v| v as f64)
                .ok_or_else(|| mismatch("f64", other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Text(s) => Ok(s),
            Value::Bytes(b) => String::from_utf8(b).map_err(|e| e.to_string()),
            other => Err(mismatch("text", &other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Bytes(b) => Ok(b),
            Value::Text(s) => Ok(s.into_bytes()),
            Value::Null => Ok(Vec::new()),
            other => Err(mismatch("bytes", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, String> {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_checks_round_trip() {
        assert_eq!(ValueKind::I8.narrow(127), Some(Value::I8(127)));
        assert_eq!(ValueKind::I8.narrow(128), None);
        assert_eq!(ValueKind::U8.narrow(-1), None);
        assert_eq!(ValueKind::U16.narrow(65_535), Some(Value::U16(65_535)));
        assert_eq!(ValueKind::I32.narrow(i64::MAX), None);
        assert_eq!(ValueKind::I64.narrow(i64::MIN), Some(Value::I64(i64::MIN)));
        assert_eq!(ValueKind::Null.narrow(7), Some(Value::I64(7)));
        assert_eq!(ValueKind::Text.narrow(7), None);
    }

    #[test]
    fn inferred_sql_types() {
        assert_eq!(Value::from(1_u8).inferred_sql_type(), "int");
        assert_eq!(Value::from(1_i64).inferred_sql_type(), "int");
        assert_eq!(Value::from("x").inferred_sql_type(), "varchar(255)");
        assert_eq!(Value::from(vec![1_u8]).inferred_sql_type(), "varchar(255)");
        assert_eq!(Value::from(5_i128).inferred_sql_type(), "varchar(255)");
    }

    #[test]
    fn integers_decode_across_widths() {
        assert_eq!(i32::from_value(Value::I64(42)), Ok(42));
        assert!(i8::from_value(Value::I64(1000)).is_err());
        assert_eq!(u64::from_value(Value::U64(u64::MAX)), Ok(u64::MAX));
        assert_eq!(i128::from_value(Value::Text("100000000000".into())), Ok(100_000_000_000));
        assert!(i64::from_value(Value::Text("abc".into())).is_err());
    }

    #[test]
    fn options_map_null() {
        assert_eq!(Option::<String>::from_value(Value::Null), Ok(None));
        assert_eq!(
            Option::<String>::from_value(Value::Text("a".into())),
            Ok(Some("a".to_string()))
        );
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(3_i16)), Value::I16(3));
    }

    #[test]
    fn bool_accepts_sqlite_integers() {
        assert_eq!(bool::from_value(Value::I64(1)), Ok(true));
        assert_eq!(bool::from_value(Value::I64(0)), Ok(false));
        assert!(bool::from_value(Value::I64(2)).is_err());
    }
}
