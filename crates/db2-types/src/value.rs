//! SQL value representation.

/// A decoded SQL value, one case per wire type family.
///
/// Decimals stay as strings to avoid floating-point precision loss; dates,
/// times, and timestamps are fixed-width text passed through unmodified.
/// Large objects surface only their byte count in summary decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean parameter value (encoded as a 2-byte integer on the wire).
    Bool(bool),
    /// 16-bit signed integer (SMALLINT).
    SmallInt(i16),
    /// 32-bit signed integer (INTEGER).
    Int(i32),
    /// 64-bit signed integer (BIGINT).
    BigInt(i64),
    /// 32-bit floating point (REAL).
    Float(f32),
    /// 64-bit floating point (DOUBLE).
    Double(f64),
    /// Character data (CHAR, VARCHAR, DATE, TIME, TIMESTAMP).
    String(String),
    /// Fixed-point decimal as a digit string (DECIMAL, NUMERIC).
    Decimal(String),
    /// Large object, surfaced as its byte count.
    Blob {
        /// Length of the object in bytes.
        length: u32,
    },
    /// Placeholder for a column of unrecognized wire type.
    Opaque,
}

impl SqlValue {
    /// Check if the value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the value as an i32, widening smaller integers.
    #[must_use]
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            Self::SmallInt(v) => Some(i32::from(*v)),
            _ => None,
        }
    }

    /// Get the value as an i64, widening smaller integers.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::BigInt(v) => Some(*v),
            Self::Int(v) => Some(i64::from(*v)),
            Self::SmallInt(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    /// Get the value as an f64, widening single precision.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            Self::Float(v) => Some(f64::from(*v)),
            _ => None,
        }
    }

    /// Get the value as a string slice (character or decimal data).
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) | Self::Decimal(v) => Some(v),
            _ => None,
        }
    }
}

impl Default for SqlValue {
    fn default() -> Self {
        Self::Null
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i16> for SqlValue {
    fn from(v: i16) -> Self {
        Self::SmallInt(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        Self::BigInt(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl<T> From<Option<T>> for SqlValue
where
    T: Into<SqlValue>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}
