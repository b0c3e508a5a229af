//! FDOCA wire data type codes.
//!
//! The low bit of a wire type code marks the nullable variant of the same
//! base type: `0x02` is a non-nullable 4-byte integer, `0x03` the nullable
//! one. Codes outside the recognized set are carried as `Unknown` so rows
//! can still be skipped past them by declared length.

/// A column's wire data type, as carried in its descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FdocaType {
    /// 2-byte big-endian signed integer.
    SmallInt,
    /// 4-byte big-endian signed integer.
    Integer,
    /// 8-byte big-endian signed integer.
    BigInt,
    /// 4-byte big-endian IEEE-754.
    Float4,
    /// 8-byte big-endian IEEE-754.
    Float8,
    /// Packed binary-coded-decimal with trailing sign nibble.
    Decimal,
    /// Fixed-length character data, blank padded.
    FixChar,
    /// Variable-length character data with a u16 length prefix.
    VarChar,
    /// Fixed-width date text (10 bytes).
    Date,
    /// Fixed-width time text (8 bytes).
    Time,
    /// Fixed-width timestamp text (26 bytes).
    Timestamp,
    /// Large object with a u32 length prefix.
    Blob,
    /// Unrecognized type code, kept for skip-by-length handling.
    Unknown(u16),
}

/// Base (non-nullable) wire codes.
pub mod wire {
    /// INTEGER.
    pub const INTEGER: u16 = 0x02;
    /// SMALLINT.
    pub const SMALLINT: u16 = 0x04;
    /// FLOAT8 (double precision).
    pub const FLOAT8: u16 = 0x0A;
    /// FLOAT4 (single precision).
    pub const FLOAT4: u16 = 0x0C;
    /// BIGINT.
    pub const BIGINT: u16 = 0x16;
    /// DATE.
    pub const DATE: u16 = 0x20;
    /// TIME.
    pub const TIME: u16 = 0x22;
    /// TIMESTAMP.
    pub const TIMESTAMP: u16 = 0x24;
    /// Packed DECIMAL.
    pub const DECIMAL: u16 = 0x30;
    /// Fixed CHAR.
    pub const FIXCHAR: u16 = 0x36;
    /// VARCHAR.
    pub const VARCHAR: u16 = 0x38;
    /// BLOB.
    pub const BLOB: u16 = 0xC8;
}

impl FdocaType {
    /// Split a raw wire code into the base type and its nullability bit.
    #[must_use]
    pub fn from_wire(code: u16) -> (Self, bool) {
        let nullable = code & 1 == 1;
        let base = match code & !1 {
            wire::INTEGER => Self::Integer,
            wire::SMALLINT => Self::SmallInt,
            wire::FLOAT8 => Self::Float8,
            wire::FLOAT4 => Self::Float4,
            wire::BIGINT => Self::BigInt,
            wire::DATE => Self::Date,
            wire::TIME => Self::Time,
            wire::TIMESTAMP => Self::Timestamp,
            wire::DECIMAL => Self::Decimal,
            wire::FIXCHAR => Self::FixChar,
            wire::VARCHAR => Self::VarChar,
            wire::BLOB => Self::Blob,
            _ => Self::Unknown(code),
        };
        (base, nullable)
    }

    /// The base (non-nullable) wire code for this type.
    #[must_use]
    pub fn wire_code(&self) -> u16 {
        match self {
            Self::Integer => wire::INTEGER,
            Self::SmallInt => wire::SMALLINT,
            Self::Float8 => wire::FLOAT8,
            Self::Float4 => wire::FLOAT4,
            Self::BigInt => wire::BIGINT,
            Self::Date => wire::DATE,
            Self::Time => wire::TIME,
            Self::Timestamp => wire::TIMESTAMP,
            Self::Decimal => wire::DECIMAL,
            Self::FixChar => wire::FIXCHAR,
            Self::VarChar => wire::VARCHAR,
            Self::Blob => wire::BLOB,
            Self::Unknown(code) => *code,
        }
    }

    /// SQL-ish type name for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::SmallInt => "SMALLINT",
            Self::Integer => "INTEGER",
            Self::BigInt => "BIGINT",
            Self::Float4 => "REAL",
            Self::Float8 => "DOUBLE",
            Self::Decimal => "DECIMAL",
            Self::FixChar => "CHAR",
            Self::VarChar => "VARCHAR",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::Timestamp => "TIMESTAMP",
            Self::Blob => "BLOB",
            Self::Unknown(_) => "UNKNOWN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nullable_bit_split() {
        assert_eq!(FdocaType::from_wire(0x02), (FdocaType::Integer, false));
        assert_eq!(FdocaType::from_wire(0x03), (FdocaType::Integer, true));
        assert_eq!(FdocaType::from_wire(0x39), (FdocaType::VarChar, true));
    }

    #[test]
    fn test_unknown_code_preserved() {
        let (ty, nullable) = FdocaType::from_wire(0x7F);
        assert_eq!(ty, FdocaType::Unknown(0x7F));
        assert!(nullable);
        assert_eq!(ty.wire_code(), 0x7F);
    }
}
