//! Type conversion error definitions.

use thiserror::Error;

/// Errors raised while decoding row data or encoding parameters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    /// A descriptor list declared more bytes than the buffer holds.
    #[error("descriptor area truncated at column {column}")]
    DescriptorTruncated {
        /// Zero-based index of the column being decoded.
        column: usize,
    },

    /// A column payload was not valid UTF-8.
    #[error("column {column} contains invalid UTF-8")]
    InvalidUtf8 {
        /// Zero-based index of the column being decoded.
        column: usize,
    },

    /// A packed-decimal byte held a nibble outside 0-9 in a digit position.
    #[error("invalid packed-decimal digit nibble 0x{0:X}")]
    InvalidDecimalDigit(u8),

    /// A parameter value cannot be marshaled onto the wire.
    #[error("parameter {index} not encodable: {reason}")]
    UnsupportedParameter {
        /// Zero-based parameter index.
        index: usize,
        /// Why the value has no wire representation.
        reason: &'static str,
    },

    /// A value exceeds its wire-format length field.
    #[error("value too large for wire field: {0}")]
    ValueTooLarge(&'static str),
}
