//! Protocol error types.

use thiserror::Error;

/// Errors raised while encoding or decoding DRDA structures.
///
/// A length field pointing past the available buffer during reply parsing is
/// *not* an error at this layer; `parse_objects` returns a partial result so
/// callers can read more bytes. Errors here mean the bytes can never become
/// valid no matter how many more arrive.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A DSS frame declared a length smaller than its own header.
    #[error("DSS length {length} is shorter than the {header}-byte header")]
    FrameTooShort {
        /// Declared frame length.
        length: u16,
        /// Fixed header size.
        header: usize,
    },

    /// The DSS magic byte was not `0xD0`.
    #[error("invalid DSS magic byte 0x{0:02X}")]
    BadMagic(u8),

    /// The DSS format byte carried an unknown structure kind.
    #[error("invalid DSS kind 0x{0:X}")]
    InvalidKind(u8),

    /// An object declared a length smaller than its own 4-byte header.
    #[error("object length {length} is shorter than the 4-byte header")]
    ObjectTooShort {
        /// Declared object length.
        length: u16,
    },

    /// Object nesting exceeded the recursion limit.
    #[error("object nesting deeper than {0} levels")]
    DepthExceeded(usize),

    /// A fixed-layout object was shorter than its mandatory fields.
    #[error("{object} payload truncated: need {expected} bytes, have {actual}")]
    TruncatedPayload {
        /// Human-readable object name.
        object: &'static str,
        /// Bytes required by the fixed layout.
        expected: usize,
        /// Bytes actually present.
        actual: usize,
    },

    /// A text field was not valid UTF-8.
    #[error("{0} contains invalid UTF-8")]
    InvalidUtf8(&'static str),

    /// An encoded value does not fit its wire representation.
    #[error("value too large for wire field: {0}")]
    ValueTooLarge(&'static str),
}
