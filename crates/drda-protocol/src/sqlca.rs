//! SQLCA status decoding and security-check reason codes.
//!
//! Every operation reply carries at most one SQLCARD object. Its sign is the
//! authoritative success/failure signal: negative codes are SQL errors,
//! non-negative codes are success or warnings, and the transport-level
//! absence of an error means nothing on its own.

use crate::codepoint;
use crate::error::ProtocolError;
use crate::object::Object;

/// SQL code meaning "cursor exhausted, no more data".
///
/// Fetch loops must treat this as normal termination, never as an error.
pub const SQL_NO_DATA: i32 = 100;

/// Decoded SQL communications area: return code, state, and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sqlca {
    /// Signed SQL return code; negative means error.
    pub code: i32,
    /// Five-character SQLSTATE.
    pub state: String,
    /// Optional server message text.
    pub message: Option<String>,
}

impl Sqlca {
    /// Whether this status reports an application-visible SQL error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.code < 0
    }

    /// Whether this status is the "no more data" cursor sentinel.
    #[must_use]
    pub fn is_end_of_data(&self) -> bool {
        self.code == SQL_NO_DATA
    }

    /// Decode from a SQLCARD payload.
    ///
    /// Layout: `code:i32, state:[u8;5]`, then an optional u16
    /// length-prefixed message string.
    pub fn decode(object: &Object) -> Result<Self, ProtocolError> {
        let payload = &object.payload;
        if payload.len() < 9 {
            return Err(ProtocolError::TruncatedPayload {
                object: "SQLCARD",
                expected: 9,
                actual: payload.len(),
            });
        }
        let code = i32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]);
        let state = core::str::from_utf8(&payload[4..9])
            .map_err(|_| ProtocolError::InvalidUtf8("SQLSTATE"))?
            .to_owned();

        let message = if payload.len() >= 11 {
            let len = u16::from_be_bytes([payload[9], payload[10]]) as usize;
            if payload.len() < 11 + len {
                return Err(ProtocolError::TruncatedPayload {
                    object: "SQLCARD message",
                    expected: 11 + len,
                    actual: payload.len(),
                });
            }
            Some(
                core::str::from_utf8(&payload[11..11 + len])
                    .map_err(|_| ProtocolError::InvalidUtf8("SQLCARD message"))?
                    .to_owned(),
            )
        } else {
            None
        };

        Ok(Self {
            code,
            state,
            message,
        })
    }

    /// Find and decode the SQLCARD among a parsed reply's objects.
    pub fn find_in(objects: &[Object]) -> Result<Option<Self>, ProtocolError> {
        match crate::object::find(objects, codepoint::SQLCARD) {
            Some(card) => Self::decode(card).map(Some),
            None => Ok(None),
        }
    }
}

/// Map a SECCHKCD security-check code to a human-readable reason.
///
/// Zero means success and never reaches this table. Codes outside the table
/// are legal; callers surface the raw number instead.
#[must_use]
pub fn security_check_reason(code: u8) -> Option<&'static str> {
    Some(match code {
        0x01 => "security mechanism not supported",
        0x02 => "user ID missing",
        0x03 => "password missing",
        0x04 => "invalid user ID or password",
        0x05 => "user ID revoked",
        0x06 => "new password required",
        _ => return None,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bytes::{BufMut, BytesMut};

    fn sqlcard(code: i32, state: &str, message: Option<&str>) -> Object {
        let mut buf = BytesMut::new();
        buf.put_i32(code);
        buf.put_slice(state.as_bytes());
        if let Some(msg) = message {
            buf.put_u16(msg.len() as u16);
            buf.put_slice(msg.as_bytes());
        }
        Object::new(codepoint::SQLCARD, buf.freeze())
    }

    #[test]
    fn test_success_without_message() {
        let sqlca = Sqlca::decode(&sqlcard(0, "00000", None)).unwrap();
        assert_eq!(sqlca.code, 0);
        assert_eq!(sqlca.state, "00000");
        assert_eq!(sqlca.message, None);
        assert!(!sqlca.is_error());
    }

    #[test]
    fn test_error_with_message() {
        let sqlca = Sqlca::decode(&sqlcard(-204, "42704", Some("T is undefined"))).unwrap();
        assert!(sqlca.is_error());
        assert_eq!(sqlca.state, "42704");
        assert_eq!(sqlca.message.as_deref(), Some("T is undefined"));
    }

    #[test]
    fn test_code_100_is_end_of_data_not_error() {
        let sqlca = Sqlca::decode(&sqlcard(SQL_NO_DATA, "02000", None)).unwrap();
        assert!(sqlca.is_end_of_data());
        assert!(!sqlca.is_error());
    }

    #[test]
    fn test_truncated_sqlcard_rejected() {
        let object = Object::new(codepoint::SQLCARD, &b"\x00\x00"[..]);
        assert!(matches!(
            Sqlca::decode(&object),
            Err(ProtocolError::TruncatedPayload { .. })
        ));
    }

    #[test]
    fn test_security_check_table() {
        assert_eq!(security_check_reason(4), Some("invalid user ID or password"));
        assert_eq!(security_check_reason(6), Some("new password required"));
        assert_eq!(security_check_reason(0x42), None);
    }
}
