//! Typed parameter encoding for prepared execution.
//!
//! Each value is marshaled as a 2-byte null indicator followed by the typed
//! payload; the order is mandatory, since servers verify parameter counts
//! and lengths at the protocol level rather than at parse time.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::TypeError;
use crate::value::SqlValue;

/// Null indicator value marking an absent payload.
const NULL_INDICATOR: u16 = 0xFFFF;

/// Null indicator value preceding a present payload.
const PRESENT_INDICATOR: u16 = 0x0000;

/// Encode a parameter list into an SQLDTA payload.
///
/// Wire contract per value:
/// - null: indicator `0xFFFF`, no payload
/// - text: u16 length prefix then UTF-8 bytes
/// - whole numbers: 4-byte big-endian, or 8-byte outside the i32 range
/// - booleans: 2-byte integer
/// - any other numeric: 8-byte big-endian IEEE-754
pub fn encode_params(params: &[SqlValue]) -> Result<Bytes, TypeError> {
    let mut buf = BytesMut::new();
    for (index, value) in params.iter().enumerate() {
        if value.is_null() {
            buf.put_u16(NULL_INDICATOR);
            continue;
        }
        buf.put_u16(PRESENT_INDICATOR);
        match value {
            SqlValue::Null => {}
            SqlValue::String(text) | SqlValue::Decimal(text) => {
                if text.len() > u16::MAX as usize {
                    return Err(TypeError::ValueTooLarge("text parameter"));
                }
                buf.put_u16(text.len() as u16);
                buf.put_slice(text.as_bytes());
            }
            SqlValue::Bool(v) => buf.put_u16(u16::from(*v)),
            SqlValue::SmallInt(v) => buf.put_i32(i32::from(*v)),
            SqlValue::Int(v) => buf.put_i32(*v),
            SqlValue::BigInt(v) => {
                if let Ok(narrow) = i32::try_from(*v) {
                    buf.put_i32(narrow);
                } else {
                    buf.put_i64(*v);
                }
            }
            SqlValue::Float(v) => buf.put_f64(f64::from(*v)),
            SqlValue::Double(v) => buf.put_f64(*v),
            SqlValue::Blob { .. } | SqlValue::Opaque => {
                return Err(TypeError::UnsupportedParameter {
                    index,
                    reason: "only null, text, numeric, and boolean parameters are marshalable",
                });
            }
        }
    }
    Ok(buf.freeze())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_null_is_indicator_only() {
        let bytes = encode_params(&[SqlValue::Null]).unwrap();
        assert_eq!(&bytes[..], &[0xFF, 0xFF]);
    }

    #[test]
    fn test_text_is_length_prefixed_after_indicator() {
        let bytes = encode_params(&[SqlValue::String("ab".into())]).unwrap();
        assert_eq!(&bytes[..], &[0x00, 0x00, 0x00, 0x02, b'a', b'b']);
    }

    #[test]
    fn test_small_whole_numbers_use_four_bytes() {
        let bytes = encode_params(&[SqlValue::BigInt(42)]).unwrap();
        assert_eq!(&bytes[..], &[0x00, 0x00, 0x00, 0x00, 0x00, 0x2A]);
    }

    #[test]
    fn test_wide_whole_numbers_use_eight_bytes() {
        let value = i64::from(i32::MAX) + 1;
        let bytes = encode_params(&[SqlValue::BigInt(value)]).unwrap();
        assert_eq!(bytes.len(), 2 + 8);
        assert_eq!(&bytes[2..], &value.to_be_bytes());
    }

    #[test]
    fn test_bool_is_two_byte_integer() {
        let bytes = encode_params(&[SqlValue::Bool(true), SqlValue::Bool(false)]).unwrap();
        assert_eq!(&bytes[..], &[0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_other_numerics_are_f64() {
        let bytes = encode_params(&[SqlValue::Double(1.5)]).unwrap();
        assert_eq!(bytes.len(), 2 + 8);
        assert_eq!(&bytes[2..], &1.5f64.to_be_bytes());
    }

    #[test]
    fn test_mixed_order_is_preserved() {
        let bytes = encode_params(&[
            SqlValue::Int(1),
            SqlValue::Null,
            SqlValue::String("x".into()),
        ])
        .unwrap();
        assert_eq!(
            &bytes[..],
            &[
                0x00, 0x00, 0x00, 0x00, 0x00, 0x01, // int 1
                0xFF, 0xFF, // null
                0x00, 0x00, 0x00, 0x01, b'x', // "x"
            ]
        );
    }
}
