//! Column descriptor and row-area decoding.
//!
//! Descriptors arrive once per statement (from prepare or open) and are
//! reused for every row of that result set. The row area of a fetch reply
//! holds rows back to back; a deleted-row marker byte may sit between rows
//! in some server variants and is skipped without being mistaken for data.

use crate::error::TypeError;
use crate::fdoca::FdocaType;
use crate::value::SqlValue;

/// Marker byte some servers leave in place of a deleted row.
pub const DELETED_ROW_MARKER: u8 = 0xFF;

/// Sign nibble decoding as negative in packed decimals. Every other nibble
/// value decodes as non-negative; this is not generalized to other
/// packed-decimal sign conventions.
const NEGATIVE_SIGN_NIBBLE: u8 = 0xD;

/// Wire description of one result-set column.
#[derive(Debug, Clone)]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,
    /// Wire data type.
    pub fdoca: FdocaType,
    /// Whether the column carries a 2-byte null indicator before its value.
    pub nullable: bool,
    /// Declared length in bytes (fixed types) or maximum length.
    pub length: u16,
    /// Precision for decimal columns.
    pub precision: u8,
    /// Scale for decimal columns.
    pub scale: u8,
}

/// Decode a SQLDARD descriptor-list payload.
///
/// Layout: `count:u16`, then per column `type:u16` (low bit = nullable),
/// `length:u16, precision:u8, scale:u8, name_len:u16, name`.
pub fn decode_descriptors(payload: &[u8]) -> Result<Vec<ColumnDescriptor>, TypeError> {
    let mut cursor = Cursor::new(payload);
    let count = cursor
        .u16()
        .ok_or(TypeError::DescriptorTruncated { column: 0 })? as usize;

    let mut columns = Vec::with_capacity(count);
    for column in 0..count {
        let truncated = TypeError::DescriptorTruncated { column };
        let wire_code = cursor.u16().ok_or(truncated.clone())?;
        let length = cursor.u16().ok_or(truncated.clone())?;
        let precision = cursor.u8().ok_or(truncated.clone())?;
        let scale = cursor.u8().ok_or(truncated.clone())?;
        let name_len = cursor.u16().ok_or(truncated.clone())? as usize;
        let name_bytes = cursor.take(name_len).ok_or(truncated)?;
        let name = core::str::from_utf8(name_bytes)
            .map_err(|_| TypeError::InvalidUtf8 { column })?
            .to_owned();

        let (fdoca, nullable) = FdocaType::from_wire(wire_code);
        columns.push(ColumnDescriptor {
            name,
            fdoca,
            nullable,
            length,
            precision,
            scale,
        });
    }
    Ok(columns)
}

/// Decodes row areas against a fixed set of column descriptors.
#[derive(Debug)]
pub struct RowDecoder<'a> {
    columns: &'a [ColumnDescriptor],
}

impl<'a> RowDecoder<'a> {
    /// Create a decoder over the given descriptors.
    #[must_use]
    pub fn new(columns: &'a [ColumnDescriptor]) -> Self {
        Self { columns }
    }

    /// Decode every complete row in a row-area buffer.
    ///
    /// A row cut off by the end of the buffer (or by an unknown type whose
    /// length cannot be determined) is discarded, never partially returned;
    /// decoding stops there since later row boundaries are unknowable.
    pub fn decode_block(&self, buf: &[u8]) -> Result<Vec<Vec<SqlValue>>, TypeError> {
        let mut rows = Vec::new();
        let mut cursor = Cursor::new(buf);

        'rows: while !cursor.is_empty() {
            if self.skip_deleted_marker(&mut cursor) {
                continue;
            }

            let mut row = Vec::with_capacity(self.columns.len());
            for (index, column) in self.columns.iter().enumerate() {
                match Self::decode_column(&mut cursor, column, index)? {
                    Some(value) => row.push(value),
                    // Truncated mid-row: discard the partial row and stop.
                    None => break 'rows,
                }
            }
            rows.push(row);
        }

        Ok(rows)
    }

    /// Skip a deleted-row hole at a row boundary.
    ///
    /// A lone `0xFF` cannot begin a row unless the first column is nullable
    /// and the next byte is also `0xFF` (a null indicator), so anything else
    /// starting with `0xFF` is a marker.
    fn skip_deleted_marker(&self, cursor: &mut Cursor<'_>) -> bool {
        if cursor.peek() != Some(DELETED_ROW_MARKER) {
            return false;
        }
        let looks_like_null_indicator = self
            .columns
            .first()
            .is_some_and(|c| c.nullable && cursor.peek_at(1) == Some(DELETED_ROW_MARKER));
        if looks_like_null_indicator {
            return false;
        }
        cursor.skip(1);
        true
    }

    /// Decode one column value, or `None` when the buffer runs out mid-row.
    fn decode_column(
        cursor: &mut Cursor<'_>,
        column: &ColumnDescriptor,
        column_index: usize,
    ) -> Result<Option<SqlValue>, TypeError> {
        if column.nullable {
            let Some(indicator) = cursor.i16() else {
                return Ok(None);
            };
            if indicator == -1 {
                return Ok(Some(SqlValue::Null));
            }
        }

        let value = match column.fdoca {
            FdocaType::SmallInt => cursor.i16().map(SqlValue::SmallInt),
            FdocaType::Integer => cursor.i32().map(SqlValue::Int),
            FdocaType::BigInt => cursor.i64().map(SqlValue::BigInt),
            FdocaType::Float4 => cursor.f32().map(SqlValue::Float),
            FdocaType::Float8 => cursor.f64().map(SqlValue::Double),
            FdocaType::Decimal => match cursor.take(column.length as usize) {
                Some(bytes) => Some(SqlValue::Decimal(decode_packed_decimal(
                    bytes,
                    column.scale,
                )?)),
                None => None,
            },
            FdocaType::FixChar | FdocaType::Date | FdocaType::Time | FdocaType::Timestamp => {
                match cursor.take(column.length as usize) {
                    Some(bytes) => {
                        let text = core::str::from_utf8(bytes).map_err(|_| {
                            TypeError::InvalidUtf8 {
                                column: column_index,
                            }
                        })?;
                        Some(SqlValue::String(text.trim_end_matches(' ').to_owned()))
                    }
                    None => None,
                }
            }
            FdocaType::VarChar => match cursor.u16() {
                Some(len) => match cursor.take(len as usize) {
                    Some(bytes) => {
                        let text = core::str::from_utf8(bytes).map_err(|_| {
                            TypeError::InvalidUtf8 {
                                column: column_index,
                            }
                        })?;
                        Some(SqlValue::String(text.to_owned()))
                    }
                    None => None,
                },
                None => None,
            },
            FdocaType::Blob => match cursor.u32() {
                Some(length) => cursor
                    .take(length as usize)
                    .map(|_| SqlValue::Blob { length }),
                None => None,
            },
            FdocaType::Unknown(_) => {
                // Skip by declared length when known; otherwise the row
                // boundary is lost and the row counts as truncated.
                if column.length > 0 {
                    cursor.take(column.length as usize).map(|_| SqlValue::Opaque)
                } else {
                    None
                }
            }
        };
        Ok(value)
    }
}

/// Decode a packed binary-coded-decimal value into a digit string.
///
/// Each byte but the last holds two digits in its nibbles; the last byte
/// holds the final digit and the sign nibble. The declared scale positions
/// the decimal point from the right, tolerating `scale >= digit count`
/// (producing a `0.xxx` form) and scale 0 (no point).
pub fn decode_packed_decimal(bytes: &[u8], scale: u8) -> Result<String, TypeError> {
    let Some((&last, body)) = bytes.split_last() else {
        return Ok("0".to_owned());
    };

    let mut digits = String::with_capacity(bytes.len() * 2);
    for &byte in body {
        digits.push(digit(byte >> 4)?);
        digits.push(digit(byte & 0x0F)?);
    }
    digits.push(digit(last >> 4)?);
    let negative = last & 0x0F == NEGATIVE_SIGN_NIBBLE;

    let scale = scale as usize;
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    if scale == 0 {
        out.push_str(trim_leading_zeros(&digits));
    } else if scale >= digits.len() {
        out.push_str("0.");
        for _ in 0..scale - digits.len() {
            out.push('0');
        }
        out.push_str(&digits);
    } else {
        let split = digits.len() - scale;
        out.push_str(trim_leading_zeros(&digits[..split]));
        out.push('.');
        out.push_str(&digits[split..]);
    }
    Ok(out)
}

fn digit(nibble: u8) -> Result<char, TypeError> {
    if nibble > 9 {
        return Err(TypeError::InvalidDecimalDigit(nibble));
    }
    Ok((b'0' + nibble) as char)
}

fn trim_leading_zeros(digits: &str) -> &str {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() { "0" } else { trimmed }
}

/// Bounds-checked big-endian reader over a byte slice.
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.buf.get(self.pos + ahead).copied()
    }

    fn skip(&mut self, n: usize) {
        self.pos += n;
    }

    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        if end > self.buf.len() {
            return None;
        }
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Some(slice)
    }

    fn u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    fn u16(&mut self) -> Option<u16> {
        self.take(2).map(|b| u16::from_be_bytes([b[0], b[1]]))
    }

    fn i16(&mut self) -> Option<i16> {
        self.take(2).map(|b| i16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Option<u32> {
        self.take(4)
            .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn i32(&mut self) -> Option<i32> {
        self.take(4)
            .map(|b| i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn i64(&mut self) -> Option<i64> {
        self.take(8).map(|b| {
            i64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
        })
    }

    fn f32(&mut self) -> Option<f32> {
        self.take(4)
            .map(|b| f32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn f64(&mut self) -> Option<f64> {
        self.take(8).map(|b| {
            f64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn col(fdoca: FdocaType, nullable: bool, length: u16, scale: u8) -> ColumnDescriptor {
        ColumnDescriptor {
            name: "C".into(),
            fdoca,
            nullable,
            length,
            precision: 0,
            scale,
        }
    }

    #[test]
    fn test_packed_decimal_negative_with_scale() {
        assert_eq!(decode_packed_decimal(&[0x12, 0x3D], 1).unwrap(), "-12.3");
        assert_eq!(decode_packed_decimal(&[0x12, 0x3D], 0).unwrap(), "-123");
    }

    #[test]
    fn test_packed_decimal_scale_exceeds_digits() {
        // Digits "001", scale 5 -> 0.00001.
        assert_eq!(decode_packed_decimal(&[0x00, 0x1C], 5).unwrap(), "0.00001");
    }

    #[test]
    fn test_packed_decimal_nontraditional_sign_nibbles_are_positive() {
        // 0xF and 0xC both decode as non-negative; only 0xD is negative.
        assert_eq!(decode_packed_decimal(&[0x12, 0x3F], 1).unwrap(), "12.3");
        assert_eq!(decode_packed_decimal(&[0x12, 0x3C], 1).unwrap(), "12.3");
    }

    #[test]
    fn test_packed_decimal_rejects_bad_digit_nibble() {
        assert!(matches!(
            decode_packed_decimal(&[0xA2, 0x3C], 0),
            Err(TypeError::InvalidDecimalDigit(0xA))
        ));
    }

    #[test]
    fn test_decode_integer_row() {
        let columns = [col(FdocaType::Integer, false, 4, 0)];
        let rows = RowDecoder::new(&columns)
            .decode_block(&[0x00, 0x00, 0x00, 0x2A])
            .unwrap();
        assert_eq!(rows, vec![vec![SqlValue::Int(42)]]);
    }

    #[test]
    fn test_null_indicator_consumes_no_payload() {
        let columns = [
            col(FdocaType::Integer, true, 4, 0),
            col(FdocaType::SmallInt, false, 2, 0),
        ];
        // Null INTEGER (indicator -1, no payload) then SMALLINT 7.
        let rows = RowDecoder::new(&columns)
            .decode_block(&[0xFF, 0xFF, 0x00, 0x07])
            .unwrap();
        assert_eq!(rows, vec![vec![SqlValue::Null, SqlValue::SmallInt(7)]]);
    }

    #[test]
    fn test_varchar_and_fixchar() {
        let columns = [
            col(FdocaType::VarChar, false, 20, 0),
            col(FdocaType::FixChar, false, 4, 0),
        ];
        let mut buf = vec![0x00, 0x02];
        buf.extend_from_slice(b"hi");
        buf.extend_from_slice(b"ab  ");
        let rows = RowDecoder::new(&columns).decode_block(&buf).unwrap();
        assert_eq!(
            rows,
            vec![vec![
                SqlValue::String("hi".into()),
                SqlValue::String("ab".into()),
            ]]
        );
    }

    #[test]
    fn test_partial_row_discarded() {
        let columns = [
            col(FdocaType::Integer, false, 4, 0),
            col(FdocaType::Integer, false, 4, 0),
        ];
        // One full row, then a row cut off after its first column.
        let buf = [
            0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02, // row 1
            0x00, 0x00, 0x00, 0x03, // row 2, truncated
        ];
        let rows = RowDecoder::new(&columns).decode_block(&buf).unwrap();
        assert_eq!(rows, vec![vec![SqlValue::Int(1), SqlValue::Int(2)]]);
    }

    #[test]
    fn test_deleted_row_marker_skipped() {
        let columns = [col(FdocaType::SmallInt, false, 2, 0)];
        let buf = [0x00, 0x01, 0xFF, 0x00, 0x02];
        let rows = RowDecoder::new(&columns).decode_block(&buf).unwrap();
        assert_eq!(
            rows,
            vec![vec![SqlValue::SmallInt(1)], vec![SqlValue::SmallInt(2)]]
        );
    }

    #[test]
    fn test_marker_not_confused_with_null_indicator() {
        let columns = [col(FdocaType::SmallInt, true, 2, 0)];
        // 0xFF 0xFF is a null indicator here, not a deleted-row marker.
        let rows = RowDecoder::new(&columns)
            .decode_block(&[0xFF, 0xFF, 0x00, 0x00, 0x00, 0x09])
            .unwrap();
        assert_eq!(
            rows,
            vec![vec![SqlValue::Null], vec![SqlValue::SmallInt(9)]]
        );
    }

    #[test]
    fn test_unknown_type_skipped_by_declared_length() {
        let columns = [
            col(FdocaType::Unknown(0x7E), false, 3, 0),
            col(FdocaType::SmallInt, false, 2, 0),
        ];
        let rows = RowDecoder::new(&columns)
            .decode_block(&[0xAA, 0xBB, 0xCC, 0x00, 0x05])
            .unwrap();
        assert_eq!(rows, vec![vec![SqlValue::Opaque, SqlValue::SmallInt(5)]]);
    }

    #[test]
    fn test_unknown_type_without_length_stops_block() {
        let columns = [col(FdocaType::Unknown(0x7E), false, 0, 0)];
        let rows = RowDecoder::new(&columns)
            .decode_block(&[0xAA, 0xBB])
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_blob_surfaces_length_and_advances() {
        let columns = [
            col(FdocaType::Blob, false, 0, 0),
            col(FdocaType::SmallInt, false, 2, 0),
        ];
        let buf = [0x00, 0x00, 0x00, 0x03, 0x01, 0x02, 0x03, 0x00, 0x04];
        let rows = RowDecoder::new(&columns).decode_block(&buf).unwrap();
        assert_eq!(
            rows,
            vec![vec![SqlValue::Blob { length: 3 }, SqlValue::SmallInt(4)]]
        );
    }

    #[test]
    fn test_descriptor_roundtrip() {
        use crate::fdoca::wire;
        let mut payload = Vec::new();
        payload.extend_from_slice(&2u16.to_be_bytes());
        // INTEGER NOT NULL, length 4
        payload.extend_from_slice(&wire::INTEGER.to_be_bytes());
        payload.extend_from_slice(&4u16.to_be_bytes());
        payload.push(0);
        payload.push(0);
        payload.extend_from_slice(&2u16.to_be_bytes());
        payload.extend_from_slice(b"ID");
        // Nullable DECIMAL(5,2), 3 bytes packed
        payload.extend_from_slice(&(wire::DECIMAL | 1).to_be_bytes());
        payload.extend_from_slice(&3u16.to_be_bytes());
        payload.push(5);
        payload.push(2);
        payload.extend_from_slice(&5u16.to_be_bytes());
        payload.extend_from_slice(b"PRICE");

        let columns = decode_descriptors(&payload).unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].name, "ID");
        assert_eq!(columns[0].fdoca, FdocaType::Integer);
        assert!(!columns[0].nullable);
        assert_eq!(columns[1].name, "PRICE");
        assert_eq!(columns[1].fdoca, FdocaType::Decimal);
        assert!(columns[1].nullable);
        assert_eq!(columns[1].scale, 2);
    }

    #[test]
    fn test_descriptor_truncation_detected() {
        let payload = [0x00, 0x02, 0x00, 0x02];
        assert!(matches!(
            decode_descriptors(&payload),
            Err(TypeError::DescriptorTruncated { column: 0 })
        ));
    }
}
