//! Wire encoders and descriptor helpers for scripting mock replies.
//!
//! These are the inverse of the `db2-types` decoders: descriptor areas,
//! row blocks, and packed decimals laid out exactly as the client expects
//! to read them.

use bytes::{BufMut, Bytes, BytesMut};
use db2_types::decode::ColumnDescriptor;
use db2_types::{FdocaType, SqlValue};

/// INTEGER NOT NULL column.
pub fn int_col(name: impl Into<String>) -> ColumnDescriptor {
    column(name, FdocaType::Integer, false, 4, 0, 0)
}

/// Nullable INTEGER column.
pub fn nullable_int_col(name: impl Into<String>) -> ColumnDescriptor {
    column(name, FdocaType::Integer, true, 4, 0, 0)
}

/// SMALLINT NOT NULL column.
pub fn smallint_col(name: impl Into<String>) -> ColumnDescriptor {
    column(name, FdocaType::SmallInt, false, 2, 0, 0)
}

/// BIGINT NOT NULL column.
pub fn bigint_col(name: impl Into<String>) -> ColumnDescriptor {
    column(name, FdocaType::BigInt, false, 8, 0, 0)
}

/// DOUBLE NOT NULL column.
pub fn double_col(name: impl Into<String>) -> ColumnDescriptor {
    column(name, FdocaType::Float8, false, 8, 0, 0)
}

/// Nullable VARCHAR column with the given maximum length.
pub fn varchar_col(name: impl Into<String>, max_length: u16) -> ColumnDescriptor {
    column(name, FdocaType::VarChar, true, max_length, 0, 0)
}

/// DECIMAL(precision, scale) NOT NULL column. The byte length follows the
/// packed layout: two digits per byte plus the sign nibble.
pub fn decimal_col(name: impl Into<String>, precision: u8, scale: u8) -> ColumnDescriptor {
    let length = u16::from(precision) / 2 + 1;
    column(name, FdocaType::Decimal, false, length, precision, scale)
}

/// Build an arbitrary column descriptor.
pub fn column(
    name: impl Into<String>,
    fdoca: FdocaType,
    nullable: bool,
    length: u16,
    precision: u8,
    scale: u8,
) -> ColumnDescriptor {
    ColumnDescriptor {
        name: name.into(),
        fdoca,
        nullable,
        length,
        precision,
        scale,
    }
}

/// Encode a SQLDARD descriptor-list payload.
pub fn encode_descriptors(columns: &[ColumnDescriptor]) -> Bytes {
    let mut buf = BytesMut::new();
    buf.put_u16(columns.len() as u16);
    for col in columns {
        let mut code = col.fdoca.wire_code();
        if col.nullable {
            code |= 1;
        }
        buf.put_u16(code);
        buf.put_u16(col.length);
        buf.put_u8(col.precision);
        buf.put_u8(col.scale);
        buf.put_u16(col.name.len() as u16);
        buf.put_slice(col.name.as_bytes());
    }
    buf.freeze()
}

/// Encode a QRYDTA row-area payload for the given rows.
pub fn encode_row_block(columns: &[ColumnDescriptor], rows: &[Vec<SqlValue>]) -> Bytes {
    let mut buf = BytesMut::new();
    for row in rows {
        for (col, value) in columns.iter().zip(row) {
            encode_value(col, value, &mut buf);
        }
    }
    buf.freeze()
}

fn encode_value(col: &ColumnDescriptor, value: &SqlValue, buf: &mut BytesMut) {
    if col.nullable {
        if matches!(value, SqlValue::Null) {
            buf.put_i16(-1);
            return;
        }
        buf.put_i16(0);
    }

    match (&col.fdoca, value) {
        (FdocaType::SmallInt, SqlValue::SmallInt(v)) => buf.put_i16(*v),
        (FdocaType::SmallInt, SqlValue::Int(v)) => buf.put_i16(*v as i16),
        (FdocaType::Integer, SqlValue::Int(v)) => buf.put_i32(*v),
        (FdocaType::BigInt, SqlValue::BigInt(v)) => buf.put_i64(*v),
        (FdocaType::BigInt, SqlValue::Int(v)) => buf.put_i64(i64::from(*v)),
        (FdocaType::Float4, SqlValue::Float(v)) => buf.put_f32(*v),
        (FdocaType::Float8, SqlValue::Double(v)) => buf.put_f64(*v),
        (FdocaType::VarChar, SqlValue::String(s)) => {
            buf.put_u16(s.len() as u16);
            buf.put_slice(s.as_bytes());
        }
        (
            FdocaType::FixChar | FdocaType::Date | FdocaType::Time | FdocaType::Timestamp,
            SqlValue::String(s),
        ) => {
            let width = col.length as usize;
            let mut field = vec![b' '; width];
            let take = s.len().min(width);
            field[..take].copy_from_slice(&s.as_bytes()[..take]);
            buf.put_slice(&field);
        }
        (FdocaType::Decimal, SqlValue::Decimal(s) | SqlValue::String(s)) => {
            buf.put_slice(&encode_packed_decimal(s, col.length, col.scale));
        }
        (FdocaType::Blob, SqlValue::Blob { length }) => {
            buf.put_u32(*length);
            buf.put_bytes(0, *length as usize);
        }
        // A value that does not fit its column is a scripting mistake;
        // emit zero bytes of the declared width so the row stays aligned.
        _ => buf.put_bytes(0, col.length as usize),
    }
}

/// Pack a decimal digit string (optionally signed, optionally with a
/// decimal point) into `byte_len` packed-BCD bytes at the given scale.
pub fn encode_packed_decimal(value: &str, byte_len: u16, scale: u8) -> Vec<u8> {
    let (negative, rest) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };
    let (int_part, frac_part) = match rest.split_once('.') {
        Some((i, f)) => (i, f),
        None => (rest, ""),
    };

    // Align the fraction to the declared scale.
    let mut digits: Vec<u8> = Vec::new();
    for c in int_part.chars().chain(frac_part.chars()) {
        digits.push(c.to_digit(10).unwrap_or(0) as u8);
    }
    for _ in frac_part.len()..scale as usize {
        digits.push(0);
    }

    // Left-pad to the field's digit capacity (two per byte minus the sign).
    let capacity = byte_len as usize * 2 - 1;
    while digits.len() < capacity {
        digits.insert(0, 0);
    }
    digits.truncate(capacity);

    let mut out = Vec::with_capacity(byte_len as usize);
    for pair in digits[..capacity - 1].chunks(2) {
        out.push((pair[0] << 4) | pair[1]);
    }
    let sign = if negative { 0xD } else { 0xC };
    out.push((digits[capacity - 1] << 4) | sign);
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use db2_types::decode::{RowDecoder, decode_descriptors};

    #[test]
    fn test_descriptors_roundtrip_through_client_decoder() {
        let columns = vec![int_col("ID"), varchar_col("NAME", 40), decimal_col("PRICE", 5, 2)];
        let decoded = decode_descriptors(&encode_descriptors(&columns)).unwrap();
        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded[0].name, "ID");
        assert!(!decoded[0].nullable);
        assert!(decoded[1].nullable);
        assert_eq!(decoded[2].scale, 2);
    }

    #[test]
    fn test_row_block_roundtrip_through_client_decoder() {
        let columns = vec![int_col("ID"), varchar_col("NAME", 40)];
        let rows = vec![
            vec![SqlValue::Int(1), SqlValue::String("alice".into())],
            vec![SqlValue::Int(2), SqlValue::Null],
        ];
        let block = encode_row_block(&columns, &rows);
        let decoded = RowDecoder::new(&columns).decode_block(&block).unwrap();
        assert_eq!(decoded, rows);
    }

    #[test]
    fn test_packed_decimal_matches_decoder_contract() {
        // "-12.3" at scale 1 in 2 bytes is 0x12 0x3D.
        assert_eq!(encode_packed_decimal("-12.3", 2, 1), vec![0x12, 0x3D]);
        assert_eq!(encode_packed_decimal("123", 2, 0), vec![0x12, 0x3C]);
    }

    #[test]
    fn test_packed_decimal_pads_fraction_to_scale() {
        // "4.5" at scale 2 means digits 450.
        assert_eq!(encode_packed_decimal("4.5", 2, 2), vec![0x45, 0x0C]);
    }
}
