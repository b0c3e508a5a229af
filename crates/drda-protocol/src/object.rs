//! DDM object tree codec.
//!
//! A DDM object is a 4-byte header (`length:u16`, `code_point:u16`, length
//! counting the header) followed by a payload. Payloads are either raw
//! scalar bytes or a sequence of nested objects; the wire format does not
//! distinguish the two, so the parser exposes children whenever the payload
//! tiles exactly into well-formed objects and keeps the raw bytes either way.
//! Unknown code points are preserved as opaque nodes so callers can traverse
//! past them to siblings they do recognize.

use bytes::{BufMut, Bytes, BytesMut};

use crate::codepoint;
use crate::dss::{DSS_HEADER_SIZE, DssHeader};
use crate::error::ProtocolError;

/// Object header size: `length:u16` plus `code_point:u16`.
pub const OBJECT_HEADER_SIZE: usize = 4;

/// Nesting limit for recursive payload expansion.
const MAX_DEPTH: usize = 16;

/// A parsed DDM object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    /// The 16-bit code point tagging this object's meaning.
    pub code_point: u16,
    /// Raw payload bytes (always present, even when children are exposed).
    pub payload: Bytes,
    /// Nested child objects, when the payload tiles exactly into them.
    pub children: Vec<Object>,
}

impl Object {
    /// Create a scalar object from raw payload bytes.
    #[must_use]
    pub fn new(code_point: u16, payload: impl Into<Bytes>) -> Self {
        Self {
            code_point,
            payload: payload.into(),
            children: Vec::new(),
        }
    }

    /// Find the first object with the given code point, searching this node
    /// and its descendants depth-first.
    #[must_use]
    pub fn find(&self, code_point: u16) -> Option<&Object> {
        if self.code_point == code_point {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(code_point))
    }

    /// Human-readable code-point name for diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        codepoint::name(self.code_point).unwrap_or("?")
    }

    /// Payload as a single byte.
    pub fn as_u8(&self) -> Result<u8, ProtocolError> {
        self.fixed::<1>().map(|b| b[0])
    }

    /// Payload as a big-endian u16.
    pub fn as_u16(&self) -> Result<u16, ProtocolError> {
        self.fixed::<2>().map(u16::from_be_bytes)
    }

    /// Payload as a big-endian u32.
    pub fn as_u32(&self) -> Result<u32, ProtocolError> {
        self.fixed::<4>().map(u32::from_be_bytes)
    }

    /// Payload as a UTF-8 string, with trailing spaces trimmed (DRDA pads
    /// fixed-width name fields with blanks).
    pub fn as_text(&self) -> Result<&str, ProtocolError> {
        let text = core::str::from_utf8(&self.payload)
            .map_err(|_| ProtocolError::InvalidUtf8(self.name()))?;
        Ok(text.trim_end_matches(' '))
    }

    fn fixed<const N: usize>(&self) -> Result<[u8; N], ProtocolError> {
        let bytes: &[u8] = &self.payload;
        bytes
            .try_into()
            .map_err(|_| ProtocolError::TruncatedPayload {
                object: self.name(),
                expected: N,
                actual: self.payload.len(),
            })
    }
}

/// Parse a single object from the front of `buf`.
///
/// Returns the object and the number of bytes consumed, or `None` when the
/// buffer ends before the declared length (the caller reads more bytes).
fn parse_one(buf: &Bytes, depth: usize) -> Result<Option<(Object, usize)>, ProtocolError> {
    if buf.len() < OBJECT_HEADER_SIZE {
        return Ok(None);
    }
    let length = u16::from_be_bytes([buf[0], buf[1]]) as usize;
    if length < OBJECT_HEADER_SIZE {
        return Err(ProtocolError::ObjectTooShort {
            length: length as u16,
        });
    }
    if buf.len() < length {
        return Ok(None);
    }
    let code_point = u16::from_be_bytes([buf[2], buf[3]]);
    let payload = buf.slice(OBJECT_HEADER_SIZE..length);
    let children = parse_children(&payload, depth + 1)?;

    Ok(Some((
        Object {
            code_point,
            payload,
            children,
        },
        length,
    )))
}

/// Attempt to expand a payload into nested children.
///
/// Children are exposed only when the payload tiles *exactly* into
/// well-formed objects; any leftover byte, short object, or impossible
/// length means the payload is scalar data and the node stays opaque.
fn parse_children(payload: &Bytes, depth: usize) -> Result<Vec<Object>, ProtocolError> {
    if payload.is_empty() {
        return Ok(Vec::new());
    }
    if depth > MAX_DEPTH {
        return Err(ProtocolError::DepthExceeded(MAX_DEPTH));
    }

    let mut children = Vec::new();
    let mut rest = payload.clone();
    while !rest.is_empty() {
        if rest.len() < OBJECT_HEADER_SIZE {
            return Ok(Vec::new());
        }
        let length = u16::from_be_bytes([rest[0], rest[1]]) as usize;
        if length < OBJECT_HEADER_SIZE || length > rest.len() {
            // Not a valid tiling; treat the payload as scalar bytes.
            return Ok(Vec::new());
        }
        match parse_one(&rest, depth)? {
            Some((child, consumed)) => {
                children.push(child);
                rest = rest.slice(consumed..);
            }
            None => return Ok(Vec::new()),
        }
    }
    Ok(children)
}

/// Parse the objects of one or more chained DSS frames.
///
/// Walks every frame whose bytes are fully present and expands its payload
/// into objects. When a length field would read past the end of the buffer
/// the walk stops and the objects parsed so far are returned; callers use
/// [`crate::dss::chain_complete`] to know when no more bytes are coming.
/// Structurally impossible lengths are errors, never silently clamped.
pub fn parse_objects(buf: &[u8]) -> Result<Vec<Object>, ProtocolError> {
    let buf = Bytes::copy_from_slice(buf);
    let mut objects = Vec::new();
    let mut offset = 0;

    while buf.len() >= offset + DSS_HEADER_SIZE {
        let mut cursor = &buf[offset..];
        let header = DssHeader::decode(&mut cursor)?;
        let end = offset + header.length as usize;
        if buf.len() < end {
            break;
        }
        let mut body = buf.slice(offset + DSS_HEADER_SIZE..end);
        while !body.is_empty() {
            match parse_one(&body, 0)? {
                Some((object, consumed)) => {
                    objects.push(object);
                    body = body.slice(consumed..);
                }
                None => break,
            }
        }
        offset = end;
    }

    Ok(objects)
}

/// Find the first object with a given code point across a parsed reply.
#[must_use]
pub fn find<'a>(objects: &'a [Object], code_point: u16) -> Option<&'a Object> {
    objects.iter().find_map(|o| o.find(code_point))
}

/// Builder for object parameters, computing length fields bottom-up.
///
/// Child lengths must be known before a parent's length can be written, so
/// each variant reports its encoded size before serialization.
#[derive(Debug, Clone)]
pub enum Param {
    /// UTF-8 string payload.
    Str(u16, String),
    /// Single-byte payload.
    U8(u16, u8),
    /// Big-endian u16 payload.
    U16(u16, u16),
    /// Big-endian u32 payload.
    U32(u16, u32),
    /// Raw byte payload.
    Bytes(u16, Bytes),
    /// Nested composite of further parameters.
    Composite(u16, Vec<Param>),
}

impl Param {
    /// Total encoded size including the 4-byte object header.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        OBJECT_HEADER_SIZE
            + match self {
                Self::Str(_, s) => s.len(),
                Self::U8(..) => 1,
                Self::U16(..) => 2,
                Self::U32(..) => 4,
                Self::Bytes(_, b) => b.len(),
                Self::Composite(_, params) => params.iter().map(Param::encoded_len).sum(),
            }
    }

    /// Serialize this parameter as one object.
    pub fn encode(&self, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        let length = self.encoded_len();
        if length > u16::MAX as usize {
            return Err(ProtocolError::ValueTooLarge("object"));
        }
        dst.put_u16(length as u16);
        dst.put_u16(self.code_point());
        match self {
            Self::Str(_, s) => dst.put_slice(s.as_bytes()),
            Self::U8(_, v) => dst.put_u8(*v),
            Self::U16(_, v) => dst.put_u16(*v),
            Self::U32(_, v) => dst.put_u32(*v),
            Self::Bytes(_, b) => dst.put_slice(b),
            Self::Composite(_, params) => {
                for param in params {
                    param.encode(dst)?;
                }
            }
        }
        Ok(())
    }

    /// The code point this parameter encodes under.
    #[must_use]
    pub fn code_point(&self) -> u16 {
        match self {
            Self::Str(cp, _)
            | Self::U8(cp, _)
            | Self::U16(cp, _)
            | Self::U32(cp, _)
            | Self::Bytes(cp, _)
            | Self::Composite(cp, _) => *cp,
        }
    }
}

/// Encode a top-level object (code point plus parameters) to bytes.
pub fn encode_object(code_point: u16, params: Vec<Param>) -> Result<Bytes, ProtocolError> {
    let root = Param::Composite(code_point, params);
    let mut buf = BytesMut::with_capacity(root.encoded_len());
    root.encode(&mut buf)?;
    Ok(buf.freeze())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::dss::{DssFlags, DssKind, encode_frame};

    fn reply_frame(object: Bytes) -> Bytes {
        encode_frame(DssKind::Reply, DssFlags::empty(), 1, &object).unwrap()
    }

    #[test]
    fn test_scalar_roundtrip() {
        let encoded = encode_object(0x115E, vec![]).unwrap();
        let frame = reply_frame(encoded);
        let objects = parse_objects(&frame).unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].code_point, 0x115E);
        assert!(objects[0].payload.is_empty());
    }

    #[test]
    fn test_nested_roundtrip_preserves_parameter_bytes() {
        let encoded = encode_object(
            codepoint::EXCSATRD,
            vec![
                Param::Str(codepoint::SRVNAM, "testdb".into()),
                Param::Composite(
                    codepoint::MGRLVLLS,
                    vec![
                        Param::U16(codepoint::AGENT, 7),
                        Param::U16(codepoint::SQLAM, 7),
                    ],
                ),
            ],
        )
        .unwrap();
        let frame = reply_frame(encoded);

        let objects = parse_objects(&frame).unwrap();
        assert_eq!(objects.len(), 1);
        let root = &objects[0];
        assert_eq!(root.code_point, codepoint::EXCSATRD);
        assert_eq!(root.children.len(), 2);

        let srvnam = root.find(codepoint::SRVNAM).unwrap();
        assert_eq!(srvnam.as_text().unwrap(), "testdb");

        let sqlam = root.find(codepoint::SQLAM).unwrap();
        assert_eq!(sqlam.as_u16().unwrap(), 7);
    }

    #[test]
    fn test_unknown_code_point_is_traversable() {
        let encoded = encode_object(
            codepoint::EXCSATRD,
            vec![
                Param::Bytes(0xBEEF, Bytes::from_static(&[1, 2, 3])),
                Param::Str(codepoint::SRVCLSNM, "QDB2/LINUX".into()),
            ],
        )
        .unwrap();
        let frame = reply_frame(encoded);

        let objects = parse_objects(&frame).unwrap();
        let root = &objects[0];
        // The opaque sibling is preserved, and the known one still found.
        assert!(root.find(0xBEEF).is_some());
        assert_eq!(
            root.find(codepoint::SRVCLSNM).unwrap().as_text().unwrap(),
            "QDB2/LINUX"
        );
    }

    #[test]
    fn test_partial_buffer_returns_partial_result() {
        let first = reply_frame(encode_object(codepoint::SQLCARD, vec![]).unwrap());
        let second = reply_frame(
            encode_object(
                codepoint::EXCSATRD,
                vec![Param::Str(codepoint::SRVNAM, "x".into())],
            )
            .unwrap(),
        );

        let mut buf = BytesMut::new();
        buf.extend_from_slice(&first);
        buf.extend_from_slice(&second[..second.len() - 2]);

        let objects = parse_objects(&buf).unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].code_point, codepoint::SQLCARD);
    }

    #[test]
    fn test_object_shorter_than_header_rejected() {
        // Object declaring length 2 inside a well-formed frame.
        let bogus = Bytes::from_static(&[0x00, 0x02, 0x11, 0x5E]);
        let frame = reply_frame(bogus);
        assert!(matches!(
            parse_objects(&frame),
            Err(ProtocolError::ObjectTooShort { length: 2 })
        ));
    }

    #[test]
    fn test_scalar_payload_not_mistaken_for_children() {
        // Payload bytes that happen to start with a plausible length but do
        // not tile exactly must stay scalar.
        let object = encode_object(
            codepoint::SQLSTT,
            vec![Param::Str(codepoint::SQLSTT, "SELECT 1 FROM SYSIBM.SYSDUMMY1".into())],
        )
        .unwrap();
        let frame = reply_frame(object);
        let objects = parse_objects(&frame).unwrap();
        let inner = &objects[0].children[0];
        assert!(inner.children.is_empty());
        assert_eq!(inner.as_text().unwrap(), "SELECT 1 FROM SYSIBM.SYSDUMMY1");
    }
}
