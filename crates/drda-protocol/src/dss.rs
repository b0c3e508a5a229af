//! DSS (Data Stream Structure) frame header.
//!
//! Every DRDA message on the wire is one or more DSS frames. A frame is a
//! 6-byte header followed by the payload; the header's length field counts
//! the header itself. Frames sharing one correlation id are chained (the
//! `CHAINED` format bit set on every frame but the last) to form a single
//! logical exchange.

use bitflags::bitflags;
use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::ProtocolError;

/// DSS header size in bytes.
pub const DSS_HEADER_SIZE: usize = 6;

/// DSS magic byte, fixed for every frame.
pub const DSS_MAGIC: u8 = 0xD0;

/// Structure kind carried in the low nibble of the format byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DssKind {
    /// Request DSS (client to server command).
    Request = 0x1,
    /// Reply DSS (server to client reply message).
    Reply = 0x2,
    /// Object DSS (data carried alongside a request or reply).
    Object = 0x3,
}

impl DssKind {
    /// Create a structure kind from the low nibble of a format byte.
    pub fn from_nibble(value: u8) -> Result<Self, ProtocolError> {
        match value & 0x0F {
            0x1 => Ok(Self::Request),
            0x2 => Ok(Self::Reply),
            0x3 => Ok(Self::Object),
            other => Err(ProtocolError::InvalidKind(other)),
        }
    }
}

bitflags! {
    /// DSS format byte flags (high nibble).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DssFlags: u8 {
        /// Another DSS of the same exchange follows this one.
        const CHAINED = 0x40;
        /// The next chained DSS carries the same correlation id.
        const SAME_CORRELATION = 0x10;
    }
}

/// DSS frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DssHeader {
    /// Total frame length including this header.
    pub length: u16,
    /// Structure kind.
    pub kind: DssKind,
    /// Format flags.
    pub flags: DssFlags,
    /// Correlation id linking requests to replies.
    pub correlation_id: u16,
}

impl DssHeader {
    /// Create a new header. The length field is filled in by the encoder.
    #[must_use]
    pub const fn new(kind: DssKind, flags: DssFlags, correlation_id: u16) -> Self {
        Self {
            length: DSS_HEADER_SIZE as u16,
            kind,
            flags,
            correlation_id,
        }
    }

    /// Parse a header from the front of a buffer.
    pub fn decode(src: &mut impl Buf) -> Result<Self, ProtocolError> {
        debug_assert!(src.remaining() >= DSS_HEADER_SIZE);

        let length = src.get_u16();
        if (length as usize) < DSS_HEADER_SIZE {
            return Err(ProtocolError::FrameTooShort {
                length,
                header: DSS_HEADER_SIZE,
            });
        }
        let magic = src.get_u8();
        if magic != DSS_MAGIC {
            return Err(ProtocolError::BadMagic(magic));
        }
        let format = src.get_u8();
        let kind = DssKind::from_nibble(format)?;
        let flags = DssFlags::from_bits_truncate(format);
        let correlation_id = src.get_u16();

        Ok(Self {
            length,
            kind,
            flags,
            correlation_id,
        })
    }

    /// Encode the header.
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_u16(self.length);
        dst.put_u8(DSS_MAGIC);
        dst.put_u8(self.kind as u8 | self.flags.bits());
        dst.put_u16(self.correlation_id);
    }

    /// Whether more frames of this exchange follow.
    #[must_use]
    pub const fn is_chained(&self) -> bool {
        self.flags.contains(DssFlags::CHAINED)
    }

    /// Payload length (total length minus the header).
    #[must_use]
    pub const fn payload_length(&self) -> usize {
        self.length as usize - DSS_HEADER_SIZE
    }
}

/// Check whether a buffer holds a complete DSS chain.
///
/// This is a pure lookahead over length fields: it walks frame boundaries
/// without decoding payloads, returning `Ok(true)` once a fully-buffered
/// frame has the chained bit unset, and `Ok(false)` if the buffer ends
/// mid-frame (or mid-header). Cheap enough to run after every socket read.
pub fn chain_complete(buf: &[u8]) -> Result<bool, ProtocolError> {
    let mut offset = 0;
    loop {
        if buf.len() < offset + DSS_HEADER_SIZE {
            return Ok(false);
        }
        let length = u16::from_be_bytes([buf[offset], buf[offset + 1]]) as usize;
        if length < DSS_HEADER_SIZE {
            return Err(ProtocolError::FrameTooShort {
                length: length as u16,
                header: DSS_HEADER_SIZE,
            });
        }
        if buf.len() < offset + length {
            return Ok(false);
        }
        let format = buf[offset + 3];
        if format & DssFlags::CHAINED.bits() == 0 {
            return Ok(true);
        }
        offset += length;
    }
}

/// Serialize one DSS frame (header plus payload) into a byte buffer.
pub fn encode_frame(
    kind: DssKind,
    flags: DssFlags,
    correlation_id: u16,
    payload: &[u8],
) -> Result<Bytes, ProtocolError> {
    let total = DSS_HEADER_SIZE + payload.len();
    if total > u16::MAX as usize {
        return Err(ProtocolError::ValueTooLarge("DSS frame"));
    }
    let mut header = DssHeader::new(kind, flags, correlation_id);
    header.length = total as u16;

    let mut buf = BytesMut::with_capacity(total);
    header.encode(&mut buf);
    buf.put_slice(payload);
    Ok(buf.freeze())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn frame(chained: bool, payload: &[u8]) -> Bytes {
        let flags = if chained {
            DssFlags::CHAINED
        } else {
            DssFlags::empty()
        };
        encode_frame(DssKind::Reply, flags, 1, payload).unwrap()
    }

    #[test]
    fn test_header_roundtrip() {
        let mut header = DssHeader::new(
            DssKind::Request,
            DssFlags::CHAINED | DssFlags::SAME_CORRELATION,
            7,
        );
        header.length = 42;

        let mut buf = BytesMut::new();
        header.encode(&mut buf);
        assert_eq!(buf.len(), DSS_HEADER_SIZE);

        let mut cursor = buf.as_ref();
        let decoded = DssHeader::decode(&mut cursor).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut bytes = BytesMut::new();
        bytes.put_u16(10);
        bytes.put_u8(0xC0);
        bytes.put_u8(0x02);
        bytes.put_u16(1);

        let mut cursor = bytes.as_ref();
        assert_eq!(
            DssHeader::decode(&mut cursor),
            Err(ProtocolError::BadMagic(0xC0))
        );
    }

    #[test]
    fn test_length_below_header_rejected() {
        let mut bytes = BytesMut::new();
        bytes.put_u16(3);
        bytes.put_u8(DSS_MAGIC);
        bytes.put_u8(0x02);
        bytes.put_u16(1);

        let mut cursor = bytes.as_ref();
        assert!(matches!(
            DssHeader::decode(&mut cursor),
            Err(ProtocolError::FrameTooShort { length: 3, .. })
        ));
    }

    #[test]
    fn test_chain_complete_single_frame() {
        let bytes = frame(false, b"abc");
        assert!(chain_complete(&bytes).unwrap());
    }

    #[test]
    fn test_chain_complete_false_for_every_prefix() {
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&frame(true, b"first"));
        buf.extend_from_slice(&frame(true, b"second"));
        buf.extend_from_slice(&frame(false, b"last"));

        for cut in 0..buf.len() {
            assert!(
                !chain_complete(&buf[..cut]).unwrap(),
                "prefix of {cut} bytes must be incomplete"
            );
        }
        assert!(chain_complete(&buf).unwrap());
    }

    #[test]
    fn test_chain_complete_rejects_impossible_length() {
        // Length field of 2 can never cover the 6-byte header.
        let bytes = [0x00, 0x02, DSS_MAGIC, 0x02, 0x00, 0x01];
        assert!(chain_complete(&bytes).is_err());
    }
}
