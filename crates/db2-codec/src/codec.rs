//! DSS frame codec implementation.

use bytes::{BufMut, Bytes, BytesMut};
use drda_protocol::dss::{DSS_HEADER_SIZE, DssHeader};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::CodecError;

/// Maximum DSS frame size accepted from the peer.
pub const MAX_FRAME_SIZE: usize = u16::MAX as usize;

/// A whole DSS frame with its parsed header and payload.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Frame header.
    pub header: DssHeader,
    /// Frame payload (excluding the header).
    pub payload: Bytes,
}

impl Frame {
    /// Whether more frames of this exchange follow.
    #[must_use]
    pub fn is_chained(&self) -> bool {
        self.header.is_chained()
    }

    /// Re-serialize the full frame, header included.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(DSS_HEADER_SIZE + self.payload.len());
        self.header.encode(&mut buf);
        buf.put_slice(&self.payload);
        buf.freeze()
    }
}

/// DSS frame codec for tokio-util framing.
///
/// Decoding never assumes a socket chunk boundary aligns with a frame
/// boundary; partial frames stay buffered until their declared length is
/// fully present.
#[derive(Debug)]
pub struct DssCodec {
    max_frame_size: usize,
}

impl DssCodec {
    /// Create a codec with the default maximum frame size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_frame_size: MAX_FRAME_SIZE,
        }
    }
}

impl Default for DssCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for DssCodec {
    type Item = Frame;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < DSS_HEADER_SIZE {
            return Ok(None);
        }

        // Peek at the length field before committing to a split.
        let length = u16::from_be_bytes([src[0], src[1]]) as usize;
        if length < DSS_HEADER_SIZE {
            return Err(drda_protocol::ProtocolError::FrameTooShort {
                length: length as u16,
                header: DSS_HEADER_SIZE,
            }
            .into());
        }
        if length > self.max_frame_size {
            return Err(CodecError::FrameTooLarge {
                size: length,
                max: self.max_frame_size,
            });
        }
        if src.len() < length {
            src.reserve(length - src.len());
            return Ok(None);
        }

        let frame_bytes = src.split_to(length).freeze();
        let mut cursor = frame_bytes.as_ref();
        let header = DssHeader::decode(&mut cursor)?;
        let payload = frame_bytes.slice(DSS_HEADER_SIZE..);

        tracing::trace!(
            kind = ?header.kind,
            length,
            chained = header.is_chained(),
            correlation = header.correlation_id,
            "decoded DSS frame"
        );

        Ok(Some(Frame { header, payload }))
    }
}

impl Encoder<Bytes> for DssCodec {
    type Error = CodecError;

    /// Write pre-framed request bytes (one or more frames built by
    /// `drda_protocol::Request::encode`).
    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        tracing::trace!(bytes = item.len(), "encoding request frames");
        dst.reserve(item.len());
        dst.put_slice(&item);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use drda_protocol::dss::{DssFlags, DssKind, encode_frame};

    #[test]
    fn test_decode_whole_frame() {
        let mut codec = DssCodec::new();
        let bytes = encode_frame(DssKind::Reply, DssFlags::empty(), 2, b"data").unwrap();
        let mut src = BytesMut::from(&bytes[..]);

        let frame = codec.decode(&mut src).unwrap().unwrap();
        assert_eq!(frame.header.kind, DssKind::Reply);
        assert_eq!(frame.header.correlation_id, 2);
        assert_eq!(&frame.payload[..], b"data");
        assert!(src.is_empty());
    }

    #[test]
    fn test_partial_frame_stays_buffered() {
        let mut codec = DssCodec::new();
        let bytes = encode_frame(DssKind::Reply, DssFlags::empty(), 1, b"payload").unwrap();
        let mut src = BytesMut::from(&bytes[..bytes.len() - 3]);

        assert!(codec.decode(&mut src).unwrap().is_none());
        assert_eq!(src.len(), bytes.len() - 3);
    }

    #[test]
    fn test_invalid_length_rejected_not_clamped() {
        let mut codec = DssCodec::new();
        let mut src = BytesMut::from(&[0x00, 0x04, 0xD0, 0x02, 0x00, 0x01][..]);
        assert!(codec.decode(&mut src).is_err());
    }

    #[test]
    fn test_roundtrip_through_encoder() {
        let mut codec = DssCodec::new();
        let bytes = encode_frame(DssKind::Request, DssFlags::CHAINED, 7, b"x").unwrap();

        let mut dst = BytesMut::new();
        codec.encode(bytes.clone(), &mut dst).unwrap();
        let frame = codec.decode(&mut dst).unwrap().unwrap();
        assert_eq!(frame.to_bytes(), bytes);
    }
}
