//! DSS chain reassembly.
//!
//! A logical reply spans one or more chained frames sharing a correlation
//! id; the last frame has the chained bit unset. This module buffers frames
//! until the chain closes and exposes the complete exchange.

use bytes::BytesMut;
use drda_protocol::object::{Object, parse_objects};
use drda_protocol::{ProtocolError, Sqlca};

use crate::codec::Frame;

/// One complete logical reply: every frame of a chain.
#[derive(Debug, Clone)]
pub struct Reply {
    frames: Vec<Frame>,
}

impl Reply {
    /// Correlation id shared by the chain (from its first frame).
    #[must_use]
    pub fn correlation_id(&self) -> u16 {
        self.frames.first().map_or(0, |f| f.header.correlation_id)
    }

    /// The frames of this reply, in wire order.
    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Parse every frame payload into DDM objects.
    pub fn objects(&self) -> Result<Vec<Object>, ProtocolError> {
        let mut buf = BytesMut::new();
        for frame in &self.frames {
            buf.extend_from_slice(&frame.to_bytes());
        }
        parse_objects(&buf)
    }

    /// Decode the SQLCA status carried by this reply, if any.
    pub fn sqlca(&self) -> Result<Option<Sqlca>, ProtocolError> {
        Sqlca::find_in(&self.objects()?)
    }
}

/// Groups decoded frames into complete replies.
#[derive(Debug, Default)]
pub struct ChainAssembler {
    pending: Vec<Frame>,
}

impl ChainAssembler {
    /// Create a new assembler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a frame; returns the completed reply once the chain closes.
    pub fn push(&mut self, frame: Frame) -> Option<Reply> {
        let closes_chain = !frame.is_chained();
        self.pending.push(frame);

        tracing::trace!(
            frames = self.pending.len(),
            complete = closes_chain,
            "assembling reply chain"
        );

        if closes_chain {
            Some(Reply {
                frames: std::mem::take(&mut self.pending),
            })
        } else {
            None
        }
    }

    /// Whether a partially-assembled chain is buffered.
    #[must_use]
    pub fn has_partial(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drop any partial chain.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use drda_protocol::dss::{DssFlags, DssHeader, DssKind};

    fn frame(chained: bool, payload: &'static [u8]) -> Frame {
        let flags = if chained {
            DssFlags::CHAINED
        } else {
            DssFlags::empty()
        };
        let mut header = DssHeader::new(DssKind::Reply, flags, 1);
        header.length = (drda_protocol::DSS_HEADER_SIZE + payload.len()) as u16;
        Frame {
            header,
            payload: Bytes::from_static(payload),
        }
    }

    #[test]
    fn test_single_frame_reply() {
        let mut assembler = ChainAssembler::new();
        let reply = assembler.push(frame(false, b"")).unwrap();
        assert_eq!(reply.frames().len(), 1);
        assert!(!assembler.has_partial());
    }

    #[test]
    fn test_chained_frames_buffer_until_last() {
        let mut assembler = ChainAssembler::new();
        assert!(assembler.push(frame(true, b"a")).is_none());
        assert!(assembler.has_partial());
        assert!(assembler.push(frame(true, b"b")).is_none());

        let reply = assembler.push(frame(false, b"c")).unwrap();
        assert_eq!(reply.frames().len(), 3);
        assert_eq!(reply.correlation_id(), 1);
        assert!(!assembler.has_partial());
    }

    #[test]
    fn test_clear_drops_partial_chain() {
        let mut assembler = ChainAssembler::new();
        assembler.push(frame(true, b"a"));
        assembler.clear();
        assert!(!assembler.has_partial());
    }
}
