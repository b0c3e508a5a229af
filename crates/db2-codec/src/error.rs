//! Codec error types.

use thiserror::Error;

/// Errors that can occur during frame encoding/decoding and I/O.
#[derive(Debug, Error)]
pub enum CodecError {
    /// IO error from the underlying transport.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Protocol-level violation in the byte stream.
    #[error("protocol error: {0}")]
    Protocol(#[from] drda_protocol::ProtocolError),

    /// A frame exceeded the configured maximum size.
    #[error("frame of {size} bytes exceeds maximum {max}")]
    FrameTooLarge {
        /// Declared frame size.
        size: usize,
        /// Configured maximum.
        max: usize,
    },

    /// The connection closed mid-reply.
    #[error("connection closed")]
    ConnectionClosed,

    /// The read deadline elapsed before the reply chain completed.
    #[error("read timed out")]
    Timeout,
}

impl CodecError {
    /// Whether this failure is a transport-level condition (as opposed to a
    /// malformed byte stream).
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Io(_) | Self::ConnectionClosed | Self::Timeout)
    }
}
