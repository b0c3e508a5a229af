//! Framed connection carrying DSS exchanges over an async stream.
//!
//! The protocol is strictly half duplex: the client frames one request
//! under a fresh correlation id, then drains reply frames until the chain
//! closes. [`Connection`] enforces that rhythm and owns the correlation
//! id counter.

use std::time::Duration;

use drda_protocol::Request;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;

use crate::chain::{ChainAssembler, Reply};
use crate::codec::DssCodec;
use crate::error::CodecError;

/// A framed, half-duplex DSS connection.
#[derive(Debug)]
pub struct Connection<T> {
    framed: Framed<T, DssCodec>,
    assembler: ChainAssembler,
    next_correlation_id: u16,
}

impl<T: AsyncRead + AsyncWrite + Unpin> Connection<T> {
    /// Wrap an async stream in the DSS codec.
    pub fn new(stream: T) -> Self {
        Self {
            framed: Framed::new(stream, DssCodec::new()),
            assembler: ChainAssembler::new(),
            next_correlation_id: 1,
        }
    }

    /// Frame and send one request, flushing the transport.
    ///
    /// Returns the correlation id the request was framed under.
    pub async fn send(&mut self, request: &Request) -> Result<u16, CodecError> {
        let correlation_id = self.next_correlation_id;
        self.next_correlation_id = self.next_correlation_id.wrapping_add(1).max(1);

        let bytes = request.encode(correlation_id)?;
        tracing::debug!(
            correlation_id,
            code_point = format_args!("{:#06x}", request.code_point()),
            bytes = bytes.len(),
            "sending request"
        );
        self.framed.send(bytes).await?;
        Ok(correlation_id)
    }

    /// Read frames until a reply chain closes, bounded by `deadline`.
    pub async fn read_reply(&mut self, deadline: Duration) -> Result<Reply, CodecError> {
        match tokio::time::timeout(deadline, self.read_reply_inner()).await {
            Ok(result) => result,
            Err(_) => {
                self.assembler.clear();
                Err(CodecError::Timeout)
            }
        }
    }

    async fn read_reply_inner(&mut self) -> Result<Reply, CodecError> {
        loop {
            let frame = match self.framed.next().await {
                Some(frame) => frame?,
                None => {
                    self.assembler.clear();
                    return Err(CodecError::ConnectionClosed);
                }
            };
            if let Some(reply) = self.assembler.push(frame) {
                tracing::trace!(
                    correlation_id = reply.correlation_id(),
                    frames = reply.frames().len(),
                    "reply chain complete"
                );
                return Ok(reply);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use drda_protocol::dss::{DssFlags, DssKind, encode_frame};
    use tokio_test::io::Builder;

    fn reply_frame(chained: bool, payload: &[u8]) -> Bytes {
        let flags = if chained {
            DssFlags::CHAINED
        } else {
            DssFlags::empty()
        };
        encode_frame(DssKind::Reply, flags, 1, payload).unwrap()
    }

    #[tokio::test]
    async fn test_read_reply_assembles_chain() {
        let first = reply_frame(true, b"aa");
        let last = reply_frame(false, b"bb");
        let stream = Builder::new().read(&first).read(&last).build();

        let mut conn = Connection::new(stream);
        let reply = conn.read_reply(Duration::from_secs(1)).await.unwrap();
        assert_eq!(reply.frames().len(), 2);
    }

    #[tokio::test]
    async fn test_read_reply_eof_is_connection_closed() {
        let stream = Builder::new().build();
        let mut conn = Connection::new(stream);
        let err = conn.read_reply(Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, CodecError::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_correlation_ids_increment() {
        let request = Request::commit().unwrap();
        let expected_first = request.encode(1).unwrap();
        let expected_second = request.encode(2).unwrap();
        let stream = Builder::new()
            .write(&expected_first)
            .write(&expected_second)
            .build();

        let mut conn = Connection::new(stream);
        assert_eq!(conn.send(&request).await.unwrap(), 1);
        assert_eq!(conn.send(&request).await.unwrap(), 2);
    }
}
