//! Client error types.

use thiserror::Error;

use db2_codec::CodecError;

/// Errors that can occur during client operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Connection failed or closed unexpectedly.
    #[error("connection failed: {0}")]
    Connection(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An operation deadline elapsed.
    #[error("operation timed out")]
    Timeout,

    /// Malformed data on the wire.
    #[error("protocol error: {0}")]
    Protocol(#[from] drda_protocol::ProtocolError),

    /// The peer's first reply was not a server-attributes exchange.
    #[error("server does not speak DRDA")]
    NotDrda,

    /// A reply arrived without the object the exchange requires.
    #[error("protocol violation: {0}")]
    UnexpectedReply(&'static str),

    /// The server rejected the credentials or security mechanism.
    #[error("authentication failed (code {code}): {reason}")]
    Authentication {
        /// Security check code reported by the server.
        code: u8,
        /// Human-readable reason.
        reason: String,
    },

    /// The server reported a SQL error.
    #[error("SQL error {code} (SQLSTATE {state}): {message}")]
    Sql {
        /// Signed SQL return code.
        code: i32,
        /// Five-character SQLSTATE.
        state: String,
        /// Server message text, empty when none was sent.
        message: String,
    },

    /// Value decode or parameter encode failure.
    #[error("type error: {0}")]
    Type(#[from] db2_types::TypeError),
}

impl From<CodecError> for Error {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Io(e) => Self::Io(e),
            CodecError::Timeout => Self::Timeout,
            CodecError::Protocol(e) => Self::Protocol(e),
            CodecError::ConnectionClosed => Self::Connection("connection closed".to_owned()),
            CodecError::FrameTooLarge { .. } => Self::Connection(err.to_string()),
        }
    }
}

impl Error {
    /// Whether this failure is transport-level (the connection is gone).
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Io(_) | Self::Timeout
        )
    }

    /// Whether this failure poisons the connection.
    ///
    /// Transport loss and protocol violations leave the exchange state
    /// unknowable; no further frames may be sent on this connection, not
    /// even best-effort cleanup.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.is_transport()
            || matches!(
                self,
                Self::Protocol(_) | Self::UnexpectedReply(_) | Self::NotDrda
            )
    }

    /// Whether the server rejected a SQL statement.
    #[must_use]
    pub fn is_sql_error(&self) -> bool {
        matches!(self, Self::Sql { .. })
    }

    /// The SQLSTATE, when this is a SQL error.
    #[must_use]
    pub fn sqlstate(&self) -> Option<&str> {
        match self {
            Self::Sql { state, .. } => Some(state),
            _ => None,
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Build a SQL error from a decoded status area.
pub(crate) fn sql_error(sqlca: drda_protocol::Sqlca) -> Error {
    Error::Sql {
        code: sqlca.code,
        state: sqlca.state,
        message: sqlca.message.unwrap_or_default(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_timeout_maps_to_timeout() {
        let err = Error::from(CodecError::Timeout);
        assert!(matches!(err, Error::Timeout));
        assert!(err.is_transport());
    }

    #[test]
    fn test_fatal_classification() {
        assert!(Error::Timeout.is_fatal());
        assert!(Error::UnexpectedReply("missing SQLDARD").is_fatal());
        assert!(Error::from(drda_protocol::ProtocolError::BadMagic(0x42)).is_fatal());
        assert!(!sql_error(drda_protocol::Sqlca {
            code: -803,
            state: "23505".to_owned(),
            message: None,
        })
        .is_fatal());
    }

    #[test]
    fn test_sql_error_exposes_state() {
        let err = sql_error(drda_protocol::Sqlca {
            code: -204,
            state: "42704".to_owned(),
            message: None,
        });
        assert!(err.is_sql_error());
        assert_eq!(err.sqlstate(), Some("42704"));
    }
}
