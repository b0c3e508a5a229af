//! Mock DRDA server for unit and integration testing.
//!
//! Simulates the handshake and scripted per-statement responses without a
//! real database instance. Each connection keeps its own cursor and
//! prepared-statement state.
//!
//! ## Example
//!
//! ```rust,ignore
//! use db2_testing::mock_server::{MockDrdaServer, MockResponse};
//! use db2_testing::fixtures::{int_col, varchar_col};
//! use db2_types::SqlValue;
//!
//! #[tokio::test]
//! async fn test_query() {
//!     let server = MockDrdaServer::builder()
//!         .with_response(
//!             "SELECT ID FROM T",
//!             MockResponse::result_set(vec![int_col("ID")], vec![vec![SqlValue::Int(1)]]),
//!         )
//!         .build()
//!         .await
//!         .unwrap();
//!     // Connect your client to server.addr()...
//! }
//! ```

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

use drda_protocol::dss::{DSS_HEADER_SIZE, DssFlags, DssKind, encode_frame};
use drda_protocol::object::{Object, Param, encode_object, find, parse_objects};
use drda_protocol::{ProtocolError, SQL_NO_DATA, codepoint as cp};
use db2_types::SqlValue;
use db2_types::decode::ColumnDescriptor;

use crate::fixtures::{encode_descriptors, encode_row_block};

/// Error type for mock server operations.
#[derive(Debug, Error)]
pub enum MockServerError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed request from the client under test.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The request chain was missing a required object.
    #[error("bad request: {0}")]
    BadRequest(&'static str),
}

/// Result type for mock server operations.
pub type Result<T> = std::result::Result<T, MockServerError>;

/// One scripted result set: columns plus rows.
#[derive(Debug, Clone)]
pub struct MockResultSet {
    /// Column descriptors.
    pub columns: Vec<ColumnDescriptor>,
    /// Row data, one inner vec per row.
    pub rows: Vec<Vec<SqlValue>>,
    /// Parameter-marker descriptors returned by prepare.
    pub parameters: Vec<ColumnDescriptor>,
}

impl MockResultSet {
    /// Create a result set from columns and rows.
    pub fn new(columns: Vec<ColumnDescriptor>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self {
            columns,
            rows,
            parameters: Vec::new(),
        }
    }

    /// Attach parameter-marker descriptors (surfaced by prepare).
    #[must_use]
    pub fn with_parameters(mut self, parameters: Vec<ColumnDescriptor>) -> Self {
        self.parameters = parameters;
        self
    }
}

/// A scripted stored-procedure outcome.
#[derive(Debug, Clone)]
pub struct MockCall {
    /// Result sets the procedure opens, in order.
    pub result_sets: Vec<MockResultSet>,
    /// Whether to report the result-set count to the client.
    pub report_count: bool,
    /// Rows affected by the procedure body, when reported.
    pub rows_affected: Option<u32>,
}

impl MockCall {
    /// A call opening the given result sets, count reported.
    pub fn new(result_sets: Vec<MockResultSet>) -> Self {
        Self {
            result_sets,
            report_count: true,
            rows_affected: None,
        }
    }

    /// Suppress the result-set count object in the reply.
    #[must_use]
    pub fn without_count(mut self) -> Self {
        self.report_count = false;
        self
    }

    /// Report a rows-affected count.
    #[must_use]
    pub fn with_rows_affected(mut self, rows: u32) -> Self {
        self.rows_affected = Some(rows);
        self
    }
}

/// Scripted response for one statement text.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// A query result set.
    ResultSet(MockResultSet),
    /// A rows-affected count (INSERT/UPDATE/DELETE).
    RowsAffected(u32),
    /// A SQL error status.
    SqlError {
        /// Signed SQL return code.
        code: i32,
        /// Five-character SQLSTATE.
        state: String,
        /// Message text.
        message: String,
    },
    /// A stored-procedure outcome.
    Call(MockCall),
}

impl MockResponse {
    /// A result-set response.
    pub fn result_set(columns: Vec<ColumnDescriptor>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self::ResultSet(MockResultSet::new(columns, rows))
    }

    /// A rows-affected response.
    pub fn affected(rows: u32) -> Self {
        Self::RowsAffected(rows)
    }

    /// A SQL error response.
    pub fn error(code: i32, state: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SqlError {
            code,
            state: state.into(),
            message: message.into(),
        }
    }
}

/// Configuration for the mock server.
struct MockServerConfig {
    responses: HashMap<String, MockResponse>,
    server_name: String,
    security_check_code: u8,
    offer_security_mechanism: bool,
    speaks_drda: bool,
    rows_per_block: usize,
    stall_on_continue: bool,
}

/// Builder for [`MockDrdaServer`].
pub struct MockServerBuilder {
    config: MockServerConfig,
}

impl MockServerBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: MockServerConfig {
                responses: HashMap::new(),
                server_name: "mockdb".to_owned(),
                security_check_code: 0,
                offer_security_mechanism: true,
                speaks_drda: true,
                rows_per_block: 2,
                stall_on_continue: false,
            },
        }
    }

    /// Script a response for an exact statement text.
    #[must_use]
    pub fn with_response(mut self, sql: impl Into<String>, response: MockResponse) -> Self {
        self.config.responses.insert(sql.into(), response);
        self
    }

    /// Set the server name reported during the attribute exchange.
    #[must_use]
    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.config.server_name = name.into();
        self
    }

    /// Answer the security check with a non-zero code (reject credentials).
    #[must_use]
    pub fn security_check_code(mut self, code: u8) -> Self {
        self.config.security_check_code = code;
        self
    }

    /// Omit the affirmative SECMEC from the ACCSEC reply.
    #[must_use]
    pub fn reject_security_mechanism(mut self) -> Self {
        self.config.offer_security_mechanism = false;
        self
    }

    /// Answer the first exchange with a non-DRDA reply.
    #[must_use]
    pub fn not_drda(mut self) -> Self {
        self.config.speaks_drda = false;
        self
    }

    /// Rows served per QRYDTA block (default 2).
    #[must_use]
    pub fn rows_per_block(mut self, rows: usize) -> Self {
        self.config.rows_per_block = rows.max(1);
        self
    }

    /// Never answer a cursor continuation; the connection goes silent on
    /// the first CNTQRY and counts every request that arrives after it.
    #[must_use]
    pub fn stall_on_continue(mut self) -> Self {
        self.config.stall_on_continue = true;
        self
    }

    /// Build and start the server on an ephemeral loopback port.
    pub async fn build(self) -> Result<MockDrdaServer> {
        MockDrdaServer::start(self.config).await
    }
}

impl Default for MockServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A mock DRDA server listening on loopback.
pub struct MockDrdaServer {
    addr: SocketAddr,
    shutdown_tx: broadcast::Sender<()>,
    post_stall: Arc<AtomicUsize>,
}

impl MockDrdaServer {
    /// Create a new builder.
    pub fn builder() -> MockServerBuilder {
        MockServerBuilder::new()
    }

    async fn start(config: MockServerConfig) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);
        let config = Arc::new(config);
        let post_stall = Arc::new(AtomicUsize::new(0));
        let counter = post_stall.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, _)) => {
                                let config = config.clone();
                                let counter = counter.clone();
                                tokio::spawn(async move {
                                    if let Err(err) = handle_connection(stream, config, counter).await {
                                        tracing::debug!(error = %err, "mock connection ended");
                                    }
                                });
                            }
                            Err(err) => {
                                tracing::error!(error = %err, "mock accept failed");
                                break;
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => break,
                }
            }
        });

        Ok(Self {
            addr,
            shutdown_tx,
            post_stall,
        })
    }

    /// The server's listening address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Host string for client configuration.
    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    /// Listening port.
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Requests received after a stalled cursor continuation.
    ///
    /// A well-behaved client sends nothing once a stalled fetch times out,
    /// so this stays zero.
    pub fn requests_after_stall(&self) -> usize {
        self.post_stall.load(Ordering::SeqCst)
    }

    /// Stop accepting connections.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

impl Drop for MockDrdaServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Per-cursor fetch position.
struct CursorState {
    columns: Vec<ColumnDescriptor>,
    rows: Vec<Vec<SqlValue>>,
    pos: usize,
}

/// Per-connection server state.
#[derive(Default)]
struct ConnState {
    prepared: HashMap<u16, String>,
    cursors: HashMap<[u8; 8], CursorState>,
    pending_sets: VecDeque<MockResultSet>,
    next_cursor: u64,
}

async fn handle_connection(
    mut stream: TcpStream,
    config: Arc<MockServerConfig>,
    post_stall: Arc<AtomicUsize>,
) -> Result<()> {
    let mut buf = BytesMut::with_capacity(4096);
    let mut state = ConnState::default();
    let mut stalled = false;

    loop {
        let Some((objects, correlation_id)) = read_request(&mut stream, &mut buf).await? else {
            return Ok(());
        };
        let Some(command) = objects.first() else {
            return Err(MockServerError::BadRequest("empty request chain"));
        };

        if stalled {
            post_stall.fetch_add(1, Ordering::SeqCst);
            continue;
        }
        if config.stall_on_continue && command.code_point == cp::CNTQRY {
            stalled = true;
            continue;
        }

        tracing::trace!(
            code_point = format_args!("{:#06x}", command.code_point),
            "mock handling request"
        );
        let reply = dispatch(&config, &mut state, command.code_point, &objects)?;
        let frame = encode_frame(DssKind::Reply, DssFlags::empty(), correlation_id, &reply)?;
        stream.write_all(&frame).await?;
        stream.flush().await?;
    }
}

/// Read one complete request chain, returning its objects and correlation
/// id, or `None` on a clean EOF between requests.
async fn read_request(
    stream: &mut TcpStream,
    buf: &mut BytesMut,
) -> Result<Option<(Vec<Object>, u16)>> {
    loop {
        if let Some(end) = chain_end(buf)? {
            let chain = buf.split_to(end);
            let correlation_id = u16::from_be_bytes([chain[4], chain[5]]);
            return Ok(Some((parse_objects(&chain)?, correlation_id)));
        }
        let read = stream.read_buf(buf).await?;
        if read == 0 {
            if buf.is_empty() {
                return Ok(None);
            }
            return Err(MockServerError::BadRequest("EOF mid-request"));
        }
    }
}

/// Byte length of the chain at the front of `buf`, when fully present.
fn chain_end(buf: &[u8]) -> Result<Option<usize>> {
    let mut offset = 0;
    loop {
        if buf.len() < offset + DSS_HEADER_SIZE {
            return Ok(None);
        }
        let length = u16::from_be_bytes([buf[offset], buf[offset + 1]]) as usize;
        if length < DSS_HEADER_SIZE {
            return Err(ProtocolError::FrameTooShort {
                length: length as u16,
                header: DSS_HEADER_SIZE,
            }
            .into());
        }
        if buf.len() < offset + length {
            return Ok(None);
        }
        let chained = buf[offset + 3] & DssFlags::CHAINED.bits() != 0;
        offset += length;
        if !chained {
            return Ok(Some(offset));
        }
    }
}

fn dispatch(
    config: &MockServerConfig,
    state: &mut ConnState,
    code_point: u16,
    objects: &[Object],
) -> Result<Bytes> {
    match code_point {
        cp::EXCSAT => {
            if !config.speaks_drda {
                // A legal frame, but not a DRDA attribute exchange.
                return object_bytes(Param::Str(cp::EXTNAM, "not-a-drda-server".into()));
            }
            encode_object(
                cp::EXCSATRD,
                vec![
                    Param::Str(cp::SRVNAM, config.server_name.clone()),
                    Param::Str(cp::SRVCLSNM, "QDB2/MOCK".into()),
                    Param::Str(cp::SRVRLSLV, "01.01.0000".into()),
                ],
            )
            .map_err(Into::into)
        }
        cp::ACCSEC => {
            let params = if config.offer_security_mechanism {
                vec![Param::U16(cp::SECMEC, cp::SECMEC_USRIDPWD)]
            } else {
                vec![Param::U16(cp::SVRCOD, 8)]
            };
            encode_object(cp::ACCSECRD, params).map_err(Into::into)
        }
        cp::SECCHK => {
            let code = config.security_check_code;
            let severity = if code == 0 { 0 } else { 8 };
            encode_object(
                cp::SECCHKRM,
                vec![
                    Param::U16(cp::SVRCOD, severity),
                    Param::U8(cp::SECCHKCD, code),
                ],
            )
            .map_err(Into::into)
        }
        cp::ACCRDB => {
            let mut reply = BytesMut::new();
            reply.extend_from_slice(&encode_object(
                cp::ACCRDBRM,
                vec![Param::Str(cp::PRDID, "SQL11055".into())],
            )?);
            reply.extend_from_slice(&sqlcard(0, "00000", None)?);
            Ok(reply.freeze())
        }
        cp::EXCSQLIMM => {
            let sql = statement_text(objects)?;
            match config.responses.get(&sql) {
                Some(MockResponse::RowsAffected(rows)) => {
                    let mut reply = BytesMut::new();
                    reply.extend_from_slice(&sqlcard(0, "00000", None)?);
                    reply.extend_from_slice(&object_bytes(Param::U32(cp::SQLNUMROW, *rows))?);
                    Ok(reply.freeze())
                }
                Some(MockResponse::SqlError {
                    code,
                    state: sqlstate,
                    message,
                }) => sqlcard(*code, sqlstate, Some(message)),
                Some(_) => sqlcard(0, "00000", None),
                None => unknown_statement(&sql),
            }
        }
        cp::PRPSQLSTT => {
            let sql = statement_text(objects)?;
            let section = section_of(objects)?;
            match config.responses.get(&sql) {
                Some(MockResponse::ResultSet(set)) => {
                    state.prepared.insert(section, sql);
                    let mut reply = BytesMut::new();
                    reply.extend_from_slice(&object_bytes(Param::Bytes(
                        cp::SQLDARD,
                        encode_descriptors(&set.columns),
                    ))?);
                    if !set.parameters.is_empty() {
                        reply.extend_from_slice(&object_bytes(Param::Bytes(
                            cp::SQLDARD,
                            encode_descriptors(&set.parameters),
                        ))?);
                    }
                    reply.extend_from_slice(&sqlcard(0, "00000", None)?);
                    Ok(reply.freeze())
                }
                Some(MockResponse::SqlError {
                    code,
                    state: sqlstate,
                    message,
                }) => sqlcard(*code, sqlstate, Some(message)),
                Some(_) => {
                    state.prepared.insert(section, sql);
                    sqlcard(0, "00000", None)
                }
                None => unknown_statement(&sql),
            }
        }
        cp::OPNQRY => match resolve_open(config, state, objects)? {
            OpenOutcome::Set(set) => open_cursor(config, state, set),
            OpenOutcome::Error {
                code,
                state: sqlstate,
                message,
            } => sqlcard(code, &sqlstate, Some(&message)),
            OpenOutcome::NoCursor => sqlcard(-501, "24501", Some("no open result set")),
        },
        cp::CNTQRY => {
            let token = cursor_token(objects)?;
            match state.cursors.get_mut(&token) {
                Some(cursor) => serve_block(config, cursor),
                None => sqlcard(-501, "24501", Some("cursor not open")),
            }
        }
        cp::CLSQRY => {
            let token = cursor_token(objects)?;
            state.cursors.remove(&token);
            sqlcard(0, "00000", None)
        }
        cp::RDBCMM | cp::RDBRLLBCK => {
            let mut reply = BytesMut::new();
            reply.extend_from_slice(&encode_object(
                cp::ENDUOWRM,
                vec![Param::U16(cp::SVRCOD, 0)],
            )?);
            reply.extend_from_slice(&sqlcard(0, "00000", None)?);
            Ok(reply.freeze())
        }
        cp::EXCSQLSTT => {
            let sql = match find(objects, cp::SQLSTT) {
                Some(stt) => stt.as_text()?.to_owned(),
                None => {
                    let section = section_of(objects)?;
                    state
                        .prepared
                        .get(&section)
                        .cloned()
                        .ok_or(MockServerError::BadRequest("unprepared section"))?
                }
            };
            match config.responses.get(&sql) {
                Some(MockResponse::Call(call)) => {
                    state.pending_sets.extend(call.result_sets.iter().cloned());
                    let mut reply = BytesMut::new();
                    reply.extend_from_slice(&sqlcard(0, "00000", None)?);
                    if call.report_count {
                        reply.extend_from_slice(&object_bytes(Param::U16(
                            cp::RSLSETRM,
                            call.result_sets.len() as u16,
                        ))?);
                    }
                    if let Some(rows) = call.rows_affected {
                        reply.extend_from_slice(&object_bytes(Param::U32(cp::SQLNUMROW, rows))?);
                    }
                    Ok(reply.freeze())
                }
                Some(MockResponse::RowsAffected(rows)) => {
                    let mut reply = BytesMut::new();
                    reply.extend_from_slice(&sqlcard(0, "00000", None)?);
                    reply.extend_from_slice(&object_bytes(Param::U32(cp::SQLNUMROW, *rows))?);
                    Ok(reply.freeze())
                }
                Some(MockResponse::SqlError {
                    code,
                    state: sqlstate,
                    message,
                }) => sqlcard(*code, sqlstate, Some(message)),
                Some(MockResponse::ResultSet(set)) => {
                    state.pending_sets.push_back(set.clone());
                    let mut reply = BytesMut::new();
                    reply.extend_from_slice(&sqlcard(0, "00000", None)?);
                    reply.extend_from_slice(&object_bytes(Param::U16(cp::RSLSETRM, 1))?);
                    Ok(reply.freeze())
                }
                None => unknown_statement(&sql),
            }
        }
        _ => sqlcard(-84, "42601", Some("unsupported request")),
    }
}

/// How an OPNQRY resolves against the script.
enum OpenOutcome {
    Set(MockResultSet),
    Error {
        code: i32,
        state: String,
        message: String,
    },
    NoCursor,
}

/// Pick the result set an OPNQRY refers to: literal SQL, a prepared
/// section, or the next set queued by a procedure call.
fn resolve_open(
    config: &MockServerConfig,
    state: &mut ConnState,
    objects: &[Object],
) -> Result<OpenOutcome> {
    let scripted = if let Some(stt) = find(objects, cp::SQLSTT) {
        config.responses.get(stt.as_text()?)
    } else {
        let section = section_of(objects)?;
        match state.prepared.get(&section) {
            Some(sql) => config.responses.get(sql),
            None => return Ok(match state.pending_sets.pop_front() {
                Some(set) => OpenOutcome::Set(set),
                None => OpenOutcome::NoCursor,
            }),
        }
    };

    Ok(match scripted {
        Some(MockResponse::ResultSet(set)) => OpenOutcome::Set(set.clone()),
        Some(MockResponse::SqlError {
            code,
            state,
            message,
        }) => OpenOutcome::Error {
            code: *code,
            state: state.clone(),
            message: message.clone(),
        },
        _ => OpenOutcome::NoCursor,
    })
}

/// Open a scripted cursor and serve its first block.
fn open_cursor(
    config: &MockServerConfig,
    state: &mut ConnState,
    set: MockResultSet,
) -> Result<Bytes> {
    state.next_cursor += 1;
    let token = state.next_cursor.to_be_bytes();
    let mut cursor = CursorState {
        columns: set.columns,
        rows: set.rows,
        pos: 0,
    };

    let mut reply = BytesMut::new();
    reply.extend_from_slice(&encode_object(
        cp::OPNQRYRM,
        vec![Param::U16(cp::SVRCOD, 0)],
    )?);
    reply.extend_from_slice(&object_bytes(Param::Bytes(
        cp::QRYINSID,
        Bytes::copy_from_slice(&token),
    ))?);
    reply.extend_from_slice(&object_bytes(Param::Bytes(
        cp::SQLDARD,
        encode_descriptors(&cursor.columns),
    ))?);
    reply.extend_from_slice(&block_and_status(config, &mut cursor)?);

    state.cursors.insert(token, cursor);
    Ok(reply.freeze())
}

/// Serve the next block of an open cursor.
fn serve_block(config: &MockServerConfig, cursor: &mut CursorState) -> Result<Bytes> {
    let mut reply = BytesMut::new();
    reply.extend_from_slice(&block_and_status(config, cursor)?);
    Ok(reply.freeze())
}

/// Encode up to `rows_per_block` rows plus the status: code 100 once the
/// cursor is exhausted, success otherwise.
fn block_and_status(config: &MockServerConfig, cursor: &mut CursorState) -> Result<Bytes> {
    let mut reply = BytesMut::new();
    let end = (cursor.pos + config.rows_per_block).min(cursor.rows.len());
    if cursor.pos < end {
        let block = encode_row_block(&cursor.columns, &cursor.rows[cursor.pos..end]);
        cursor.pos = end;
        reply.extend_from_slice(&object_bytes(Param::Bytes(cp::QRYDTA, block))?);
    }
    if cursor.pos >= cursor.rows.len() {
        reply.extend_from_slice(&sqlcard(SQL_NO_DATA, "02000", None)?);
    } else {
        reply.extend_from_slice(&sqlcard(0, "00000", None)?);
    }
    Ok(reply.freeze())
}

/// Encode one flat object (header plus scalar payload).
fn object_bytes(param: Param) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(param.encoded_len());
    param.encode(&mut buf)?;
    Ok(buf.freeze())
}

/// Encode a SQLCARD object.
fn sqlcard(code: i32, state: &str, message: Option<&str>) -> Result<Bytes> {
    let mut payload = BytesMut::new();
    payload.put_i32(code);
    payload.put_slice(state.as_bytes());
    if let Some(message) = message {
        payload.put_u16(message.len() as u16);
        payload.put_slice(message.as_bytes());
    }
    object_bytes(Param::Bytes(cp::SQLCARD, payload.freeze()))
}

fn unknown_statement(sql: &str) -> Result<Bytes> {
    tracing::debug!(sql, "no scripted response");
    sqlcard(-204, "42704", Some("object is undefined"))
}

fn statement_text(objects: &[Object]) -> Result<String> {
    Ok(find(objects, cp::SQLSTT)
        .ok_or(MockServerError::BadRequest("missing SQLSTT"))?
        .as_text()?
        .to_owned())
}

/// Extract the section number from the PKGNAMCSN payload (its last two
/// bytes).
fn section_of(objects: &[Object]) -> Result<u16> {
    let payload = &find(objects, cp::PKGNAMCSN)
        .ok_or(MockServerError::BadRequest("missing PKGNAMCSN"))?
        .payload;
    if payload.len() != 64 {
        return Err(MockServerError::BadRequest("malformed PKGNAMCSN"));
    }
    Ok(u16::from_be_bytes([payload[62], payload[63]]))
}

fn cursor_token(objects: &[Object]) -> Result<[u8; 8]> {
    find(objects, cp::QRYINSID)
        .ok_or(MockServerError::BadRequest("missing QRYINSID"))?
        .payload
        .as_ref()
        .try_into()
        .map_err(|_| MockServerError::BadRequest("malformed QRYINSID"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_end_requires_whole_chain() {
        let frame = encode_frame(DssKind::Request, DssFlags::CHAINED, 1, b"abc").unwrap();
        assert_eq!(chain_end(&frame).unwrap(), None);

        let last = encode_frame(DssKind::Request, DssFlags::empty(), 1, b"d").unwrap();
        let mut buf = BytesMut::from(&frame[..]);
        buf.extend_from_slice(&last);
        assert_eq!(chain_end(&buf).unwrap(), Some(buf.len()));
    }

    #[test]
    fn test_sqlcard_decodes_through_client_path() {
        let bytes = sqlcard(-204, "42704", Some("oops")).unwrap();
        let frame = encode_frame(DssKind::Reply, DssFlags::empty(), 1, &bytes).unwrap();
        let objects = parse_objects(&frame).unwrap();
        let sqlca = drda_protocol::Sqlca::find_in(&objects).unwrap().unwrap();
        assert_eq!(sqlca.code, -204);
        assert_eq!(sqlca.message.as_deref(), Some("oops"));
    }
}
