//! High-level client: connect, execute, query, prepare, call.

use std::sync::Arc;

use std::time::Duration;

use drda_protocol::object::{self, Object};
use drda_protocol::request::CURSOR_TOKEN_LEN;
use drda_protocol::{PackageRef, Request, Sqlca, codepoint as cp};
use tokio::net::TcpStream;
use tokio::time::Instant;

use db2_codec::Connection;
use db2_types::decode::RowDecoder;
use db2_types::{SqlValue, decode_descriptors, encode_params};

use crate::config::Config;
use crate::error::{Error, Result, sql_error};
use crate::handshake::{self, Session};
use crate::query::{CallResult, PreparedStatement, QueryResult};
use crate::row::{Column, Row};

/// An authenticated connection to a DRDA server.
///
/// One statement at a time; each operation is a full request/reply turn.
/// Section numbers are a local counter starting at 1, bumped once per
/// logical statement.
#[derive(Debug)]
pub struct Client {
    conn: Connection<TcpStream>,
    config: Config,
    session: Session,
    next_section: u16,
    op_deadline: Option<Instant>,
}

/// Collect every object with the given code point across a reply,
/// depth-first. Matching nodes are not descended into.
fn collect_all<'a>(objects: &'a [Object], code_point: u16) -> Vec<&'a Object> {
    fn walk<'a>(object: &'a Object, code_point: u16, out: &mut Vec<&'a Object>) {
        if object.code_point == code_point {
            out.push(object);
            return;
        }
        for child in &object.children {
            walk(child, code_point, out);
        }
    }
    let mut out = Vec::new();
    for object in objects {
        walk(object, code_point, &mut out);
    }
    out
}

impl Client {
    /// Connect and authenticate.
    ///
    /// On any handshake failure the transport is dropped; there is no
    /// partially-authenticated state to observe.
    pub async fn connect(config: Config) -> Result<Self> {
        let addr = format!("{}:{}", config.host, config.port);
        tracing::info!(addr = %addr, database = %config.database, "connecting");

        let stream = tokio::time::timeout(config.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| Error::Timeout)??;
        stream.set_nodelay(true)?;

        let mut conn = Connection::new(stream);
        let session = match config.operation_timeout {
            Some(deadline) => {
                tokio::time::timeout(deadline, handshake::authenticate(&mut conn, &config))
                    .await
                    .map_err(|_| Error::Timeout)??
            }
            None => handshake::authenticate(&mut conn, &config).await?,
        };

        Ok(Self {
            conn,
            config,
            session,
            next_section: 1,
            op_deadline: None,
        })
    }

    /// Server name reported during the handshake.
    #[must_use]
    pub fn server_name(&self) -> Option<&str> {
        self.session.server_name.as_deref()
    }

    /// Server class name reported during the handshake.
    #[must_use]
    pub fn server_class(&self) -> Option<&str> {
        self.session.server_class.as_deref()
    }

    /// Server release level reported during the handshake.
    #[must_use]
    pub fn server_release(&self) -> Option<&str> {
        self.session.server_release.as_deref()
    }

    fn next_package_ref(&mut self) -> PackageRef {
        let section = self.next_section;
        self.next_section = self.next_section.wrapping_add(1).max(1);
        self.package_ref_for(section)
    }

    fn package_ref_for(&self, section: u16) -> PackageRef {
        PackageRef::new(
            &self.config.database,
            &self.config.collection,
            &self.config.package,
            section,
        )
    }

    /// Arm the per-operation deadline. Called on entry to every public
    /// operation, never by internal steps, so cleanup turns share the
    /// budget of the operation they belong to.
    fn start_operation(&mut self) {
        self.op_deadline = self
            .config
            .operation_timeout
            .map(|timeout| Instant::now() + timeout);
    }

    /// Read budget for the next exchange: the per-read deadline, capped by
    /// whatever remains of the operation deadline.
    fn read_budget(&self) -> Result<Duration> {
        let per_read = self.config.read_timeout;
        match self.op_deadline {
            None => Ok(per_read),
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return Err(Error::Timeout);
                }
                Ok(per_read.min(remaining))
            }
        }
    }

    async fn exchange(&mut self, request: Request) -> Result<Vec<Object>> {
        let budget = self.read_budget()?;
        self.conn.send(&request).await?;
        let reply = self.conn.read_reply(budget).await?;
        Ok(reply.objects()?)
    }

    /// Exchange a request and fail on an error status.
    async fn run_statement(&mut self, request: Request) -> Result<Vec<Object>> {
        let objects = self.exchange(request).await?;
        if let Some(sqlca) = Sqlca::find_in(&objects)? {
            if sqlca.is_error() {
                return Err(sql_error(sqlca));
            }
        }
        Ok(objects)
    }

    async fn commit_best_effort(&mut self) {
        let result = match Request::commit() {
            Ok(request) => self.run_statement(request).await.map(|_| ()),
            Err(err) => Err(err.into()),
        };
        if let Err(err) = result {
            tracing::warn!(error = %err, "best-effort commit failed");
        }
    }

    /// Execute a SQL statement immediately, returning the rows-affected
    /// count when the server reports one.
    pub async fn execute(&mut self, sql: &str) -> Result<u32> {
        self.start_operation();
        let pkg = self.next_package_ref();
        tracing::debug!(section = pkg.section, sql, "execute immediate");
        self.run_update(Request::execute_immediate(&pkg, sql)?).await
    }

    /// Execute a prepared non-query statement with typed parameters,
    /// returning the rows-affected count.
    pub async fn execute_prepared(
        &mut self,
        statement: &PreparedStatement,
        params: &[SqlValue],
    ) -> Result<u32> {
        self.start_operation();
        let pkg = self.package_ref_for(statement.section());
        tracing::debug!(
            section = pkg.section,
            params = params.len(),
            "execute prepared"
        );
        let data = encode_params(params)?;
        self.run_update(Request::execute_prepared(&pkg, data)?).await
    }

    /// The update tail shared by immediate and prepared execution: decode
    /// the status, surface the row count, autocommit. A fatal failure
    /// propagates untouched; only SQL errors still get the commit turn.
    async fn run_update(&mut self, request: Request) -> Result<u32> {
        let objects = self.exchange(request).await?;
        if let Some(sqlca) = Sqlca::find_in(&objects)? {
            if sqlca.is_error() {
                self.commit_best_effort().await;
                return Err(sql_error(sqlca));
            }
        }
        let rows_affected = object::find(&objects, cp::SQLNUMROW)
            .and_then(|o| o.as_u32().ok())
            .unwrap_or(0);

        self.commit_best_effort().await;
        Ok(rows_affected)
    }

    /// Run a query and fetch its rows, bounded by the configured row cap.
    pub async fn query(&mut self, sql: &str) -> Result<QueryResult> {
        self.start_operation();
        let pkg = self.next_package_ref();
        tracing::debug!(section = pkg.section, sql, "open query");
        let request = Request::open_query(&pkg, Some(sql), None, self.config.query_block_size)?;
        self.run_query(pkg, request, true).await
    }

    /// Prepare a statement, returning its column and parameter
    /// descriptors without executing it.
    pub async fn prepare(&mut self, sql: &str) -> Result<PreparedStatement> {
        self.start_operation();
        let pkg = self.next_package_ref();
        tracing::debug!(section = pkg.section, sql, "prepare");

        let objects = self.run_statement(Request::prepare(&pkg, sql)?).await?;
        let descriptors = collect_all(&objects, cp::SQLDARD);
        let columns = match descriptors.first() {
            Some(area) => decode_descriptors(&area.payload)?,
            None => Vec::new(),
        };
        let parameters = match descriptors.get(1) {
            Some(area) => decode_descriptors(&area.payload)?,
            None => Vec::new(),
        };

        Ok(PreparedStatement {
            section: pkg.section,
            columns,
            parameters,
        })
    }

    /// Run a prepared query with typed parameters.
    pub async fn query_prepared(
        &mut self,
        statement: &PreparedStatement,
        params: &[SqlValue],
    ) -> Result<QueryResult> {
        self.start_operation();
        let pkg = self.package_ref_for(statement.section());
        tracing::debug!(section = pkg.section, params = params.len(), "open prepared query");
        let data = encode_params(params)?;
        let request = Request::open_query(&pkg, None, Some(data), self.config.query_block_size)?;
        self.run_query(pkg, request, true).await
    }

    /// Invoke a stored procedure and fetch every result set it opens.
    ///
    /// A failure opening set *i* stops enumeration; sets `0..i` are kept.
    pub async fn call(&mut self, procedure: &str, params: &[SqlValue]) -> Result<CallResult> {
        self.start_operation();
        let pkg = self.next_package_ref();
        let placeholders = vec!["?"; params.len()].join(", ");
        let sql = format!("CALL {procedure}({placeholders})");
        tracing::debug!(section = pkg.section, sql, "call procedure");

        let data = if params.is_empty() {
            None
        } else {
            Some(encode_params(params)?)
        };
        let objects = self.run_statement(Request::call(&pkg, &sql, data)?).await?;

        let rows_affected = object::find(&objects, cp::SQLNUMROW).and_then(|o| o.as_u32().ok());
        // An absent count still means the procedure may have opened one set.
        let set_count = object::find(&objects, cp::RSLSETRM)
            .and_then(|o| o.as_u16().ok())
            .unwrap_or(1);

        let mut result_sets = Vec::new();
        for set_index in 0..set_count {
            let set_pkg = self.next_package_ref();
            let request =
                Request::open_query(&set_pkg, None, None, self.config.query_block_size)?;
            match self.run_query(set_pkg, request, false).await {
                Ok(result) => result_sets.push(result),
                Err(err) => {
                    tracing::warn!(
                        set = set_index,
                        error = %err,
                        "opening result set failed, keeping earlier sets"
                    );
                    break;
                }
            }
        }
        self.commit_best_effort().await;

        Ok(CallResult {
            result_sets,
            rows_affected,
        })
    }

    /// Commit the current unit of work.
    pub async fn commit(&mut self) -> Result<()> {
        self.start_operation();
        self.run_statement(Request::commit()?).await?;
        Ok(())
    }

    /// Roll back the current unit of work.
    pub async fn rollback(&mut self) -> Result<()> {
        self.start_operation();
        self.run_statement(Request::rollback()?).await?;
        Ok(())
    }

    /// Open a cursor, fetch it to completion or the row cap, then close
    /// it (and commit, when `autocommit`) best-effort.
    async fn run_query(
        &mut self,
        pkg: PackageRef,
        open: Request,
        autocommit: bool,
    ) -> Result<QueryResult> {
        let objects = self.exchange(open).await?;
        if let Some(sqlca) = Sqlca::find_in(&objects)? {
            if sqlca.is_error() {
                // The cursor never opened; nothing to close.
                return Err(sql_error(sqlca));
            }
        }

        let descriptor_area = object::find(&objects, cp::SQLDARD)
            .ok_or(Error::UnexpectedReply("missing SQLDARD"))?;
        let descriptors = decode_descriptors(&descriptor_area.payload)?;
        let columns: Arc<[Column]> = descriptors
            .iter()
            .enumerate()
            .map(|(i, d)| Column::from_descriptor(d, i))
            .collect();
        let cursor: [u8; CURSOR_TOKEN_LEN] = object::find(&objects, cp::QRYINSID)
            .ok_or(Error::UnexpectedReply("missing QRYINSID"))?
            .payload
            .as_ref()
            .try_into()
            .map_err(|_| Error::UnexpectedReply("malformed cursor token"))?;

        let decoder = RowDecoder::new(&descriptors);
        let outcome = self
            .fetch_rows(&pkg, &cursor, &decoder, &columns, objects)
            .await;

        // A fatal failure leaves the exchange state unknowable; sending
        // CLSQRY or RDBCMM now would pair later replies with the wrong
        // requests. Only success and SQL errors get the cleanup turns.
        match &outcome {
            Err(err) if err.is_fatal() => {}
            _ => {
                self.close_cursor_best_effort(&pkg, &cursor).await;
                if autocommit {
                    self.commit_best_effort().await;
                }
            }
        }

        let (rows, truncated) = outcome?;
        Ok(QueryResult {
            columns,
            rows,
            truncated,
        })
    }

    /// The fetch loop. Terminates when a fetch yields no new rows, the
    /// row cap is hit, or the server reports the cursor exhausted
    /// (SQL code 100, which is not an error).
    async fn fetch_rows(
        &mut self,
        pkg: &PackageRef,
        cursor: &[u8; CURSOR_TOKEN_LEN],
        decoder: &RowDecoder<'_>,
        columns: &Arc<[Column]>,
        mut objects: Vec<Object>,
    ) -> Result<(Vec<Row>, bool)> {
        let max_rows = self.config.max_rows;
        let mut rows = Vec::new();
        let mut truncated = false;

        loop {
            let mut new_rows = 0usize;
            for block in collect_all(&objects, cp::QRYDTA) {
                for values in decoder.decode_block(&block.payload)? {
                    if rows.len() >= max_rows {
                        truncated = true;
                        break;
                    }
                    rows.push(Row::new(columns.clone(), values));
                    new_rows += 1;
                }
                if truncated {
                    break;
                }
            }

            let status = Sqlca::find_in(&objects)?;
            if let Some(sqlca) = &status {
                if sqlca.is_error() {
                    return Err(sql_error(sqlca.clone()));
                }
            }
            let exhausted = status.as_ref().is_some_and(Sqlca::is_end_of_data);
            if exhausted || truncated || new_rows == 0 {
                tracing::debug!(
                    rows = rows.len(),
                    truncated,
                    exhausted,
                    "fetch loop finished"
                );
                return Ok((rows, truncated));
            }

            objects = self
                .exchange(Request::continue_query(
                    pkg,
                    cursor,
                    self.config.query_block_size,
                )?)
                .await?;
        }
    }

    async fn close_cursor_best_effort(&mut self, pkg: &PackageRef, cursor: &[u8; CURSOR_TOKEN_LEN]) {
        let result = match Request::close_query(pkg, cursor) {
            Ok(request) => self.run_statement(request).await.map(|_| ()),
            Err(err) => Err(err.into()),
        };
        if let Err(err) = result {
            tracing::warn!(error = %err, "closing cursor failed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_collect_all_finds_repeated_objects() {
        let objects = vec![
            Object::new(cp::QRYDTA, Bytes::from_static(&[1])),
            Object::new(cp::SQLCARD, Bytes::new()),
            Object::new(cp::QRYDTA, Bytes::from_static(&[2])),
        ];
        let blocks = collect_all(&objects, cp::QRYDTA);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].payload[0], 2);
    }

    #[test]
    fn test_collect_all_does_not_descend_into_matches() {
        let inner = Object::new(cp::QRYDTA, Bytes::from_static(&[9]));
        let outer = Object {
            code_point: cp::QRYDTA,
            payload: Bytes::new(),
            children: vec![inner],
        };
        let blocks = collect_all(std::slice::from_ref(&outer), cp::QRYDTA);
        assert_eq!(blocks.len(), 1);
    }
}
