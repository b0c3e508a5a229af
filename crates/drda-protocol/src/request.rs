//! Request builders for the handshake and SQL operations.
//!
//! Each builder produces the object tree(s) of one logical exchange. A
//! request is one RQSDSS frame optionally chained with OBJDSS frames that
//! carry statement text or parameter data; `encode` lays the chain out with
//! the chaining bits set on every frame but the last.

use bytes::{BufMut, Bytes, BytesMut};

use crate::codepoint as cp;
use crate::dss::{DssFlags, DssKind, encode_frame};
use crate::error::ProtocolError;
use crate::object::{Param, encode_object};

/// Width of the padded name fields inside PKGNAMCSN and RDBNAM.
const NAME_WIDTH: usize = 18;

/// Length of the opaque query instance identifier (cursor token).
pub const CURSOR_TOKEN_LEN: usize = 8;

/// Manager level proposed for every manager in EXCSAT.
const MANAGER_LEVEL: u16 = 7;

/// Product identifier sent in ACCRDB.
const PRODUCT_ID: &str = "SQL11055";

/// Data type definition name sent in ACCRDB.
const TYPE_DEF: &str = "QTDSQLASC";

/// The package reference attached to every SQL operation: database,
/// collection, and package names plus a per-statement section number.
///
/// The section number is a caller-local counter starting at 1 and bumped
/// once per logical statement within a connection; it is never derived from
/// server state.
#[derive(Debug, Clone)]
pub struct PackageRef {
    /// Target database name.
    pub database: String,
    /// Package collection name.
    pub collection: String,
    /// Package name.
    pub package: String,
    /// Package consistency token.
    pub consistency_token: [u8; 8],
    /// Section (serial) number for this statement.
    pub section: u16,
}

impl PackageRef {
    /// Create a package reference with the default consistency token.
    pub fn new(
        database: impl Into<String>,
        collection: impl Into<String>,
        package: impl Into<String>,
        section: u16,
    ) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
            package: package.into(),
            consistency_token: *b"\x01\x01\x01\x01\x01\x01\x01\x01",
            section,
        }
    }

    /// Serialize as the fixed 64-byte PKGNAMCSN payload.
    pub fn to_bytes(&self) -> Result<Bytes, ProtocolError> {
        let mut buf = BytesMut::with_capacity(3 * NAME_WIDTH + 8 + 2);
        buf.put_slice(&pad_name(&self.database)?);
        buf.put_slice(&pad_name(&self.collection)?);
        buf.put_slice(&pad_name(&self.package)?);
        buf.put_slice(&self.consistency_token);
        buf.put_u16(self.section);
        Ok(buf.freeze())
    }
}

/// Pad a name to the fixed field width with trailing blanks.
fn pad_name(name: &str) -> Result<[u8; NAME_WIDTH], ProtocolError> {
    if name.len() > NAME_WIDTH {
        return Err(ProtocolError::ValueTooLarge("name field"));
    }
    let mut field = [b' '; NAME_WIDTH];
    field[..name.len()].copy_from_slice(name.as_bytes());
    Ok(field)
}

/// One encoded exchange, ready to be framed with a correlation id.
#[derive(Debug, Clone)]
pub struct Request {
    code_point: u16,
    parts: Vec<(DssKind, Bytes)>,
}

impl Request {
    fn new(code_point: u16, params: Vec<Param>) -> Result<Self, ProtocolError> {
        Ok(Self {
            code_point,
            parts: vec![(DssKind::Request, encode_object(code_point, params)?)],
        })
    }

    fn with_object(mut self, code_point: u16, payload: Bytes) -> Result<Self, ProtocolError> {
        let param = Param::Bytes(code_point, payload);
        let mut buf = BytesMut::with_capacity(param.encoded_len());
        param.encode(&mut buf)?;
        self.parts.push((DssKind::Object, buf.freeze()));
        Ok(self)
    }

    /// Exchange server attributes: client identity plus proposed manager
    /// levels. First message of every connection.
    pub fn excsat(client_name: &str) -> Result<Self, ProtocolError> {
        Self::new(
            cp::EXCSAT,
            vec![
                Param::Str(cp::EXTNAM, client_name.to_owned()),
                Param::Composite(
                    cp::MGRLVLLS,
                    vec![
                        Param::U16(cp::AGENT, MANAGER_LEVEL),
                        Param::U16(cp::SQLAM, MANAGER_LEVEL),
                        Param::U16(cp::RDB, MANAGER_LEVEL),
                        Param::U16(cp::SECMGR, MANAGER_LEVEL),
                    ],
                ),
            ],
        )
    }

    /// Access security: name the database and propose user/password auth.
    pub fn accsec(database: &str) -> Result<Self, ProtocolError> {
        Self::new(
            cp::ACCSEC,
            vec![
                Param::U16(cp::SECMEC, cp::SECMEC_USRIDPWD),
                Param::Bytes(cp::RDBNAM, Bytes::copy_from_slice(&pad_name(database)?)),
            ],
        )
    }

    /// Security check: send the credentials.
    pub fn secchk(database: &str, user: &str, password: &str) -> Result<Self, ProtocolError> {
        Self::new(
            cp::SECCHK,
            vec![
                Param::U16(cp::SECMEC, cp::SECMEC_USRIDPWD),
                Param::Bytes(cp::RDBNAM, Bytes::copy_from_slice(&pad_name(database)?)),
                Param::Str(cp::USRID, user.to_owned()),
                Param::Str(cp::PASSWORD, password.to_owned()),
            ],
        )
    }

    /// Attach to the database, completing the handshake.
    pub fn accrdb(database: &str) -> Result<Self, ProtocolError> {
        Self::new(
            cp::ACCRDB,
            vec![
                Param::Bytes(cp::RDBNAM, Bytes::copy_from_slice(&pad_name(database)?)),
                Param::U16(cp::RDBACCCL, cp::SQLAM),
                Param::Str(cp::PRDID, PRODUCT_ID.to_owned()),
                Param::Str(cp::TYPDEFNAM, TYPE_DEF.to_owned()),
            ],
        )
    }

    /// Execute a literal SQL statement immediately.
    pub fn execute_immediate(pkg: &PackageRef, sql: &str) -> Result<Self, ProtocolError> {
        Self::new(
            cp::EXCSQLIMM,
            vec![Param::Bytes(cp::PKGNAMCSN, pkg.to_bytes()?)],
        )?
        .with_object(cp::SQLSTT, Bytes::copy_from_slice(sql.as_bytes()))
    }

    /// Prepare a statement, returning descriptors without executing.
    pub fn prepare(pkg: &PackageRef, sql: &str) -> Result<Self, ProtocolError> {
        Self::new(
            cp::PRPSQLSTT,
            vec![Param::Bytes(cp::PKGNAMCSN, pkg.to_bytes()?)],
        )?
        .with_object(cp::SQLSTT, Bytes::copy_from_slice(sql.as_bytes()))
    }

    /// Execute a prepared statement with typed parameter data.
    pub fn execute_prepared(pkg: &PackageRef, param_data: Bytes) -> Result<Self, ProtocolError> {
        Self::new(
            cp::EXCSQLSTT,
            vec![Param::Bytes(cp::PKGNAMCSN, pkg.to_bytes()?)],
        )?
        .with_object(cp::SQLDTA, param_data)
    }

    /// Execute a statement carrying its own text, typically a procedure
    /// CALL, with optional typed parameter data.
    pub fn call(
        pkg: &PackageRef,
        sql: &str,
        param_data: Option<Bytes>,
    ) -> Result<Self, ProtocolError> {
        let request = Self::new(
            cp::EXCSQLSTT,
            vec![Param::Bytes(cp::PKGNAMCSN, pkg.to_bytes()?)],
        )?
        .with_object(cp::SQLSTT, Bytes::copy_from_slice(sql.as_bytes()))?;
        match param_data {
            Some(data) => request.with_object(cp::SQLDTA, data),
            None => Ok(request),
        }
    }

    /// Open a cursor, either for literal SQL or a prepared section (with
    /// optional typed parameters).
    pub fn open_query(
        pkg: &PackageRef,
        sql: Option<&str>,
        param_data: Option<Bytes>,
        query_block_size: u32,
    ) -> Result<Self, ProtocolError> {
        let mut request = Self::new(
            cp::OPNQRY,
            vec![
                Param::Bytes(cp::PKGNAMCSN, pkg.to_bytes()?),
                Param::U32(cp::QRYBLKSZ, query_block_size),
            ],
        )?;
        if let Some(sql) = sql {
            request = request.with_object(cp::SQLSTT, Bytes::copy_from_slice(sql.as_bytes()))?;
        }
        if let Some(data) = param_data {
            request = request.with_object(cp::SQLDTA, data)?;
        }
        Ok(request)
    }

    /// Fetch the next block of rows for an open cursor.
    pub fn continue_query(
        pkg: &PackageRef,
        cursor: &[u8; CURSOR_TOKEN_LEN],
        query_block_size: u32,
    ) -> Result<Self, ProtocolError> {
        Self::new(
            cp::CNTQRY,
            vec![
                Param::Bytes(cp::PKGNAMCSN, pkg.to_bytes()?),
                Param::U32(cp::QRYBLKSZ, query_block_size),
                Param::Bytes(cp::QRYINSID, Bytes::copy_from_slice(cursor)),
            ],
        )
    }

    /// Close an open cursor.
    pub fn close_query(
        pkg: &PackageRef,
        cursor: &[u8; CURSOR_TOKEN_LEN],
    ) -> Result<Self, ProtocolError> {
        Self::new(
            cp::CLSQRY,
            vec![
                Param::Bytes(cp::PKGNAMCSN, pkg.to_bytes()?),
                Param::Bytes(cp::QRYINSID, Bytes::copy_from_slice(cursor)),
            ],
        )
    }

    /// Commit the current unit of work.
    pub fn commit() -> Result<Self, ProtocolError> {
        Self::new(cp::RDBCMM, vec![])
    }

    /// Roll back the current unit of work.
    pub fn rollback() -> Result<Self, ProtocolError> {
        Self::new(cp::RDBRLLBCK, vec![])
    }

    /// The command code point, for logging.
    #[must_use]
    pub fn code_point(&self) -> u16 {
        self.code_point
    }

    /// Frame the exchange under one correlation id.
    ///
    /// All frames but the last carry `CHAINED | SAME_CORRELATION`.
    pub fn encode(&self, correlation_id: u16) -> Result<Bytes, ProtocolError> {
        let mut buf = BytesMut::new();
        let last = self.parts.len() - 1;
        for (i, (kind, object)) in self.parts.iter().enumerate() {
            let flags = if i < last {
                DssFlags::CHAINED | DssFlags::SAME_CORRELATION
            } else {
                DssFlags::empty()
            };
            buf.extend_from_slice(&encode_frame(*kind, flags, correlation_id, object)?);
        }
        Ok(buf.freeze())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::dss::chain_complete;
    use crate::object::parse_objects;

    fn pkg() -> PackageRef {
        PackageRef::new("TESTDB", "NULLID", "SYSSH200", 1)
    }

    #[test]
    fn test_pkgnamcsn_is_64_bytes() {
        let bytes = pkg().to_bytes().unwrap();
        assert_eq!(bytes.len(), 64);
        assert_eq!(&bytes[..6], b"TESTDB");
        assert_eq!(bytes[6], b' ');
        assert_eq!(u16::from_be_bytes([bytes[62], bytes[63]]), 1);
    }

    #[test]
    fn test_overlong_database_name_rejected() {
        let pkg = PackageRef::new("A".repeat(19), "NULLID", "PKG", 1);
        assert!(pkg.to_bytes().is_err());
    }

    #[test]
    fn test_execute_immediate_chains_statement_text() {
        let encoded = Request::execute_immediate(&pkg(), "DELETE FROM T")
            .unwrap()
            .encode(3)
            .unwrap();

        // Two frames: chained EXCSQLIMM then terminal SQLSTT carrier.
        assert!(chain_complete(&encoded).unwrap());
        let objects = parse_objects(&encoded).unwrap();
        assert_eq!(objects[0].code_point, cp::EXCSQLIMM);
        let stt = crate::object::find(&objects, cp::SQLSTT).unwrap();
        assert_eq!(stt.as_text().unwrap(), "DELETE FROM T");
    }

    #[test]
    fn test_excsat_proposes_manager_levels() {
        let encoded = Request::excsat("db2-client").unwrap().encode(1).unwrap();
        let objects = parse_objects(&encoded).unwrap();
        let levels = crate::object::find(&objects, cp::MGRLVLLS).unwrap();
        assert_eq!(levels.children.len(), 4);
        assert_eq!(
            levels.find(cp::SQLAM).unwrap().as_u16().unwrap(),
            MANAGER_LEVEL
        );
    }

    #[test]
    fn test_call_carries_statement_and_parameters() {
        let encoded = Request::call(
            &pkg(),
            "CALL GET_ORDERS(?)",
            Some(Bytes::from_static(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x07])),
        )
        .unwrap()
        .encode(4)
        .unwrap();

        let objects = parse_objects(&encoded).unwrap();
        assert_eq!(objects[0].code_point, cp::EXCSQLSTT);
        let stt = crate::object::find(&objects, cp::SQLSTT).unwrap();
        assert_eq!(stt.as_text().unwrap(), "CALL GET_ORDERS(?)");
        assert!(crate::object::find(&objects, cp::SQLDTA).is_some());
    }

    #[test]
    fn test_continue_query_echoes_cursor_token() {
        let cursor = [9u8; CURSOR_TOKEN_LEN];
        let encoded = Request::continue_query(&pkg(), &cursor, 4096)
            .unwrap()
            .encode(5)
            .unwrap();
        let objects = parse_objects(&encoded).unwrap();
        let token = crate::object::find(&objects, cp::QRYINSID).unwrap();
        assert_eq!(&token.payload[..], &cursor);
    }
}
