//! DDM code points.
//!
//! Code points are the 16-bit tags identifying the semantic meaning of a DDM
//! object. The constants below cover every object this driver sends or
//! inspects; anything else on the wire is carried as an opaque object and
//! skipped during traversal rather than rejected.

/// Exchange server attributes request.
pub const EXCSAT: u16 = 0x1041;
/// Exchange server attributes reply data.
pub const EXCSATRD: u16 = 0x1443;
/// Access security request.
pub const ACCSEC: u16 = 0x106D;
/// Access security reply data.
pub const ACCSECRD: u16 = 0x14AC;
/// Security check request.
pub const SECCHK: u16 = 0x106E;
/// Security check reply message.
pub const SECCHKRM: u16 = 0x1219;
/// Access RDB (attach database) request.
pub const ACCRDB: u16 = 0x2001;
/// Access RDB reply message.
pub const ACCRDBRM: u16 = 0x2201;

/// Execute immediate SQL statement.
pub const EXCSQLIMM: u16 = 0x200A;
/// Execute prepared SQL statement.
pub const EXCSQLSTT: u16 = 0x200B;
/// Open query.
pub const OPNQRY: u16 = 0x200C;
/// Open query reply message.
pub const OPNQRYRM: u16 = 0x2205;
/// Prepare SQL statement.
pub const PRPSQLSTT: u16 = 0x200D;
/// Continue (fetch) query.
pub const CNTQRY: u16 = 0x2006;
/// Close query.
pub const CLSQRY: u16 = 0x2005;
/// End of query reply message.
pub const ENDQRYRM: u16 = 0x220B;
/// RDB commit unit of work.
pub const RDBCMM: u16 = 0x200E;
/// RDB rollback unit of work.
pub const RDBRLLBCK: u16 = 0x200F;
/// End unit of work reply message.
pub const ENDUOWRM: u16 = 0x220C;

/// SQL communications area (status) reply object.
pub const SQLCARD: u16 = 0x2408;
/// SQL descriptor area reply object (column/parameter descriptors).
pub const SQLDARD: u16 = 0x2411;
/// SQL statement text.
pub const SQLSTT: u16 = 0x2414;
/// SQL statement attributes.
pub const SQLATTR: u16 = 0x2450;
/// Typed SQL parameter data.
pub const SQLDTA: u16 = 0x2412;
/// Query answer set data (row area).
pub const QRYDTA: u16 = 0x241B;
/// Query instance identifier (cursor token).
pub const QRYINSID: u16 = 0x215B;
/// Result-set count reply message (stored procedures).
pub const RSLSETRM: u16 = 0x2219;
/// Rows-affected count side object.
pub const SQLNUMROW: u16 = 0x2419;

/// External name (client identity).
pub const EXTNAM: u16 = 0x115E;
/// Server name.
pub const SRVNAM: u16 = 0x116D;
/// Server class name.
pub const SRVCLSNM: u16 = 0x1147;
/// Server product release level.
pub const SRVRLSLV: u16 = 0x115A;
/// Manager-level list.
pub const MGRLVLLS: u16 = 0x1404;
/// Agent manager.
pub const AGENT: u16 = 0x1403;
/// SQL application manager.
pub const SQLAM: u16 = 0x2407;
/// Relational database manager.
pub const RDB: u16 = 0x240F;
/// Security manager.
pub const SECMGR: u16 = 0x1440;
/// Security mechanism.
pub const SECMEC: u16 = 0x11A2;
/// Security check code.
pub const SECCHKCD: u16 = 0x11A4;
/// Severity code.
pub const SVRCOD: u16 = 0x1149;
/// User ID.
pub const USRID: u16 = 0x11A0;
/// Password.
pub const PASSWORD: u16 = 0x11A1;
/// Relational database name.
pub const RDBNAM: u16 = 0x2110;
/// RDB access class.
pub const RDBACCCL: u16 = 0x210F;
/// Product identifier.
pub const PRDID: u16 = 0x112E;
/// Data type definition name.
pub const TYPDEFNAM: u16 = 0x002F;
/// Package name, consistency token, and section number.
pub const PKGNAMCSN: u16 = 0x2113;
/// Query block size.
pub const QRYBLKSZ: u16 = 0x2114;

/// Security mechanism: clear-text user ID and password.
pub const SECMEC_USRIDPWD: u16 = 0x0003;

/// Human-readable name for a code point, for logging and diagnostics.
///
/// Unknown code points are legal on the wire, so this returns `None` rather
/// than failing for values outside the recognized set.
#[must_use]
pub fn name(code_point: u16) -> Option<&'static str> {
    Some(match code_point {
        EXCSAT => "EXCSAT",
        EXCSATRD => "EXCSATRD",
        ACCSEC => "ACCSEC",
        ACCSECRD => "ACCSECRD",
        SECCHK => "SECCHK",
        SECCHKRM => "SECCHKRM",
        ACCRDB => "ACCRDB",
        ACCRDBRM => "ACCRDBRM",
        EXCSQLIMM => "EXCSQLIMM",
        EXCSQLSTT => "EXCSQLSTT",
        OPNQRY => "OPNQRY",
        OPNQRYRM => "OPNQRYRM",
        PRPSQLSTT => "PRPSQLSTT",
        CNTQRY => "CNTQRY",
        CLSQRY => "CLSQRY",
        ENDQRYRM => "ENDQRYRM",
        RDBCMM => "RDBCMM",
        RDBRLLBCK => "RDBRLLBCK",
        ENDUOWRM => "ENDUOWRM",
        SQLCARD => "SQLCARD",
        SQLDARD => "SQLDARD",
        SQLSTT => "SQLSTT",
        SQLATTR => "SQLATTR",
        SQLDTA => "SQLDTA",
        QRYDTA => "QRYDTA",
        QRYINSID => "QRYINSID",
        RSLSETRM => "RSLSETRM",
        SQLNUMROW => "SQLNUMROW",
        EXTNAM => "EXTNAM",
        SRVNAM => "SRVNAM",
        SRVCLSNM => "SRVCLSNM",
        SRVRLSLV => "SRVRLSLV",
        MGRLVLLS => "MGRLVLLS",
        AGENT => "AGENT",
        SQLAM => "SQLAM",
        RDB => "RDB",
        SECMGR => "SECMGR",
        SECMEC => "SECMEC",
        SECCHKCD => "SECCHKCD",
        SVRCOD => "SVRCOD",
        USRID => "USRID",
        PASSWORD => "PASSWORD",
        RDBNAM => "RDBNAM",
        RDBACCCL => "RDBACCCL",
        PRDID => "PRDID",
        TYPDEFNAM => "TYPDEFNAM",
        PKGNAMCSN => "PKGNAMCSN",
        QRYBLKSZ => "QRYBLKSZ",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_resolve() {
        assert_eq!(name(EXCSAT), Some("EXCSAT"));
        assert_eq!(name(SQLCARD), Some("SQLCARD"));
        assert_eq!(name(QRYINSID), Some("QRYINSID"));
    }

    #[test]
    fn unknown_names_return_none() {
        assert_eq!(name(0xBEEF), None);
    }
}
