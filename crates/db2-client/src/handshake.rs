//! Connection handshake coordinator.
//!
//! The sequence is fixed and linear: EXCSAT, ACCSEC, SECCHK, ACCRDB. A
//! failure at any step aborts the attempt; the caller drops the transport
//! and never sees a partially-authenticated session.

use drda_protocol::object::{self, Object};
use drda_protocol::{Request, Sqlca, codepoint as cp, sqlca::security_check_reason};
use tokio::io::{AsyncRead, AsyncWrite};

use db2_codec::Connection;

use crate::config::Config;
use crate::error::{Error, Result, sql_error};

/// Server identity captured during the attribute exchange.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Server name (SRVNAM).
    pub server_name: Option<String>,
    /// Server class name (SRVCLSNM).
    pub server_class: Option<String>,
    /// Server product release level (SRVRLSLV).
    pub server_release: Option<String>,
}

fn text_of(parent: &Object, code_point: u16) -> Option<String> {
    parent
        .find(code_point)
        .and_then(|o| o.as_text().ok().map(str::to_owned))
}

/// Run the four-step handshake over an established transport.
pub(crate) async fn authenticate<T>(
    conn: &mut Connection<T>,
    config: &Config,
) -> Result<Session>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    // Step 1: exchange server attributes. Anything but EXCSATRD here means
    // the peer is not a DRDA server; no further frames are sent.
    conn.send(&Request::excsat(&config.client_name)?).await?;
    let reply = conn.read_reply(config.read_timeout).await?;
    let objects = reply.objects()?;
    let Some(attrs) = object::find(&objects, cp::EXCSATRD) else {
        return Err(Error::NotDrda);
    };
    let session = Session {
        server_name: text_of(attrs, cp::SRVNAM),
        server_class: text_of(attrs, cp::SRVCLSNM),
        server_release: text_of(attrs, cp::SRVRLSLV),
    };
    tracing::debug!(
        server = session.server_name.as_deref().unwrap_or("?"),
        class = session.server_class.as_deref().unwrap_or("?"),
        "server attributes exchanged"
    );

    // Step 2: propose the user/password mechanism. The reply must echo an
    // affirmative SECMEC; its absence is a rejection.
    conn.send(&Request::accsec(&config.database)?).await?;
    let reply = conn.read_reply(config.read_timeout).await?;
    let objects = reply.objects()?;
    let Some(secrd) = object::find(&objects, cp::ACCSECRD) else {
        return Err(Error::UnexpectedReply("missing ACCSECRD"));
    };
    let accepted = secrd
        .find(cp::SECMEC)
        .and_then(|o| o.as_u16().ok())
        .is_some_and(|mech| mech == cp::SECMEC_USRIDPWD);
    if !accepted {
        let reason = match secrd.find(cp::SVRCOD).and_then(|o| o.as_u16().ok()) {
            Some(code) => format!("security mechanism rejected (SVRCOD {code})"),
            None => "security mechanism rejected".to_owned(),
        };
        return Err(Error::Authentication { code: 0, reason });
    }

    // Step 3: send the credentials and read the check code.
    conn.send(&Request::secchk(
        &config.database,
        &config.username,
        &config.password,
    )?)
    .await?;
    let reply = conn.read_reply(config.read_timeout).await?;
    let objects = reply.objects()?;
    let Some(checkrm) = object::find(&objects, cp::SECCHKRM) else {
        return Err(Error::UnexpectedReply("missing SECCHKRM"));
    };
    let code = checkrm
        .find(cp::SECCHKCD)
        .ok_or(Error::UnexpectedReply("missing SECCHKCD"))?
        .as_u8()?;
    if code != 0 {
        let reason = match security_check_reason(code) {
            Some(reason) => reason.to_owned(),
            None => format!("security check code {code}"),
        };
        return Err(Error::Authentication { code, reason });
    }

    // Step 4: attach to the database. A non-error SQLCA completes the
    // handshake; reply fields beyond identity are discarded.
    conn.send(&Request::accrdb(&config.database)?).await?;
    let reply = conn.read_reply(config.read_timeout).await?;
    let objects = reply.objects()?;
    if object::find(&objects, cp::ACCRDBRM).is_none() {
        return Err(Error::UnexpectedReply("missing ACCRDBRM"));
    }
    if let Some(sqlca) = Sqlca::find_in(&objects)? {
        if sqlca.is_error() {
            return Err(sql_error(sqlca));
        }
    }

    tracing::info!(
        database = %config.database,
        user = %config.username,
        "handshake complete"
    );
    Ok(session)
}
