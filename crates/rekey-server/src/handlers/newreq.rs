//! `NEWREQ` (spec §4.4): begin rotating a principal for a set of
//! target hosts.

use rekey_auth::KerberosPrincipal;
use rekey_wire::{flags, Buffer, ErrorCode, Response};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::dispatch::Outcome;
use crate::error::{HandlerError, Result};
use crate::keygen;
use crate::session::Session;

/// Handle a `NEWREQ` request.
pub async fn handle<T>(session: &mut Session<T>, mut req: Buffer) -> Result<Outcome>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    if !session.authz().is_admin {
        return Err(HandlerError::non_fatal(ErrorCode::AuthZ, "NEWREQ requires an admin principal"));
    }

    let name = req.get_str()?;
    let flag_word = req.get_u32()?;
    let host_count = req.get_u32()?;
    let mut hostnames = Vec::with_capacity(host_count as usize);
    for _ in 0..host_count {
        hostnames.push(req.get_str()?);
    }

    let principal = KerberosPrincipal::parse(&name)
        .map_err(|_| HandlerError::non_fatal(ErrorCode::BadReq, "malformed principal name"))?;
    if !principal.realm_equals(session.default_realm()) {
        return Err(HandlerError::non_fatal(ErrorCode::AuthZ, "principal is not in this server's realm"));
    }

    let current_kvno = session.kdb().current_kvno(&name).await.map_err(HandlerError::from)?;
    let new_kvno = current_kvno + 1;

    let keys = if flag_word & flags::NEWREQ_DESONLY != 0 {
        vec![(i64::from(rekey_wire::enctypes::DES_CBC_CRC), keygen::random_key(rekey_wire::enctypes::DES_CBC_CRC))]
    } else {
        keygen::generate_key_set(session.enctype_profile())
    };

    session
        .store()
        .new_rotation(&name, new_kvno, &hostnames, &keys)
        .await
        .map_err(HandlerError::from)?;

    session.write_response(Response::Ok, &Buffer::new()).await?;
    Ok(Outcome::Continue)
}
