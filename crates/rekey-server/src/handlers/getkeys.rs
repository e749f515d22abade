//! `GETKEYS` (spec §4.6): fetch the generated keys for every rotation
//! targeting this host.

use rekey_wire::{Buffer, ErrorCode, Response};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::dispatch::Outcome;
use crate::error::{HandlerError, Result};
use crate::session::Session;

/// Handle a `GETKEYS` request.
pub async fn handle<T>(session: &mut Session<T>, _req: Buffer) -> Result<Outcome>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    let Some(hostname) = session.authz().hostname.clone().filter(|_| session.authz().is_host) else {
        return Err(HandlerError::non_fatal(ErrorCode::NoKeys, "GETKEYS requires a host principal"));
    };

    let principals = session.store().get_keys_for_host(&hostname).await.map_err(HandlerError::from)?;
    if principals.is_empty() {
        return Err(HandlerError::non_fatal(ErrorCode::NoKeys, "no rotation targets this host"));
    }

    let mut resp = Buffer::new();
    resp.put_u32(principals.len() as u32);
    for principal in &principals {
        resp.put_str(&principal.name);
        resp.put_u32(principal.kvno as u32);
        resp.put_u32(principal.keys.len() as u32);
        for key in &principal.keys {
            resp.put_u32(key.enctype as u32);
            resp.put_bytes(&key.key);
        }
    }

    session.write_response(Response::Keys, &resp).await?;
    Ok(Outcome::Continue)
}
