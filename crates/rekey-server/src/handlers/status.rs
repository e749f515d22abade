//! `STATUS` (spec §4.5): report the ACL completion status of an
//! in-progress rotation.

use rekey_wire::{flags, Buffer, ErrorCode, Response};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::dispatch::Outcome;
use crate::error::{HandlerError, Result};
use crate::session::Session;

/// Handle a `STATUS` request.
pub async fn handle<T>(session: &mut Session<T>, mut req: Buffer) -> Result<Outcome>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    if !session.authz().is_admin {
        return Err(HandlerError::non_fatal(ErrorCode::AuthZ, "STATUS requires an admin principal"));
    }

    let name = req.get_str()?;
    let rows = session.store().status(&name).await.map_err(HandlerError::from)?;

    let mut resp = Buffer::new();
    resp.put_u32(0);
    resp.put_u32(rows.len() as u32);
    for row in &rows {
        let mut flag_word = 0;
        if row.attempted {
            flag_word |= flags::status::ATTEMPTED;
        }
        if row.complete {
            flag_word |= flags::status::COMPLETE;
        }
        resp.put_u32(flag_word);
        resp.put_str(&row.hostname);
    }

    session.write_response(Response::Status, &resp).await?;
    Ok(Outcome::Continue)
}
