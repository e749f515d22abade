//! `SIMPLEKEY`, `ABORTREQ` (spec §4.8): reserved opcodes, accepted but
//! not yet implemented.

use rekey_wire::{Buffer, ErrorCode};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::dispatch::Outcome;
use crate::error::{HandlerError, Result};
use crate::session::Session;

/// Handle a `SIMPLEKEY` or `ABORTREQ` request.
pub async fn handle<T>(session: &mut Session<T>, _req: Buffer) -> Result<Outcome>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    if !session.authz().is_admin {
        return Err(HandlerError::non_fatal(ErrorCode::AuthZ, "this opcode requires an admin principal"));
    }
    Err(HandlerError::non_fatal(ErrorCode::BadOp, "Not implemented yet"))
}
