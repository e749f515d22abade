//! Opcode dispatch table.

use rekey_wire::{Buffer, Opcode};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::Result;
use crate::handlers::{auth, commitkey, getkeys, newreq, reserved, status};
use crate::session::{AuthState, Session};

/// What the session loop should do after a handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Keep reading frames on this connection.
    Continue,
    /// The handler finalized the session; stop reading.
    Terminate,
}

/// The highest opcode number currently assigned.
pub const MAX_OPCODE: u32 = Opcode::AbortReq as u32;

/// Dispatch one already-decoded request to its handler.
///
/// Gating on `authstate` (spec §4.9: "if `authstate != 2` and `opcode
/// > AUTHCHAN`, reply `AUTHZ` and continue") is the session loop's
/// responsibility, not this function's — by the time a request
/// reaches here it has already passed that check, so every arm below
/// can assume its own preconditions (admin/host) are the only ones
/// left to verify.
pub async fn dispatch<T>(session: &mut Session<T>, opcode: Opcode, req: Buffer) -> Result<Outcome>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    match opcode {
        Opcode::Auth => auth::handle_auth(session, req).await,
        Opcode::AuthErr => auth::handle_autherr(session, req).await,
        Opcode::AuthChan => auth::handle_authchan(session, req).await,
        Opcode::NewReq => newreq::handle(session, req).await,
        Opcode::Status => status::handle(session, req).await,
        Opcode::GetKeys => getkeys::handle(session, req).await,
        Opcode::CommitKey => commitkey::handle(session, req).await,
        Opcode::SimpleKey | Opcode::AbortReq => reserved::handle(session, req).await,
    }
}

/// Whether `opcode` is reachable at the session's current
/// [`AuthState`] — spec §4.9's gate: everything above `AUTHCHAN`
/// requires a fully channel-bound session.
#[must_use]
pub fn opcode_allowed(opcode: Opcode, authstate: AuthState) -> bool {
    authstate == AuthState::ChannelBound || opcode <= Opcode::MAX_UNAUTHENTICATED
}
