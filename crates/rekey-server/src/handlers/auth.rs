//! `AUTH`, `AUTHERR`, `AUTHCHAN` — the authentication state machine
//! (spec §4.2).

use rekey_auth::{classify, AuthError, KerberosPrincipal, StepOutcome};
use rekey_wire::{flags, Buffer, ErrorCode, Response};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::dispatch::Outcome;
use crate::error::{HandlerError, Result};
use crate::session::{AuthState, Session};

/// `AUTH` (state 0 → 0 or 1): feed one client token to the GSS
/// acceptor and reply with its continuation token, a final token, or
/// a bare `OK`.
pub async fn handle_auth<T>(session: &mut Session<T>, mut req: Buffer) -> Result<Outcome>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    let flag_word = req.get_u32()?;
    let more = flag_word & flags::AUTH_MORE != 0;
    let token = req.get_bytes()?;

    let Some(acceptor) = session.acceptor() else {
        return Err(HandlerError::fatal(ErrorCode::AuthN, "no acceptor context for this session"));
    };

    let step = acceptor.step(&token);
    match step {
        Err(_gss_error) => {
            // `libgssapi`'s safe wrapper does not expose a partial
            // output token alongside a failed step (see
            // rekey_auth::acceptor's doc comment), so the spec's
            // "reply AUTHERR carrying the acceptor's output token"
            // branch is unreachable here; we always take the
            // token-less ERROR/AUTHN branch.
            session.write_error(ErrorCode::AuthN, "GSSAPI acceptor rejected the token").await?;
            Ok(Outcome::Continue)
        }
        Ok(StepOutcome::Continue(out)) => {
            let Some(out) = out else {
                return Err(HandlerError::fatal(
                    ErrorCode::Other,
                    "GSS acceptor requested continuation but produced no output token",
                ));
            };
            send_auth_token(session, &out, more).await?;
            Ok(Outcome::Continue)
        }
        Ok(StepOutcome::Complete(out)) => complete_handshake(session, out, more).await,
    }
}

async fn send_auth_token<T>(session: &mut Session<T>, token: &[u8], more: bool) -> Result<()>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    if !more {
        return Err(HandlerError::fatal(
            ErrorCode::Other,
            "server produced a continuation token but the client did not set MORE",
        ));
    }
    let mut resp = Buffer::new();
    resp.put_bytes(token);
    session.write_response(Response::Auth, &resp).await
}

async fn complete_handshake<T>(session: &mut Session<T>, out: Option<Vec<u8>>, more: bool) -> Result<Outcome>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    let has_required_flags = session
        .acceptor()
        .expect("just stepped")
        .has_required_flags()
        .map_err(HandlerError::from)?;
    if !has_required_flags {
        session.write_error(ErrorCode::AuthN, "GSS context is missing required mutual/integrity flags").await?;
        return Ok(Outcome::Terminate);
    }

    let principal_text = session
        .acceptor()
        .expect("just stepped")
        .peer_principal_text()
        .map_err(HandlerError::from)?;
    let principal = KerberosPrincipal::parse(&principal_text)
        .map_err(|_| HandlerError::fatal(ErrorCode::AuthN, "authenticated principal name failed to parse"))?;
    let authz = classify(&principal, session.default_realm());

    session.set_authz(authz);
    session.set_principal_text(principal_text);
    session.set_authstate(AuthState::GssComplete);

    match out {
        Some(out) => send_auth_token(session, &out, more).await?,
        None => session.write_ok().await?,
    }
    Ok(Outcome::Continue)
}

/// `AUTHERR` (state 0): the client reports a local authentication
/// failure. Feed the token to the acceptor purely so the GSS
/// mechanism-level error gets logged, reply `OK`, and end the
/// session.
pub async fn handle_autherr<T>(session: &mut Session<T>, mut req: Buffer) -> Result<Outcome>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    let token = req.get_bytes()?;
    if let Some(acceptor) = session.acceptor() {
        if let Err(e) = acceptor.step(&token) {
            tracing::info!(error = %e, "client-reported authentication failure");
        }
    }
    session.write_ok().await?;
    Ok(Outcome::Terminate)
}

/// `AUTHCHAN` (state 1 → 2): verify the client's MIC over the
/// channel-binding string, and reply with our own MIC over the
/// reverse ordering.
pub async fn handle_authchan<T>(session: &mut Session<T>, mut req: Buffer) -> Result<Outcome>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    let mic = req.get_bytes()?;

    let Some(channel_binding) = session.channel_binding().cloned() else {
        return Err(HandlerError::fatal(
            ErrorCode::AuthN,
            "no channel-binding material available for this transport",
        ));
    };
    let Some(acceptor) = session.acceptor() else {
        return Err(HandlerError::fatal(ErrorCode::AuthN, "no acceptor context for this session"));
    };

    match acceptor.verify_mic(channel_binding.verification_bytes(), &mic) {
        Err(AuthError::BadMic) => {
            return Err(HandlerError::fatal(ErrorCode::AuthN, "Channel binding verification failed"));
        }
        Err(other) => {
            session.write_error(ErrorCode::AuthN, &other.to_string()).await?;
            return Ok(Outcome::Continue);
        }
        Ok(()) => {}
    }

    let reply_mic = acceptor
        .get_mic(channel_binding.reply_bytes())
        .map_err(HandlerError::from)?;
    let mut resp = Buffer::new();
    resp.put_bytes(&reply_mic);
    session.write_response(Response::AuthChan, &resp).await?;
    session.set_authstate(AuthState::ChannelBound);
    Ok(Outcome::Continue)
}
