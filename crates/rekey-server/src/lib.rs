//! # rekey-server
//!
//! The request pipeline for a Kerberos principal re-keying service:
//! the GSS authentication state machine and channel binding, the
//! authorization classifier, the opcode dispatcher and its nine
//! handlers, and the session loop that ties them to one accepted
//! connection.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod keygen;
pub mod session;
pub mod stdio;
pub mod tls;

use rekey_wire::{ErrorCode, Opcode};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::dispatch::Outcome;
use crate::error::HandlerError;
use crate::session::Session;

/// Drive one session to completion: read frames, gate on `authstate`,
/// dispatch, and write replies, until the peer closes the connection
/// or a handler finalizes the session (spec §4.9).
pub async fn run_session<T>(session: &mut Session<T>)
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let frame = match session.conn().read_frame().await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                tracing::debug!("peer closed connection");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "transport read failed; finalizing session");
                return;
            }
        };

        let opcode = match Opcode::from_u32(frame.code) {
            Ok(opcode) => opcode,
            Err(_) => {
                if session.write_error(ErrorCode::BadOp, "unrecognized opcode").await.is_err() {
                    return;
                }
                continue;
            }
        };

        if !dispatch::opcode_allowed(opcode, session.authstate()) {
            if session.write_error(ErrorCode::AuthZ, "this opcode requires a fully bound session").await.is_err() {
                return;
            }
            continue;
        }

        match dispatch::dispatch(session, opcode, frame.body).await {
            Ok(Outcome::Continue) => continue,
            Ok(Outcome::Terminate) => return,
            Err(e) => {
                let fatal = e.is_fatal();
                log_handler_error(opcode, &e);
                if let Some(code) = e.wire_code() {
                    if session.write_error(code, &e.wire_message()).await.is_err() {
                        return;
                    }
                }
                if fatal {
                    return;
                }
            }
        }
    }
}

fn log_handler_error(opcode: Opcode, error: &HandlerError) {
    if error.is_fatal() {
        tracing::error!(?opcode, error = %error, "fatal handler error");
    } else {
        tracing::warn!(?opcode, error = %error, "handler rejected request");
    }
}
