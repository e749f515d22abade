//! `COMMITKEY` (spec §4.7): acknowledge that a host installed its new
//! keys, and, for the last host to acknowledge, push the finished key
//! set to KDB and garbage-collect the rotation.
//!
//! Steps 5–9 of spec §4.7 run after the client has already received
//! its `OK` (step 4); from that point on this handler only logs,
//! never replies — see [`Session::suppress_further_replies`].

use rekey_store::CommitAck;
use rekey_wire::{enctypes, Buffer, ErrorCode, Response};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::dispatch::Outcome;
use crate::error::{HandlerError, Result};
use crate::session::Session;

/// Handle a `COMMITKEY` request.
pub async fn handle<T>(session: &mut Session<T>, mut req: Buffer) -> Result<Outcome>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    if !session.authz().is_host {
        return Err(HandlerError::non_fatal(ErrorCode::AuthZ, "COMMITKEY requires a host principal"));
    }
    let Some(hostname) = session.authz().hostname.clone() else {
        return Err(HandlerError::non_fatal(ErrorCode::AuthZ, "COMMITKEY requires a host principal"));
    };

    let name = req.get_str()?;
    let kvno = i64::from(req.get_u32()?);

    let ack = match session.store().commit_ack(&name, kvno, &hostname).await {
        Ok(ack) => ack,
        Err(rekey_store::StoreError::NotFound) => {
            return Err(HandlerError::non_fatal(ErrorCode::AuthZ, "no rekey in progress"));
        }
        Err(e) => return Err(e.into()),
    };

    session.write_response(Response::Ok, &Buffer::new()).await?;
    session.suppress_further_replies();

    let CommitAck::LastAcknowledger { principal_id } = ack else {
        return Ok(Outcome::Continue);
    };

    finalize_rotation(session, principal_id, &name, kvno).await;
    Ok(Outcome::Continue)
}

/// Push the finished key set to KDB and garbage-collect the rotation
/// (spec §4.7 steps 6–9). Every failure here is logged, not replied.
async fn finalize_rotation<T>(session: &mut Session<T>, principal_id: i64, name: &str, kvno: i64)
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    let current_kvno = match session.kdb().current_kvno(name).await {
        Ok(kvno) => kvno,
        Err(rekey_kdb::KdbError::NotFound) => {
            record_terminal(session, principal_id, "Principal disappeared from kdc").await;
            return;
        }
        Err(e) => {
            tracing::error!(principal = name, error = %e, "KDB lookup failed while finalizing rotation");
            return;
        }
    };
    if current_kvno != kvno - 1 {
        record_terminal(session, principal_id, "kvno changed on kdc").await;
        return;
    }

    let keys = match session.store().keys_for_principal(principal_id).await {
        Ok(keys) => keys,
        Err(e) => {
            tracing::error!(principal = name, error = %e, "failed to read key rows while finalizing rotation");
            return;
        }
    };

    let mut push_set: Vec<(i64, Vec<u8>)> = Vec::with_capacity(keys.len() + 2);
    for key in &keys {
        push_set.push((key.enctype, key.key.clone()));
        if key.enctype == i64::from(enctypes::DES_CBC_CRC) {
            push_set.push((i64::from(enctypes::DES_CBC_MD4), key.key.clone()));
            push_set.push((i64::from(enctypes::DES_CBC_MD5), key.key.clone()));
        }
    }

    if let Err(e) = session.kdb().commit_keys(name, kvno, &push_set).await {
        record_terminal(session, principal_id, &format!("updating kdc failed: {e}")).await;
        return;
    }

    if let Err(e) = session.store().delete_rotation(principal_id).await {
        tracing::error!(principal = name, error = %e, "failed to delete completed rotation");
    }
}

async fn record_terminal<T>(session: &mut Session<T>, principal_id: i64, message: &str)
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    tracing::warn!(principal_id, message, "rotation finalization stopped");
    if let Err(e) = session.store().record_terminal_message(principal_id, message).await {
        tracing::error!(principal_id, error = %e, "failed to record terminal message");
    }
}
