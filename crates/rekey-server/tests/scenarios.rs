//! End-to-end scenarios over a loopback transport, driving the real
//! session loop and handlers against `rekey-testing`'s fixtures. These
//! are the cross-cutting properties from spec §8: no in-memory GSS
//! double exists, so every session here starts already authenticated
//! via `Session::for_tests`, exercising everything from `NEWREQ`
//! onward.

use std::sync::Arc;

use rekey_auth::Authorization;
use rekey_kdb::KdbAdmin;
use rekey_server::session::Session;
use rekey_testing::{loopback, memory_store, FakeKdb};
use rekey_wire::{Buffer, ErrorCode, EnctypeProfile, Opcode, Response};

const REALM: &str = "EXAMPLE.ORG";

fn admin() -> Authorization {
    Authorization {
        is_host: false,
        is_admin: true,
        hostname: None,
    }
}

fn host(name: &str) -> Authorization {
    Authorization {
        is_host: true,
        is_admin: false,
        hostname: Some(name.to_string()),
    }
}

/// Spawn a session owning one end of a loopback pair and return the
/// other end for the test to drive.
fn spawn(
    store: rekey_store::RotationStore,
    kdb: Arc<dyn KdbAdmin>,
    authz: Authorization,
    principal_text: &str,
) -> rekey_transport::Connection<tokio::io::DuplexStream> {
    let (client, server) = loopback();
    let mut session = Session::for_tests(
        server,
        store,
        kdb,
        REALM.to_string(),
        EnctypeProfile::Modern,
        authz,
        principal_text.to_string(),
    );
    tokio::spawn(async move {
        rekey_server::run_session(&mut session).await;
    });
    client
}

async fn newreq(
    client: &mut rekey_transport::Connection<tokio::io::DuplexStream>,
    name: &str,
    hostnames: &[&str],
) -> Response {
    let mut req = Buffer::new();
    req.put_str(name);
    req.put_u32(0);
    req.put_u32(hostnames.len() as u32);
    for h in hostnames {
        req.put_str(h);
    }
    client.write_frame(Opcode::NewReq.as_u32(), &req).await.unwrap();
    let frame = client.read_frame().await.unwrap().unwrap();
    response_from_code(frame.code)
}

fn response_from_code(code: u32) -> Response {
    match code {
        c if c == Response::Ok.as_u32() => Response::Ok,
        c if c == Response::Status.as_u32() => Response::Status,
        c if c == Response::Keys.as_u32() => Response::Keys,
        c if c == Response::Error.as_u32() => Response::Error,
        other => panic!("unexpected response code {other}"),
    }
}

#[tokio::test]
async fn admin_opens_rotation_for_two_hosts() {
    let store = memory_store().await;
    let kdb: Arc<dyn KdbAdmin> = Arc::new(FakeKdb::new().with_kvno("svc/db@EXAMPLE.ORG", 5));
    let mut client = spawn(store.clone(), Arc::clone(&kdb), admin(), "alice/admin@EXAMPLE.ORG");

    let resp = newreq(&mut client, "svc/db@EXAMPLE.ORG", &["h1.example", "h2.example"]).await;
    assert_eq!(resp, Response::Ok);

    let status = store.status("svc/db@EXAMPLE.ORG").await.unwrap();
    assert_eq!(status.len(), 2);
}

#[tokio::test]
async fn repeat_newreq_for_same_principal_is_rejected() {
    let store = memory_store().await;
    let kdb: Arc<dyn KdbAdmin> = Arc::new(FakeKdb::new().with_kvno("svc/db@EXAMPLE.ORG", 5));
    let mut client = spawn(store, Arc::clone(&kdb), admin(), "alice/admin@EXAMPLE.ORG");

    assert_eq!(newreq(&mut client, "svc/db@EXAMPLE.ORG", &["h1.example"]).await, Response::Ok);
    assert_eq!(newreq(&mut client, "svc/db@EXAMPLE.ORG", &["h1.example"]).await, Response::Error);
}

#[tokio::test]
async fn wrong_realm_principal_is_rejected_with_authz() {
    let store = memory_store().await;
    let kdb: Arc<dyn KdbAdmin> = Arc::new(FakeKdb::new());
    let mut client = spawn(store, kdb, admin(), "alice/admin@EXAMPLE.ORG");

    let mut req = Buffer::new();
    req.put_str("svc/db@OTHER.ORG");
    req.put_u32(0);
    req.put_u32(0);
    client.write_frame(Opcode::NewReq.as_u32(), &req).await.unwrap();
    let frame = client.read_frame().await.unwrap().unwrap();
    assert_eq!(frame.code, Response::Error.as_u32());
    let code = frame.body.clone().into_vec();
    assert_eq!(u32::from_be_bytes(code[0..4].try_into().unwrap()), ErrorCode::AuthZ.as_u32());
}

#[tokio::test]
async fn getkeys_without_host_principal_reports_nokeys() {
    let store = memory_store().await;
    let kdb: Arc<dyn KdbAdmin> = Arc::new(FakeKdb::new());
    let mut client = spawn(store, kdb, admin(), "alice/admin@EXAMPLE.ORG");

    client.write_frame(Opcode::GetKeys.as_u32(), &Buffer::new()).await.unwrap();
    let frame = client.read_frame().await.unwrap().unwrap();
    assert_eq!(frame.code, Response::Error.as_u32());
    let body = frame.body.clone().into_vec();
    assert_eq!(u32::from_be_bytes(body[0..4].try_into().unwrap()), ErrorCode::NoKeys.as_u32());
}

#[tokio::test]
async fn last_host_to_commit_triggers_kdb_push_and_rotation_cleanup() {
    let store = memory_store().await;
    let kdb: Arc<dyn KdbAdmin> = Arc::new(FakeKdb::new().with_kvno("svc/db@EXAMPLE.ORG", 5));

    let mut admin_client = spawn(store.clone(), Arc::clone(&kdb), admin(), "alice/admin@EXAMPLE.ORG");
    assert_eq!(
        newreq(&mut admin_client, "svc/db@EXAMPLE.ORG", &["h1.example", "h2.example"]).await,
        Response::Ok
    );

    let mut h1 = spawn(store.clone(), Arc::clone(&kdb), host("h1.example"), "host/h1.example@EXAMPLE.ORG");
    h1.write_frame(Opcode::GetKeys.as_u32(), &Buffer::new()).await.unwrap();
    let frame = h1.read_frame().await.unwrap().unwrap();
    assert_eq!(frame.code, Response::Keys.as_u32());

    let mut commit_req = Buffer::new();
    commit_req.put_str("svc/db@EXAMPLE.ORG");
    commit_req.put_u32(6);
    h1.write_frame(Opcode::CommitKey.as_u32(), &commit_req).await.unwrap();
    let frame = h1.read_frame().await.unwrap().unwrap();
    assert_eq!(frame.code, Response::Ok.as_u32());

    // Rotation is not yet gone: h2 has not acknowledged.
    assert!(store.rotation_exists("svc/db@EXAMPLE.ORG").await.unwrap());

    let mut h2 = spawn(store.clone(), Arc::clone(&kdb), host("h2.example"), "host/h2.example@EXAMPLE.ORG");
    let mut commit_req2 = Buffer::new();
    commit_req2.put_str("svc/db@EXAMPLE.ORG");
    commit_req2.put_u32(6);
    h2.write_frame(Opcode::CommitKey.as_u32(), &commit_req2).await.unwrap();
    let frame = h2.read_frame().await.unwrap().unwrap();
    assert_eq!(frame.code, Response::Ok.as_u32());

    // Give the finalization tail (runs after the OK reply) a chance to land.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    assert_eq!(kdb.current_kvno("svc/db@EXAMPLE.ORG").await.unwrap(), 6);
    assert!(!store.rotation_exists("svc/db@EXAMPLE.ORG").await.unwrap());
}

#[tokio::test]
async fn status_ors_attempted_and_complete_bits() {
    // Two hosts, so h1's ACL row survives to be inspected: h2 never
    // acknowledges, so the rotation is never garbage-collected.
    let store = memory_store().await;
    let kdb: Arc<dyn KdbAdmin> = Arc::new(FakeKdb::new().with_kvno("svc/db@EXAMPLE.ORG", 5));
    let mut admin_client = spawn(store.clone(), Arc::clone(&kdb), admin(), "alice/admin@EXAMPLE.ORG");
    assert_eq!(
        newreq(&mut admin_client, "svc/db@EXAMPLE.ORG", &["h1.example", "h2.example"]).await,
        Response::Ok
    );

    let mut h1 = spawn(store.clone(), Arc::clone(&kdb), host("h1.example"), "host/h1.example@EXAMPLE.ORG");
    h1.write_frame(Opcode::GetKeys.as_u32(), &Buffer::new()).await.unwrap();
    h1.read_frame().await.unwrap().unwrap();

    let mut commit_req = Buffer::new();
    commit_req.put_str("svc/db@EXAMPLE.ORG");
    commit_req.put_u32(6);
    h1.write_frame(Opcode::CommitKey.as_u32(), &commit_req).await.unwrap();
    h1.read_frame().await.unwrap().unwrap();

    let mut status_req = Buffer::new();
    status_req.put_str("svc/db@EXAMPLE.ORG");
    admin_client.write_frame(Opcode::Status.as_u32(), &status_req).await.unwrap();
    let frame = admin_client.read_frame().await.unwrap().unwrap();
    assert_eq!(frame.code, Response::Status.as_u32());

    let mut body = frame.body;
    let _status = body.get_u32().unwrap();
    let count = body.get_u32().unwrap();
    assert_eq!(count, 2);
    let mut saw_h1_both_bits = false;
    for _ in 0..count {
        let flag_word = body.get_u32().unwrap();
        let hostname = body.get_str().unwrap();
        if hostname == "h1.example" {
            assert_eq!(flag_word, rekey_wire::flags::status::ATTEMPTED | rekey_wire::flags::status::COMPLETE);
            saw_h1_both_bits = true;
        }
    }
    assert!(saw_h1_both_bits);
}
