//! Connection-scoped session state.
//!
//! One [`Session`] is created per accepted connection and owned
//! exclusively by the `tokio` task handling it — spec's "one session
//! per OS process" (fork-per-connection) maps directly to "one task
//! per accepted connection with no shared in-process mutable state
//! other than the rotation store" (spec §9's design note, quoted
//! almost verbatim).

use std::sync::Arc;

use rekey_auth::{Acceptor, Authorization};
use rekey_kdb::KdbAdmin;
use rekey_store::RotationStore;
use rekey_transport::{ChannelBinding, Connection};
use rekey_wire::{Buffer, EnctypeProfile, ErrorCode, Response};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::{HandlerError, Result};

/// The authentication state machine's three states, in the order
/// spec's `authstate` counter advances through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AuthState {
    /// No GSS context has completed yet.
    Unauthenticated,
    /// The GSS handshake completed; the channel-binding MIC exchange
    /// has not.
    GssComplete,
    /// Both the GSS handshake and the channel-binding MIC exchange
    /// completed. Opcodes above `AUTHCHAN` are only reachable here.
    ChannelBound,
}

/// One connection's state: the framed transport, the in-progress or
/// completed GSS context, the derived authorization, and handles to
/// the shared rotation store and KDB bridge.
pub struct Session<T> {
    conn: Connection<T>,
    acceptor: Option<Acceptor>,
    channel_binding: Option<ChannelBinding>,
    authstate: AuthState,
    authz: Authorization,
    principal_text: Option<String>,
    store: RotationStore,
    kdb: Arc<dyn KdbAdmin>,
    default_realm: String,
    enctype_profile: EnctypeProfile,
    /// Set once `COMMITKEY` has replied `OK` to the client; from that
    /// point on, [`Session::write_error`] is a no-op — spec's `no_send`
    /// guard (§4.7, §7): the host must not see a second wire response
    /// for work that happens after its keytab install is already
    /// acknowledged.
    no_send: bool,
}

impl<T> Session<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Build a session for a real connection: acquires a fresh GSS
    /// acceptor context and stores the channel-binding material
    /// derived from the already-completed TLS handshake.
    pub fn new(
        conn: Connection<T>,
        channel_binding: ChannelBinding,
        store: RotationStore,
        kdb: Arc<dyn KdbAdmin>,
        default_realm: String,
        enctype_profile: EnctypeProfile,
    ) -> Result<Self> {
        let acceptor = Acceptor::new()?;
        Ok(Self {
            conn,
            acceptor: Some(acceptor),
            channel_binding: Some(channel_binding),
            authstate: AuthState::Unauthenticated,
            authz: Authorization::default(),
            principal_text: None,
            store,
            kdb,
            default_realm,
            enctype_profile,
            no_send: false,
        })
    }

    /// Build a session already past authentication, for tests that
    /// exercise the admin/host request handlers without a real GSS
    /// handshake (there is no in-memory GSS double — Kerberos
    /// acceptance genuinely requires a KDC). Not used by the
    /// production `AUTH`/`AUTHCHAN` path.
    #[doc(hidden)]
    #[must_use]
    pub fn for_tests(
        conn: Connection<T>,
        store: RotationStore,
        kdb: Arc<dyn KdbAdmin>,
        default_realm: String,
        enctype_profile: EnctypeProfile,
        authz: Authorization,
        principal_text: String,
    ) -> Self {
        Self {
            conn,
            acceptor: None,
            channel_binding: None,
            authstate: AuthState::ChannelBound,
            authz,
            principal_text: Some(principal_text),
            store,
            kdb,
            default_realm,
            enctype_profile,
            no_send: false,
        }
    }

    /// The framed connection.
    pub fn conn(&mut self) -> &mut Connection<T> {
        &mut self.conn
    }

    /// The in-progress or completed GSS acceptor context, if any.
    pub fn acceptor(&mut self) -> Option<&mut Acceptor> {
        self.acceptor.as_mut()
    }

    /// Channel-binding material derived from the transport, if any.
    #[must_use]
    pub fn channel_binding(&self) -> Option<&ChannelBinding> {
        self.channel_binding.as_ref()
    }

    /// The current authentication state.
    #[must_use]
    pub fn authstate(&self) -> AuthState {
        self.authstate
    }

    /// Advance the authentication state machine.
    pub fn set_authstate(&mut self, state: AuthState) {
        self.authstate = state;
    }

    /// The derived authorization (`is_host`/`is_admin`/`hostname`).
    #[must_use]
    pub fn authz(&self) -> &Authorization {
        &self.authz
    }

    /// Set the derived authorization, once per session, right after a
    /// successful `AUTH`.
    pub fn set_authz(&mut self, authz: Authorization) {
        self.authz = authz;
    }

    /// The authenticated principal's text representation, once known.
    #[must_use]
    pub fn principal_text(&self) -> Option<&str> {
        self.principal_text.as_deref()
    }

    /// Record the authenticated principal's text representation.
    pub fn set_principal_text(&mut self, text: String) {
        self.principal_text = Some(text);
    }

    /// The rotation store handle.
    #[must_use]
    pub fn store(&self) -> &RotationStore {
        &self.store
    }

    /// The KDB bridge handle.
    #[must_use]
    pub fn kdb(&self) -> &dyn KdbAdmin {
        self.kdb.as_ref()
    }

    /// The server's default realm.
    #[must_use]
    pub fn default_realm(&self) -> &str {
        &self.default_realm
    }

    /// The enctype set `NEWREQ` generates absent a per-request
    /// `DESONLY` override.
    #[must_use]
    pub fn enctype_profile(&self) -> EnctypeProfile {
        self.enctype_profile
    }

    /// Whether [`Session::write_error`] has been suppressed by the
    /// `COMMITKEY` `no_send` guard.
    #[must_use]
    pub fn is_send_suppressed(&self) -> bool {
        self.no_send
    }

    /// Suppress all further `ERROR` replies on this connection. Set by
    /// `COMMITKEY` immediately after replying `OK`, since everything
    /// that handler does afterward (the KDB push and rotation cleanup)
    /// must not surface a second wire response.
    pub fn suppress_further_replies(&mut self) {
        self.no_send = true;
    }

    /// Write an `ERROR` response, unless replies are currently
    /// suppressed (see [`Session::suppress_further_replies`]).
    pub async fn write_error(&mut self, code: ErrorCode, message: &str) -> Result<()> {
        if self.no_send {
            return Ok(());
        }
        let mut body = Buffer::new();
        body.put_u32(code.as_u32());
        body.put_str(message);
        self.conn
            .write_frame(Response::Error.as_u32(), &body)
            .await
            .map_err(HandlerError::from)
    }

    /// Write a bare `OK` with no payload.
    pub async fn write_ok(&mut self) -> Result<()> {
        self.conn
            .write_frame(Response::Ok.as_u32(), &Buffer::new())
            .await
            .map_err(HandlerError::from)
    }

    /// Write a response frame with `code` and `body`.
    pub async fn write_response(&mut self, code: Response, body: &Buffer) -> Result<()> {
        self.conn
            .write_frame(code.as_u32(), body)
            .await
            .map_err(HandlerError::from)
    }
}
