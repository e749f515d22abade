//! GSS acceptor-side security context, wrapping `libgssapi`'s
//! `ServerCtx` the way `mssql-auth::IntegratedAuth` wraps `ClientCtx`
//! on the initiator side, with the state transitions
//! `AUTH`/`AUTHCHAN` actually need.

use libgssapi::context::{CtxFlags, SecurityContext, ServerCtx};
use libgssapi::credential::{Cred, CredUsage};

use crate::error::{AuthError, Result};
use crate::exported_name;

/// The context flags this protocol requires of a completed handshake.
pub const REQUIRED_FLAGS: CtxFlags = CtxFlags::GSS_C_MUTUAL_FLAG.union(CtxFlags::GSS_C_INTEG_FLAG);

/// The result of feeding one token to [`Acceptor::step`].
#[derive(Debug)]
pub enum StepOutcome {
    /// The handshake needs another round trip; carries the token to
    /// send back to the client, if the mechanism produced one.
    Continue(Option<Vec<u8>>),
    /// The handshake completed on this call; carries the final output
    /// token, if the mechanism produced one.
    Complete(Option<Vec<u8>>),
}

/// An in-progress or completed acceptor-side GSS security context for
/// one connection.
pub struct Acceptor {
    ctx: ServerCtx,
}

impl Acceptor {
    /// Acquire default server credentials and create a fresh acceptor
    /// context, ready for the first `AUTH` token.
    pub fn new() -> Result<Self> {
        let cred = Cred::acquire(None, None, CredUsage::Accept, None)
            .map_err(|e| AuthError::Gss(e.to_string()))?;
        Ok(Self {
            ctx: ServerCtx::new(Some(cred)),
        })
    }

    /// Feed one client token to `gss_accept_sec_context`.
    ///
    /// On a GSSAPI-level failure this returns `Err`; `libgssapi`'s safe
    /// wrapper does not expose a partial output token alongside a
    /// failed step, so the `AUTH` handler's "reply `AUTHERR` with the
    /// acceptor's output token" branch degrades to the token-less
    /// `ERROR/AUTHN` branch in that case — a deliberate, documented
    /// limitation of the bound library rather than a silent protocol
    /// deviation.
    pub fn step(&mut self, token: &[u8]) -> Result<StepOutcome> {
        if self.ctx.is_complete() {
            return Err(AuthError::AlreadyComplete);
        }
        let out = self
            .ctx
            .step(token)
            .map_err(|e| AuthError::Gss(e.to_string()))?
            .map(|buf| buf.to_vec());
        if self.ctx.is_complete() {
            Ok(StepOutcome::Complete(out))
        } else {
            Ok(StepOutcome::Continue(out))
        }
    }

    /// Whether the handshake has completed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.ctx.is_complete()
    }

    /// The negotiated context flags. Only meaningful once complete.
    pub fn flags(&self) -> Result<CtxFlags> {
        self.ctx.flags().map_err(|e| AuthError::Gss(e.to_string()))
    }

    /// Whether the negotiated flags satisfy [`REQUIRED_FLAGS`].
    pub fn has_required_flags(&self) -> Result<bool> {
        let flags = self.flags()?;
        Ok(flags & REQUIRED_FLAGS == REQUIRED_FLAGS)
    }

    /// Export the authenticated peer's name and decode it into its
    /// principal text, validating the exported-name header along the
    /// way (see [`exported_name`]).
    pub fn peer_principal_text(&self) -> Result<String> {
        if !self.ctx.is_complete() {
            return Err(AuthError::NotEstablished);
        }
        let info = self.ctx.info().map_err(|e| AuthError::Gss(e.to_string()))?;
        let exported = info
            .source_name
            .export()
            .map_err(|e| AuthError::Gss(e.to_string()))?;
        exported_name::decode(&exported)
    }

    /// Sign `msg` with `gss_get_mic`.
    pub fn get_mic(&mut self, msg: &[u8]) -> Result<Vec<u8>> {
        if !self.ctx.is_complete() {
            return Err(AuthError::NotEstablished);
        }
        self.ctx
            .get_mic(libgssapi::context::Qop::default(), msg)
            .map(|buf| buf.to_vec())
            .map_err(|e| AuthError::Gss(e.to_string()))
    }

    /// Verify `mic` over `msg` with `gss_verify_mic`.
    pub fn verify_mic(&mut self, msg: &[u8], mic: &[u8]) -> Result<()> {
        if !self.ctx.is_complete() {
            return Err(AuthError::NotEstablished);
        }
        self.ctx
            .verify_mic(msg, mic)
            .map(|_qop| ())
            .map_err(|_e| AuthError::BadMic)
    }
}
