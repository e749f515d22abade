//! Request opcodes and response/error codes.

use crate::error::WireError;

/// A request opcode, as sent by the client in the message header.
///
/// `AUTH`, `AUTHERR`, and `AUTHCHAN` drive the authentication state
/// machine; everything above `AuthChan` is gated on `authstate` having
/// reached `ChannelBound` (see `rekey-auth`'s session state).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u32)]
pub enum Opcode {
    /// Initial GSS token, or a continuation of an in-progress handshake.
    Auth = 1,
    /// Client reports a local authentication failure and closes.
    AuthErr = 2,
    /// Final GSS token carrying the channel-binding MIC.
    AuthChan = 3,
    /// Begin rotating a principal for a set of target hosts.
    NewReq = 4,
    /// Report the ACL completion status of an in-progress rotation.
    Status = 5,
    /// Fetch the generated keys for a host's rotation.
    GetKeys = 6,
    /// Acknowledge that a host has installed its new keys.
    CommitKey = 7,
    /// Reserved: single-host key fetch without a prior `NEWREQ`.
    SimpleKey = 8,
    /// Reserved: abort an in-progress rotation.
    AbortReq = 9,
}

impl Opcode {
    /// The highest opcode that is reachable before full authentication.
    pub const MAX_UNAUTHENTICATED: Opcode = Opcode::AuthChan;

    /// Decode an opcode from its wire representation.
    pub fn from_u32(v: u32) -> Result<Self, WireError> {
        Ok(match v {
            1 => Self::Auth,
            2 => Self::AuthErr,
            3 => Self::AuthChan,
            4 => Self::NewReq,
            5 => Self::Status,
            6 => Self::GetKeys,
            7 => Self::CommitKey,
            8 => Self::SimpleKey,
            9 => Self::AbortReq,
            other => return Err(WireError::UnknownOpcode(other)),
        })
    }

    /// Encode to the wire representation.
    #[must_use]
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

/// A response opcode, as sent by the server in the reply header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Response {
    /// Unqualified success with no payload beyond what the handler adds.
    Ok = 0,
    /// Continuation token for an in-progress `AUTH` handshake.
    Auth = 1,
    /// Server-side authentication failure.
    AuthErr = 2,
    /// Continuation token for an in-progress `AUTHCHAN` handshake.
    AuthChan = 3,
    /// ACL completion status payload (reply to `STATUS`).
    Status = 4,
    /// Key material payload (reply to `GETKEYS`/`SIMPLEKEY`).
    Keys = 5,
    /// An `ErrorCode` payload describing why the request failed.
    Error = 6,
}

impl Response {
    /// Encode to the wire representation.
    #[must_use]
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

/// The taxonomy of error conditions reported in an `ERROR` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    /// An error outside the other categories (store or KDB failure).
    Other = 1,
    /// The opcode is not recognized or not valid in the current state.
    BadOp = 2,
    /// The request payload is malformed or internally inconsistent.
    BadReq = 3,
    /// Authentication is required, absent, or failed.
    AuthN = 4,
    /// The authenticated principal is not authorized for this request.
    AuthZ = 5,
    /// The referenced principal or rotation record does not exist.
    NotFound = 6,
    /// No keys are available to satisfy the request.
    NoKeys = 7,
}

impl ErrorCode {
    /// Encode to the wire representation.
    #[must_use]
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}
