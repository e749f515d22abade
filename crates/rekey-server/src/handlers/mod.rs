//! The nine opcode handlers.
//!
//! Each handler is a free async function over `&mut Session<T>` and
//! the request [`Buffer`](rekey_wire::Buffer); it writes its own
//! response frame(s) and returns the [`crate::dispatch::Outcome`] that
//! tells the session loop whether to keep reading. Splitting by
//! opcode (rather than one large match arm) matches spec's
//! handler-table design note: "a tagged-union opcode mapped to a
//! handler by exhaustive matching."

pub mod auth;
pub mod commitkey;
pub mod getkeys;
pub mod newreq;
pub mod reserved;
pub mod status;
