//! A combined stdin/stdout stream, for `-i` (inetd) mode.
//!
//! Under inetd, the accepted socket is handed to the process as fd 0
//! (and conventionally fd 1 for the reply direction). `tokio::io::Stdin`
//! and `tokio::io::Stdout` are separate types; [`Stdio`] pins both
//! behind one `AsyncRead + AsyncWrite` value so the rest of the server
//! never needs to know whether it's talking to a real socket or to
//! inetd's fds.

use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{self, AsyncRead, AsyncWrite, ReadBuf, Stdin, Stdout};

/// Combined stdin (read half) / stdout (write half) stream.
pub struct Stdio {
    stdin: Stdin,
    stdout: Stdout,
}

impl Stdio {
    /// Take ownership of the process's stdin/stdout as one stream.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stdin: io::stdin(),
            stdout: io::stdout(),
        }
    }
}

impl Default for Stdio {
    fn default() -> Self {
        Self::new()
    }
}

impl AsyncRead for Stdio {
    fn poll_read(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stdin).poll_read(cx, buf)
    }
}

impl AsyncWrite for Stdio {
    fn poll_write(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.stdout).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stdout).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stdout).poll_shutdown(cx)
    }
}
