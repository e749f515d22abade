//! Framed connection: one opcode and one length-prefixed payload per
//! message, read and written as a single unit.
//!
//! Unlike a multi-packet wire protocol, every request and reply here is
//! one frame: `u32 opcode || u32 len || len bytes of payload`. There is
//! no reassembly and no out-of-band cancellation frame to worry about,
//! so the connection is a thin read/write wrapper rather than the
//! split-I/O, cancel-handle machinery a multi-packet protocol needs.

use rekey_wire::{Buffer, Opcode};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Result, TransportError};

/// Maximum accepted payload length for a single frame.
pub const MAX_FRAME_LEN: u32 = 1 << 20;

/// A framed message: an opcode (request) or response code, plus its
/// payload buffer.
#[derive(Debug)]
pub struct Frame {
    /// The raw opcode/response word.
    pub code: u32,
    /// The payload, positioned at its read cursor.
    pub body: Buffer,
}

/// A connection that reads and writes one [`Frame`] at a time.
pub struct Connection<T> {
    inner: T,
}

impl<T> Connection<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap a transport in frame-at-a-time I/O.
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Read the next frame, or `None` if the peer closed the connection
    /// cleanly between frames.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>> {
        let mut header = [0u8; 8];
        match self.inner.read_exact(&mut header).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }
        let code = u32::from_be_bytes(header[0..4].try_into().expect("len checked"));
        let len = u32::from_be_bytes(header[4..8].try_into().expect("len checked"));
        if len > MAX_FRAME_LEN {
            return Err(TransportError::Wire(rekey_wire::WireError::LengthTooLarge {
                len,
                max: MAX_FRAME_LEN,
            }));
        }
        let mut payload = vec![0u8; len as usize];
        self.inner
            .read_exact(&mut payload)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::UnexpectedEof => TransportError::ConnectionClosed,
                _ => TransportError::Io(e),
            })?;
        Ok(Some(Frame {
            code,
            body: Buffer::from_vec(payload),
        }))
    }

    /// Read the next frame and decode its code as a request [`Opcode`].
    pub async fn read_request(&mut self) -> Result<Option<(Opcode, Buffer)>> {
        let Some(frame) = self.read_frame().await? else {
            return Ok(None);
        };
        let opcode = Opcode::from_u32(frame.code)?;
        Ok(Some((opcode, frame.body)))
    }

    /// Write a frame with the given code and payload.
    pub async fn write_frame(&mut self, code: u32, body: &Buffer) -> Result<()> {
        let bytes = body.clone().into_vec();
        let mut header = [0u8; 8];
        header[0..4].copy_from_slice(&code.to_be_bytes());
        header[4..8].copy_from_slice(&(bytes.len() as u32).to_be_bytes());
        self.inner.write_all(&header).await?;
        self.inner.write_all(&bytes).await?;
        self.inner.flush().await?;
        Ok(())
    }

    /// Borrow the underlying transport, e.g. to read TLS connection
    /// state for channel binding.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rekey_wire::Response;
    use tokio::io::duplex;

    #[tokio::test]
    async fn frame_round_trips_over_a_duplex_stream() {
        let (client, server) = duplex(4096);
        let mut client = Connection::new(client);
        let mut server = Connection::new(server);

        let mut payload = Buffer::new();
        payload.put_str("host/db1.example.org@EXAMPLE.ORG");

        client
            .write_frame(Opcode::NewReq.as_u32(), &payload)
            .await
            .unwrap();

        let (opcode, mut body) = server.read_request().await.unwrap().unwrap();
        assert_eq!(opcode, Opcode::NewReq);
        assert_eq!(body.get_str().unwrap(), "host/db1.example.org@EXAMPLE.ORG");

        let mut reply = Buffer::new();
        reply.put_u32(7);
        server
            .write_frame(Response::Ok.as_u32(), &reply)
            .await
            .unwrap();

        let frame = client.read_frame().await.unwrap().unwrap();
        assert_eq!(frame.code, Response::Ok.as_u32());
    }

    #[tokio::test]
    async fn clean_close_between_frames_is_none() {
        let (client, server) = duplex(64);
        drop(client);
        let mut server = Connection::new(server);
        assert!(server.read_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn oversized_frame_length_is_rejected() {
        let (mut client, server) = duplex(4096);
        let mut server = Connection::new(server);
        let mut header = [0u8; 8];
        header[4..8].copy_from_slice(&(MAX_FRAME_LEN + 1).to_be_bytes());
        client.write_all(&header).await.unwrap();
        assert!(server.read_frame().await.is_err());
    }
}
