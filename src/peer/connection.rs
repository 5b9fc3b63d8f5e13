use std::net::SocketAddr;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use super::error::PeerError;
use super::message::Message;

/// Largest accepted frame: a full 16 MiB piece message plus its header.
const MAX_FRAME_LEN: usize = 16 * 1024 * 1024 + 13;

const READ_BUF_CAPACITY: usize = 32 * 1024;

/// A framed transport over one TCP stream.
///
/// The connection carries no protocol state; it only marshals bytes. The
/// handshake is read in two halves so the local side can inspect the
/// remote's info hash before deciding to answer; everything after the
/// handshake is a 4-byte length prefix followed by that many body bytes.
///
/// [`PeerSession`](super::PeerSession) splits a connection into its read and
/// write halves and drives each from its own worker.
pub struct PeerConnection {
    stream: TcpStream,
    read_buf: BytesMut,
    closed: bool,
}

impl PeerConnection {
    /// Opens a TCP connection to a peer.
    pub async fn connect(addr: SocketAddr) -> Result<Self, PeerError> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::new(stream))
    }

    /// Wraps an already connected stream (e.g. an accepted socket).
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            read_buf: BytesMut::with_capacity(READ_BUF_CAPACITY),
            closed: false,
        }
    }

    /// Returns the remote address, if the socket is still usable.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.stream.peer_addr().ok()
    }

    /// Reads the first half of the handshake.
    ///
    /// Blocks until `pstrlen`, the protocol name, the reserved bytes and the
    /// info hash have all arrived.
    pub async fn receive_handshake_start(&mut self) -> Result<Message, PeerError> {
        receive_handshake_start(&mut self.stream, &mut self.read_buf).await
    }

    /// Reads the second half of the handshake: the 20-byte peer id.
    pub async fn receive_handshake_end(&mut self) -> Result<Message, PeerError> {
        receive_handshake_end(&mut self.stream, &mut self.read_buf).await
    }

    /// Reads one length-prefixed message.
    pub async fn receive_message(&mut self) -> Result<Message, PeerError> {
        receive_message(&mut self.stream, &mut self.read_buf).await
    }

    /// Encodes and writes a message in one pass.
    pub async fn send_message(&mut self, message: &Message) -> Result<(), PeerError> {
        let data = message.encode();
        self.stream.write_all(&data).await?;
        Ok(())
    }

    /// Shuts the stream down. Safe to call more than once.
    pub async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            let _ = self.stream.shutdown().await;
        }
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn into_split(self) -> (PeerReader, PeerWriter) {
        let (read_half, write_half) = self.stream.into_split();
        (
            PeerReader {
                half: read_half,
                buf: self.read_buf,
            },
            PeerWriter { half: write_half },
        )
    }
}

/// The read side of a split connection, owned by the receive worker.
pub(crate) struct PeerReader {
    half: OwnedReadHalf,
    buf: BytesMut,
}

impl PeerReader {
    pub(crate) async fn receive_handshake_start(&mut self) -> Result<Message, PeerError> {
        receive_handshake_start(&mut self.half, &mut self.buf).await
    }

    pub(crate) async fn receive_handshake_end(&mut self) -> Result<Message, PeerError> {
        receive_handshake_end(&mut self.half, &mut self.buf).await
    }

    pub(crate) async fn receive_message(&mut self) -> Result<Message, PeerError> {
        receive_message(&mut self.half, &mut self.buf).await
    }
}

/// The write side of a split connection, owned by the send worker.
pub(crate) struct PeerWriter {
    half: OwnedWriteHalf,
}

impl PeerWriter {
    pub(crate) async fn send_message(&mut self, message: &Message) -> Result<(), PeerError> {
        let data = message.encode();
        self.half.write_all(&data).await?;
        Ok(())
    }
}

/// Fills `buf` until it holds at least `n` bytes, then splits them off.
///
/// Bytes past `n` stay buffered for the next frame.
async fn read_frame<R>(reader: &mut R, buf: &mut BytesMut, n: usize) -> Result<Bytes, PeerError>
where
    R: AsyncRead + Unpin,
{
    while buf.len() < n {
        let read = reader.read_buf(buf).await?;
        if read == 0 {
            return Err(PeerError::ConnectionClosed);
        }
    }
    Ok(buf.split_to(n).freeze())
}

async fn receive_handshake_start<R>(
    reader: &mut R,
    buf: &mut BytesMut,
) -> Result<Message, PeerError>
where
    R: AsyncRead + Unpin,
{
    while buf.is_empty() {
        let read = reader.read_buf(buf).await?;
        if read == 0 {
            return Err(PeerError::ConnectionClosed);
        }
    }

    // pstrlen + protocol + reserved(8) + info hash(20)
    let total = 1 + buf[0] as usize + 28;
    let data = read_frame(reader, buf, total).await?;
    Message::decode_handshake_start(data)
}

async fn receive_handshake_end<R>(reader: &mut R, buf: &mut BytesMut) -> Result<Message, PeerError>
where
    R: AsyncRead + Unpin,
{
    let data = read_frame(reader, buf, 20).await?;
    Message::decode_handshake_end(data)
}

async fn receive_message<R>(reader: &mut R, buf: &mut BytesMut) -> Result<Message, PeerError>
where
    R: AsyncRead + Unpin,
{
    while buf.len() < 4 {
        let read = reader.read_buf(buf).await?;
        if read == 0 {
            return Err(PeerError::ConnectionClosed);
        }
    }

    let length = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    if length > MAX_FRAME_LEN {
        return Err(PeerError::MessageTooLarge(length));
    }

    let frame = read_frame(reader, buf, 4 + length).await?;
    Message::decode(frame)
}
