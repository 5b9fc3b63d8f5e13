use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::error::PeerError;
use super::peer_id::PeerId;
use crate::metainfo::InfoHash;

/// The BitTorrent protocol identifier sent in every handshake.
pub const PROTOCOL_NAME: &str = "BitTorrent protocol";

/// Message type identifiers in the peer wire protocol.
///
/// Each regular message (except KeepAlive) has a one-byte ID following the
/// length prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageId {
    /// Stop serving the peer's requests.
    Choke = 0,
    /// Resume serving the peer's requests.
    Unchoke = 1,
    /// Want data from the peer.
    Interested = 2,
    /// Don't want data from the peer.
    NotInterested = 3,
    /// Announce a newly acquired piece.
    Have = 4,
    /// Announce all held pieces at once.
    Bitfield = 5,
    /// Request a data block.
    Request = 6,
    /// Deliver a data block.
    Piece = 7,
    /// Cancel a pending request.
    Cancel = 8,
    /// DHT port announcement.
    Port = 9,
}

impl TryFrom<u8> for MessageId {
    type Error = PeerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MessageId::Choke),
            1 => Ok(MessageId::Unchoke),
            2 => Ok(MessageId::Interested),
            3 => Ok(MessageId::NotInterested),
            4 => Ok(MessageId::Have),
            5 => Ok(MessageId::Bitfield),
            6 => Ok(MessageId::Request),
            7 => Ok(MessageId::Piece),
            8 => Ok(MessageId::Cancel),
            9 => Ok(MessageId::Port),
            _ => Err(PeerError::InvalidMessageId(value)),
        }
    }
}

/// A peer wire protocol message.
///
/// The handshake travels in two halves, modelled as messages of their own so
/// that the session layer can process and dispatch them like everything
/// else: [`HandshakeStart`](Message::HandshakeStart) carries the protocol
/// name, the reserved flag bytes and the info hash; after seeing it the
/// local side can decide whether to answer before the remote's
/// [`HandshakeEnd`](Message::HandshakeEnd) (the peer id) arrives.
///
/// Regular messages are length-prefixed: a 4-byte big-endian length, a
/// 1-byte message ID, and the payload. A length of zero is a keep-alive.
///
/// # Examples
///
/// ```
/// use bitwire::peer::Message;
///
/// let request = Message::Request { index: 0, begin: 0, length: 16384 };
/// let bytes = request.encode();
/// assert_eq!(bytes.len(), 17); // 4-byte length + 1-byte ID + 12-byte payload
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// First half of the handshake: protocol name, reserved flags, info hash.
    HandshakeStart {
        protocol: String,
        reserved: [u8; 8],
        info_hash: InfoHash,
    },
    /// Second half of the handshake: the sender's peer id.
    HandshakeEnd { peer_id: PeerId },
    /// Empty message that only resets idle timeouts.
    KeepAlive,
    /// The sender stops serving requests.
    Choke,
    /// The sender resumes serving requests.
    Unchoke,
    /// The sender wants the receiver's data.
    Interested,
    /// The sender does not want the receiver's data.
    NotInterested,
    /// The sender acquired the given piece.
    Have { piece: u32 },
    /// All pieces the sender holds, one bit per piece, MSB first.
    Bitfield(Bytes),
    /// Request for a block of data.
    Request { index: u32, begin: u32, length: u32 },
    /// A block of piece data.
    Piece { index: u32, begin: u32, data: Bytes },
    /// Cancel a previously sent request.
    Cancel { index: u32, begin: u32, length: u32 },
    /// The sender's DHT port.
    Port(u16),
}

impl Message {
    /// Encodes the message for transmission.
    ///
    /// Regular messages include their 4-byte length prefix; the handshake
    /// halves are raw since they are not length-prefixed on the wire.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();

        match self {
            Message::HandshakeStart {
                protocol,
                reserved,
                info_hash,
            } => {
                buf.put_u8(protocol.len() as u8);
                buf.put_slice(protocol.as_bytes());
                buf.put_slice(reserved);
                buf.put_slice(info_hash.as_bytes());
            }
            Message::HandshakeEnd { peer_id } => {
                buf.put_slice(peer_id.as_bytes());
            }
            Message::KeepAlive => {
                buf.put_u32(0);
            }
            Message::Choke => {
                buf.put_u32(1);
                buf.put_u8(MessageId::Choke as u8);
            }
            Message::Unchoke => {
                buf.put_u32(1);
                buf.put_u8(MessageId::Unchoke as u8);
            }
            Message::Interested => {
                buf.put_u32(1);
                buf.put_u8(MessageId::Interested as u8);
            }
            Message::NotInterested => {
                buf.put_u32(1);
                buf.put_u8(MessageId::NotInterested as u8);
            }
            Message::Have { piece } => {
                buf.put_u32(5);
                buf.put_u8(MessageId::Have as u8);
                buf.put_u32(*piece);
            }
            Message::Bitfield(bits) => {
                buf.put_u32(1 + bits.len() as u32);
                buf.put_u8(MessageId::Bitfield as u8);
                buf.put_slice(bits);
            }
            Message::Request {
                index,
                begin,
                length,
            } => {
                buf.put_u32(13);
                buf.put_u8(MessageId::Request as u8);
                buf.put_u32(*index);
                buf.put_u32(*begin);
                buf.put_u32(*length);
            }
            Message::Piece { index, begin, data } => {
                buf.put_u32(9 + data.len() as u32);
                buf.put_u8(MessageId::Piece as u8);
                buf.put_u32(*index);
                buf.put_u32(*begin);
                buf.put_slice(data);
            }
            Message::Cancel {
                index,
                begin,
                length,
            } => {
                buf.put_u32(13);
                buf.put_u8(MessageId::Cancel as u8);
                buf.put_u32(*index);
                buf.put_u32(*begin);
                buf.put_u32(*length);
            }
            Message::Port(port) => {
                buf.put_u32(3);
                buf.put_u8(MessageId::Port as u8);
                buf.put_u16(*port);
            }
        }

        buf.freeze()
    }

    /// Decodes a regular message from a full frame (length prefix included).
    ///
    /// Fixed-size payloads are checked exactly; variable payloads (bitfield,
    /// piece) consume exactly the remaining frame bytes.
    pub fn decode(mut frame: Bytes) -> Result<Self, PeerError> {
        if frame.len() < 4 {
            return Err(PeerError::InvalidMessage("frame too short".into()));
        }

        let length = frame.get_u32() as usize;

        if length == 0 {
            return Ok(Message::KeepAlive);
        }

        if frame.remaining() != length {
            return Err(PeerError::InvalidMessage("frame length mismatch".into()));
        }

        let id = MessageId::try_from(frame.get_u8())?;
        let payload = length - 1;

        match id {
            MessageId::Choke => expect_len(payload, 0).map(|_| Message::Choke),
            MessageId::Unchoke => expect_len(payload, 0).map(|_| Message::Unchoke),
            MessageId::Interested => expect_len(payload, 0).map(|_| Message::Interested),
            MessageId::NotInterested => expect_len(payload, 0).map(|_| Message::NotInterested),
            MessageId::Have => {
                expect_len(payload, 4)?;
                Ok(Message::Have {
                    piece: frame.get_u32(),
                })
            }
            MessageId::Bitfield => Ok(Message::Bitfield(frame.copy_to_bytes(payload))),
            MessageId::Request => {
                expect_len(payload, 12)?;
                Ok(Message::Request {
                    index: frame.get_u32(),
                    begin: frame.get_u32(),
                    length: frame.get_u32(),
                })
            }
            MessageId::Piece => {
                if payload < 8 {
                    return Err(PeerError::InvalidMessage("piece too short".into()));
                }
                let index = frame.get_u32();
                let begin = frame.get_u32();
                let data = frame.copy_to_bytes(payload - 8);
                Ok(Message::Piece { index, begin, data })
            }
            MessageId::Cancel => {
                expect_len(payload, 12)?;
                Ok(Message::Cancel {
                    index: frame.get_u32(),
                    begin: frame.get_u32(),
                    length: frame.get_u32(),
                })
            }
            MessageId::Port => {
                expect_len(payload, 2)?;
                Ok(Message::Port(frame.get_u16()))
            }
        }
    }

    /// Decodes the first half of a handshake: `pstrlen`, the protocol name,
    /// the reserved bytes and the info hash.
    pub fn decode_handshake_start(mut data: Bytes) -> Result<Self, PeerError> {
        if data.is_empty() {
            return Err(PeerError::InvalidHandshake);
        }

        let pstrlen = data.get_u8() as usize;
        if data.remaining() != pstrlen + 28 {
            return Err(PeerError::InvalidHandshake);
        }

        let protocol_bytes = data.copy_to_bytes(pstrlen);
        let protocol = String::from_utf8_lossy(&protocol_bytes).into_owned();

        let mut reserved = [0u8; 8];
        data.copy_to_slice(&mut reserved);

        let mut hash = [0u8; 20];
        data.copy_to_slice(&mut hash);

        Ok(Message::HandshakeStart {
            protocol,
            reserved,
            info_hash: InfoHash::from_bytes(hash),
        })
    }

    /// Decodes the second half of a handshake: the 20-byte peer id.
    pub fn decode_handshake_end(data: Bytes) -> Result<Self, PeerError> {
        let peer_id = PeerId::from_bytes(&data).ok_or(PeerError::InvalidHandshake)?;
        Ok(Message::HandshakeEnd { peer_id })
    }

    /// Builds a handshake start with the standard protocol name and no
    /// reserved flags set.
    pub fn handshake_start(info_hash: InfoHash) -> Self {
        Message::HandshakeStart {
            protocol: PROTOCOL_NAME.to_string(),
            reserved: [0u8; 8],
            info_hash,
        }
    }
}

fn expect_len(actual: usize, expected: usize) -> Result<(), PeerError> {
    if actual != expected {
        return Err(PeerError::InvalidMessage(format!(
            "payload of {} bytes, expected {}",
            actual, expected
        )));
    }
    Ok(())
}
