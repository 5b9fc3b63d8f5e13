//! Peer wire protocol (BEP-3)
//!
//! This module implements the BitTorrent peer protocol: the message codec,
//! a framed transport over one TCP stream, and a session layer that drives
//! the transport in background tasks while mirroring the protocol state of
//! both ends of the connection.
//!
//! A [`PeerSession`] owns one [`PeerConnection`] and runs two workers: a
//! receive worker that reads the handshake and then framed messages, and a
//! send worker that drains an unbounded output queue. Every message commits
//! its state mutation before listeners observe it, and listeners see events
//! strictly in wire order. A [`SessionPool`] shares one event dispatcher
//! across many sessions and reaps the ones that have closed.

mod bitfield;
mod connection;
mod error;
mod message;
mod peer_id;
mod pool;
mod session;

pub use bitfield::Bitfield;
pub use connection::PeerConnection;
pub use error::PeerError;
pub use message::{Message, MessageId, PROTOCOL_NAME};
pub use peer_id::PeerId;
pub use pool::SessionPool;
pub use session::{EndpointState, PeerListener, PeerSession};
