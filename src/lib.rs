//! bitwire - a protocol-layer BitTorrent library
//!
//! This library implements the pieces needed to participate in the
//! BitTorrent ecosystem at the protocol level: parsing torrents, talking to
//! trackers, and exchanging messages with peers. Piece verification, disk
//! I/O, and transfer policy (choking, request scheduling) are left to the
//! client built on top.
//!
//! # Modules
//!
//! - [`bencode`] - BEP-3 bencode encoding/decoding with strict canonical form
//! - [`metainfo`] - Torrent file parsing, info hashes, piece/file mapping
//! - [`tracker`] - HTTP and UDP announce protocols with BEP-12 failover
//! - [`peer`] - Peer wire protocol: codec, framed transport, sessions, pools

pub mod bencode;
pub mod metainfo;
pub mod peer;
pub mod tracker;

pub use bencode::{decode, encode, BencodeError, Value};
pub use metainfo::{FileEntry, Info, InfoHash, MappingEntry, Metainfo, MetainfoError, PieceFileMapping};
pub use peer::{
    Bitfield, EndpointState, Message, MessageId, PeerConnection, PeerError, PeerId, PeerListener,
    PeerSession, SessionPool,
};
pub use tracker::{
    AnnounceEvent, BackedTracker, HttpTracker, PeerInfo, SingleTracker, Tracker, TrackerError,
    TrackerRequest, TrackerResponse, UdpTracker,
};
