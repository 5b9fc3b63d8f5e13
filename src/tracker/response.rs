use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use bytes::Bytes;

use super::error::TrackerError;
use crate::bencode::Value;
use crate::peer::PeerId;

/// A peer returned from a tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerInfo {
    /// The peer's socket address.
    pub addr: SocketAddr,
    /// The peer's id, when the tracker sent one. Compact responses never
    /// carry peer ids.
    pub peer_id: Option<PeerId>,
}

impl PeerInfo {
    /// Creates a peer with just an address.
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            peer_id: None,
        }
    }

    /// Parses a peer from the compact IPv4 format: 4 bytes of address and a
    /// big-endian port.
    pub fn from_compact(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 6 {
            return None;
        }
        let ip = Ipv4Addr::new(bytes[0], bytes[1], bytes[2], bytes[3]);
        let port = u16::from_be_bytes([bytes[4], bytes[5]]);
        Some(Self::new(SocketAddr::new(IpAddr::V4(ip), port)))
    }
}

/// The response to an announce.
///
/// A tracker-reported failure is a response with
/// [`failure_reason`](Self::failure_reason) set and every other field
/// zeroed; network-level failures never produce a response at all.
#[derive(Debug, Clone)]
pub struct TrackerResponse {
    /// Human-readable failure reported by the tracker, if any.
    pub failure_reason: Option<String>,
    /// Human-readable warning reported by the tracker, if any.
    pub warning_message: Option<String>,
    /// Seconds the client should wait between regular announces.
    pub interval: u64,
    /// Seconds the client must wait between any announces. Defaults to
    /// `interval` when the tracker does not send one.
    pub min_interval: u64,
    /// Opaque token to echo back in subsequent announces.
    pub tracker_id: Option<Bytes>,
    /// Number of seeders in the swarm.
    pub complete: u64,
    /// Number of leechers in the swarm.
    pub incomplete: u64,
    /// Peers returned by the tracker.
    pub peers: Vec<PeerInfo>,
}

impl TrackerResponse {
    /// Returns `true` if the tracker reported a failure.
    pub fn is_failure(&self) -> bool {
        self.failure_reason.is_some()
    }

    pub(crate) fn failure(reason: String) -> Self {
        Self {
            failure_reason: Some(reason),
            warning_message: None,
            interval: 0,
            min_interval: 0,
            tracker_id: None,
            complete: 0,
            incomplete: 0,
            peers: Vec::new(),
        }
    }

    /// Builds a response from the bencoded dictionary an HTTP tracker sends.
    pub(crate) fn from_value(value: &Value) -> Result<Self, TrackerError> {
        let dict = value
            .as_dict()
            .ok_or_else(|| TrackerError::InvalidResponse("expected dict".into()))?;

        if let Some(reason) = dict
            .get(b"failure reason".as_slice())
            .and_then(|v| v.as_str())
        {
            return Ok(Self::failure(reason.to_string()));
        }

        let interval = dict
            .get(b"interval".as_slice())
            .and_then(|v| v.as_integer())
            .ok_or_else(|| TrackerError::InvalidResponse("missing interval".into()))?
            as u64;

        let min_interval = dict
            .get(b"min interval".as_slice())
            .and_then(|v| v.as_integer())
            .map(|v| v as u64)
            .unwrap_or(interval);

        let complete = dict
            .get(b"complete".as_slice())
            .and_then(|v| v.as_integer())
            .ok_or_else(|| TrackerError::InvalidResponse("missing complete".into()))?
            as u64;

        let incomplete = dict
            .get(b"incomplete".as_slice())
            .and_then(|v| v.as_integer())
            .ok_or_else(|| TrackerError::InvalidResponse("missing incomplete".into()))?
            as u64;

        let warning_message = dict
            .get(b"warning message".as_slice())
            .and_then(|v| v.as_str())
            .map(String::from);

        let tracker_id = dict
            .get(b"tracker id".as_slice())
            .and_then(|v| v.as_bytes())
            .cloned();

        let peers = match dict.get(b"peers".as_slice()) {
            Some(Value::Bytes(blob)) => parse_compact_peers(blob)?,
            Some(Value::List(list)) => parse_dict_peers(list),
            Some(_) => return Err(TrackerError::InvalidResponse("bad peers type".into())),
            None => return Err(TrackerError::InvalidResponse("missing peers".into())),
        };

        Ok(Self {
            failure_reason: None,
            warning_message,
            interval,
            min_interval,
            tracker_id,
            complete,
            incomplete,
            peers,
        })
    }
}

/// Parses a BEP-23 compact peer blob: 6 bytes per peer.
pub(crate) fn parse_compact_peers(data: &[u8]) -> Result<Vec<PeerInfo>, TrackerError> {
    if data.len() % 6 != 0 {
        return Err(TrackerError::InvalidResponse(
            "compact peer list not a multiple of 6 bytes".into(),
        ));
    }

    Ok(data.chunks_exact(6).filter_map(PeerInfo::from_compact).collect())
}

/// Parses the dictionary-shaped peer list. Entries that do not parse are
/// skipped rather than failing the whole response.
fn parse_dict_peers(list: &[Value]) -> Vec<PeerInfo> {
    let mut peers = Vec::with_capacity(list.len());

    for entry in list {
        let ip = entry
            .get(b"ip")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse::<IpAddr>().ok());
        let port = entry
            .get(b"port")
            .and_then(|v| v.as_integer())
            .map(|p| p as u16);

        let (Some(ip), Some(port)) = (ip, port) else {
            continue;
        };

        let peer_id = entry
            .get(b"peer id")
            .and_then(|v| v.as_bytes())
            .and_then(|b| PeerId::from_bytes(b));

        peers.push(PeerInfo {
            addr: SocketAddr::new(ip, port),
            peer_id,
        });
    }

    peers
}
