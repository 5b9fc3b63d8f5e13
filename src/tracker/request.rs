use std::net::IpAddr;

use bytes::Bytes;

use super::error::TrackerError;
use crate::metainfo::InfoHash;
use crate::peer::PeerId;

/// The lifecycle event an announce reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnounceEvent {
    /// Periodic announce with no particular event.
    Regular,
    /// First announce after starting a download.
    Started,
    /// The torrent was stopped gracefully.
    Stopped,
    /// The download finished. Sent once per torrent.
    Completed,
}

impl AnnounceEvent {
    /// Returns the `event` query value. Regular announces use the empty
    /// string.
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnounceEvent::Regular => "",
            AnnounceEvent::Started => "started",
            AnnounceEvent::Stopped => "stopped",
            AnnounceEvent::Completed => "completed",
        }
    }

    /// Returns the event number used in UDP announce packets.
    pub fn as_udp_id(&self) -> u32 {
        match self {
            AnnounceEvent::Regular => 0,
            AnnounceEvent::Started => 1,
            AnnounceEvent::Completed => 2,
            AnnounceEvent::Stopped => 3,
        }
    }
}

/// An announce request.
///
/// Immutable once built, so one request can be reused across trackers.
/// Construct through [`TrackerRequest::builder`].
///
/// # Examples
///
/// ```
/// use bitwire::metainfo::InfoHash;
/// use bitwire::peer::PeerId;
/// use bitwire::tracker::{AnnounceEvent, TrackerRequest};
///
/// let request = TrackerRequest::builder()
///     .info_hash(InfoHash::from_bytes([0; 20]))
///     .peer_id(PeerId::generate())
///     .port(6881)
///     .left(1_000_000)
///     .event(AnnounceEvent::Started)
///     .num_want(50)
///     .build()
///     .unwrap();
///
/// assert_eq!(request.num_want, 50);
/// ```
#[derive(Debug, Clone)]
pub struct TrackerRequest {
    /// Identity of the torrent being announced.
    pub info_hash: InfoHash,
    /// This client's peer id.
    pub peer_id: PeerId,
    /// Port on which this client accepts peer connections.
    pub port: u16,
    /// Total bytes uploaded so far.
    pub uploaded: u64,
    /// Total bytes downloaded so far.
    pub downloaded: u64,
    /// Bytes left to complete the torrent.
    pub left: u64,
    /// Whether to request a compact peer list. `None` lets the tracker
    /// choose and omits the parameter.
    pub compact: Option<bool>,
    /// Whether peer ids are wanted in a non-compact peer list.
    pub want_peer_id: bool,
    /// Lifecycle event of this announce.
    pub event: AnnounceEvent,
    /// The client's real IP address, if it must be stated explicitly.
    pub ip: Option<IpAddr>,
    /// Number of peers wanted.
    pub num_want: i32,
    /// Opaque per-client key.
    pub key: Option<String>,
    /// Tracker id echoed from a previous response.
    pub tracker_id: Option<Bytes>,
}

impl TrackerRequest {
    /// Returns a builder with the default field values.
    pub fn builder() -> TrackerRequestBuilder {
        TrackerRequestBuilder::default()
    }
}

/// Builder for [`TrackerRequest`].
///
/// Defaults: port 6881, all byte counters 0, regular event, 32 peers
/// wanted, peer ids not requested, everything else unset.
#[derive(Debug)]
pub struct TrackerRequestBuilder {
    info_hash: Option<InfoHash>,
    peer_id: Option<PeerId>,
    port: u16,
    uploaded: u64,
    downloaded: u64,
    left: u64,
    compact: Option<bool>,
    want_peer_id: bool,
    event: AnnounceEvent,
    ip: Option<IpAddr>,
    num_want: i32,
    key: Option<String>,
    tracker_id: Option<Bytes>,
}

impl Default for TrackerRequestBuilder {
    fn default() -> Self {
        Self {
            info_hash: None,
            peer_id: None,
            port: 6881,
            uploaded: 0,
            downloaded: 0,
            left: 0,
            compact: None,
            want_peer_id: false,
            event: AnnounceEvent::Regular,
            ip: None,
            num_want: 32,
            key: None,
            tracker_id: None,
        }
    }
}

impl TrackerRequestBuilder {
    pub fn info_hash(mut self, info_hash: InfoHash) -> Self {
        self.info_hash = Some(info_hash);
        self
    }

    pub fn peer_id(mut self, peer_id: PeerId) -> Self {
        self.peer_id = Some(peer_id);
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn uploaded(mut self, uploaded: u64) -> Self {
        self.uploaded = uploaded;
        self
    }

    pub fn downloaded(mut self, downloaded: u64) -> Self {
        self.downloaded = downloaded;
        self
    }

    pub fn left(mut self, left: u64) -> Self {
        self.left = left;
        self
    }

    pub fn compact(mut self, compact: bool) -> Self {
        self.compact = Some(compact);
        self
    }

    pub fn want_peer_id(mut self, want_peer_id: bool) -> Self {
        self.want_peer_id = want_peer_id;
        self
    }

    pub fn event(mut self, event: AnnounceEvent) -> Self {
        self.event = event;
        self
    }

    pub fn ip(mut self, ip: IpAddr) -> Self {
        self.ip = Some(ip);
        self
    }

    pub fn num_want(mut self, num_want: i32) -> Self {
        self.num_want = num_want;
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn tracker_id(mut self, tracker_id: Bytes) -> Self {
        self.tracker_id = Some(tracker_id);
        self
    }

    /// Builds the request.
    ///
    /// # Errors
    ///
    /// Fails with [`TrackerError::IncompleteRequest`] if the info hash or
    /// peer id was never set.
    pub fn build(self) -> Result<TrackerRequest, TrackerError> {
        Ok(TrackerRequest {
            info_hash: self
                .info_hash
                .ok_or(TrackerError::IncompleteRequest("info_hash"))?,
            peer_id: self
                .peer_id
                .ok_or(TrackerError::IncompleteRequest("peer_id"))?,
            port: self.port,
            uploaded: self.uploaded,
            downloaded: self.downloaded,
            left: self.left,
            compact: self.compact,
            want_peer_id: self.want_peer_id,
            event: self.event,
            ip: self.ip,
            num_want: self.num_want,
            key: self.key,
            tracker_id: self.tracker_id,
        })
    }
}
