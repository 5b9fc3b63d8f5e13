//! Tracker protocols (BEP-3, BEP-12, BEP-15, BEP-23)
//!
//! Trackers are servers that help peers find each other. Clients "announce"
//! to a tracker to register themselves in the swarm, report transfer
//! statistics, and receive a list of peers.
//!
//! This module implements the HTTP(S) announce protocol, the UDP announce
//! protocol, and the BEP-12 multi-tier failover rule: trackers within a tier
//! are tried in order within a shared time budget, and the tracker that
//! answers is promoted to the front of its tier.
//!
//! Network-level failures (I/O errors, timeouts, malformed responses) are
//! recovered locally and reported as an absent response. A failure the
//! tracker itself reports comes back as a normal [`TrackerResponse`] with
//! [`failure_reason`](TrackerResponse::failure_reason) set.
//!
//! # Examples
//!
//! ```no_run
//! use bitwire::metainfo::Metainfo;
//! use bitwire::peer::PeerId;
//! use bitwire::tracker::{AnnounceEvent, Tracker, TrackerRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let metainfo = Metainfo::from_file("example.torrent")?;
//!
//! let request = TrackerRequest::builder()
//!     .info_hash(metainfo.info_hash.clone())
//!     .peer_id(PeerId::generate())
//!     .left(metainfo.info.total_length)
//!     .event(AnnounceEvent::Started)
//!     .build()?;
//!
//! for tracker in Tracker::for_torrent(&metainfo) {
//!     if let Some(response) = tracker.announce_default(&request).await {
//!         println!("{} peers, next announce in {}s", response.peers.len(), response.interval);
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod backed;
mod error;
mod http;
mod request;
mod response;
mod udp;

pub use backed::BackedTracker;
pub use error::TrackerError;
pub use http::HttpTracker;
pub use request::{AnnounceEvent, TrackerRequest, TrackerRequestBuilder};
pub use response::{PeerInfo, TrackerResponse};
pub use udp::UdpTracker;

use crate::metainfo::Metainfo;
use std::time::Duration;

/// Budget used by [`Tracker::announce_default`] and
/// [`SingleTracker::announce_default`].
pub const DEFAULT_ANNOUNCE_BUDGET: Duration = Duration::from_secs(60);

/// A tracker reachable at one announce URL.
#[derive(Debug)]
pub enum SingleTracker {
    /// HTTP(S) announce.
    Http(HttpTracker),
    /// BEP-15 UDP announce.
    Udp(UdpTracker),
}

impl SingleTracker {
    /// Creates a tracker for an announce URL, dispatching on its scheme.
    pub fn for_url(url: &str) -> Result<Self, TrackerError> {
        if url.starts_with("udp://") {
            Ok(SingleTracker::Udp(UdpTracker::new(url)?))
        } else if url.starts_with("http://") || url.starts_with("https://") {
            Ok(SingleTracker::Http(HttpTracker::new(url)?))
        } else {
            Err(TrackerError::UnsupportedProtocol(url.to_string()))
        }
    }

    /// Returns the announce URL.
    pub fn url(&self) -> &str {
        match self {
            SingleTracker::Http(t) => t.url(),
            SingleTracker::Udp(t) => t.url(),
        }
    }

    /// Sends an announce, spending at most `budget`.
    ///
    /// Network and protocol failures are logged and reported as `None`.
    pub async fn announce(
        &self,
        request: &TrackerRequest,
        budget: Duration,
    ) -> Option<TrackerResponse> {
        let result = match self {
            SingleTracker::Http(t) => t.announce(request, budget).await,
            SingleTracker::Udp(t) => t.announce(request, budget).await,
        };

        match result {
            Ok(response) => Some(response),
            Err(err) => {
                tracing::debug!(url = self.url(), error = %err, "announce failed");
                None
            }
        }
    }

    /// Sends an announce with the default one-minute budget.
    pub async fn announce_default(&self, request: &TrackerRequest) -> Option<TrackerResponse> {
        self.announce(request, DEFAULT_ANNOUNCE_BUDGET).await
    }
}

/// An announce target for a torrent: either a single tracker or a BEP-12
/// tier of trackers tried in order.
#[derive(Debug)]
pub enum Tracker {
    /// One announce URL.
    Single(SingleTracker),
    /// An ordered tier with failover and move-to-front promotion.
    Backed(BackedTracker),
}

impl Tracker {
    /// Creates a single-URL tracker.
    pub fn for_url(url: &str) -> Result<Self, TrackerError> {
        Ok(Tracker::Single(SingleTracker::for_url(url)?))
    }

    /// Creates a tracker for one announce-list tier.
    ///
    /// URLs with unsupported schemes are skipped. Returns `None` if nothing
    /// usable remains; a one-entry tier collapses to a single tracker.
    pub fn for_tier<S: AsRef<str>>(urls: &[S]) -> Option<Self> {
        let mut trackers = Vec::with_capacity(urls.len());
        for url in urls {
            match SingleTracker::for_url(url.as_ref()) {
                Ok(tracker) => trackers.push(tracker),
                Err(err) => {
                    tracing::debug!(url = url.as_ref(), error = %err, "skipping tracker");
                }
            }
        }

        match trackers.len() {
            0 => None,
            1 => Some(Tracker::Single(trackers.pop().expect("len checked"))),
            _ => Some(Tracker::Backed(BackedTracker::new(trackers))),
        }
    }

    /// Returns the announce targets for a torrent: the `announce` URL first,
    /// then one backed tracker per `announce-list` tier.
    pub fn for_torrent(metainfo: &Metainfo) -> Vec<Tracker> {
        let mut trackers = Vec::new();

        match Tracker::for_url(&metainfo.announce) {
            Ok(tracker) => trackers.push(tracker),
            Err(err) => {
                tracing::debug!(url = %metainfo.announce, error = %err, "skipping announce url");
            }
        }

        for tier in &metainfo.announce_list {
            if let Some(tracker) = Tracker::for_tier(tier) {
                trackers.push(tracker);
            }
        }

        trackers
    }

    /// Sends an announce, spending at most `budget` across the whole target.
    pub async fn announce(
        &self,
        request: &TrackerRequest,
        budget: Duration,
    ) -> Option<TrackerResponse> {
        match self {
            Tracker::Single(t) => t.announce(request, budget).await,
            Tracker::Backed(t) => t.announce(request, budget).await,
        }
    }

    /// Sends an announce with the default one-minute budget.
    pub async fn announce_default(&self, request: &TrackerRequest) -> Option<TrackerResponse> {
        self.announce(request, DEFAULT_ANNOUNCE_BUDGET).await
    }
}

#[cfg(test)]
mod tests;
