use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use super::request::TrackerRequest;
use super::response::TrackerResponse;
use super::SingleTracker;

/// An ordered tier of trackers with failover (BEP-12).
///
/// Sub-trackers are tried in order until one answers. The overall time
/// budget is split evenly across the sub-trackers that are still left, so a
/// fast failure leaves its unused time to the rest. A tracker that answers
/// is promoted to the front of the tier, and the promotion is visible to
/// every later announce through this tier.
#[derive(Debug)]
pub struct BackedTracker {
    trackers: Mutex<Vec<SingleTracker>>,
}

impl BackedTracker {
    pub(crate) fn new(trackers: Vec<SingleTracker>) -> Self {
        Self {
            trackers: Mutex::new(trackers),
        }
    }

    /// Returns the tier's announce URLs in their current order.
    pub async fn urls(&self) -> Vec<String> {
        let trackers = self.trackers.lock().await;
        trackers.iter().map(|t| t.url().to_string()).collect()
    }

    /// Tries each sub-tracker in order within `budget`.
    ///
    /// The tier is locked for the whole attempt, which also makes the
    /// move-to-front mutation atomic with respect to concurrent callers.
    pub(crate) async fn announce(
        &self,
        request: &TrackerRequest,
        budget: Duration,
    ) -> Option<TrackerResponse> {
        let mut trackers = self.trackers.lock().await;

        let mut remaining = budget;
        let mut left = trackers.len();
        let mut index = 0;

        while index < trackers.len() && !remaining.is_zero() {
            let slice = remaining / left as u32;

            let started = Instant::now();
            let response = trackers[index].announce(request, slice).await;
            remaining = remaining.saturating_sub(started.elapsed());
            left -= 1;

            if let Some(response) = response {
                let tracker = trackers.remove(index);
                trackers.insert(0, tracker);
                return Some(response);
            }

            index += 1;
        }

        None
    }
}
