use std::time::Duration;

use reqwest::Client;

use super::error::TrackerError;
use super::request::TrackerRequest;
use super::response::TrackerResponse;
use crate::bencode::decode;
use crate::metainfo::percent_encode;

/// An HTTP(S) tracker client (BEP-3).
///
/// Announces are plain GET requests whose query string carries the request
/// fields; the response body is a bencoded dictionary.
#[derive(Debug)]
pub struct HttpTracker {
    url: String,
}

impl HttpTracker {
    /// Creates a tracker for an `http://` or `https://` announce URL.
    pub fn new(url: &str) -> Result<Self, TrackerError> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(TrackerError::InvalidUrl(url.to_string()));
        }

        Ok(Self {
            url: url.to_string(),
        })
    }

    /// Returns the announce URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sends an announce and parses the bencoded response.
    ///
    /// The whole exchange honours `budget`: connecting may take the full
    /// budget, reading the response a fifth of it.
    pub(crate) async fn announce(
        &self,
        request: &TrackerRequest,
        budget: Duration,
    ) -> Result<TrackerResponse, TrackerError> {
        let client = Client::builder()
            .connect_timeout(budget)
            .read_timeout(budget / 5)
            .build()?;

        let url = format!("{}{}", self.url, query_string(request));

        let response = client.get(&url).timeout(budget).send().await?;
        let bytes = response.bytes().await?;

        let value = decode(&bytes)?;
        TrackerResponse::from_value(&value)
    }
}

/// Builds the announce query string.
///
/// `info_hash` and `peer_id` are byte-exact percent encodings of the raw 20
/// bytes. `compact` is omitted entirely when the request leaves the choice
/// to the tracker; `event` is always present and empty for regular
/// announces.
pub(crate) fn query_string(request: &TrackerRequest) -> String {
    let mut query = format!(
        "?info_hash={}&peer_id={}&port={}&uploaded={}&downloaded={}&left={}",
        request.info_hash.url_encoded(),
        request.peer_id.url_encoded(),
        request.port,
        request.uploaded,
        request.downloaded,
        request.left,
    );

    if let Some(compact) = request.compact {
        query.push_str("&compact=");
        query.push(if compact { '1' } else { '0' });
    }

    query.push_str("&no_peer_id=");
    query.push(if request.want_peer_id { '0' } else { '1' });

    query.push_str("&event=");
    query.push_str(request.event.as_str());

    if let Some(ip) = request.ip {
        query.push_str(&format!("&ip={}", ip));
    }

    query.push_str(&format!("&numwant={}", request.num_want));

    if let Some(key) = &request.key {
        query.push_str(&format!("&key={}", percent_encode(key.as_bytes())));
    }

    if let Some(tracker_id) = &request.tracker_id {
        query.push_str(&format!("&trackerid={}", percent_encode(tracker_id)));
    }

    query
}
