use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use rand::Rng as _;
use tokio::net::UdpSocket;
use tokio::time::timeout;

use super::error::TrackerError;
use super::request::TrackerRequest;
use super::response::{parse_compact_peers, TrackerResponse};

const PROTOCOL_MAGIC: u64 = 0x41727101980;
const ACTION_CONNECT: u32 = 0;
const ACTION_ANNOUNCE: u32 = 1;
const ACTION_ERROR: u32 = 3;

/// A UDP tracker client (BEP-15).
///
/// Each announce is a four-step exchange over a freshly bound socket:
/// a 16-byte connect request, a 16-byte connect response carrying the
/// connection id, a 98-byte announce request, and the announce response with
/// the peer list. Every multi-byte field is big-endian.
#[derive(Debug)]
pub struct UdpTracker {
    url: String,
    host: String,
    port: u16,
}

impl UdpTracker {
    /// Creates a tracker for a `udp://host:port` announce URL.
    pub fn new(url: &str) -> Result<Self, TrackerError> {
        let (host, port) = parse_udp_url(url)?;
        Ok(Self {
            url: url.to_string(),
            host,
            port,
        })
    }

    /// Returns the announce URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Runs the connect + announce exchange, spending at most `budget`.
    ///
    /// Each socket read waits at most half the budget, so a dead tracker
    /// cannot block an announce forever.
    pub(crate) async fn announce(
        &self,
        request: &TrackerRequest,
        budget: Duration,
    ) -> Result<TrackerResponse, TrackerError> {
        let read_timeout = budget / 2;

        let addr = self.resolve().await?;
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect(addr).await?;

        let connection_id = connect_exchange(&socket, read_timeout).await?;
        announce_exchange(&socket, connection_id, request, read_timeout).await
    }

    async fn resolve(&self) -> Result<SocketAddr, TrackerError> {
        let mut addrs = tokio::net::lookup_host((self.host.as_str(), self.port)).await?;
        addrs
            .find(SocketAddr::is_ipv4)
            .ok_or_else(|| TrackerError::InvalidUrl(self.url.clone()))
    }
}

async fn connect_exchange(
    socket: &UdpSocket,
    read_timeout: Duration,
) -> Result<u64, TrackerError> {
    let transaction_id: u32 = rand::rng().random();

    let mut request = Vec::with_capacity(16);
    request.extend_from_slice(&PROTOCOL_MAGIC.to_be_bytes());
    request.extend_from_slice(&ACTION_CONNECT.to_be_bytes());
    request.extend_from_slice(&transaction_id.to_be_bytes());
    socket.send(&request).await?;

    let mut buf = [0u8; 16];
    let n = timeout(read_timeout, socket.recv(&mut buf))
        .await
        .map_err(|_| TrackerError::Timeout)??;

    if n < 16 {
        return Err(TrackerError::InvalidResponse(
            "connect response too short".into(),
        ));
    }

    let action = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
    let resp_tid = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);

    if action != ACTION_CONNECT || resp_tid != transaction_id {
        return Err(TrackerError::InvalidResponse(
            "connect response mismatch".into(),
        ));
    }

    Ok(u64::from_be_bytes([
        buf[8], buf[9], buf[10], buf[11], buf[12], buf[13], buf[14], buf[15],
    ]))
}

async fn announce_exchange(
    socket: &UdpSocket,
    connection_id: u64,
    request: &TrackerRequest,
    read_timeout: Duration,
) -> Result<TrackerResponse, TrackerError> {
    let transaction_id: u32 = rand::rng().random();
    let key: u32 = rand::rng().random();

    let mut packet = Vec::with_capacity(98);
    packet.extend_from_slice(&connection_id.to_be_bytes());
    packet.extend_from_slice(&ACTION_ANNOUNCE.to_be_bytes());
    packet.extend_from_slice(&transaction_id.to_be_bytes());
    packet.extend_from_slice(request.info_hash.as_bytes());
    packet.extend_from_slice(request.peer_id.as_bytes());
    packet.extend_from_slice(&request.downloaded.to_be_bytes());
    packet.extend_from_slice(&request.left.to_be_bytes());
    packet.extend_from_slice(&request.uploaded.to_be_bytes());
    packet.extend_from_slice(&request.event.as_udp_id().to_be_bytes());
    match request.ip {
        Some(IpAddr::V4(v4)) => packet.extend_from_slice(&v4.octets()),
        _ => packet.extend_from_slice(&(-1i32).to_be_bytes()),
    }
    packet.extend_from_slice(&key.to_be_bytes());
    packet.extend_from_slice(&request.num_want.to_be_bytes());
    packet.extend_from_slice(&request.port.to_be_bytes());
    socket.send(&packet).await?;

    let capacity = if request.num_want > 0 {
        20 + 6 * request.num_want as usize
    } else {
        2048
    };
    let mut buf = vec![0u8; capacity];
    let n = timeout(read_timeout, socket.recv(&mut buf))
        .await
        .map_err(|_| TrackerError::Timeout)??;

    if n < 20 {
        return Err(TrackerError::InvalidResponse(
            "announce response too short".into(),
        ));
    }

    let action = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
    let resp_tid = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);

    if resp_tid != transaction_id {
        return Err(TrackerError::InvalidResponse(
            "transaction id mismatch".into(),
        ));
    }

    // An error packet is the tracker speaking, not a transport failure
    if action == ACTION_ERROR {
        let message = String::from_utf8_lossy(&buf[8..n]).to_string();
        return Ok(TrackerResponse::failure(message));
    }

    if action != ACTION_ANNOUNCE {
        return Err(TrackerError::InvalidResponse(
            "announce response mismatch".into(),
        ));
    }

    let interval = u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]) as u64;
    let leechers = u32::from_be_bytes([buf[12], buf[13], buf[14], buf[15]]) as u64;
    let seeders = u32::from_be_bytes([buf[16], buf[17], buf[18], buf[19]]) as u64;

    let peers = parse_compact_peers(&buf[20..n - (n - 20) % 6])?;

    Ok(TrackerResponse {
        failure_reason: None,
        warning_message: None,
        interval,
        min_interval: interval,
        tracker_id: None,
        complete: seeders,
        incomplete: leechers,
        peers,
    })
}

fn parse_udp_url(url: &str) -> Result<(String, u16), TrackerError> {
    let rest = url
        .strip_prefix("udp://")
        .ok_or_else(|| TrackerError::InvalidUrl(url.to_string()))?;

    let authority = rest.split('/').next().unwrap_or(rest);

    let (host, port) = authority
        .rsplit_once(':')
        .ok_or_else(|| TrackerError::InvalidUrl(url.to_string()))?;

    let port: u16 = port
        .parse()
        .map_err(|_| TrackerError::InvalidUrl(url.to_string()))?;

    if host.is_empty() {
        return Err(TrackerError::InvalidUrl(url.to_string()));
    }

    Ok((host.to_string(), port))
}
