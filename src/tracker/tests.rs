use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::UdpSocket;

use super::*;
use crate::bencode::decode;
use crate::metainfo::InfoHash;
use crate::peer::PeerId;

fn basic_request() -> TrackerRequest {
    TrackerRequest::builder()
        .info_hash(InfoHash::from_bytes([0xAA; 20]))
        .peer_id(PeerId::from_bytes(&[0x42; 20]).unwrap())
        .left(1000)
        .build()
        .unwrap()
}

#[test]
fn test_builder_requires_identity() {
    assert!(matches!(
        TrackerRequest::builder().build(),
        Err(TrackerError::IncompleteRequest("info_hash"))
    ));
    assert!(matches!(
        TrackerRequest::builder()
            .info_hash(InfoHash::from_bytes([0; 20]))
            .build(),
        Err(TrackerError::IncompleteRequest("peer_id"))
    ));
}

#[test]
fn test_builder_defaults() {
    let request = basic_request();
    assert_eq!(request.port, 6881);
    assert_eq!(request.num_want, 32);
    assert_eq!(request.event, AnnounceEvent::Regular);
    assert!(!request.want_peer_id);
    assert!(request.compact.is_none());
}

#[test]
fn test_event_strings_and_udp_ids() {
    assert_eq!(AnnounceEvent::Regular.as_str(), "");
    assert_eq!(AnnounceEvent::Started.as_str(), "started");
    assert_eq!(AnnounceEvent::Stopped.as_str(), "stopped");
    assert_eq!(AnnounceEvent::Completed.as_str(), "completed");

    assert_eq!(AnnounceEvent::Regular.as_udp_id(), 0);
    assert_eq!(AnnounceEvent::Started.as_udp_id(), 1);
    assert_eq!(AnnounceEvent::Completed.as_udp_id(), 2);
    assert_eq!(AnnounceEvent::Stopped.as_udp_id(), 3);
}

#[test]
fn test_query_string_fields() {
    let request = TrackerRequest::builder()
        .info_hash(InfoHash::from_bytes([0xAA; 20]))
        .peer_id(PeerId::from_bytes(&[0x42; 20]).unwrap())
        .event(AnnounceEvent::Started)
        .num_want(8)
        .want_peer_id(true)
        .build()
        .unwrap();

    let query = http::query_string(&request);

    assert!(query.starts_with("?info_hash=%AA%AA"));
    assert!(query.contains("&event=started"));
    assert!(query.contains("&numwant=8"));
    assert!(query.contains("&no_peer_id=0"));
    assert!(!query.contains("compact="));
    // 0x42 is ASCII 'B', which passes through percent encoding untouched
    assert!(query.contains(&format!("&peer_id={}", "B".repeat(20))));
}

#[test]
fn test_query_string_regular_event_is_empty() {
    let request = TrackerRequest::builder()
        .info_hash(InfoHash::from_bytes([0xAA; 20]))
        .peer_id(PeerId::from_bytes(&[0x42; 20]).unwrap())
        .compact(true)
        .build()
        .unwrap();

    let query = http::query_string(&request);

    assert!(query.contains("&compact=1"));
    assert!(query.contains("&no_peer_id=1"));
    assert!(query.contains("&event=&"));
}

#[test]
fn test_response_compact_peers() {
    let body = b"d8:completei5e10:incompletei3e8:intervali1800e5:peers6:\xc0\xa8\x00\x01\x1a\xe1e";
    let value = decode(body).unwrap();
    let response = TrackerResponse::from_value(&value).unwrap();

    assert!(!response.is_failure());
    assert_eq!(response.interval, 1800);
    assert_eq!(response.min_interval, 1800);
    assert_eq!(response.complete, 5);
    assert_eq!(response.incomplete, 3);
    assert_eq!(response.peers.len(), 1);
    let expected: SocketAddr = "192.168.0.1:6881".parse().unwrap();
    assert_eq!(response.peers[0].addr, expected);
    assert!(response.peers[0].peer_id.is_none());
}

#[test]
fn test_response_dict_peers() {
    let mut body = Vec::new();
    body.extend_from_slice(b"d8:completei1e10:incompletei0e8:intervali900e5:peersl");
    body.extend_from_slice(b"d2:ip11:192.168.0.27:peer id20:");
    body.extend_from_slice(&[0x43; 20]);
    body.extend_from_slice(b"4:porti6882eee");
    body.push(b'e');

    let value = decode(&body).unwrap();
    let response = TrackerResponse::from_value(&value).unwrap();

    assert_eq!(response.peers.len(), 1);
    let expected: SocketAddr = "192.168.0.2:6882".parse().unwrap();
    assert_eq!(response.peers[0].addr, expected);
    assert_eq!(
        response.peers[0].peer_id,
        PeerId::from_bytes(&[0x43; 20])
    );
}

#[test]
fn test_response_failure_reason() {
    let value = decode(b"d14:failure reason12:unregistered4:infoi0ee").unwrap();
    let response = TrackerResponse::from_value(&value).unwrap();

    assert!(response.is_failure());
    assert_eq!(response.failure_reason.as_deref(), Some("unregistered"));
    assert!(response.peers.is_empty());
}

#[test]
fn test_response_missing_interval() {
    let value = decode(b"d8:completei5e10:incompletei3e5:peers0:e").unwrap();
    assert!(matches!(
        TrackerResponse::from_value(&value),
        Err(TrackerError::InvalidResponse(_))
    ));
}

#[test]
fn test_compact_peers_bad_length() {
    assert!(matches!(
        response::parse_compact_peers(&[1, 2, 3]),
        Err(TrackerError::InvalidResponse(_))
    ));
}

/// Minimal BEP-15 tracker: answers connect requests correctly, answers
/// announce requests with the given action.
async fn spawn_fake_udp_tracker(announce_action: u32) -> SocketAddr {
    let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr().unwrap();

    tokio::spawn(async move {
        let mut buf = [0u8; 1024];
        loop {
            let Ok((n, peer)) = server.recv_from(&mut buf).await else {
                break;
            };

            if n == 16 {
                let mut resp = Vec::with_capacity(16);
                resp.extend_from_slice(&0u32.to_be_bytes());
                resp.extend_from_slice(&buf[12..16]);
                resp.extend_from_slice(&0xCAFEBABE_DEADBEEFu64.to_be_bytes());
                let _ = server.send_to(&resp, peer).await;
            } else if n == 98 {
                let mut resp = Vec::new();
                resp.extend_from_slice(&announce_action.to_be_bytes());
                resp.extend_from_slice(&buf[12..16]);
                resp.extend_from_slice(&1800u32.to_be_bytes());
                resp.extend_from_slice(&3u32.to_be_bytes());
                resp.extend_from_slice(&5u32.to_be_bytes());
                resp.extend_from_slice(&[10, 0, 0, 1, 0x1a, 0xe1]);
                resp.extend_from_slice(&[10, 0, 0, 2, 0x1a, 0xe2]);
                let _ = server.send_to(&resp, peer).await;
            }
        }
    });

    addr
}

#[tokio::test]
async fn test_udp_announce() {
    let addr = spawn_fake_udp_tracker(1).await;
    let tracker = UdpTracker::new(&format!("udp://127.0.0.1:{}", addr.port())).unwrap();

    let response = tracker
        .announce(&basic_request(), Duration::from_secs(2))
        .await
        .unwrap();

    assert_eq!(response.interval, 1800);
    assert_eq!(response.complete, 5);
    assert_eq!(response.incomplete, 3);
    assert_eq!(response.peers.len(), 2);
    let first: SocketAddr = "10.0.0.1:6881".parse().unwrap();
    let second: SocketAddr = "10.0.0.2:6882".parse().unwrap();
    assert_eq!(response.peers[0].addr, first);
    assert_eq!(response.peers[1].addr, second);
}

#[tokio::test]
async fn test_udp_announce_action_mismatch() {
    // Announce answered with action 0 instead of 1: no response surfaces
    let addr = spawn_fake_udp_tracker(0).await;
    let tracker =
        SingleTracker::for_url(&format!("udp://127.0.0.1:{}", addr.port())).unwrap();

    let response = tracker
        .announce(&basic_request(), Duration::from_millis(500))
        .await;

    assert!(response.is_none());
}

#[tokio::test]
async fn test_udp_announce_timeout() {
    // A bound socket that never answers: the announce gives up within budget
    let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = silent.local_addr().unwrap();
    let tracker =
        SingleTracker::for_url(&format!("udp://127.0.0.1:{}", addr.port())).unwrap();

    let response = tracker
        .announce(&basic_request(), Duration::from_millis(200))
        .await;

    assert!(response.is_none());
    drop(silent);
}

#[tokio::test]
async fn test_backed_tracker_promotes_responder() {
    let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let dead_url = format!("udp://127.0.0.1:{}", silent.local_addr().unwrap().port());
    let live_addr = spawn_fake_udp_tracker(1).await;
    let live_url = format!("udp://127.0.0.1:{}", live_addr.port());

    let tier = Tracker::for_tier(&[dead_url.clone(), live_url.clone()]).unwrap();
    let Tracker::Backed(backed) = &tier else {
        panic!("expected a backed tier");
    };

    let response = tier.announce(&basic_request(), Duration::from_secs(2)).await;
    assert!(response.is_some());

    // BEP-12 move-to-front: the responder now leads the tier
    assert_eq!(backed.urls().await, vec![live_url, dead_url]);
    drop(silent);
}

#[test]
fn test_for_tier_collapses_and_filters() {
    assert!(Tracker::for_tier::<&str>(&[]).is_none());
    assert!(Tracker::for_tier(&["wss://nope.example"]).is_none());

    match Tracker::for_tier(&["udp://t.example:80"]) {
        Some(Tracker::Single(_)) => {}
        other => panic!("expected single tracker, got {:?}", other),
    }
}

#[test]
fn test_unsupported_scheme() {
    assert!(matches!(
        SingleTracker::for_url("wss://tracker.example"),
        Err(TrackerError::UnsupportedProtocol(_))
    ));
}
