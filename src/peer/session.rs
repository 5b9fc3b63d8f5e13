use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::{mpsc, watch};

use super::bitfield::Bitfield;
use super::connection::{PeerConnection, PeerReader, PeerWriter};
use super::message::Message;
use super::peer_id::PeerId;
use crate::metainfo::InfoHash;

/// How long the send worker waits on the output queue before re-checking
/// whether the session has closed.
const SEND_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Listener for session events.
///
/// Callbacks run on the session's event dispatcher, one at a time per
/// session, in wire order for received messages and enqueue order for sent
/// messages. The state mutation for a message is always committed before
/// the callback observing that message runs.
///
/// Listeners never see I/O errors; a failing session delivers a single
/// [`on_close`](Self::on_close) instead.
pub trait PeerListener: Send + Sync {
    /// A message arrived from the remote end.
    fn on_receive(&self, session: &PeerSession, message: &Message) {
        let _ = (session, message);
    }

    /// A message from the output queue was written to the remote end.
    fn on_send(&self, session: &PeerSession, message: &Message) {
        let _ = (session, message);
    }

    /// The session closed. Fired exactly once.
    fn on_close(&self, session: &PeerSession) {
        let _ = session;
    }
}

/// The protocol state of one end of a session.
///
/// Each session keeps two of these: one mirroring what the local end has
/// sent, one mirroring what the remote end has sent.
#[derive(Debug, Clone)]
pub struct EndpointState {
    /// Peer id from the handshake end, once seen.
    pub peer_id: Option<PeerId>,
    /// Protocol name from the handshake start, once seen.
    pub protocol: Option<String>,
    /// Info hash from the handshake start, once seen.
    pub info_hash: Option<InfoHash>,
    /// Reserved flag bytes from the handshake start.
    pub reserved: [u8; 8],
    /// Pieces this end has claimed via BitField and Have messages.
    pub claimed_pieces: Bitfield,
    /// Whether this end is choking the other. Starts true.
    pub choking: bool,
    /// Whether this end is interested in the other. Starts false.
    pub interested: bool,
    /// Whether this end has sent its handshake start.
    pub handshake_started: bool,
    /// Whether this end has sent its handshake end.
    pub handshake_finished: bool,
}

impl Default for EndpointState {
    fn default() -> Self {
        Self {
            peer_id: None,
            protocol: None,
            info_hash: None,
            reserved: [0; 8],
            claimed_pieces: Bitfield::default(),
            choking: true,
            interested: false,
            handshake_started: false,
            handshake_finished: false,
        }
    }
}

impl EndpointState {
    fn apply(&mut self, message: &Message) {
        match message {
            Message::HandshakeStart {
                protocol,
                reserved,
                info_hash,
            } => {
                for (ours, theirs) in self.reserved.iter_mut().zip(reserved) {
                    *ours |= theirs;
                }
                self.protocol = Some(protocol.clone());
                self.info_hash = Some(info_hash.clone());
                self.handshake_started = true;
            }
            Message::HandshakeEnd { peer_id } => {
                self.peer_id = Some(peer_id.clone());
                self.handshake_finished = true;
            }
            Message::Choke => self.choking = true,
            Message::Unchoke => self.choking = false,
            Message::Interested => self.interested = true,
            Message::NotInterested => self.interested = false,
            Message::Have { piece } => self.claimed_pieces.set(*piece as usize),
            Message::Bitfield(bits) => self.claimed_pieces.union_with(bits),
            _ => {}
        }
    }
}

#[derive(Default)]
struct SessionState {
    local: EndpointState,
    remote: EndpointState,
}

pub(crate) enum EventKind {
    Received(Message),
    Sent(Message),
    Closed { shutdown_dispatcher: bool },
}

pub(crate) struct PeerEvent {
    pub(crate) session: PeerSession,
    pub(crate) kind: EventKind,
}

/// Handle for submitting events to a dispatcher.
#[derive(Clone)]
pub(crate) struct EventSink {
    tx: mpsc::UnboundedSender<PeerEvent>,
}

impl EventSink {
    pub(crate) fn dispatch(&self, event: PeerEvent) {
        let _ = self.tx.send(event);
    }
}

/// A single-consumer event loop.
///
/// One dispatcher task drains the event queue, so events are delivered one
/// at a time and in submission order, for every session feeding it.
pub(crate) struct EventDispatcher {
    sink: EventSink,
    handle: tokio::task::JoinHandle<()>,
}

impl EventDispatcher {
    pub(crate) fn spawn() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<PeerEvent>();

        let handle = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let listeners = event.session.listeners_snapshot();
                match &event.kind {
                    EventKind::Received(message) => {
                        for listener in listeners.iter() {
                            listener.on_receive(&event.session, message);
                        }
                    }
                    EventKind::Sent(message) => {
                        for listener in listeners.iter() {
                            listener.on_send(&event.session, message);
                        }
                    }
                    EventKind::Closed {
                        shutdown_dispatcher,
                    } => {
                        for listener in listeners.iter() {
                            listener.on_close(&event.session);
                        }
                        // A dispatcher owned by its only session has nothing
                        // left to deliver after that session's close event
                        if *shutdown_dispatcher {
                            break;
                        }
                    }
                }
            }
        });

        Self {
            sink: EventSink { tx },
            handle,
        }
    }

    pub(crate) fn sink(&self) -> EventSink {
        self.sink.clone()
    }

    /// Stops the dispatcher: gives queued events `grace` to drain, then
    /// aborts the loop.
    pub(crate) async fn shutdown(self, grace: Duration) {
        let EventDispatcher { sink, mut handle } = self;
        drop(sink);

        if tokio::time::timeout(grace, &mut handle).await.is_err() {
            handle.abort();
        }
    }
}

/// A peer-protocol session over one connection.
///
/// The session splits its connection into a receive worker and a send
/// worker. The receive worker reads the two handshake halves, then framed
/// messages, committing each message's state mutation before submitting a
/// receive event. The send worker drains the output queue, committing the
/// local-side mutation before writing and firing a send event after.
///
/// [`send_message`](Self::send_message) never blocks: it enqueues onto an
/// unbounded queue. [`close`](Self::close) is idempotent; the first call
/// shuts the connection, wakes both workers, and fires one close event.
///
/// Cloning a `PeerSession` clones a handle to the same session.
///
/// # Examples
///
/// ```no_run
/// use bitwire::metainfo::InfoHash;
/// use bitwire::peer::{Message, PeerConnection, PeerId, PeerSession};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let connection = PeerConnection::connect("203.0.113.9:6881".parse()?).await?;
/// let session = PeerSession::spawn(connection);
///
/// session.send_message(Message::handshake_start(InfoHash::from_bytes([0; 20])));
/// session.send_message(Message::HandshakeEnd { peer_id: PeerId::generate() });
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PeerSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    addr: Option<SocketAddr>,
    state: RwLock<SessionState>,
    // Copy-on-write: event firing clones the Arc and never holds the lock
    // while callbacks run
    listeners: RwLock<Arc<Vec<Arc<dyn PeerListener>>>>,
    out_tx: mpsc::UnboundedSender<Message>,
    events: EventSink,
    owned_dispatcher: Option<EventDispatcher>,
    closed: watch::Sender<bool>,
}

impl PeerSession {
    /// Spawns a session with its own event dispatcher.
    ///
    /// The dispatcher belongs to this session and is shut down after the
    /// close event has been delivered. Sessions created through a
    /// [`SessionPool`](super::SessionPool) share the pool's dispatcher
    /// instead and leave its lifecycle to the pool.
    pub fn spawn(connection: PeerConnection) -> Self {
        let dispatcher = EventDispatcher::spawn();
        let sink = dispatcher.sink();
        Self::spawn_inner(connection, sink, Some(dispatcher))
    }

    pub(crate) fn spawn_with(connection: PeerConnection, events: EventSink) -> Self {
        Self::spawn_inner(connection, events, None)
    }

    fn spawn_inner(
        connection: PeerConnection,
        events: EventSink,
        owned_dispatcher: Option<EventDispatcher>,
    ) -> Self {
        let addr = connection.peer_addr();
        let (reader, writer) = connection.into_split();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (closed, _) = watch::channel(false);

        let session = PeerSession {
            inner: Arc::new(SessionInner {
                addr,
                state: RwLock::new(SessionState::default()),
                listeners: RwLock::new(Arc::new(Vec::new())),
                out_tx,
                events,
                owned_dispatcher,
                closed,
            }),
        };

        tokio::spawn(receive_worker(session.clone(), reader));
        tokio::spawn(send_worker(session.clone(), writer, out_rx));

        session
    }

    /// Returns the remote address the underlying socket is connected to.
    pub fn addr(&self) -> Option<SocketAddr> {
        self.inner.addr
    }

    /// Returns a snapshot of the local end's mirrored state.
    pub fn local_state(&self) -> EndpointState {
        self.inner.state.read().local.clone()
    }

    /// Returns a snapshot of the remote end's mirrored state.
    pub fn remote_state(&self) -> EndpointState {
        self.inner.state.read().remote.clone()
    }

    /// Enqueues a message to be sent as soon as possible.
    ///
    /// Returns `true` if the message was queued. Never blocks.
    pub fn send_message(&self, message: Message) -> bool {
        if self.is_closed() {
            return false;
        }
        self.inner.out_tx.send(message).is_ok()
    }

    /// Adds a listener that will receive this session's events.
    ///
    /// Adding the same listener twice has no effect.
    pub fn add_listener(&self, listener: Arc<dyn PeerListener>) {
        let mut guard = self.inner.listeners.write();
        if guard.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            return;
        }
        let mut next = guard.as_ref().clone();
        next.push(listener);
        *guard = Arc::new(next);
    }

    /// Removes a previously added listener.
    pub fn remove_listener(&self, listener: &Arc<dyn PeerListener>) {
        let mut guard = self.inner.listeners.write();
        let next: Vec<_> = guard
            .iter()
            .filter(|l| !Arc::ptr_eq(l, listener))
            .cloned()
            .collect();
        *guard = Arc::new(next);
    }

    pub(crate) fn listeners_snapshot(&self) -> Arc<Vec<Arc<dyn PeerListener>>> {
        self.inner.listeners.read().clone()
    }

    /// Returns `true` once the session has closed.
    pub fn is_closed(&self) -> bool {
        *self.inner.closed.borrow()
    }

    /// Closes the session.
    ///
    /// The first call signals both workers, enqueues a keep-alive sentinel
    /// so a queue-blocked send worker wakes immediately, and fires a single
    /// close event. Later calls do nothing.
    pub fn close(&self) {
        let was_closed = self.inner.closed.send_replace(true);
        if was_closed {
            return;
        }

        let _ = self.inner.out_tx.send(Message::KeepAlive);

        self.inner.events.dispatch(PeerEvent {
            session: self.clone(),
            kind: EventKind::Closed {
                shutdown_dispatcher: self.inner.owned_dispatcher.is_some(),
            },
        });

        tracing::debug!(addr = ?self.inner.addr, "peer session closed");
    }

    fn apply_remote(&self, message: &Message) {
        self.inner.state.write().remote.apply(message);
    }

    fn apply_local(&self, message: &Message) {
        self.inner.state.write().local.apply(message);
    }
}

impl std::fmt::Debug for PeerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerSession")
            .field("addr", &self.inner.addr)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Reads the handshake halves and then framed messages until the session
/// closes or the socket fails.
async fn receive_worker(session: PeerSession, mut reader: PeerReader) {
    let mut closed = session.inner.closed.subscribe();
    let mut received: u64 = 0;

    loop {
        if *closed.borrow() {
            break;
        }

        let next = tokio::select! {
            _ = closed.changed() => break,
            result = async {
                match received {
                    0 => reader.receive_handshake_start().await,
                    1 => reader.receive_handshake_end().await,
                    _ => reader.receive_message().await,
                }
            } => result,
        };

        match next {
            Ok(message) => {
                // State first, event second: listeners must observe the
                // mutation of the message they are being handed
                session.apply_remote(&message);
                session.inner.events.dispatch(PeerEvent {
                    session: session.clone(),
                    kind: EventKind::Received(message),
                });
                received += 1;
            }
            Err(err) => {
                tracing::debug!(addr = ?session.inner.addr, error = %err, "receive worker stopping");
                break;
            }
        }
    }

    session.close();
}

/// Drains the output queue until the session closes or the socket fails.
async fn send_worker(
    session: PeerSession,
    mut writer: PeerWriter,
    mut queue: mpsc::UnboundedReceiver<Message>,
) {
    let mut closed = session.inner.closed.subscribe();

    loop {
        if *closed.borrow() {
            break;
        }

        let polled = tokio::select! {
            _ = closed.changed() => break,
            polled = tokio::time::timeout(SEND_POLL_INTERVAL, queue.recv()) => polled,
        };

        match polled {
            // Poll timeout: go round and re-check the closed flag
            Err(_) => continue,
            // All queue handles dropped
            Ok(None) => break,
            Ok(Some(message)) => {
                // The close sentinel lands here when close() won the race
                if *closed.borrow() {
                    break;
                }

                session.apply_local(&message);
                if let Err(err) = writer.send_message(&message).await {
                    tracing::debug!(addr = ?session.inner.addr, error = %err, "send worker stopping");
                    break;
                }
                session.inner.events.dispatch(PeerEvent {
                    session: session.clone(),
                    kind: EventKind::Sent(message),
                });
            }
        }
    }

    session.close();
}
