use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;

use super::connection::PeerConnection;
use super::session::{EventDispatcher, EventSink, PeerListener, PeerSession};

/// How often the reaper sweeps closed sessions out of the pool.
const REAP_INTERVAL: Duration = Duration::from_secs(30);

/// How long queued events get to drain when the pool closes before the
/// dispatcher is aborted.
const EVENT_SHUTDOWN_GRACE: Duration = Duration::from_millis(250);

/// A container for peer sessions sharing one event dispatcher.
///
/// Sessions created through the pool dispatch their events on the pool's
/// single-consumer dispatcher, so events are serialized across all of them.
/// Listeners registered on the pool are attached to every current and
/// future session. A background reaper drops closed sessions from the pool
/// roughly every 30 seconds.
///
/// The pool owns its dispatcher for its whole lifetime: sessions it creates
/// never shut the dispatcher down on their own close, only
/// [`close`](Self::close) does.
///
/// # Examples
///
/// ```no_run
/// use bitwire::peer::{PeerConnection, SessionPool};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = SessionPool::new();
///
/// let connection = PeerConnection::connect("203.0.113.9:6881".parse()?).await?;
/// let session = pool.new_session(connection);
///
/// // ... drive the session ...
///
/// pool.close().await;
/// # Ok(())
/// # }
/// ```
pub struct SessionPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    sessions: Mutex<Vec<PeerSession>>,
    listeners: Mutex<Vec<Arc<dyn PeerListener>>>,
    events: EventSink,
    dispatcher: Mutex<Option<EventDispatcher>>,
    closed: watch::Sender<bool>,
}

impl SessionPool {
    /// Creates an empty pool and starts its dispatcher and reaper.
    pub fn new() -> Self {
        let dispatcher = EventDispatcher::spawn();
        let events = dispatcher.sink();
        let (closed, closed_rx) = watch::channel(false);

        let inner = Arc::new(PoolInner {
            sessions: Mutex::new(Vec::new()),
            listeners: Mutex::new(Vec::new()),
            events,
            dispatcher: Mutex::new(Some(dispatcher)),
            closed,
        });

        tokio::spawn(reaper(Arc::downgrade(&inner), closed_rx));

        Self { inner }
    }

    /// Attaches a new session for `connection` to this pool.
    ///
    /// The session uses the pool's dispatcher and starts out with every
    /// listener currently registered on the pool.
    pub fn new_session(&self, connection: PeerConnection) -> PeerSession {
        let session = PeerSession::spawn_with(connection, self.inner.events.clone());

        let mut sessions = self.inner.sessions.lock();
        for listener in self.inner.listeners.lock().iter() {
            session.add_listener(listener.clone());
        }
        sessions.push(session.clone());

        session
    }

    /// Registers a listener on every current and future session.
    pub fn add_listener(&self, listener: Arc<dyn PeerListener>) {
        let sessions = self.inner.sessions.lock();
        self.inner.listeners.lock().push(listener.clone());
        for session in sessions.iter() {
            session.add_listener(listener.clone());
        }
    }

    /// Removes a listener from the pool and from every current session.
    pub fn remove_listener(&self, listener: &Arc<dyn PeerListener>) {
        let sessions = self.inner.sessions.lock();
        self.inner
            .listeners
            .lock()
            .retain(|l| !Arc::ptr_eq(l, listener));
        for session in sessions.iter() {
            session.remove_listener(listener);
        }
    }

    /// Returns the number of sessions currently held by the pool.
    ///
    /// Closed sessions count until the reaper removes them.
    pub fn session_count(&self) -> usize {
        self.inner.sessions.lock().len()
    }

    /// Returns `true` once the pool has been closed.
    pub fn is_closed(&self) -> bool {
        *self.inner.closed.borrow()
    }

    /// Closes every session, then shuts the dispatcher down.
    ///
    /// Queued events get a short grace period to drain before the
    /// dispatcher is forced to stop. Safe to call more than once.
    pub async fn close(&self) {
        let was_closed = self.inner.closed.send_replace(true);
        if was_closed {
            return;
        }

        let sessions: Vec<PeerSession> = std::mem::take(&mut *self.inner.sessions.lock());
        for session in &sessions {
            session.close();
        }

        let dispatcher = self.inner.dispatcher.lock().take();
        if let Some(dispatcher) = dispatcher {
            dispatcher.shutdown(EVENT_SHUTDOWN_GRACE).await;
        }
    }
}

impl Default for SessionPool {
    fn default() -> Self {
        Self::new()
    }
}

/// Periodically drops closed sessions. Stops when the pool closes or is
/// dropped.
async fn reaper(pool: Weak<PoolInner>, mut closed: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            _ = closed.changed() => break,
            _ = tokio::time::sleep(REAP_INTERVAL) => {}
        }

        let Some(pool) = pool.upgrade() else {
            break;
        };

        let mut sessions = pool.sessions.lock();
        let before = sessions.len();
        sessions.retain(|session| !session.is_closed());
        let reaped = before - sessions.len();
        if reaped > 0 {
            tracing::trace!(reaped, "reaped closed peer sessions");
        }
    }
}
