//! Connection supervisor serializing start, write and stop
//!
//! The supervisor owns the only shared mutable state of the client: which
//! worker set is active. Either a connector is retrying, or a reader/writer
//! pair is serving a live link, or nothing runs. Every change to that record
//! happens under one lock that is held for bookkeeping only, never across I/O.

use super::config::ClientConfig;
use super::connector::Connector;
use super::event::{EventSink, Notifier};
use super::link::Link;
use super::queue::{write_queue, QueueError};
use super::reader::Reader;
use super::writer::{Writer, WriterHandle};
use crate::transport::{LinkAdapter, TransportStream};
use bt_client_shared::{ConnectionState, ErrorKind, StateTracker, TransitionResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Errors returned synchronously by [`Supervisor::write`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SupervisorError {
    #[error("write payload is empty")]
    EmptyPayload,

    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Which workers are currently running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Idle,
    Connecting,
    Connected,
}

struct ConnectorHandle {
    id: u64,
    cancel: CancellationToken,
}

struct SessionHandle {
    id: u64,
    cancel: CancellationToken,
    link: Link,
    writer: WriterHandle,
}

/// At most one connector or one reader/writer pair, never both
enum Active {
    Idle,
    Connecting(ConnectorHandle),
    Connected(SessionHandle),
}

struct Slots {
    tracker: StateTracker,
    active: Active,
}

/// State shared between the supervisor and its workers
pub(crate) struct Shared {
    pub(crate) config: ClientConfig,
    pub(crate) events: Notifier,
    adapter: Option<Arc<dyn LinkAdapter>>,
    slots: Mutex<Slots>,
    next_id: AtomicU64,
    terminated: CancellationToken,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Slots> {
        // Bookkeeping stays consistent even if a holder panicked
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn set_state(&self, slots: &mut Slots, state: ConnectionState) {
        match slots.tracker.transition(state) {
            TransitionResult::Success { from, to } => {
                if from != to {
                    info!("[SUPERVISOR] {} -> {}", from, to);
                }
            }
            TransitionResult::Invalid { from, to } => {
                warn!("[SUPERVISOR] Unexpected transition {} -> {}", from, to);
            }
        }
        self.events.status(state);
    }

    /// Record and launch a fresh connector; caller holds the lock
    fn spawn_connector(shared: &Arc<Shared>, slots: &mut Slots) -> bool {
        let Some(adapter) = shared.adapter.clone() else {
            return false;
        };

        let id = shared.next_id();
        let cancel = CancellationToken::new();
        slots.active = Active::Connecting(ConnectorHandle {
            id,
            cancel: cancel.clone(),
        });
        shared.set_state(slots, ConnectionState::Connecting);

        debug!("[SUPERVISOR] Spawning connector {} via {}", id, adapter.name());
        let connector = Connector::new(id, adapter, cancel, shared.clone());
        tokio::spawn(connector.run());
        true
    }

    /// Swap the connector for a reader/writer pair on `stream`
    ///
    /// Returns false, closing the stream, when the connector was cancelled
    /// while the link was opening.
    pub(crate) fn install_session(
        shared: &Arc<Shared>,
        connector_id: u64,
        cancel: &CancellationToken,
        stream: Box<dyn TransportStream>,
    ) -> bool {
        let mut slots = shared.lock();
        let owned = matches!(&slots.active, Active::Connecting(h) if h.id == connector_id);
        if cancel.is_cancelled() || !owned {
            drop(slots);
            info!("[CONNECT] Cancelled while connecting, closing {}", stream.peer());
            drop(stream);
            return false;
        }

        let link = Link::new(stream.peer());
        let (input, output) = tokio::io::split(stream);
        let (queue_tx, queue_rx) = write_queue(shared.config.write_queue_capacity);
        let writer_handle = WriterHandle::new(queue_tx);

        let id = shared.next_id();
        let session_cancel = CancellationToken::new();
        slots.active = Active::Connected(SessionHandle {
            id,
            cancel: session_cancel.clone(),
            link: link.clone(),
            writer: writer_handle.clone(),
        });

        let writer = Writer::new(output, queue_rx, link.clone(), shared.events.clone());
        let reader = Reader::new(
            id,
            input,
            link,
            writer_handle,
            session_cancel,
            shared.clone(),
        );
        tokio::spawn(reader.run(writer));
        true
    }

    /// Post Connected if `session_id` is still the live session
    pub(crate) fn mark_connected(&self, session_id: u64) {
        let mut slots = self.lock();
        if matches!(&slots.active, Active::Connected(h) if h.id == session_id) {
            self.set_state(&mut slots, ConnectionState::Connected);
        }
    }

    /// Clear a connector's own record when its loop exits
    pub(crate) fn connector_finished(&self, connector_id: u64) {
        let mut slots = self.lock();
        if matches!(&slots.active, Active::Connecting(h) if h.id == connector_id) {
            slots.active = Active::Idle;
        }
    }

    /// Settle in Stopped after a connector hit an error retrying cannot fix
    ///
    /// A connector that was already replaced or stopped changes nothing.
    pub(crate) fn connector_rejected(&self, connector_id: u64) {
        let mut slots = self.lock();
        if matches!(&slots.active, Active::Connecting(h) if h.id == connector_id) {
            slots.active = Active::Idle;
            self.set_state(&mut slots, ConnectionState::Stopped);
        }
    }

    /// Release a failed session and reconnect unless it was cancelled
    pub(crate) fn session_lost(
        shared: &Arc<Shared>,
        session_id: u64,
        cancel: &CancellationToken,
    ) {
        let mut slots = shared.lock();
        if matches!(&slots.active, Active::Connected(h) if h.id == session_id) {
            slots.active = Active::Idle;
        }

        if cancel.is_cancelled() {
            debug!("[SUPERVISOR] Session {} cancelled, not reconnecting", session_id);
            return;
        }
        if !matches!(slots.active, Active::Idle) {
            return;
        }

        info!("[SUPERVISOR] Session {} lost, reconnecting", session_id);
        Shared::spawn_connector(shared, &mut slots);
    }
}

/// The single entry point for start, write and stop commands
///
/// Cheap to clone; clones drive the same connection. `start` spawns worker
/// tasks and must be called from within a Tokio runtime.
#[derive(Clone)]
pub struct Supervisor {
    shared: Arc<Shared>,
}

impl Supervisor {
    /// Create a supervisor in the Unstarted state
    ///
    /// `adapter` is `None` when the host has no transport adapter at all.
    pub fn new(
        config: ClientConfig,
        adapter: Option<Arc<dyn LinkAdapter>>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let shared = Arc::new(Shared {
            config,
            events: Notifier::new(sink),
            adapter,
            slots: Mutex::new(Slots {
                tracker: StateTracker::new(),
                active: Active::Idle,
            }),
            next_id: AtomicU64::new(0),
            terminated: CancellationToken::new(),
        });
        shared.events.status(ConnectionState::Unstarted);
        Self { shared }
    }

    /// Begin connecting; no-op while a connector or session is active
    pub fn start(&self) {
        let mut slots = self.shared.lock();
        if !matches!(slots.active, Active::Idle) {
            debug!("[SUPERVISOR] Start ignored, connection already active");
            return;
        }

        if !Shared::spawn_connector(&self.shared, &mut slots) {
            drop(slots);
            error!("[SUPERVISOR] No transport adapter available");
            self.shared.events.error(ErrorKind::Unsupported);
            self.stop();
            self.shared.terminated.cancel();
        }
    }

    /// Queue `payload` on the live link
    ///
    /// With no live link this posts a `WriteFailure` carrying the payload and
    /// returns `Ok`. Errors are reserved for contract violations: an empty
    /// payload, or a bounded write queue that is full.
    pub fn write(&self, payload: &str) -> Result<(), SupervisorError> {
        if payload.is_empty() {
            return Err(SupervisorError::EmptyPayload);
        }

        let slots = self.shared.lock();
        let result = match &slots.active {
            Active::Connected(session) => session.writer.enqueue(payload),
            _ => Err(QueueError::Closed),
        };

        match result {
            Ok(()) => Ok(()),
            Err(QueueError::Closed) => {
                drop(slots);
                warn!("[SUPERVISOR] Write with no live connection");
                self.shared
                    .events
                    .error_with(ErrorKind::WriteFailure, payload);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Cancel every active worker and settle in Stopped; idempotent
    pub fn stop(&self) {
        let mut slots = self.shared.lock();
        match std::mem::replace(&mut slots.active, Active::Idle) {
            Active::Connecting(connector) => {
                info!("[SUPERVISOR] Cancelling connector {}", connector.id);
                connector.cancel.cancel();
            }
            Active::Connected(session) => {
                info!("[SUPERVISOR] Closing session {} to {}", session.id, session.link.peer());
                session.cancel.cancel();
                session.link.close();
            }
            Active::Idle => {}
        }

        if slots.tracker.state() != ConnectionState::Stopped {
            self.shared.set_state(&mut slots, ConnectionState::Stopped);
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        self.shared.lock().tracker.state()
    }

    /// Which workers are running right now
    pub fn activity(&self) -> Activity {
        match self.shared.lock().active {
            Active::Idle => Activity::Idle,
            Active::Connecting(_) => Activity::Connecting,
            Active::Connected(_) => Activity::Connected,
        }
    }

    /// Resolves once the supervisor has shut itself down for good
    pub async fn terminated(&self) {
        self.shared.terminated.cancelled().await
    }

    pub fn is_terminated(&self) -> bool {
        self.shared.terminated.is_cancelled()
    }
}
