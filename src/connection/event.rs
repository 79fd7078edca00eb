//! Notifications emitted by the connection loops

use bt_client_shared::{ConnectionState, ErrorKind, Frame};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Events posted to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Lifecycle transition
    Status(ConnectionState),
    /// Error notification with optional context
    Error {
        kind: ErrorKind,
        context: Option<String>,
    },
    /// A decoded inbound frame
    Message(Frame),
}

/// Receives events from the connection loops
///
/// `post` is called from worker tasks, sometimes while supervisor bookkeeping
/// is locked, so it must not block.
pub trait EventSink: Send + Sync + 'static {
    fn post(&self, event: ClientEvent);
}

impl EventSink for mpsc::UnboundedSender<ClientEvent> {
    fn post(&self, event: ClientEvent) {
        // A host that stopped listening loses nothing it asked for
        let _ = self.send(event);
    }
}

/// Cloneable front for an event sink
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn EventSink>,
}

impl Notifier {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }

    pub fn status(&self, state: ConnectionState) {
        self.sink.post(ClientEvent::Status(state));
    }

    pub fn error(&self, kind: ErrorKind) {
        self.sink.post(ClientEvent::Error {
            kind,
            context: None,
        });
    }

    pub fn error_with(&self, kind: ErrorKind, context: impl Into<String>) {
        self.sink.post(ClientEvent::Error {
            kind,
            context: Some(context.into()),
        });
    }

    pub fn message(&self, frame: Frame) {
        self.sink.post(ClientEvent::Message(frame));
    }
}
