//! Outbound write queue
//!
//! FIFO of pending payloads drained by exactly one writer. Unbounded unless a
//! capacity is configured, in which case a full queue rejects the item instead
//! of blocking the caller.

use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Items flowing to the writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Bytes to write to the link
    Payload(Bytes),
    /// Ends the writer loop; never written to the link
    Terminate,
}

/// Errors raised when the queue rejects an item
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("write queue full (capacity {0})")]
    Full(usize),

    #[error("write queue closed")]
    Closed,

    #[error("payload is empty")]
    EmptyPayload,
}

/// Create a write queue, bounded when `capacity` is set
pub fn write_queue(capacity: Option<usize>) -> (QueueSender, QueueReceiver) {
    match capacity {
        Some(capacity) => {
            let capacity = capacity.max(1);
            let (tx, rx) = mpsc::channel(capacity);
            (
                QueueSender::Bounded { tx, capacity },
                QueueReceiver::Bounded(rx),
            )
        }
        None => {
            let (tx, rx) = mpsc::unbounded_channel();
            (QueueSender::Unbounded(tx), QueueReceiver::Unbounded(rx))
        }
    }
}

/// Producer side of the write queue
#[derive(Debug, Clone)]
pub enum QueueSender {
    Bounded {
        tx: mpsc::Sender<Outbound>,
        capacity: usize,
    },
    Unbounded(mpsc::UnboundedSender<Outbound>),
}

impl QueueSender {
    /// Append an item without waiting
    pub fn push(&self, item: Outbound) -> Result<(), QueueError> {
        match self {
            QueueSender::Bounded { tx, capacity } => tx.try_send(item).map_err(|e| match e {
                TrySendError::Full(_) => QueueError::Full(*capacity),
                TrySendError::Closed(_) => QueueError::Closed,
            }),
            QueueSender::Unbounded(tx) => tx.send(item).map_err(|_| QueueError::Closed),
        }
    }
}

/// Consumer side of the write queue
#[derive(Debug)]
pub enum QueueReceiver {
    Bounded(mpsc::Receiver<Outbound>),
    Unbounded(mpsc::UnboundedReceiver<Outbound>),
}

impl QueueReceiver {
    /// Wait for the next item; `None` once every sender is gone
    pub async fn take(&mut self) -> Option<Outbound> {
        match self {
            QueueReceiver::Bounded(rx) => rx.recv().await,
            QueueReceiver::Unbounded(rx) => rx.recv().await,
        }
    }
}
