//! Shared handle to one live transport link

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Close signal shared by the reader and writer of one link
///
/// Closing is idempotent and wakes every pending read or write on the link;
/// the socket itself is released once both halves have been dropped.
#[derive(Debug, Clone)]
pub struct Link {
    closed: CancellationToken,
    peer: Arc<str>,
}

impl Link {
    pub fn new(peer: impl Into<Arc<str>>) -> Self {
        Self {
            closed: CancellationToken::new(),
            peer: peer.into(),
        }
    }

    /// Description of the remote end
    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub fn close(&self) {
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Resolves once the link has been closed
    pub async fn closed(&self) {
        self.closed.cancelled().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_close_wakes_waiters() {
        let link = Link::new("memory");
        let waiter = link.clone();
        let task = tokio::spawn(async move { waiter.closed().await });

        assert!(!link.is_closed());
        link.close();
        link.close();

        task.await.expect("waiter finished");
        assert!(link.is_closed());
        assert_eq!(link.peer(), "memory");
    }
}
