//! Connect loop retrying until a link is installed or the loop is cancelled

use super::supervisor::Shared;
use crate::transport::LinkAdapter;
use bt_client_shared::{AddressError, ErrorKind, PeerAddress};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Outcome of one connect attempt
enum Attempt {
    /// Reader and writer installed on a fresh link
    Installed,
    /// Transport failed to open or the connector was cancelled meanwhile
    Failed,
}

/// Connect-with-retry worker
pub(crate) struct Connector {
    id: u64,
    adapter: Arc<dyn LinkAdapter>,
    cancel: CancellationToken,
    shared: Arc<Shared>,
}

impl Connector {
    pub(crate) fn new(
        id: u64,
        adapter: Arc<dyn LinkAdapter>,
        cancel: CancellationToken,
        shared: Arc<Shared>,
    ) -> Self {
        Self {
            id,
            adapter,
            cancel,
            shared,
        }
    }

    /// Retry until a link is installed, the address is rejected, or cancelled
    ///
    /// A rejected address is reported as `Exception` carrying the parse error
    /// and settles the supervisor in Stopped.
    pub(crate) async fn run(self) {
        let retry_interval = self.shared.config.retry_interval;
        let mut attempts: u64 = 0;

        while !self.cancel.is_cancelled() {
            if !self.adapter.is_enabled().await {
                warn!("[CONNECT] {} adapter is disabled", self.adapter.name());
                self.shared.events.error(ErrorKind::Disabled);
            } else {
                attempts += 1;
                match self.attempt().await {
                    Ok(Attempt::Installed) => {
                        info!("[CONNECT] Connected after {} attempt(s)", attempts);
                        return;
                    }
                    Ok(Attempt::Failed) => {}
                    Err(e) => {
                        error!("[CONNECT] Giving up: {}", e);
                        self.shared
                            .events
                            .error_with(ErrorKind::Exception, e.to_string());
                        self.shared.connector_rejected(self.id);
                        return;
                    }
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(retry_interval) => {}
                _ = self.cancel.cancelled() => {}
            }
        }

        debug!("[CONNECT] Connector {} exiting", self.id);
        self.shared.connector_finished(self.id);
    }

    /// Open one link and hand it to the supervisor
    ///
    /// Only a malformed address is an error; it will not fix itself on retry.
    async fn attempt(&self) -> Result<Attempt, AddressError> {
        let address: PeerAddress = self.shared.config.address.parse()?;
        self.adapter.cancel_discovery().await;

        let opened = tokio::select! {
            result = self.adapter.open(&address) => result,
            _ = self.cancel.cancelled() => {
                debug!("[CONNECT] Attempt to {} abandoned", address);
                return Ok(Attempt::Failed);
            }
        };

        let stream = match opened {
            Ok(stream) => stream,
            Err(e) => {
                debug!("[CONNECT] {} open failed: {:#}", self.adapter.name(), e);
                return Ok(Attempt::Failed);
            }
        };

        if Shared::install_session(&self.shared, self.id, &self.cancel, stream) {
            Ok(Attempt::Installed)
        } else {
            Ok(Attempt::Failed)
        }
    }
}
