//! Command executor - validates and dispatches incoming commands

use crate::connection::{Supervisor, SupervisorError};
use bt_client_shared::{Command, CommandError};
use thiserror::Error;
use tracing::{debug, warn};

/// Reasons a command is refused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecuteError {
    #[error("invalid command: {0}")]
    Command(#[from] CommandError),

    #[error(transparent)]
    Supervisor(#[from] SupervisorError),
}

/// Routes commands to the supervisor
pub struct CommandExecutor {
    supervisor: Supervisor,
}

impl CommandExecutor {
    /// Create a new command executor
    pub fn new(supervisor: Supervisor) -> Self {
        Self { supervisor }
    }

    /// The supervisor commands are routed to
    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    /// Execute a parsed command
    ///
    /// Outcomes other than contract violations surface as events, not errors.
    pub fn execute(&self, command: &Command) -> Result<(), ExecuteError> {
        debug!("Executing command: {}", command.action());

        match command {
            Command::Start => self.supervisor.start(),
            Command::Write(payload) => self.supervisor.write(payload)?,
            Command::Stop => self.supervisor.stop(),
        }
        Ok(())
    }

    /// Parse and execute one command line
    pub fn execute_line(&self, line: &str) -> Result<(), ExecuteError> {
        let command = line.parse::<Command>().map_err(|e| {
            warn!("Rejected command {:?}: {}", line, e);
            e
        })?;
        self.execute(&command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{Activity, ClientConfig, ClientEvent};
    use crate::transport::memory::MemoryAdapter;
    use crate::transport::LinkAdapter;
    use bt_client_shared::{ConnectionState, ErrorKind};
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn executor() -> (CommandExecutor, mpsc::UnboundedReceiver<ClientEvent>) {
        let (adapter, _peers) = MemoryAdapter::new();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let config = ClientConfig {
            address: "00:11:22:33:44:55".into(),
            ..Default::default()
        };
        let supervisor = Supervisor::new(
            config,
            Some(adapter as Arc<dyn LinkAdapter>),
            Arc::new(event_tx),
        );
        (CommandExecutor::new(supervisor), event_rx)
    }

    #[tokio::test]
    async fn test_unknown_command_rejected() {
        let (executor, _events) = executor();
        assert_eq!(
            executor.execute_line("RECONNECT"),
            Err(ExecuteError::Command(CommandError::Unknown("RECONNECT".into())))
        );
        assert_eq!(
            executor.execute_line(""),
            Err(ExecuteError::Command(CommandError::Empty))
        );
        assert_eq!(executor.supervisor().activity(), Activity::Idle);
    }

    #[tokio::test]
    async fn test_empty_write_never_reaches_supervisor() {
        let (executor, mut events) = executor();
        assert_eq!(
            executor.execute_line("WRITE"),
            Err(ExecuteError::Command(CommandError::EmptyPayload))
        );

        assert_eq!(
            events.try_recv().ok(),
            Some(ClientEvent::Status(ConnectionState::Unstarted))
        );
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_write_routes_to_supervisor() {
        let (executor, mut events) = executor();
        events.try_recv().ok();

        executor.execute_line("WRITE abcdef").expect("execute");
        assert_eq!(
            events.try_recv().ok(),
            Some(ClientEvent::Error {
                kind: ErrorKind::WriteFailure,
                context: Some("abcdef".into()),
            })
        );
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let (executor, _events) = executor();

        executor.execute(&Command::Start).expect("start");
        assert_eq!(executor.supervisor().activity(), Activity::Connecting);

        executor.execute(&Command::Stop).expect("stop");
        assert_eq!(executor.supervisor().activity(), Activity::Idle);
        assert_eq!(executor.supervisor().state(), ConnectionState::Stopped);
    }
}
