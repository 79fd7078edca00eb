//! Command surface parsing
//!
//! Commands arrive as single text lines:
//! ```text
//! START
//! WRITE <payload>
//! STOP
//! ```

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors for commands that violate the command contract
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown action: {0}")]
    Unknown(String),

    #[error("{0} takes no argument")]
    UnexpectedArgument(&'static str),

    #[error("write requires a non-empty payload")]
    EmptyPayload,
}

/// A command addressed to the connection supervisor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Begin connecting
    Start,
    /// Queue a payload for the peer
    Write(String),
    /// Tear down any connection and quiesce
    Stop,
}

impl Command {
    /// Build a write command, rejecting an empty payload
    pub fn write(payload: impl Into<String>) -> Result<Self, CommandError> {
        let payload = payload.into();
        if payload.is_empty() {
            return Err(CommandError::EmptyPayload);
        }
        Ok(Command::Write(payload))
    }

    /// Action name as it appears on the command surface
    pub fn action(&self) -> &'static str {
        match self {
            Command::Start => "START",
            Command::Write(_) => "WRITE",
            Command::Stop => "STOP",
        }
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim_end_matches(|c: char| c == '\r' || c == '\n');
        if line.trim().is_empty() {
            return Err(CommandError::Empty);
        }

        let (action, argument) = match line.split_once(' ') {
            Some((action, argument)) => (action, Some(argument)),
            None => (line, None),
        };

        match (action, argument) {
            ("START", None) => Ok(Command::Start),
            ("STOP", None) => Ok(Command::Stop),
            ("START", Some(_)) => Err(CommandError::UnexpectedArgument("START")),
            ("STOP", Some(_)) => Err(CommandError::UnexpectedArgument("STOP")),
            ("WRITE", payload) => Command::write(payload.unwrap_or_default()),
            (other, _) => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Write(payload) => write!(f, "WRITE {payload}"),
            other => f.write_str(other.action()),
        }
    }
}
