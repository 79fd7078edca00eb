//! Connection Lifecycle State Machine
//!
//! Defines valid lifecycle transitions for the single client connection.

use crate::ConnectionState;

/// Result of a state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition was valid and state changed (or was re-posted)
    Success {
        from: ConnectionState,
        to: ConnectionState,
    },
    /// Transition is not part of the lifecycle; the state was still applied
    Invalid {
        from: ConnectionState,
        to: ConnectionState,
    },
}

/// Tracks the current lifecycle state
#[derive(Debug)]
pub struct StateTracker {
    current_state: ConnectionState,
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StateTracker {
    /// Create a tracker in the Unstarted state
    pub fn new() -> Self {
        Self {
            current_state: ConnectionState::Unstarted,
        }
    }

    /// Get current state
    pub fn state(&self) -> ConnectionState {
        self.current_state
    }

    /// Move to `to`, reporting whether the lifecycle allows it
    pub fn transition(&mut self, to: ConnectionState) -> TransitionResult {
        let from = self.current_state;
        self.current_state = to;
        if is_valid_transition(from, to) {
            TransitionResult::Success { from, to }
        } else {
            TransitionResult::Invalid { from, to }
        }
    }
}

/// Check if a transition from one state to another is valid
pub fn is_valid_transition(from: ConnectionState, to: ConnectionState) -> bool {
    use ConnectionState::*;

    match (from, to) {
        // Re-posting the same state is harmless
        (a, b) if a == b => true,

        // Stop can happen from anywhere
        (_, Stopped) => true,

        (Unstarted, Connecting) => true,
        (Connecting, Connected) => true,
        // Link lost, reconnecting
        (Connected, Connecting) => true,
        // Restart after an explicit stop
        (Stopped, Connecting) => true,

        _ => false,
    }
}
