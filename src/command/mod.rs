//! Command surface for the connection supervisor
//!
//! This module handles:
//! - Parsing command lines into commands
//! - Routing commands to the supervisor

mod executor;

pub use executor::{CommandExecutor, ExecuteError};
