//! Connection management for the single persistent peer link
//!
//! This module handles:
//! - The connect loop with fixed-interval retry
//! - The reader loop reassembling fixed-length frames
//! - The writer loop draining the outbound queue
//! - The supervisor that keeps exactly one of them active

mod config;
mod connector;
mod event;
mod link;
mod queue;
mod reader;
mod supervisor;
mod writer;

pub use config::{ClientConfig, TransportMode};
pub use event::{ClientEvent, EventSink, Notifier};
pub use link::Link;
pub use queue::{write_queue, Outbound, QueueError, QueueReceiver, QueueSender};
pub use supervisor::{Activity, Supervisor, SupervisorError};
pub use writer::{Writer, WriterHandle};
