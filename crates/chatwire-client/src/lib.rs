//! chatwire client library entry.
//!
//! This crate wires the transport seam, the realtime channel state machine,
//! and the chat session glue into the client stack. It is consumed by the
//! terminal binary (`main.rs`) and by integration tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod channel;
pub mod config;
pub mod session;
pub mod transport;

pub use channel::{ChannelOptions, ConnectionState, RealtimeChannel};
pub use session::ChatSession;
