//! chatwire core: transport-agnostic wire payloads, chat model, and errors.
//!
//! This crate defines the wire contract and error surface shared by the
//! realtime client, the echo server, and the terminal front end. It carries no
//! transport or runtime dependencies so the model and codec can be reused
//! anywhere a chat turn needs to be encoded, decoded, or stored.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths surface as `ChatWireError`/`Result` so a malformed
//! frame from the server never takes the UI down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod model;
pub mod protocol;
pub mod store;

/// Shared result type.
pub use error::{ChatWireError, ErrorCode, Result};
pub use model::{Conversation, Message, Role};
pub use protocol::WirePayload;
pub use store::{InMemoryStore, MessageStore};
