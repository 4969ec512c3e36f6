//! Transport layer (WebSocket).
//!
//! Exposes the WS upgrade handler and the echo reply codec.

pub mod codec;
pub mod ws;
