//! Wire format for the realtime chat channel.
//!
//! Frames are JSON objects carrying at least a `message` string. Every other
//! field is passed through untouched so the server can extend the payload
//! without a client release.
//!
//! All decoders are panic-free: malformed input is reported as
//! `ChatWireError` instead of panicking.

pub mod payload;

pub use payload::{decode_inbound, encode_outbound, WirePayload};
