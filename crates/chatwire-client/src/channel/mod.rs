//! Realtime channel: connection lifecycle and inbound dispatch.
//!
//! State machine: `Disconnected -> Connecting -> Connected`, falling back to
//! `Disconnected` on a failed open or a lost transport. A lost transport
//! triggers a bounded reconnect loop; `disconnect()` or an exhausted loop are
//! the only ways to stop for good.

mod realtime;
mod reconnect;
mod state;

pub use realtime::{ChannelOptions, Listener, ListenerId, RealtimeChannel};
pub use reconnect::{Backoff, ReconnectPolicy, Sleeper, TokioSleeper};
pub use state::ConnectionState;
