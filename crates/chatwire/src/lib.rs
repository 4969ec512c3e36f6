//! Top-level facade crate for chatwire.
//!
//! Re-exports the core model, the realtime client, and the echo server so
//! users can depend on a single crate.

pub mod core {
    pub use chatwire_core::*;
}

pub mod client {
    pub use chatwire_client::*;
}

pub mod echo {
    pub use chatwire_echo::*;
}
