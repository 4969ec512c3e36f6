//! Client config loader (strict parsing).

pub mod schema;

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use chatwire_core::error::{ChatWireError, Result};

pub use schema::{BackoffKind, ChannelSection, ClientConfig, ReconnectSection};

pub fn load_from_file(path: impl AsRef<Path>) -> Result<ClientConfig> {
    let path = path.as_ref();
    let s = fs::read_to_string(path).map_err(|e| {
        ChatWireError::BadConfig(format!("read config failed ({}): {e}", path.display()))
    })?;
    load_from_str(&s)
}

/// Like `load_from_file`, but a missing file yields the defaults.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<ClientConfig> {
    let path = path.as_ref();
    match fs::metadata(path) {
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            Ok(ClientConfig::default())
        }
        _ => load_from_file(path),
    }
}

pub fn load_from_str(s: &str) -> Result<ClientConfig> {
    let cfg: ClientConfig = serde_yaml::from_str(s)
        .map_err(|e| ChatWireError::BadConfig(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
