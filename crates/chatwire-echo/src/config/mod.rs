//! Echo server config loader (strict parsing).

pub mod schema;

use std::fs;

use chatwire_core::error::{ChatWireError, Result};

pub use schema::{EchoConfig, ServerSection};

pub fn load_from_file(path: &str) -> Result<EchoConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| ChatWireError::BadConfig(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<EchoConfig> {
    let cfg: EchoConfig = serde_yaml::from_str(s)
        .map_err(|e| ChatWireError::BadConfig(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
