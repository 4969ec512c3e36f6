use serde::Deserialize;
use chatwire_core::error::{ChatWireError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EchoConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
        }
    }
}

impl EchoConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ChatWireError::UnsupportedVersion);
        }
        self.server.validate()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,

    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    #[serde(default = "default_reply_prefix")]
    pub reply_prefix: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            ping_interval_ms: default_ping_interval_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
            reply_prefix: default_reply_prefix(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        if !(1000..=120000).contains(&self.ping_interval_ms) {
            return Err(ChatWireError::BadConfig(
                "server.ping_interval_ms must be between 1000 and 120000".into(),
            ));
        }
        if self.idle_timeout_ms <= self.ping_interval_ms || self.idle_timeout_ms > 600000 {
            return Err(ChatWireError::BadConfig(
                "server.idle_timeout_ms must be greater than ping_interval_ms and at most 600000".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "127.0.0.1:8000".into()
}
fn default_ping_interval_ms() -> u64 {
    20000
}
fn default_idle_timeout_ms() -> u64 {
    60000
}
fn default_reply_prefix() -> String {
    "Echo: ".into()
}
