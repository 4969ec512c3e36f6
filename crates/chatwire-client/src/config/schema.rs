use std::time::Duration;

use serde::Deserialize;
use chatwire_core::error::{ChatWireError, Result};

use crate::channel::{Backoff, ReconnectPolicy};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub version: u32,

    #[serde(default)]
    pub channel: ChannelSection,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: 1,
            channel: ChannelSection::default(),
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ChatWireError::UnsupportedVersion);
        }
        self.channel.validate()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelSection {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default)]
    pub reconnect: ReconnectSection,
}

impl Default for ChannelSection {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            connect_timeout_ms: default_connect_timeout_ms(),
            reconnect: ReconnectSection::default(),
        }
    }
}

impl ChannelSection {
    pub fn validate(&self) -> Result<()> {
        if !(self.endpoint.starts_with("ws://") || self.endpoint.starts_with("wss://")) {
            return Err(ChatWireError::BadConfig(
                "channel.endpoint must start with ws:// or wss://".into(),
            ));
        }
        if !(100..=60000).contains(&self.connect_timeout_ms) {
            return Err(ChatWireError::BadConfig(
                "channel.connect_timeout_ms must be between 100 and 60000".into(),
            ));
        }
        self.reconnect.validate()
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffKind {
    Fixed,
    Exponential,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconnectSection {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    #[serde(default = "default_backoff")]
    pub backoff: BackoffKind,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for ReconnectSection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_delay_ms(),
            backoff: default_backoff(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl ReconnectSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=20).contains(&self.max_attempts) {
            return Err(ChatWireError::BadConfig(
                "channel.reconnect.max_attempts must be between 1 and 20".into(),
            ));
        }
        if !(10..=60000).contains(&self.delay_ms) {
            return Err(ChatWireError::BadConfig(
                "channel.reconnect.delay_ms must be between 10 and 60000".into(),
            ));
        }
        if self.max_delay_ms < self.delay_ms || self.max_delay_ms > 300000 {
            return Err(ChatWireError::BadConfig(
                "channel.reconnect.max_delay_ms must be >= delay_ms and <= 300000".into(),
            ));
        }
        Ok(())
    }

    pub fn policy(&self) -> ReconnectPolicy {
        let backoff = match self.backoff {
            BackoffKind::Fixed => Backoff::Fixed,
            BackoffKind::Exponential => Backoff::Exponential {
                max_delay: Duration::from_millis(self.max_delay_ms),
            },
        };
        ReconnectPolicy {
            max_attempts: self.max_attempts,
            delay: Duration::from_millis(self.delay_ms),
            backoff,
        }
    }
}

fn default_endpoint() -> String {
    "ws://localhost:8000/ws".into()
}
fn default_connect_timeout_ms() -> u64 {
    5000
}
fn default_max_attempts() -> u32 {
    5
}
fn default_delay_ms() -> u64 {
    1000
}
fn default_backoff() -> BackoffKind {
    BackoffKind::Fixed
}
fn default_max_delay_ms() -> u64 {
    30000
}
