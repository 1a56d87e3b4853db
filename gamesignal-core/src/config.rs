// src/config.rs

use std::path::PathBuf;
use std::time::Duration;

use crate::registry::DEFAULT_ENDPOINT_PREFIX;
use crate::Error;

pub const DEFAULT_STORE_PATH: &str = "device_webhooks.json";
pub const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 10;

/// Validated runtime settings, built by the server from CLI flags / env.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    pub channel_id: u64,
    pub store_path: PathBuf,
    pub endpoint_prefix: String,
    pub remote_timeout: Duration,
}

impl BotConfig {
    pub fn new(token: impl Into<String>, channel_id: u64) -> Self {
        Self {
            token: token.into(),
            channel_id,
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            endpoint_prefix: DEFAULT_ENDPOINT_PREFIX.to_string(),
            remote_timeout: Duration::from_secs(DEFAULT_REMOTE_TIMEOUT_SECS),
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.token.trim().is_empty() {
            return Err(Error::Config("Discord bot token is empty".into()));
        }
        if self.channel_id == 0 {
            return Err(Error::Config("gaming channel id must be non-zero".into()));
        }
        if self.endpoint_prefix.is_empty() {
            return Err(Error::Config("endpoint prefix must not be empty".into()));
        }
        if self.remote_timeout.is_zero() {
            return Err(Error::Config("remote timeout must be at least one second".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = BotConfig::new("token", 1234);
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.endpoint_prefix, "Gaming-");
        assert_eq!(cfg.remote_timeout, Duration::from_secs(10));
    }

    #[test]
    fn rejects_empty_token_and_zero_channel() {
        assert!(matches!(BotConfig::new("  ", 1).validate(), Err(Error::Config(_))));
        assert!(matches!(BotConfig::new("t", 0).validate(), Err(Error::Config(_))));
    }
}
