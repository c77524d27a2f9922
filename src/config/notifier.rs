//! Notifier and channel configuration structures.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::{AppResult, DEFAULT_MAIL_MODULE};
use crate::infra::store::is_file_safe_queue_name;

/// Environment variable holding the path of the JSON configuration file.
pub const CONFIG_PATH_ENV: &str = "NOTIFIER_CONFIG";

/// Queue store backend selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackendConfig {
    /// In-memory store for development/testing.
    #[default]
    InMemory,
    /// JSON-lines files under a directory.
    File {
        /// Directory holding one file per queue.
        path: PathBuf,
    },
}

/// One notification channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Subject used until a handler sets one.
    pub default_subject: String,
    /// Lease taken per claimed item, in seconds.
    #[serde(default = "default_lease_secs")]
    pub lease_secs: u64,
    /// Drain budget in seconds; 0 means unlimited.
    #[serde(default)]
    pub time_limit_secs: u64,
}

fn default_lease_secs() -> u64 {
    30
}

fn default_langcode() -> String {
    "en".into()
}

fn default_mail_module() -> String {
    DEFAULT_MAIL_MODULE.into()
}

impl ChannelConfig {
    /// Channel with default lease and no budget.
    pub fn new(default_subject: impl Into<String>) -> Self {
        Self {
            default_subject: default_subject.into(),
            lease_secs: default_lease_secs(),
            time_limit_secs: 0,
        }
    }

    /// Validate channel configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.default_subject.trim().is_empty() {
            return Err("default_subject must not be empty".into());
        }
        if self.lease_secs == 0 {
            return Err("lease_secs must be greater than 0".into());
        }
        Ok(())
    }

    /// Lease as a duration.
    pub const fn lease(&self) -> Duration {
        Duration::from_secs(self.lease_secs)
    }

    /// Drain budget, `None` when unlimited.
    pub const fn time_limit(&self) -> Option<Duration> {
        if self.time_limit_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.time_limit_secs))
        }
    }
}

/// Root notifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Map of channel (queue) name to configuration.
    pub channels: HashMap<String, ChannelConfig>,
    /// Store backend shared by every channel.
    #[serde(default)]
    pub store: StoreBackendConfig,
    /// Language messages are rendered in.
    #[serde(default = "default_langcode")]
    pub langcode: String,
    /// Module handed to the mail transport.
    #[serde(default = "default_mail_module")]
    pub mail_module: String,
}

impl NotifierConfig {
    /// Validate all channels and ensure at least one exists.
    ///
    /// With the file backend, channel names must also be usable as file names.
    pub fn validate(&self) -> Result<(), String> {
        if self.channels.is_empty() {
            return Err("at least one channel must be defined".into());
        }
        if self.langcode.trim().is_empty() {
            return Err("langcode must not be empty".into());
        }
        if self.mail_module.trim().is_empty() {
            return Err("mail_module must not be empty".into());
        }
        for (name, channel) in &self.channels {
            if name.trim().is_empty() || name.chars().any(char::is_whitespace) {
                return Err(format!("channel name `{name}` is invalid"));
            }
            if matches!(self.store, StoreBackendConfig::File { .. })
                && !is_file_safe_queue_name(name)
            {
                return Err(format!(
                    "channel name `{name}` cannot be used with the file store"
                ));
            }
            channel
                .validate()
                .map_err(|e| format!("channel `{name}` invalid: {e}"))?;
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load the file named by [`CONFIG_PATH_ENV`], reading `.env` first if present.
    ///
    /// # Errors
    ///
    /// Fails when the variable is unset, the file is unreadable, or the
    /// contents do not validate.
    pub fn from_env() -> AppResult<Self> {
        let _ = dotenvy::dotenv();
        let path = std::env::var(CONFIG_PATH_ENV)
            .with_context(|| format!("{CONFIG_PATH_ENV} is not set"))?;
        let input = std::fs::read_to_string(&path)
            .with_context(|| format!("reading notifier config from {path}"))?;
        Self::from_json_str(&input).map_err(|e| anyhow::anyhow!("{path}: {e}"))
    }
}
