use std::env;

use crate::error::{Result, SyncError};

const DEFAULT_LOG_DIRECTIVE: &str = "pubsync=info";
const DEFAULT_ACTION_LOG_CAPACITY: usize = 1024;

/// Host configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// The user the local client acts as.
    pub user_id: String,

    // Logging
    pub log_directive: String,

    // Engine
    pub action_log_capacity: usize,
    pub run_id: String,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary lookup (tests, embedded hosts).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let user_id = required(&lookup, "PUBSYNC_USER_ID")?;

        let action_log_capacity = match lookup("PUBSYNC_ACTION_LOG_CAPACITY") {
            Some(raw) => raw.parse::<usize>().map_err(|_| {
                SyncError::Config(format!(
                    "PUBSYNC_ACTION_LOG_CAPACITY must be a number, got {raw:?}"
                ))
            })?,
            None => DEFAULT_ACTION_LOG_CAPACITY,
        };
        if action_log_capacity == 0 {
            return Err(SyncError::Config(
                "PUBSYNC_ACTION_LOG_CAPACITY must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            user_id,
            log_directive: lookup("PUBSYNC_LOG")
                .unwrap_or_else(|| DEFAULT_LOG_DIRECTIVE.to_string()),
            action_log_capacity,
            run_id: lookup("PUBSYNC_RUN_ID").unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        })
    }

    /// Log the loaded configuration.
    pub fn log_summary(&self) {
        tracing::info!(
            user_id = %self.user_id,
            log_directive = %self.log_directive,
            action_log_capacity = self.action_log_capacity,
            run_id = %self.run_id,
            "Configuration loaded"
        );
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(SyncError::Config(format!(
            "{key} environment variable is required"
        ))),
    }
}
