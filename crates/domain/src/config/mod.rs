mod ai;
mod observability;
mod server;
mod store;
mod usage;

pub use ai::*;
pub use observability::*;
pub use server::*;
pub use store::*;
pub use usage::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub usage: UsageConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Admin
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Environment variable holding the admin bearer token.
    /// If the env var is unset, admin endpoints are **disabled** (403).
    #[serde(default = "d_admin_token_env")]
    pub token_env: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            token_env: d_admin_token_env(),
        }
    }
}

fn d_admin_token_env() -> String {
    "HH_ADMIN_TOKEN".into()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

const MAX_SENSIBLE_RETRIES: u32 = 10;

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut push = |severity, field: &str, message: String| {
            errors.push(ConfigError {
                severity,
                field: field.into(),
                message,
            });
        };

        if self.server.port == 0 {
            push(
                ConfigSeverity::Error,
                "server.port",
                "port must be greater than 0".into(),
            );
        }
        if self.server.host.is_empty() {
            push(
                ConfigSeverity::Error,
                "server.host",
                "host must not be empty".into(),
            );
        }
        if self.server.max_concurrent_requests == 0 {
            push(
                ConfigSeverity::Error,
                "server.max_concurrent_requests",
                "must be greater than 0".into(),
            );
        }
        if let Some(rl) = &self.server.rate_limit {
            if rl.requests_per_second == 0 || rl.burst_size == 0 {
                push(
                    ConfigSeverity::Error,
                    "server.rate_limit",
                    "requests_per_second and burst_size must be > 0".into(),
                );
            }
        }
        if self.server.cors.allowed_origins.len() == 1
            && self.server.cors.allowed_origins[0] == "*"
        {
            push(
                ConfigSeverity::Warning,
                "server.cors.allowed_origins",
                "wildcard \"*\" allows all origins (not recommended for production)".into(),
            );
        }

        if let Err(e) = self.usage.tz() {
            push(ConfigSeverity::Error, "usage.time_zone", e);
        }
        if self.usage.free_user_limit == 0 {
            push(
                ConfigSeverity::Warning,
                "usage.free_user_limit",
                "0 blocks every unsubscribed user".into(),
            );
        }

        if self.ai.base_url.is_empty() {
            push(
                ConfigSeverity::Error,
                "ai.base_url",
                "base_url must not be empty".into(),
            );
        }
        if self.ai.timeout_ms == 0 {
            push(
                ConfigSeverity::Error,
                "ai.timeout_ms",
                "timeout must be greater than 0".into(),
            );
        }
        if self.ai.max_retries > MAX_SENSIBLE_RETRIES {
            push(
                ConfigSeverity::Warning,
                "ai.max_retries",
                format!(
                    "{} retries keeps a chat request waiting for minutes",
                    self.ai.max_retries
                ),
            );
        }

        if self.store.state_path.as_os_str().is_empty() {
            push(
                ConfigSeverity::Error,
                "store.state_path",
                "state_path must not be empty".into(),
            );
        }

        errors.extend(self.observability.validate());
        errors
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
