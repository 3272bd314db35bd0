//! AppState construction extracted from `main.rs`.

use std::sync::Arc;

use anyhow::Context;
use sha2::{Digest, Sha256};

use hh_ai::{AiBackend, RestAiClient};
use hh_domain::config::{Config, ConfigSeverity};
use hh_ledger::{Clock, JsonUserStore, SystemClock, UserStore};

use crate::questions::QuestionLog;
use crate::state::AppState;

/// Validate config, initialize every subsystem and return a fully-wired
/// [`AppState`].
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    if issues.iter().any(|i| i.severity == ConfigSeverity::Error) {
        anyhow::bail!(
            "config validation failed with {} error(s)",
            issues
                .iter()
                .filter(|i| i.severity == ConfigSeverity::Error)
                .count()
        );
    }

    // ── User store ───────────────────────────────────────────────────
    let state_path = &config.store.state_path;
    let users: Arc<dyn UserStore> = Arc::new(
        JsonUserStore::new(state_path)
            .with_context(|| format!("opening user store under {}", state_path.display()))?,
    );

    // ── Question log ─────────────────────────────────────────────────
    let questions = Arc::new(QuestionLog::new(state_path));

    // ── AI backend ───────────────────────────────────────────────────
    let ai: Arc<dyn AiBackend> =
        Arc::new(RestAiClient::new(&config.ai).context("creating AI client")?);
    tracing::info!(
        url = %config.ai.base_url,
        timeout_ms = config.ai.timeout_ms,
        max_retries = config.ai.max_retries,
        "AI client ready"
    );

    // ── Admin token ──────────────────────────────────────────────────
    let admin_token_hash = read_token_hash(&config.admin.token_env);
    if admin_token_hash.is_none() {
        tracing::warn!(
            env = %config.admin.token_env,
            "admin token not set, admin endpoints disabled"
        );
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let state = AppState::new(config.clone(), users, ai, clock, questions, admin_token_hash)?;

    tracing::info!(
        free_user_limit = config.usage.free_user_limit,
        time_zone = %state.ledger.time_zone(),
        "usage ledger ready"
    );

    Ok(state)
}

/// SHA-256 digest of the token in env var `name`, or `None` when it is
/// unset or blank.
fn read_token_hash(name: &str) -> Option<Vec<u8>> {
    std::env::var(name)
        .ok()
        .filter(|t| !t.trim().is_empty())
        .map(|t| Sha256::digest(t.as_bytes()).to_vec())
}
