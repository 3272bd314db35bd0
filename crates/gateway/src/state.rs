use std::sync::Arc;
use std::time::Instant;

use hh_ai::AiBackend;
use hh_domain::config::Config;
use hh_ledger::{Clock, UsageLedger, UserStore};

use crate::questions::QuestionLog;

/// Shared application state passed to all API handlers.
///
/// Fields are grouped by concern:
/// - **Core services**: config, usage ledger, user store, AI backend
/// - **Records**: question log
/// - **Security**: admin token hash
#[derive(Clone)]
pub struct AppState {
    // ── Core services ─────────────────────────────────────────────────
    pub config: Arc<Config>,
    pub ledger: Arc<UsageLedger>,
    /// Same store the ledger uses; billing and admin handlers write through it.
    pub users: Arc<dyn UserStore>,
    pub ai: Arc<dyn AiBackend>,
    pub clock: Arc<dyn Clock>,

    // ── Records ───────────────────────────────────────────────────────
    pub questions: Arc<QuestionLog>,

    // ── Security (startup-computed) ───────────────────────────────────
    /// SHA-256 hash of the admin bearer token (read once at startup).
    /// `None` = admin endpoints disabled.
    pub admin_token_hash: Option<Vec<u8>>,

    pub started_at: Instant,
}

impl AppState {
    /// Assemble state from already-built services.  The ledger is built
    /// here so it always shares `users` and `clock` with the handlers.
    pub fn new(
        config: Arc<Config>,
        users: Arc<dyn UserStore>,
        ai: Arc<dyn AiBackend>,
        clock: Arc<dyn Clock>,
        questions: Arc<QuestionLog>,
        admin_token_hash: Option<Vec<u8>>,
    ) -> anyhow::Result<Self> {
        let tz = config
            .usage
            .tz()
            .map_err(|e| anyhow::anyhow!("usage.time_zone: {e}"))?;
        let ledger = Arc::new(UsageLedger::new(
            users.clone(),
            clock.clone(),
            tz,
            config.usage.free_user_limit,
        ));

        Ok(Self {
            config,
            ledger,
            users,
            ai,
            clock,
            questions,
            admin_token_hash,
            started_at: Instant::now(),
        })
    }
}
