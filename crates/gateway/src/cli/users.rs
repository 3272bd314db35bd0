//! Offline account commands.  These open the same JSON store the server
//! uses, so run them while the server is stopped.

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;

use hh_domain::config::Config;
use hh_domain::user::{Caller, UserId, UserRecord};
use hh_ledger::{JsonUserStore, SystemClock, UsageLedger, UserStore};

fn open_store(config: &Config) -> anyhow::Result<Arc<JsonUserStore>> {
    let path = &config.store.state_path;
    Ok(Arc::new(JsonUserStore::new(path).with_context(|| {
        format!("opening user store under {}", path.display())
    })?))
}

/// Create an account and return its id.
pub fn add(config: &Config, name: &str, email: &str) -> anyhow::Result<UserId> {
    let email = email.trim();
    if !email.contains('@') {
        anyhow::bail!("{email:?} is not an email address");
    }
    let store = open_store(config)?;
    let record = UserRecord::new(name.trim(), email, Utc::now());
    let id = record.id;
    store.insert(record).context("creating user")?;
    Ok(id)
}

pub fn show(config: &Config, raw_id: &str) -> anyhow::Result<()> {
    println!("{}", describe(config, raw_id)?);
    Ok(())
}

/// Pretty JSON of the record followed by a one-line usage summary.
pub fn describe(config: &Config, raw_id: &str) -> anyhow::Result<String> {
    let id: UserId = raw_id
        .trim()
        .parse()
        .with_context(|| format!("{raw_id:?} is not a user id"))?;

    let store = open_store(config)?;
    let tz = config
        .usage
        .tz()
        .map_err(|e| anyhow::anyhow!("usage.time_zone: {e}"))?;
    // Resolving through the ledger applies any pending monthly reset.
    let ledger = UsageLedger::new(
        store.clone(),
        Arc::new(SystemClock),
        tz,
        config.usage.free_user_limit,
    );
    let Some(record) = ledger.resolve(Caller::User(id))? else {
        anyhow::bail!("user {id} not found");
    };

    Ok(format!(
        "{}\n\nusage this month: {}/{}{}",
        serde_json::to_string_pretty(&record)?,
        record.usage,
        ledger.free_limit(),
        if record.is_subscribed() { " (subscribed, unmetered)" } else { "" }
    ))
}
