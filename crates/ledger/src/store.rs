//! User account persistence.
//!
//! [`UserStore`] is the seam between the ledger and storage.  Every mutating
//! method is a single atomic operation at the store level: the increment
//! never loses updates under concurrent requests, and the monthly reset is a
//! compare-and-set on the observed `usage_reset_at`.
//!
//! [`JsonUserStore`] keeps accounts in memory and rewrites
//! `users/users.json` under the state path after each mutation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use hh_domain::error::{Error, Result};
use hh_domain::user::{Plan, ProfileUpdate, Subscription, UserId, UserRecord};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Result of a conditional reset.
#[derive(Debug, Clone, PartialEq)]
pub enum ResetOutcome {
    /// This call performed the reset.
    Reset(UserRecord),
    /// The stored reset timestamp no longer matched; someone else already
    /// reset.  Carries the current record.
    AlreadyCurrent(UserRecord),
    Missing,
}

pub trait UserStore: Send + Sync {
    fn get(&self, id: &UserId) -> Result<Option<UserRecord>>;

    /// Add a new account.  Fails on a duplicate id or email.
    fn insert(&self, record: UserRecord) -> Result<()>;

    /// Atomically add one to `usage`; returns the new count.
    fn increment_usage(&self, id: &UserId) -> Result<u64>;

    /// Set `usage = 0` and `usage_reset_at = now`, but only if the stored
    /// `usage_reset_at` still equals `expected`.
    fn reset_usage_if(
        &self,
        id: &UserId,
        expected: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<ResetOutcome>;

    fn set_subscription(&self, id: &UserId, subscription: Subscription)
        -> Result<Option<UserRecord>>;

    /// Remember a pending payment so the provider callback can find the user.
    fn set_pending_checkout(
        &self,
        id: &UserId,
        plan: Plan,
        checkout_id: &str,
        phone: Option<&str>,
    ) -> Result<Option<UserRecord>>;

    /// Activate the subscription of whoever holds `checkout_id`.
    fn activate_by_checkout(
        &self,
        checkout_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<UserRecord>>;

    /// Change name and phone.  Usage and billing are untouched.
    fn update_profile(&self, id: &UserId, update: ProfileUpdate) -> Result<Option<UserRecord>>;

    fn count(&self) -> usize;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// JSON file store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// JSON-file-backed user store.
pub struct JsonUserStore {
    /// `None` keeps everything in memory (tests, dry runs).
    users_path: Option<PathBuf>,
    users: RwLock<HashMap<UserId, UserRecord>>,
}

impl JsonUserStore {
    /// Load or create the store at `state_path/users/users.json`.
    pub fn new(state_path: &Path) -> Result<Self> {
        let dir = state_path.join("users");
        std::fs::create_dir_all(&dir)?;

        let users_path = dir.join("users.json");
        let users = if users_path.exists() {
            let raw = std::fs::read_to_string(&users_path)?;
            let list: Vec<UserRecord> = serde_json::from_str(&raw)?;
            list.into_iter().map(|u| (u.id, u)).collect()
        } else {
            HashMap::new()
        };

        tracing::info!(
            users = users.len(),
            path = %users_path.display(),
            "user store loaded"
        );

        Ok(Self {
            users_path: Some(users_path),
            users: RwLock::new(users),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            users_path: None,
            users: RwLock::new(HashMap::new()),
        }
    }

    fn persist(&self, users: &HashMap<UserId, UserRecord>) -> Result<()> {
        let Some(path) = &self.users_path else {
            return Ok(());
        };
        let mut list: Vec<&UserRecord> = users.values().collect();
        list.sort_by_key(|u| u.created_at);
        let json = serde_json::to_string_pretty(&list)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Apply `f` to one record under the write lock and persist.  When the
    /// write to disk fails the in-memory record is rolled back so memory and
    /// disk never disagree.
    fn update<T>(
        &self,
        id: &UserId,
        f: impl FnOnce(&mut UserRecord) -> T,
    ) -> Result<Option<(T, UserRecord)>> {
        let mut users = self.users.write();
        let Some(entry) = users.get_mut(id) else {
            return Ok(None);
        };
        let before = entry.clone();
        let out = f(entry);
        let after = entry.clone();

        if let Err(e) = self.persist(&users) {
            users.insert(*id, before);
            return Err(e);
        }
        Ok(Some((out, after)))
    }
}

impl UserStore for JsonUserStore {
    fn get(&self, id: &UserId) -> Result<Option<UserRecord>> {
        Ok(self.users.read().get(id).cloned())
    }

    fn insert(&self, record: UserRecord) -> Result<()> {
        let mut users = self.users.write();
        if users.contains_key(&record.id) {
            return Err(Error::Conflict(format!("user {} already exists", record.id)));
        }
        if users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&record.email))
        {
            return Err(Error::Conflict(format!("email {} already in use", record.email)));
        }

        let id = record.id;
        users.insert(id, record);
        if let Err(e) = self.persist(&users) {
            users.remove(&id);
            return Err(e);
        }
        Ok(())
    }

    fn increment_usage(&self, id: &UserId) -> Result<u64> {
        self.update(id, |u| {
            u.usage += 1;
            u.usage
        })?
        .map(|(usage, _)| usage)
        .ok_or_else(|| Error::UserNotFound(id.to_string()))
    }

    fn reset_usage_if(
        &self,
        id: &UserId,
        expected: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<ResetOutcome> {
        // Check under the read lock first so a lost race costs no disk write.
        match self.users.read().get(id) {
            None => return Ok(ResetOutcome::Missing),
            Some(u) if u.usage_reset_at != expected => {
                return Ok(ResetOutcome::AlreadyCurrent(u.clone()))
            }
            Some(_) => {}
        }

        let updated = self.update(id, |u| {
            if u.usage_reset_at != expected {
                return false;
            }
            u.usage = 0;
            u.usage_reset_at = Some(now);
            true
        })?;

        Ok(match updated {
            None => ResetOutcome::Missing,
            Some((true, rec)) => ResetOutcome::Reset(rec),
            Some((false, rec)) => ResetOutcome::AlreadyCurrent(rec),
        })
    }

    fn set_subscription(
        &self,
        id: &UserId,
        subscription: Subscription,
    ) -> Result<Option<UserRecord>> {
        Ok(self
            .update(id, |u| u.subscription = subscription)?
            .map(|(_, rec)| rec))
    }

    fn set_pending_checkout(
        &self,
        id: &UserId,
        plan: Plan,
        checkout_id: &str,
        phone: Option<&str>,
    ) -> Result<Option<UserRecord>> {
        Ok(self
            .update(id, |u| {
                u.subscription.active = false;
                u.subscription.plan = Some(plan);
                u.subscription.checkout_id = Some(checkout_id.to_owned());
                u.subscription.phone = phone.map(str::to_owned);
            })?
            .map(|(_, rec)| rec))
    }

    fn activate_by_checkout(
        &self,
        checkout_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<UserRecord>> {
        let id = self
            .users
            .read()
            .values()
            .find(|u| u.subscription.checkout_id.as_deref() == Some(checkout_id))
            .map(|u| u.id);
        let Some(id) = id else {
            return Ok(None);
        };

        Ok(self
            .update(&id, |u| {
                u.subscription.active = true;
                u.subscription.activated_at = Some(now);
            })?
            .map(|(_, rec)| rec))
    }

    fn update_profile(&self, id: &UserId, update: ProfileUpdate) -> Result<Option<UserRecord>> {
        Ok(self
            .update(id, |u| u.apply_profile(update))?
            .map(|(_, rec)| rec))
    }

    fn count(&self) -> usize {
        self.users.read().len()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn march() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn insert_and_get() {
        let store = JsonUserStore::in_memory();
        let rec = UserRecord::new("Ada", "ada@example.com", march());
        let id = rec.id;
        store.insert(rec).unwrap();
        assert_eq!(store.get(&id).unwrap().unwrap().email, "ada@example.com");
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let store = JsonUserStore::in_memory();
        store
            .insert(UserRecord::new("Ada", "ada@example.com", march()))
            .unwrap();
        let err = store
            .insert(UserRecord::new("Other", "ADA@example.com", march()))
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn increment_unknown_user_fails() {
        let store = JsonUserStore::in_memory();
        let err = store.increment_usage(&UserId::new()).unwrap_err();
        assert!(matches!(err, Error::UserNotFound(_)));
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let store = Arc::new(JsonUserStore::in_memory());
        let rec = UserRecord::new("Ada", "ada@example.com", march());
        let id = rec.id;
        store.insert(rec).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        store.increment_usage(&id).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(store.get(&id).unwrap().unwrap().usage, 200);
    }

    #[test]
    fn conditional_reset_applies_once() {
        let store = JsonUserStore::in_memory();
        let mut rec = UserRecord::new("Ada", "ada@example.com", march());
        rec.usage = 7;
        let id = rec.id;
        store.insert(rec).unwrap();

        let april = Utc.with_ymd_and_hms(2024, 4, 2, 8, 0, 0).unwrap();
        let first = store.reset_usage_if(&id, Some(march()), april).unwrap();
        let ResetOutcome::Reset(after) = first else {
            panic!("expected reset, got {first:?}");
        };
        assert_eq!(after.usage, 0);
        assert_eq!(after.usage_reset_at, Some(april));

        // A racer that observed the March timestamp loses.
        let later = april + chrono::Duration::seconds(1);
        let second = store.reset_usage_if(&id, Some(march()), later).unwrap();
        assert_eq!(second, ResetOutcome::AlreadyCurrent(after));
    }

    #[test]
    fn reset_unknown_user_is_missing() {
        let store = JsonUserStore::in_memory();
        let out = store
            .reset_usage_if(&UserId::new(), Some(march()), march())
            .unwrap();
        assert_eq!(out, ResetOutcome::Missing);
    }

    #[test]
    fn checkout_activation() {
        let store = JsonUserStore::in_memory();
        let rec = UserRecord::new("Ada", "ada@example.com", march());
        let id = rec.id;
        store.insert(rec).unwrap();

        store
            .set_pending_checkout(&id, Plan::Monthly, "ws_CO_123", Some("254700000001"))
            .unwrap()
            .unwrap();
        assert!(store.activate_by_checkout("ws_CO_999", march()).unwrap().is_none());

        let activated = store.activate_by_checkout("ws_CO_123", march()).unwrap().unwrap();
        assert!(activated.subscription.active);
        assert_eq!(activated.subscription.plan, Some(Plan::Monthly));
        assert_eq!(activated.subscription.activated_at, Some(march()));
        assert_eq!(activated.subscription.phone.as_deref(), Some("254700000001"));
    }

    #[test]
    fn profile_update_keeps_usage_and_billing() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonUserStore::new(dir.path()).unwrap();
        let mut rec = UserRecord::new("Ada", "ada@example.com", march());
        rec.usage = 4;
        rec.subscription.active = true;
        let id = rec.id;
        store.insert(rec).unwrap();

        let updated = store
            .update_profile(
                &id,
                ProfileUpdate {
                    name: Some("Ada Lovelace".into()),
                    phone: Some("254700000002".into()),
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Ada Lovelace");
        assert_eq!(updated.usage, 4);
        assert!(updated.subscription.active);

        let reloaded = JsonUserStore::new(dir.path()).unwrap();
        let rec = reloaded.get(&id).unwrap().unwrap();
        assert_eq!(rec.phone.as_deref(), Some("254700000002"));
        assert!(store
            .update_profile(&UserId::new(), ProfileUpdate::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn state_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let rec = UserRecord::new("Ada", "ada@example.com", march());
        let id = rec.id;
        {
            let store = JsonUserStore::new(dir.path()).unwrap();
            store.insert(rec).unwrap();
            store.increment_usage(&id).unwrap();
            store.increment_usage(&id).unwrap();
        }

        let reloaded = JsonUserStore::new(dir.path()).unwrap();
        let rec = reloaded.get(&id).unwrap().unwrap();
        assert_eq!(rec.usage, 2);
        assert_eq!(rec.usage_reset_at, Some(march()));
        assert!(dir.path().join("users/users.json").exists());
    }

    #[test]
    fn failed_write_rolls_back_memory() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonUserStore::new(dir.path()).unwrap();
        let rec = UserRecord::new("Ada", "ada@example.com", march());
        let id = rec.id;
        store.insert(rec).unwrap();

        // Replace the users directory with a file so the next write fails.
        let users_dir = dir.path().join("users");
        std::fs::remove_dir_all(&users_dir).unwrap();
        std::fs::write(&users_dir, b"not a directory").unwrap();

        assert!(store.increment_usage(&id).is_err());
        assert_eq!(store.get(&id).unwrap().unwrap().usage, 0);
    }
}
