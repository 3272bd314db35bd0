//! User accounts and request callers.
//!
//! A [`UserRecord`] is the persisted account row the usage ledger reads and
//! mutates.  A [`Caller`] is what a request resolves to before the ledger is
//! consulted: either a well-formed user id or an unmetered guest.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifiers the clients send for callers without an account.
const GUEST_MARKERS: &[&str] = &["demo", "guest"];

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Identifiers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Opaque unique user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Who is making a request, as far as usage accounting is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    Guest,
    User(UserId),
}

impl Caller {
    /// Resolve a raw client-supplied id.
    ///
    /// Absent, blank, guest markers and malformed ids all resolve to
    /// [`Caller::Guest`]; this never fails.
    pub fn from_raw(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Caller::Guest;
        };
        if GUEST_MARKERS.contains(&raw) {
            return Caller::Guest;
        }
        match raw.parse::<UserId>() {
            Ok(id) => Caller::User(id),
            Err(_) => {
                tracing::debug!(raw_id = %raw, "malformed user id, treating as guest");
                Caller::Guest
            }
        }
    }
}

/// Label reported to clients alongside usage figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Guest,
    Registered,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Subscription
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Monthly,
    Yearly,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Monthly => "monthly",
            Plan::Yearly => "yearly",
        }
    }
}

/// Billing state.  Only the billing side ever changes it; the usage ledger
/// just reads `active`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub plan: Option<Plan>,
    #[serde(default)]
    pub activated_at: Option<DateTime<Utc>>,
    /// Pending payment reference used to match the provider callback.
    #[serde(default)]
    pub checkout_id: Option<String>,
    /// Number the payment prompt was sent to.
    #[serde(default)]
    pub phone: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// User record
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// Chat requests made in the current accounting period.
    #[serde(default)]
    pub usage: u64,
    /// Last reset instant.  Records without one are never reset.
    #[serde(default)]
    pub usage_reset_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub subscription: Subscription,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// A fresh account: zero usage, reset clock starting now.
    pub fn new(name: impl Into<String>, email: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            name: name.into(),
            email: email.into(),
            phone: None,
            usage: 0,
            usage_reset_at: Some(now),
            subscription: Subscription::default(),
            created_at: now,
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.active
    }

    /// Apply the fields present in `update`; absent ones are left alone.
    pub fn apply_profile(&mut self, update: ProfileUpdate) {
        if let Some(name) = update.name {
            self.name = name.trim().to_owned();
        }
        if let Some(phone) = update.phone {
            let phone = phone.trim();
            self.phone = (!phone.is_empty()).then(|| phone.to_owned());
        }
    }
}

/// Self-service profile edit.  Email and billing are not editable here.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
