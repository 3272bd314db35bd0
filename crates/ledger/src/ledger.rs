//! Free-tier gating and monthly usage accounting.
//!
//! The chat path calls [`UsageLedger::admit`] before asking the AI backend
//! and [`UsageLedger::record_consumption`] only after an answer came back.
//! The usage query path calls [`UsageLedger::get_status`].  Neither path ever
//! sees a store error: reads degrade to guest behaviour and failed increments
//! are logged and dropped.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use hh_domain::error::{Error, Result};
use hh_domain::trace::TraceEvent;
use hh_domain::user::{Caller, UserId, UserRecord, UserType};

use crate::clock::Clock;
use crate::period::AccountingPeriod;
use crate::store::{ResetOutcome, UserStore};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Refusal returned when an unsubscribed user has used up the free tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("free usage limit reached ({usage}/{limit})")]
pub struct QuotaExceeded {
    pub usage: u64,
    pub limit: u64,
}

/// A caller that passed the free-tier gate.
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    /// Unmetered; nothing is recorded afterwards.
    Guest,
    /// The record as it stood after the month check.
    Registered(UserRecord),
}

impl Admission {
    pub fn user_type(&self) -> UserType {
        match self {
            Admission::Guest => UserType::Guest,
            Admission::Registered(_) => UserType::Registered,
        }
    }
}

/// What the usage endpoint reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStatus {
    pub usage: u64,
    pub is_subscribed: bool,
    pub limit: u64,
    pub user_type: UserType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_reset_at: Option<DateTime<Utc>>,
}

impl UsageStatus {
    fn guest(limit: u64) -> Self {
        Self {
            usage: 0,
            is_subscribed: false,
            limit,
            user_type: UserType::Guest,
            usage_reset_at: None,
        }
    }
}

/// Subscribers are never blocked; everyone else gets `free_limit` uses.
pub fn may_consume(record: &UserRecord, free_limit: u64) -> bool {
    record.subscription.active || record.usage < free_limit
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// UsageLedger
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct UsageLedger {
    store: Arc<dyn UserStore>,
    clock: Arc<dyn Clock>,
    tz: Tz,
    free_limit: u64,
}

impl UsageLedger {
    pub fn new(store: Arc<dyn UserStore>, clock: Arc<dyn Clock>, tz: Tz, free_limit: u64) -> Self {
        Self {
            store,
            clock,
            tz,
            free_limit,
        }
    }

    pub fn free_limit(&self) -> u64 {
        self.free_limit
    }

    pub fn time_zone(&self) -> Tz {
        self.tz
    }

    /// Zero the counter if `record` was last reset in an earlier calendar
    /// month.  Idempotent within a month.  Records with no reset timestamp
    /// are returned untouched.
    pub fn check_and_reset(&self, record: UserRecord) -> Result<UserRecord> {
        let Some(reset_at) = record.usage_reset_at else {
            return Ok(record);
        };

        let now = self.clock.now();
        let current = AccountingPeriod::containing(now, self.tz);
        if AccountingPeriod::containing(reset_at, self.tz) == current {
            return Ok(record);
        }

        match self.store.reset_usage_if(&record.id, Some(reset_at), now)? {
            ResetOutcome::Reset(updated) => {
                tracing::info!(
                    user_id = %record.id,
                    previous_usage = record.usage,
                    period = %current,
                    "monthly usage reset"
                );
                TraceEvent::UsageReset {
                    user_id: record.id.to_string(),
                    previous_usage: record.usage,
                    period: current.to_string(),
                }
                .emit();
                Ok(updated)
            }
            ResetOutcome::AlreadyCurrent(updated) => Ok(updated),
            ResetOutcome::Missing => Err(Error::UserNotFound(record.id.to_string())),
        }
    }

    /// Look up a caller's record with the month check applied.
    /// `Ok(None)` for guests and unknown ids.
    pub fn resolve(&self, caller: Caller) -> Result<Option<UserRecord>> {
        let Caller::User(id) = caller else {
            return Ok(None);
        };
        let Some(record) = self.store.get(&id)? else {
            tracing::debug!(user_id = %id, "unknown user id, treating as guest");
            return Ok(None);
        };
        match self.check_and_reset(record) {
            Ok(record) => Ok(Some(record)),
            Err(Error::UserNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Decide whether `caller` may ask another question.
    ///
    /// Store failures while resolving the caller are logged and the request
    /// continues unmetered as a guest.
    pub fn admit(&self, caller: Caller) -> std::result::Result<Admission, QuotaExceeded> {
        let record = match self.resolve(caller) {
            Ok(Some(record)) => record,
            Ok(None) => return Ok(Admission::Guest),
            Err(e) => {
                tracing::warn!(error = %e, "user lookup failed, continuing as guest");
                return Ok(Admission::Guest);
            }
        };

        if may_consume(&record, self.free_limit) {
            return Ok(Admission::Registered(record));
        }

        TraceEvent::QuotaRefused {
            user_id: record.id.to_string(),
            usage: record.usage,
            limit: self.free_limit,
        }
        .emit();
        Err(QuotaExceeded {
            usage: record.usage,
            limit: self.free_limit,
        })
    }

    /// Count one answered question against `id`.
    ///
    /// Best effort: a store failure is logged and swallowed so the answer
    /// still reaches the user.  Returns the new count when it is known.
    pub fn record_consumption(&self, id: &UserId) -> Option<u64> {
        match self.store.increment_usage(id) {
            Ok(usage) => {
                TraceEvent::UsageRecorded {
                    user_id: id.to_string(),
                    usage,
                }
                .emit();
                Some(usage)
            }
            Err(e) => {
                tracing::warn!(user_id = %id, error = %e, "failed to record usage, continuing");
                TraceEvent::UsageRecordFailed {
                    user_id: id.to_string(),
                    error: e.to_string(),
                }
                .emit();
                None
            }
        }
    }

    /// Current usage and subscription flag for `caller`.  Never fails:
    /// guests, unknown ids and store errors all report zero usage.
    pub fn get_status(&self, caller: Caller) -> UsageStatus {
        match self.resolve(caller) {
            Ok(Some(record)) => UsageStatus {
                usage: record.usage,
                is_subscribed: record.is_subscribed(),
                limit: self.free_limit,
                user_type: UserType::Registered,
                usage_reset_at: record.usage_reset_at,
            },
            Ok(None) => UsageStatus::guest(self.free_limit),
            Err(e) => {
                tracing::warn!(error = %e, "usage lookup failed, reporting guest defaults");
                UsageStatus::guest(self.free_limit)
            }
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
