use serde::{Deserialize, Serialize};

/// Free chats per accounting period for unsubscribed users.
///
/// This is the one place the number lives; clients read it from
/// `GET /api/config` instead of hardcoding their own copy.
pub const FREE_USER_LIMIT: u64 = 10;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Usage accounting
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Monthly free-tier accounting.
///
/// `time_zone` is an IANA zone name.  Every month comparison the ledger
/// makes happens in this one zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageConfig {
    #[serde(default = "d_free_limit")]
    pub free_user_limit: u64,
    #[serde(default = "d_time_zone")]
    pub time_zone: String,
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            free_user_limit: FREE_USER_LIMIT,
            time_zone: d_time_zone(),
        }
    }
}

impl UsageConfig {
    /// Parse `time_zone` into a [`chrono_tz::Tz`].
    pub fn tz(&self) -> Result<chrono_tz::Tz, String> {
        self.time_zone
            .parse::<chrono_tz::Tz>()
            .map_err(|e| format!("unknown time zone {:?}: {e}", self.time_zone))
    }
}

fn d_free_limit() -> u64 {
    FREE_USER_LIMIT
}
fn d_time_zone() -> String {
    "UTC".into()
}
