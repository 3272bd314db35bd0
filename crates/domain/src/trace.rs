use serde::Serialize;

/// Structured trace events emitted across all Homework Helper crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    UsageReset {
        user_id: String,
        previous_usage: u64,
        period: String,
    },
    UsageRecorded {
        user_id: String,
        usage: u64,
    },
    UsageRecordFailed {
        user_id: String,
        error: String,
    },
    QuotaRefused {
        user_id: String,
        usage: u64,
        limit: u64,
    },
    AiCall {
        endpoint: String,
        status: u16,
        duration_ms: u64,
    },
    SubscriptionChanged {
        user_id: String,
        active: bool,
        plan: Option<String>,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "hh_event");
    }
}
