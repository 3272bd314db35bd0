use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// AI backend connection
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Base URL of the AI answer service (the gateway calls `{base_url}/chat`).
    #[serde(default = "d_ai_url")]
    pub base_url: String,
    #[serde(default = "d_30000")]
    pub timeout_ms: u64,
    /// Retries on 5xx / timeout.  `0` disables retrying.
    #[serde(default)]
    pub max_retries: u32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: d_ai_url(),
            timeout_ms: 30_000,
            max_retries: 0,
        }
    }
}

fn d_ai_url() -> String {
    "http://localhost:5001".into()
}
fn d_30000() -> u64 {
    30_000
}
