//! REST implementation of [`AiBackend`].
//!
//! `RestAiClient` wraps a `reqwest::Client` and posts `{question}` to the AI
//! service's `/chat` route, with optional retry + exponential back-off on
//! transient (5xx / timeout) failures.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hh_domain::config::AiConfig;
use hh_domain::error::{Error, Result};
use hh_domain::trace::TraceEvent;

use crate::backend::AiBackend;

const BASE_BACKOFF_MS: u64 = 200;
const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Delay before retry number `attempt` (1-based): 200ms doubling, capped.
fn backoff(attempt: u32) -> Duration {
    let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
    Duration::from_millis(BASE_BACKOFF_MS.saturating_mul(factor)).min(MAX_BACKOFF)
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    question: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    answer: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Created once at startup; the inner `reqwest::Client` pools connections.
#[derive(Debug, Clone)]
pub struct RestAiClient {
    http: Client,
    base_url: String,
    timeout: Duration,
    max_retries: u32,
}

impl RestAiClient {
    pub fn new(cfg: &AiConfig) -> Result<Self> {
        let timeout = Duration::from_millis(cfg.timeout_ms);
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_owned(),
            timeout,
            max_retries: cfg.max_retries,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ── retry engine ─────────────────────────────────────────────────

    /// Send with retry on 5xx and transport errors.  4xx is permanent.
    /// Emits a `TraceEvent::AiCall` after every attempt.
    async fn execute_with_retry(
        &self,
        endpoint: &str,
        build_request: impl Fn() -> RequestBuilder,
    ) -> Result<Response> {
        let mut last_err: Option<Error> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = backoff(attempt);
                tracing::debug!(attempt, ?delay, endpoint, "retrying AI call");
                tokio::time::sleep(delay).await;
            }

            let start = Instant::now();
            let rb = build_request().header("X-Trace-Id", Uuid::new_v4().to_string());
            let result = rb.send().await;
            let duration_ms = start.elapsed().as_millis() as u64;

            match result {
                Ok(resp) => {
                    let status = resp.status();
                    TraceEvent::AiCall {
                        endpoint: endpoint.to_owned(),
                        status: status.as_u16(),
                        duration_ms,
                    }
                    .emit();

                    if status.is_server_error() {
                        let body = resp.text().await.unwrap_or_default();
                        last_err = Some(Error::AiBackend(format!(
                            "{endpoint} returned {status}: {body}"
                        )));
                        continue;
                    }
                    if status.is_client_error() {
                        let body = resp.text().await.unwrap_or_default();
                        return Err(Error::AiBackend(format!(
                            "{endpoint} returned {status}: {body}"
                        )));
                    }
                    return Ok(resp);
                }
                Err(e) => {
                    TraceEvent::AiCall {
                        endpoint: endpoint.to_owned(),
                        status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                        duration_ms,
                    }
                    .emit();
                    last_err = Some(from_reqwest(e));
                }
            }
        }

        Err(last_err.unwrap_or_else(|| Error::AiBackend(format!("{endpoint}: all retries exhausted"))))
    }
}

#[async_trait]
impl AiBackend for RestAiClient {
    async fn ask(&self, question: &str) -> Result<String> {
        let url = self.url("/chat");
        let resp = self
            .execute_with_retry("POST /chat", || {
                self.http.post(&url).json(&ChatRequest { question })
            })
            .await?;

        let body = resp.text().await.map_err(from_reqwest)?;
        parse_answer(&body)
    }

    fn name(&self) -> &str {
        "rest"
    }
}

/// Pull `answer` out of the service's JSON reply.
fn parse_answer(body: &str) -> Result<String> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| Error::AiBackend(format!("failed to parse chat response: {e}: {body}")))?;
    parsed
        .answer
        .ok_or_else(|| Error::AiBackend("chat response has no answer".into()))
}

/// Convert a transport error, keeping timeouts distinguishable.
pub fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}
