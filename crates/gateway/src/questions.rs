//! Question log: every answered question, guest or registered.
//!
//! Entries are appended to `questions.jsonl` under the state path and the
//! most recent ones are kept in a bounded in-memory ring for history
//! lookups.  Logging is best effort: a failed append never affects the
//! answer already on its way to the client.

use std::collections::VecDeque;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use hh_domain::user::{UserId, UserType};

const MAX_RECENT: usize = 1000;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionEntry {
    pub id: Uuid,
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub user_type: UserType,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

impl QuestionEntry {
    pub fn new(
        user_id: Option<UserId>,
        question: String,
        answer: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_type: if user_id.is_some() {
                UserType::Registered
            } else {
                UserType::Guest
            },
            user_id,
            question,
            image_url: None,
            answer,
            created_at,
        }
    }

    pub fn with_image_url(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url.filter(|u| !u.is_empty());
        self
    }
}

pub struct QuestionLog {
    recent: RwLock<VecDeque<QuestionEntry>>,
    persist_path: Option<PathBuf>,
    total: AtomicUsize,
}

impl QuestionLog {
    /// Open `state_path/questions.jsonl`, loading the tail into memory.
    pub fn new(state_path: &Path) -> Self {
        let persist_path = state_path.join("questions.jsonl");
        let mut recent = VecDeque::new();
        let mut total = 0;

        if let Ok(data) = std::fs::read_to_string(&persist_path) {
            for line in data.lines() {
                match serde_json::from_str::<QuestionEntry>(line) {
                    Ok(entry) => {
                        total += 1;
                        recent.push_back(entry);
                        if recent.len() > MAX_RECENT {
                            recent.pop_front();
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "skipping unreadable question log line"),
                }
            }
            tracing::info!(total, path = %persist_path.display(), "question log loaded");
        }

        Self {
            recent: RwLock::new(recent),
            persist_path: Some(persist_path),
            total: AtomicUsize::new(total),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            recent: RwLock::new(VecDeque::new()),
            persist_path: None,
            total: AtomicUsize::new(0),
        }
    }

    pub async fn append(&self, entry: QuestionEntry) {
        if let Some(path) = &self.persist_path {
            if let Err(e) = persist_one(path, &entry) {
                tracing::warn!(error = %e, question_id = %entry.id, "failed to persist question");
            }
        }

        let mut recent = self.recent.write().await;
        recent.push_back(entry);
        while recent.len() > MAX_RECENT {
            recent.pop_front();
        }
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    /// Most recent first.
    pub async fn recent_for(&self, user_id: &UserId, limit: usize) -> Vec<QuestionEntry> {
        self.recent
            .read()
            .await
            .iter()
            .rev()
            .filter(|e| e.user_id.as_ref() == Some(user_id))
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }
}

fn persist_one(path: &Path, entry: &QuestionEntry) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string(entry)?;
    let mut f = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(f, "{json}")
}
