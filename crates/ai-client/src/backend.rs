use async_trait::async_trait;
use hh_domain::error::Result;

/// Something that can answer a homework question.
///
/// Implementations may call the real AI service or be a test double.
#[async_trait]
pub trait AiBackend: Send + Sync {
    async fn ask(&self, question: &str) -> Result<String>;

    /// Short label for logs.
    fn name(&self) -> &str {
        "ai"
    }
}
