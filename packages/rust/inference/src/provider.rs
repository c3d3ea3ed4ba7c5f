use async_trait::async_trait;

use topicpress_shared::Result;

/// A text-generation backend addressed by opaque model identifiers.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Human-readable provider name for tracing.
    fn name(&self) -> &str;

    /// Generate text for `prompt` with the given model. Errors are
    /// provider-specific; an empty reply must be reported as an error.
    async fn generate(&self, model_id: &str, prompt: &str) -> Result<String>;
}
