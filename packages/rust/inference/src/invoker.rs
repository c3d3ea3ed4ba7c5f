//! Model fallback chain.
//!
//! A single generation request walks an ordered list of model identifiers
//! until one of them returns text. There is no retry on the same model.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use topicpress_shared::{GeminiConfig, Result, TopicPressError};

use crate::provider::GenerationProvider;

/// Ordered model identifiers: the primary first, then fallbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelChain {
    pub primary: String,
    pub fallbacks: Vec<String>,
}

impl ModelChain {
    pub fn new(primary: impl Into<String>, fallbacks: Vec<String>) -> Self {
        Self {
            primary: primary.into(),
            fallbacks,
        }
    }

    /// Models in attempt order. A fallback repeating an earlier entry is
    /// skipped.
    pub fn attempt_order(&self) -> Vec<&str> {
        let mut order: Vec<&str> = vec![self.primary.as_str()];
        for model in &self.fallbacks {
            if !order.contains(&model.as_str()) {
                order.push(model.as_str());
            }
        }
        order
    }
}

impl From<&GeminiConfig> for ModelChain {
    fn from(config: &GeminiConfig) -> Self {
        Self::new(config.primary_model.clone(), config.fallback_models.clone())
    }
}

/// Runs prompts against a [`GenerationProvider`] with model fallback.
pub struct ModelInvoker {
    provider: Arc<dyn GenerationProvider>,
    chain: ModelChain,
    timeout: Duration,
}

impl ModelInvoker {
    pub fn new(
        provider: Arc<dyn GenerationProvider>,
        chain: ModelChain,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            chain,
            timeout,
        }
    }

    pub fn chain(&self) -> &ModelChain {
        &self.chain
    }

    /// Generate with the configured chain.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with(prompt, &self.chain).await
    }

    /// Generate with an explicit chain. Returns the first successful
    /// model's text, or [`TopicPressError::GenerationExhausted`] carrying the
    /// primary model's failure.
    #[instrument(skip_all, fields(primary = %chain.primary))]
    pub async fn generate_with(&self, prompt: &str, chain: &ModelChain) -> Result<String> {
        let order = chain.attempt_order();
        let mut primary_error: Option<TopicPressError> = None;

        for (attempt, model) in order.iter().enumerate() {
            match self.attempt(model, prompt).await {
                Ok(text) => {
                    info!(model, attempt = attempt + 1, "generation succeeded");
                    return Ok(text);
                }
                Err(e) => {
                    warn!(
                        model,
                        attempt = attempt + 1,
                        error = %e,
                        "generation attempt failed"
                    );
                    if primary_error.is_none() {
                        primary_error = Some(e);
                    }
                }
            }
        }

        let source = primary_error
            .unwrap_or_else(|| TopicPressError::model(chain.primary.clone(), "no attempt made"));
        Err(TopicPressError::GenerationExhausted {
            primary_model: chain.primary.clone(),
            attempts: order.len(),
            source: Box::new(source),
        })
    }

    async fn attempt(&self, model: &str, prompt: &str) -> Result<String> {
        let text = tokio::time::timeout(self.timeout, self.provider.generate(model, prompt))
            .await
            .map_err(|_| {
                TopicPressError::model(
                    model,
                    format!("timed out after {}s", self.timeout.as_secs_f32()),
                )
            })??;

        if text.trim().is_empty() {
            return Err(TopicPressError::model(model, "empty response"));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    enum Reply {
        Text(&'static str),
        Fail(&'static str),
        Hang,
    }

    /// Provider answering per model id and recording the call order.
    struct ScriptedModels {
        replies: HashMap<&'static str, Reply>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedModels {
        fn new(replies: Vec<(&'static str, Reply)>) -> Self {
            Self {
                replies: replies.into_iter().collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GenerationProvider for ScriptedModels {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, model_id: &str, _prompt: &str) -> Result<String> {
            self.calls.lock().unwrap().push(model_id.to_string());
            match self.replies.get(model_id) {
                Some(Reply::Text(t)) => Ok((*t).to_string()),
                Some(Reply::Fail(msg)) => Err(TopicPressError::model(model_id, *msg)),
                Some(Reply::Hang) => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok("too late".into())
                }
                None => Err(TopicPressError::model(model_id, "unknown model")),
            }
        }
    }

    fn chain() -> ModelChain {
        ModelChain::new("primary", vec!["second".into(), "third".into()])
    }

    fn invoker(provider: Arc<ScriptedModels>) -> ModelInvoker {
        ModelInvoker::new(provider, chain(), Duration::from_millis(200))
    }

    #[tokio::test]
    async fn primary_success_makes_one_call() {
        let provider = Arc::new(ScriptedModels::new(vec![("primary", Reply::Text("ok"))]));
        let text = invoker(provider.clone()).generate("p").await.unwrap();
        assert_eq!(text, "ok");
        assert_eq!(provider.calls(), vec!["primary"]);
    }

    #[tokio::test]
    async fn fallback_short_circuits_on_first_success() {
        let provider = Arc::new(ScriptedModels::new(vec![
            ("primary", Reply::Fail("quota")),
            ("second", Reply::Text("from second")),
            ("third", Reply::Text("from third")),
        ]));
        let text = invoker(provider.clone()).generate("p").await.unwrap();
        assert_eq!(text, "from second");
        assert_eq!(provider.calls(), vec!["primary", "second"]);
    }

    #[tokio::test]
    async fn exhaustion_reports_primary_failure() {
        let provider = Arc::new(ScriptedModels::new(vec![
            ("primary", Reply::Fail("primary broke")),
            ("second", Reply::Fail("second broke")),
            ("third", Reply::Fail("third broke")),
        ]));
        let err = invoker(provider.clone()).generate("p").await.unwrap_err();

        assert_eq!(provider.calls(), vec!["primary", "second", "third"]);
        match err {
            TopicPressError::GenerationExhausted {
                primary_model,
                attempts,
                source,
            } => {
                assert_eq!(primary_model, "primary");
                assert_eq!(attempts, 3);
                assert!(source.to_string().contains("primary broke"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn timeout_counts_as_failure() {
        let provider = Arc::new(ScriptedModels::new(vec![
            ("primary", Reply::Hang),
            ("second", Reply::Text("fast")),
        ]));
        let text = invoker(provider.clone()).generate("p").await.unwrap();
        assert_eq!(text, "fast");
        assert_eq!(provider.calls(), vec!["primary", "second"]);
    }

    #[tokio::test]
    async fn empty_text_moves_to_next_model() {
        let provider = Arc::new(ScriptedModels::new(vec![
            ("primary", Reply::Text("   ")),
            ("second", Reply::Text("real text")),
        ]));
        let text = invoker(provider).generate("p").await.unwrap();
        assert_eq!(text, "real text");
    }

    #[tokio::test]
    async fn explicit_chain_overrides_configured_one() {
        let provider = Arc::new(ScriptedModels::new(vec![("other", Reply::Text("hi"))]));
        let inv = invoker(provider.clone());
        let text = inv
            .generate_with("p", &ModelChain::new("other", Vec::new()))
            .await
            .unwrap();
        assert_eq!(text, "hi");
        assert_eq!(provider.calls(), vec!["other"]);
    }

    #[test]
    fn attempt_order_skips_repeats() {
        let chain = ModelChain::new("a", vec!["b".into(), "a".into(), "b".into(), "c".into()]);
        assert_eq!(chain.attempt_order(), vec!["a", "b", "c"]);
    }

    #[test]
    fn chain_from_config_uses_defaults() {
        let chain = ModelChain::from(&GeminiConfig::default());
        assert_eq!(chain.primary, "gemini-flash-latest");
        assert_eq!(chain.fallbacks.len(), 5);
    }
}
