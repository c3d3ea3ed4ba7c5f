//! Topic pipeline: classify → research → summarize → draft → polish.

use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use topicpress_inference::ModelInvoker;
use topicpress_search::SearchAggregator;
use topicpress_shared::{GenerationResult, Intent, PipelineOptions, Result, SearchResult};

use crate::boundary;
use crate::intent::{self, canned_reply};
use crate::prompts::{self, NO_RESULTS_SUMMARY};

/// Pipeline stages, in the order the article path visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Classify,
    Greeting,
    Research,
    Summarize,
    Draft,
    Polish,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Classify => "Classifying topic",
            Self::Greeting => "Replying to greeting",
            Self::Research => "Searching the web",
            Self::Summarize => "Summarizing research",
            Self::Draft => "Drafting article",
            Self::Polish => "Polishing article",
        }
    }
}

/// Progress callback for reporting pipeline status.
pub trait PipelineProgress: Send + Sync {
    /// Called when entering a new stage.
    fn stage(&self, stage: Stage);
    /// Called once research finishes.
    fn researched(&self, results: usize);
    /// Called with the final result.
    fn done(&self, result: &GenerationResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl PipelineProgress for SilentProgress {
    fn stage(&self, _stage: Stage) {}
    fn researched(&self, _results: usize) {}
    fn done(&self, _result: &GenerationResult) {}
}

/// Whitespace-separated word count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Owns the search and model collaborators. Holds no per-request state, so
/// one instance can serve concurrent requests.
pub struct TopicPipeline {
    aggregator: SearchAggregator,
    invoker: ModelInvoker,
    options: PipelineOptions,
}

impl TopicPipeline {
    pub fn new(
        aggregator: SearchAggregator,
        invoker: ModelInvoker,
        options: PipelineOptions,
    ) -> Self {
        Self {
            aggregator,
            invoker,
            options,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Run the pipeline behind the error boundary. Never fails and never
    /// returns an empty `blog_content`.
    pub async fn process_topic(
        &self,
        topic: &str,
        progress: &dyn PipelineProgress,
    ) -> GenerationResult {
        let result = boundary::contain(self.run(topic, progress)).await;
        progress.done(&result);
        result
    }

    /// Run the state machine. Model exhaustion becomes error text here;
    /// panics are left to the boundary.
    #[instrument(skip_all, fields(topic = %topic))]
    pub async fn run(&self, topic: &str, progress: &dyn PipelineProgress) -> GenerationResult {
        let start = Instant::now();

        progress.stage(Stage::Classify);
        let intent = intent::classify(topic);
        info!(%intent, "classified topic");

        if let Some(reply) = canned_reply(intent) {
            return GenerationResult::reply(intent, reply);
        }

        if intent == Intent::Greeting {
            progress.stage(Stage::Greeting);
            let body = match self.invoker.generate(&prompts::greeting(topic)).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "greeting generation failed");
                    format!("Error generating greeting: {e}")
                }
            };
            return GenerationResult::reply(intent, body);
        }

        let result = self.article(topic, progress).await;
        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            results = result.search_results_count,
            words = word_count(&result.blog_content),
            "article pipeline finished"
        );
        result
    }

    async fn article(&self, topic: &str, progress: &dyn PipelineProgress) -> GenerationResult {
        let intent = Some(Intent::ArticleTopic);

        // --- Research ---
        progress.stage(Stage::Research);
        let results = self
            .aggregator
            .multi_search(topic, self.aggregator.num_searches())
            .await;
        let search_results_count = results.len();
        progress.researched(search_results_count);

        // --- Summarize ---
        progress.stage(Stage::Summarize);
        let research_summary = match self.summarize(&results).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(error = %e, "summarization failed");
                return GenerationResult {
                    blog_content: format!("Error summarizing search results: {e}"),
                    research_summary: None,
                    search_results_count,
                    intent,
                };
            }
        };

        // --- Draft ---
        progress.stage(Stage::Draft);
        let draft = match self
            .invoker
            .generate(&prompts::draft(topic, &research_summary))
            .await
        {
            Ok(draft) => draft,
            Err(e) => {
                warn!(error = %e, "draft generation failed");
                return GenerationResult {
                    blog_content: format!("Error generating blog: {e}"),
                    research_summary: Some(research_summary),
                    search_results_count,
                    intent,
                };
            }
        };

        // --- Polish ---
        let blog_content = self.polish(topic, draft, progress).await;

        GenerationResult {
            blog_content,
            research_summary: Some(research_summary),
            search_results_count,
            intent,
        }
    }

    async fn summarize(&self, results: &[SearchResult]) -> Result<String> {
        if results.is_empty() {
            debug!("no search results, skipping summarization call");
            return Ok(NO_RESULTS_SUMMARY.to_string());
        }
        self.invoker.generate(&prompts::summarize(results)).await
    }

    /// Returns the polished article, or the draft unchanged when polishing
    /// is disabled, the draft is short, or the call fails.
    async fn polish(&self, topic: &str, draft: String, progress: &dyn PipelineProgress) -> String {
        if !self.options.polish {
            debug!("polishing disabled");
            return draft;
        }
        let words = word_count(&draft);
        if words < self.options.polish_min_words {
            debug!(words, min = self.options.polish_min_words, "draft too short to polish");
            return draft;
        }

        progress.stage(Stage::Polish);
        match self.invoker.generate(&prompts::polish(topic, &draft)).await {
            Ok(polished) => polished,
            Err(e) => {
                warn!(error = %e, "polish failed, keeping draft");
                draft
            }
        }
    }
}
