//! Scripted providers shared by the pipeline, boundary, and service tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use topicpress_inference::{GenerationProvider, ModelChain, ModelInvoker};
use topicpress_search::{RawHit, SearchAggregator, SearchProvider};
use topicpress_shared::{PipelineOptions, Result, SearchOptions, TopicPressError};

use crate::pipeline::TopicPipeline;

/// Search provider returning `hits` unique results per query.
pub struct FakeSearch {
    hits: usize,
    queries: Mutex<Vec<String>>,
}

impl FakeSearch {
    pub fn with_hits(hits: usize) -> Arc<Self> {
        Arc::new(Self {
            hits,
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for FakeSearch {
    fn name(&self) -> &str {
        "fake"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<RawHit>> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok((0..self.hits.min(max_results))
            .map(|i| RawHit {
                title: Some(format!("{query} #{i}")),
                body: Some(format!("snippet {i} for {query}")),
                href: Some(format!("https://example.com/{i}")),
            })
            .collect())
    }
}

/// Which pipeline prompt a model call carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Greeting,
    Summarize,
    Draft,
    Polish,
}

impl PromptKind {
    fn of(prompt: &str) -> Self {
        if prompt.starts_with("The user said") {
            Self::Greeting
        } else if prompt.starts_with("You are an AI research assistant") {
            Self::Summarize
        } else if prompt.starts_with("You are a professional blog writer") {
            Self::Draft
        } else {
            Self::Polish
        }
    }
}

/// A 200-word draft, long enough to be polished.
pub fn long_text() -> String {
    vec!["word"; 200].join(" ")
}

/// Generation provider answering by prompt kind. Kinds in `failing` fail
/// on every model; `panic_on` panics instead.
pub struct FakeModels {
    failing: Vec<PromptKind>,
    panic_on: Option<PromptKind>,
    draft: String,
    calls: Mutex<Vec<(String, PromptKind)>>,
}

impl FakeModels {
    fn build(failing: &[PromptKind], panic_on: Option<PromptKind>, draft: String) -> Arc<Self> {
        Arc::new(Self {
            failing: failing.to_vec(),
            panic_on,
            draft,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn ok() -> Arc<Self> {
        Self::build(&[], None, long_text())
    }

    pub fn failing(kinds: &[PromptKind]) -> Arc<Self> {
        Self::build(kinds, None, long_text())
    }

    pub fn panicking(kind: PromptKind) -> Arc<Self> {
        Self::build(&[], Some(kind), long_text())
    }

    pub fn with_draft(draft: &str) -> Arc<Self> {
        Self::build(&[], None, draft.to_string())
    }

    pub fn calls(&self) -> Vec<(String, PromptKind)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<PromptKind> {
        self.calls().into_iter().map(|(_, k)| k).collect()
    }
}

#[async_trait]
impl GenerationProvider for FakeModels {
    fn name(&self) -> &str {
        "fake"
    }

    async fn generate(&self, model_id: &str, prompt: &str) -> Result<String> {
        let kind = PromptKind::of(prompt);
        self.calls.lock().unwrap().push((model_id.to_string(), kind));

        if self.panic_on == Some(kind) {
            panic!("provider blew up during {kind:?}");
        }
        if self.failing.contains(&kind) {
            return Err(TopicPressError::model(model_id, format!("{kind:?} unavailable")));
        }

        Ok(match kind {
            PromptKind::Greeting => "Hi! Give me a topic.".to_string(),
            PromptKind::Summarize => "summary of sources".to_string(),
            PromptKind::Draft => self.draft.clone(),
            PromptKind::Polish => "polished article".to_string(),
        })
    }
}

pub fn pipeline(
    search: &Arc<FakeSearch>,
    models: &Arc<FakeModels>,
    options: PipelineOptions,
) -> TopicPipeline {
    pipeline_with_search_options(search, models, options, SearchOptions::default())
}

pub fn pipeline_with_search_options(
    search: &Arc<FakeSearch>,
    models: &Arc<FakeModels>,
    options: PipelineOptions,
    search_options: SearchOptions,
) -> TopicPipeline {
    let aggregator = SearchAggregator::new(search.clone(), search_options);
    let invoker = ModelInvoker::new(
        models.clone(),
        ModelChain::new("primary", vec!["backup".into()]),
        Duration::from_secs(5),
    );
    TopicPipeline::new(aggregator, invoker, options)
}
