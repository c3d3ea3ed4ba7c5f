//! The external search capability, as seen by the aggregator.

use async_trait::async_trait;

use topicpress_shared::{Result, SearchResult};

/// One hit as returned by a provider. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawHit {
    pub title: Option<String>,
    pub body: Option<String>,
    pub href: Option<String>,
}

impl From<RawHit> for SearchResult {
    fn from(hit: RawHit) -> Self {
        Self {
            title: hit.title.unwrap_or_default(),
            snippet: hit.body.unwrap_or_default(),
            link: hit.href.unwrap_or_default(),
        }
    }
}

/// A web search backend. Implementations may fail or return nothing;
/// callers are expected to recover.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Human-readable provider name for tracing.
    fn name(&self) -> &str;

    /// Run `query` and return at most `max_results` hits.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<RawHit>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default_to_empty() {
        let hit = RawHit {
            title: Some("Rust".into()),
            body: None,
            href: None,
        };
        let result = SearchResult::from(hit);
        assert_eq!(result.title, "Rust");
        assert_eq!(result.snippet, "");
        assert_eq!(result.link, "");
    }
}
