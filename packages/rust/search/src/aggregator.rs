//! Multi-query research: fan out query variants, then normalize and dedup.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use topicpress_shared::{
    MAX_SEARCH_RESULTS, QUERY_TEMPLATE_COUNT, SearchOptions, SearchResult, TopicPressError,
};

use crate::provider::SearchProvider;

/// Builds the query variants for a topic, in template order.
///
/// Only the first `num_searches` templates are used; asking for more than
/// [`QUERY_TEMPLATE_COUNT`] yields all of them.
pub fn query_variants(topic: &str, num_searches: usize) -> Vec<String> {
    let templates: [String; QUERY_TEMPLATE_COUNT] = [
        topic.to_string(),
        format!("{topic} latest information"),
        format!("{topic} comprehensive guide"),
    ];
    templates.into_iter().take(num_searches).collect()
}

/// Keep the first result for each exact title, preserving order.
pub fn dedup_by_title(results: Vec<SearchResult>) -> Vec<SearchResult> {
    let mut seen = HashSet::new();
    results
        .into_iter()
        .filter(|r| seen.insert(r.title.clone()))
        .collect()
}

/// Issues query variants against a [`SearchProvider`] and merges the hits.
pub struct SearchAggregator {
    provider: Arc<dyn SearchProvider>,
    options: SearchOptions,
}

impl SearchAggregator {
    pub fn new(provider: Arc<dyn SearchProvider>, options: SearchOptions) -> Self {
        Self { provider, options }
    }

    /// Configured number of query variants.
    pub fn num_searches(&self) -> usize {
        self.options.num_searches
    }

    /// Run one query. Provider errors and timeouts are logged and become an
    /// empty list.
    pub async fn search_topic(&self, query: &str, max_results: usize) -> Vec<SearchResult> {
        let outcome =
            tokio::time::timeout(self.options.timeout, self.provider.search(query, max_results))
                .await
                .unwrap_or_else(|_| {
                    Err(TopicPressError::SearchProvider(format!(
                        "{query}: timed out after {}s",
                        self.options.timeout.as_secs()
                    )))
                });

        match outcome {
            Ok(hits) => hits
                .into_iter()
                .take(max_results)
                .map(SearchResult::from)
                .collect(),
            Err(e) => {
                warn!(
                    query,
                    provider = self.provider.name(),
                    error = %e,
                    "search failed, continuing without results"
                );
                Vec::new()
            }
        }
    }

    /// Search `num_searches` variants of `topic` concurrently and return at
    /// most `max_results` results with unique titles, never more than
    /// [`MAX_SEARCH_RESULTS`].
    ///
    /// Results are merged in query order regardless of completion order, so
    /// the first-seen title always comes from the earliest query.
    #[instrument(skip_all, fields(topic = %topic, num_searches = num_searches))]
    pub async fn multi_search(&self, topic: &str, num_searches: usize) -> Vec<SearchResult> {
        if num_searches > QUERY_TEMPLATE_COUNT {
            warn!(
                num_searches,
                max = QUERY_TEMPLATE_COUNT,
                "more searches requested than query templates, capping"
            );
        }

        let queries = query_variants(topic, num_searches);
        let per_query = self.options.max_results_per_query;

        // join_all yields outputs in input order.
        let batches = join_all(queries.iter().map(|q| self.search_topic(q, per_query))).await;

        let merged: Vec<SearchResult> = batches.into_iter().flatten().collect();
        let total = merged.len();
        let mut unique = dedup_by_title(merged);
        unique.truncate(self.options.max_results.min(MAX_SEARCH_RESULTS));

        debug!(total, unique = unique.len(), "merged search results");
        info!(
            queries = queries.len(),
            results = unique.len(),
            "research complete"
        );

        unique
    }
}
