//! DuckDuckGo HTML results page as a [`SearchProvider`].
//!
//! The HTML endpoint needs no API key. Result links are usually wrapped in a
//! `/l/?uddg=<target>` redirect which we unwrap to the destination URL.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};
use url::Url;

use topicpress_shared::{Result, SearchOptions, TopicPressError};

use crate::provider::{RawHit, SearchProvider};

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("TopicPress/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 3;

/// Search provider backed by `html.duckduckgo.com`.
pub struct DuckDuckGo {
    client: Client,
    endpoint: Url,
}

impl DuckDuckGo {
    /// Build a provider for the given endpoint with a per-request timeout.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            TopicPressError::config(format!("invalid search endpoint '{endpoint}': {e}"))
        })?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(timeout)
            .build()
            .map_err(|e| TopicPressError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, endpoint })
    }

    /// Build a provider from runtime search options.
    pub fn from_options(opts: &SearchOptions) -> Result<Self> {
        Self::new(&opts.endpoint, opts.timeout)
    }

    fn query_url(&self, query: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("q", query.trim());
        url
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGo {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    #[instrument(skip(self), fields(provider = "duckduckgo"))]
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<RawHit>> {
        let url = self.query_url(query);

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| TopicPressError::SearchProvider(format!("{query}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TopicPressError::SearchProvider(format!(
                "{query}: HTTP {status}"
            )));
        }

        let body = response.text().await.map_err(|e| {
            TopicPressError::SearchProvider(format!("{query}: failed to read body: {e}"))
        })?;

        if let Some(reason) = detect_challenge(&body) {
            return Err(TopicPressError::SearchProvider(format!("{query}: {reason}")));
        }

        let hits = parse_results(&body, max_results)?;
        debug!(hits = hits.len(), "parsed search results");
        Ok(hits)
    }
}

// ---------------------------------------------------------------------------
// HTML parsing
// ---------------------------------------------------------------------------

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| TopicPressError::parse(format!("bad selector {css}: {e}")))
}

/// Extract up to `limit` organic hits from a DuckDuckGo HTML results page.
pub fn parse_results(html: &str, limit: usize) -> Result<Vec<RawHit>> {
    let document = Html::parse_document(html);
    let container_sel = selector("div.result")?;
    let title_sel = selector("a.result__a")?;
    let snippet_sel = selector(".result__snippet")?;

    let mut hits = Vec::new();
    for container in document.select(&container_sel) {
        if hits.len() >= limit {
            break;
        }

        // Sponsored results carry the `result--ad` class.
        let is_ad = container
            .value()
            .classes()
            .any(|c| c == "result--ad");
        if is_ad {
            continue;
        }

        let Some(anchor) = container.select(&title_sel).next() else {
            continue;
        };

        let title = non_empty(collapse_text(anchor));
        let href = anchor.value().attr("href").and_then(normalize_href);
        let body = container
            .select(&snippet_sel)
            .next()
            .and_then(|s| non_empty(collapse_text(s)));

        if title.is_none() && href.is_none() {
            continue;
        }

        hits.push(RawHit { title, body, href });
    }

    Ok(hits)
}

/// Detect DuckDuckGo's bot-check page, which comes back as HTTP 200.
fn detect_challenge(body: &str) -> Option<&'static str> {
    let lower = body.to_ascii_lowercase();
    if lower.contains("anomaly-modal") || lower.contains("challenge-form") {
        return Some("duckduckgo bot-check page returned");
    }
    None
}

/// Resolve a result href to an absolute destination URL.
fn normalize_href(href: &str) -> Option<String> {
    let trimmed = href.trim();
    let absolute = if trimmed.starts_with("//") {
        format!("https:{trimmed}")
    } else if trimmed.starts_with('/') {
        format!("https://duckduckgo.com{trimmed}")
    } else {
        trimmed.to_string()
    };

    let parsed = Url::parse(&absolute).ok()?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return None;
    }

    let is_redirect = parsed
        .host_str()
        .is_some_and(|h| h.ends_with("duckduckgo.com"))
        && parsed.path().starts_with("/l/");
    if !is_redirect {
        return Some(parsed.to_string());
    }

    // `query_pairs` yields the decoded target.
    let target = parsed
        .query_pairs()
        .find(|(k, _)| k == "uddg")
        .map(|(_, v)| v.into_owned())?;
    Url::parse(target.trim()).ok().map(|u| u.to_string())
}

fn collapse_text(el: ElementRef<'_>) -> String {
    let raw: String = el.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}
