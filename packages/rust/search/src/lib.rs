//! Web research for TopicPress.
//!
//! This crate provides:
//! - [`SearchProvider`]: the external search capability seam
//! - [`DuckDuckGo`]: the default provider, scraping the HTML results page
//! - [`SearchAggregator`]: multi-query fan-out with title deduplication

pub mod aggregator;
pub mod duckduckgo;
pub mod provider;

pub use aggregator::{SearchAggregator, dedup_by_title, query_variants};
pub use duckduckgo::DuckDuckGo;
pub use provider::{RawHit, SearchProvider};
