//! Shared types, error model, and configuration for TopicPress.
//!
//! This crate is the foundation depended on by all other TopicPress crates.
//! It provides:
//! - [`TopicPressError`] — the unified error type
//! - Domain types ([`SearchResult`], [`Intent`], [`GenerationResult`], stored records)
//! - Configuration ([`AppConfig`], runtime option structs, config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, GeminiConfig, PipelineConfig, PipelineOptions,
    QUERY_TEMPLATE_COUNT, SearchConfig, SearchOptions, StorageConfig, config_dir,
    config_file_path, expand_home, init_config, load_config, load_config_from, resolve_api_key,
};
pub use error::{Result, TopicPressError};
pub use types::{
    BlogRecord, CHAT_TITLE_MAX_CHARS, ChatRecord, GenerationResult, Intent, MAX_SEARCH_RESULTS,
    MessageRecord, MessageRole, OffTopicReason, SearchResult, UserRecord, chat_title,
};
