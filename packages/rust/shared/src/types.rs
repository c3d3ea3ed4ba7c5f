//! Core domain types for the topic pipeline and its persisted records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of search results kept after deduplication.
pub const MAX_SEARCH_RESULTS: usize = 10;

/// Chat titles are the topic cut to this many characters.
pub const CHAT_TITLE_MAX_CHARS: usize = 100;

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// A normalized web search hit. Missing provider fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub snippet: String,
    pub link: String,
}

// ---------------------------------------------------------------------------
// Intent
// ---------------------------------------------------------------------------

/// Why a topic was rejected as off-topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffTopicReason {
    /// Arithmetic symbols together with digits.
    Math,
    /// Coding requests.
    Code,
    /// A single token of three characters or fewer.
    TooShort,
}

/// Classification of a raw topic string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// "Who are you?" style questions.
    Identity,
    /// Greetings and small talk.
    Greeting,
    /// Requests the agent declines.
    OffTopic(OffTopicReason),
    /// A genuine subject for an article.
    ArticleTopic,
}

impl Intent {
    /// Short label for logs and CLI output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Greeting => "greeting",
            Self::OffTopic(OffTopicReason::Math) => "off_topic:math",
            Self::OffTopic(OffTopicReason::Code) => "off_topic:code",
            Self::OffTopic(OffTopicReason::TooShort) => "off_topic:too_short",
            Self::ArticleTopic => "article_topic",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// GenerationResult
// ---------------------------------------------------------------------------

/// The unit returned by the pipeline to its caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Article text, canned reply, or a human-readable error. Never empty.
    pub blog_content: String,
    /// Research summary; only set on the article path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub research_summary: Option<String>,
    /// Number of deduplicated search results fed to summarization.
    #[serde(default)]
    pub search_results_count: usize,
    /// The classified intent, when classification ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
}

impl GenerationResult {
    /// A reply that carries only body text.
    pub fn reply(intent: Intent, blog_content: impl Into<String>) -> Self {
        Self {
            blog_content: blog_content.into(),
            research_summary: None,
            search_results_count: 0,
            intent: Some(intent),
        }
    }

    /// A result produced by the error boundary.
    pub fn system_error(message: impl std::fmt::Display) -> Self {
        Self {
            blog_content: format!("System Error: {message}"),
            research_summary: None,
            search_results_count: 0,
            intent: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Persisted records
// ---------------------------------------------------------------------------

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::str::FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            other => Err(format!("unknown message role: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// A conversation started by one topic request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRecord {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    pub chat_id: String,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A saved article. `chat_id` is cleared when its chat is deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogRecord {
    pub id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    pub topic: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Truncate a topic to a chat title on a character boundary.
pub fn chat_title(topic: &str) -> String {
    topic.chars().take(CHAT_TITLE_MAX_CHARS).collect()
}
