//! Application configuration for TopicPress.
//!
//! User config lives at `~/.topicpress/topicpress.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TopicPressError};
use crate::types::MAX_SEARCH_RESULTS;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "topicpress.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".topicpress";

/// Number of query templates the search aggregator knows about.
pub const QUERY_TEMPLATE_COUNT: usize = 3;

// ---------------------------------------------------------------------------
// Config structs (matching topicpress.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Generative Language API settings.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Web search settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Pipeline behaviour.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Database location.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Username that owns chats and blogs when none is given.
    #[serde(default = "default_user")]
    pub user: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            user: default_user(),
        }
    }
}

fn default_user() -> String {
    "default".into()
}

/// `[gemini]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// API root, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model tried first for every generation.
    #[serde(default = "default_primary_model")]
    pub primary_model: String,

    /// Models tried in order when the primary fails.
    #[serde(default = "default_fallback_models")]
    pub fallback_models: Vec<String>,

    /// Per-attempt timeout.
    #[serde(default = "default_gemini_timeout")]
    pub timeout_secs: u64,

    /// `generationConfig` keys removed from every request before dispatch.
    #[serde(default)]
    pub strip_params: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            primary_model: default_primary_model(),
            fallback_models: default_fallback_models(),
            timeout_secs: default_gemini_timeout(),
            strip_params: Vec::new(),
            temperature: None,
            max_output_tokens: None,
        }
    }
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".into()
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}
fn default_primary_model() -> String {
    "gemini-flash-latest".into()
}
fn default_fallback_models() -> Vec<String> {
    [
        "gemini-2.0-flash-lite",
        "gemini-pro-latest",
        "gemini-2.5-flash",
        "gemini-1.5-flash",
        "gemini-pro",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
fn default_gemini_timeout() -> u64 {
    60
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// DuckDuckGo HTML endpoint.
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    /// Query variants issued per topic (at most [`QUERY_TEMPLATE_COUNT`]).
    #[serde(default = "default_num_searches")]
    pub num_searches: usize,

    /// Hits requested per query.
    #[serde(default = "default_max_results_per_query")]
    pub max_results_per_query: usize,

    /// Cap on the deduplicated result set.
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Per-query timeout.
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            num_searches: default_num_searches(),
            max_results_per_query: default_max_results_per_query(),
            max_results: default_max_results(),
            timeout_secs: default_search_timeout(),
        }
    }
}

fn default_search_endpoint() -> String {
    "https://html.duckduckgo.com/html/".into()
}
fn default_num_searches() -> usize {
    3
}
fn default_max_results_per_query() -> usize {
    3
}
fn default_max_results() -> usize {
    MAX_SEARCH_RESULTS
}
fn default_search_timeout() -> u64 {
    15
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Whether drafts are sent through a polishing pass.
    #[serde(default = "default_true")]
    pub polish: bool,

    /// Drafts shorter than this many words are never polished.
    #[serde(default = "default_polish_min_words")]
    pub polish_min_words: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            polish: true,
            polish_min_words: default_polish_min_words(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_polish_min_words() -> usize {
    150
}

/// `[storage]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the libSQL database file. A leading `~/` is expanded.
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    "~/.topicpress/topicpress.db".into()
}

impl AppConfig {
    /// Reject settings the pipeline cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.search.num_searches == 0 || self.search.num_searches > QUERY_TEMPLATE_COUNT {
            return Err(TopicPressError::config(format!(
                "search.num_searches must be between 1 and {QUERY_TEMPLATE_COUNT}, got {}",
                self.search.num_searches
            )));
        }
        if self.search.max_results == 0 || self.search.max_results > MAX_SEARCH_RESULTS {
            return Err(TopicPressError::config(format!(
                "search.max_results must be between 1 and {MAX_SEARCH_RESULTS}, got {}",
                self.search.max_results
            )));
        }
        if self.gemini.primary_model.trim().is_empty() {
            return Err(TopicPressError::config("gemini.primary_model must not be empty"));
        }
        if self.gemini.timeout_secs == 0 || self.search.timeout_secs == 0 {
            return Err(TopicPressError::config("timeouts must be at least 1 second"));
        }
        if self.pipeline.polish_min_words == 0 {
            return Err(TopicPressError::config(
                "pipeline.polish_min_words must be at least 1",
            ));
        }
        Ok(())
    }

    /// Resolved database path with `~` expanded.
    pub fn db_path(&self) -> Result<PathBuf> {
        expand_home(&self.storage.db_path)
    }
}

// ---------------------------------------------------------------------------
// Runtime settings (derived from config, passed to constructors)
// ---------------------------------------------------------------------------

/// Runtime search settings.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub endpoint: String,
    pub num_searches: usize,
    pub max_results_per_query: usize,
    pub max_results: usize,
    pub timeout: Duration,
}

impl From<&AppConfig> for SearchOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            endpoint: config.search.endpoint.clone(),
            num_searches: config.search.num_searches,
            max_results_per_query: config.search.max_results_per_query,
            max_results: config.search.max_results,
            timeout: Duration::from_secs(config.search.timeout_secs),
        }
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// Runtime pipeline settings.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub polish: bool,
    pub polish_min_words: usize,
}

impl From<&AppConfig> for PipelineOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            polish: config.pipeline.polish,
            polish_min_words: config.pipeline.polish_min_words,
        }
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.topicpress/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| TopicPressError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.topicpress/topicpress.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| TopicPressError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        TopicPressError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| TopicPressError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| TopicPressError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| TopicPressError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the Generative Language API key from the env var named in config.
pub fn resolve_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.gemini.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val.trim().to_string()),
        _ => Err(TopicPressError::config(format!(
            "Gemini API key not found. Set the {var_name} environment variable.\n\
             Get a key at https://aistudio.google.com/app/apikey"
        ))),
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir()
                .ok_or_else(|| TopicPressError::config("could not determine home directory"))?;
            Ok(home.join(rest))
        }
        None => Ok(PathBuf::from(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("primary_model"));
        assert!(toml_str.contains("GEMINI_API_KEY"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.search.num_searches, 3);
        assert_eq!(parsed.gemini.fallback_models.len(), 5);
        assert_eq!(parsed.pipeline.polish_min_words, 150);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[gemini]
primary_model = "gemini-2.5-flash"
fallback_models = ["gemini-pro"]
strip_params = ["topK"]

[pipeline]
polish = false
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.gemini.primary_model, "gemini-2.5-flash");
        assert_eq!(config.gemini.fallback_models, vec!["gemini-pro".to_string()]);
        assert_eq!(config.gemini.strip_params, vec!["topK".to_string()]);
        assert_eq!(config.gemini.api_key_env, "GEMINI_API_KEY");
        assert!(!config.pipeline.polish);
        assert_eq!(config.search.max_results, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_too_many_searches() {
        let mut config = AppConfig::default();
        config.search.num_searches = 4;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("num_searches"));

        config.search.num_searches = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_max_results_above_cap() {
        let mut config = AppConfig::default();
        config.search.max_results = 25;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_results"));

        config.search.max_results = MAX_SEARCH_RESULTS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_primary_model() {
        let mut config = AppConfig::default();
        config.gemini.primary_model = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn runtime_options_from_app_config() {
        let app = AppConfig::default();
        let search = SearchOptions::from(&app);
        assert_eq!(search.num_searches, 3);
        assert_eq!(search.max_results_per_query, 3);
        assert_eq!(search.timeout, Duration::from_secs(15));

        let pipeline = PipelineOptions::from(&app);
        assert!(pipeline.polish);
        assert_eq!(pipeline.polish_min_words, 150);
    }

    #[test]
    fn api_key_resolution() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.gemini.api_key_env = "TP_TEST_NONEXISTENT_KEY_12345".into();
        let result = resolve_api_key(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }

    #[test]
    fn expand_home_leaves_absolute_paths() {
        assert_eq!(
            expand_home("/var/lib/topicpress.db").unwrap(),
            PathBuf::from("/var/lib/topicpress.db")
        );
        let expanded = expand_home("~/x.db").unwrap();
        assert!(expanded.ends_with("x.db"));
        assert!(!expanded.to_string_lossy().starts_with('~'));
    }
}
