//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use topicpress_core::{BlogService, PipelineProgress, Stage, TopicPipeline};
use topicpress_inference::{GeminiClient, GeminiSettings, ModelChain, ModelInvoker};
use topicpress_search::{DuckDuckGo, SearchAggregator};
use topicpress_shared::{
    AppConfig, GenerationResult, PipelineOptions, SearchOptions, init_config, load_config,
    load_config_from, resolve_api_key,
};
use topicpress_storage::Storage;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// TopicPress — research a topic and write a blog article about it.
#[derive(Parser)]
#[command(
    name = "topicpress",
    version,
    about = "Research a topic on the web and turn it into a long-form blog article.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.topicpress/topicpress.toml).
    #[arg(long, global = true, env = "TOPICPRESS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Research a topic and generate a blog article.
    Generate {
        /// The topic to write about.
        topic: String,

        /// User the chat and blog are saved under (defaults to config).
        #[arg(short, long)]
        user: Option<String>,

        /// Skip the final polishing pass.
        #[arg(long)]
        no_polish: bool,

        /// Print the result without writing to the database.
        #[arg(long)]
        no_save: bool,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Browse and delete saved chats.
    Chats {
        #[command(subcommand)]
        action: ChatsAction,
    },

    /// Browse saved blogs.
    Blogs {
        #[command(subcommand)]
        action: BlogsAction,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Chat subcommands.
#[derive(Subcommand)]
pub(crate) enum ChatsAction {
    /// List a user's chats, most recent first.
    List {
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Print the messages of a chat.
    Messages { chat_id: String },
    /// Delete a chat and its messages. Its blogs are kept.
    Delete { chat_id: String },
}

/// Blog subcommands.
#[derive(Subcommand)]
pub(crate) enum BlogsAction {
    /// List a user's blogs, newest first.
    List {
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Print one blog.
    Show { blog_id: String },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "topicpress=info",
        1 => "topicpress=debug",
        _ => "topicpress=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    match cli.command {
        Command::Generate {
            topic,
            user,
            no_polish,
            no_save,
            json,
        } => {
            let user = user.unwrap_or_else(|| config.defaults.user.clone());
            cmd_generate(&config, &topic, &user, no_polish, no_save, json).await
        }
        Command::Chats { action } => match action {
            ChatsAction::List { user } => {
                let user = user.unwrap_or_else(|| config.defaults.user.clone());
                cmd_chats_list(&config, &user).await
            }
            ChatsAction::Messages { chat_id } => cmd_chats_messages(&config, &chat_id).await,
            ChatsAction::Delete { chat_id } => cmd_chats_delete(&config, &chat_id).await,
        },
        Command::Blogs { action } => match action {
            BlogsAction::List { user } => {
                let user = user.unwrap_or_else(|| config.defaults.user.clone());
                cmd_blogs_list(&config, &user).await
            }
            BlogsAction::Show { blog_id } => cmd_blogs_show(&config, &blog_id).await,
        },
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(&config).await,
        },
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// Build the pipeline from config. Reads the API key from the environment.
fn build_pipeline(config: &AppConfig, polish: bool) -> Result<TopicPipeline> {
    let api_key = resolve_api_key(config)?;

    let search_options = SearchOptions::from(config);
    let search = DuckDuckGo::from_options(&search_options)?;
    let aggregator = SearchAggregator::new(Arc::new(search), search_options);

    let settings = GeminiSettings::from_config(&config.gemini, api_key);
    let timeout = settings.timeout;
    let gemini = GeminiClient::new(settings)?;
    let invoker = ModelInvoker::new(Arc::new(gemini), ModelChain::from(&config.gemini), timeout);

    let mut options = PipelineOptions::from(config);
    options.polish &= polish;

    Ok(TopicPipeline::new(aggregator, invoker, options))
}

/// Open the database read-only, or `None` if nothing has been saved yet.
async fn open_existing(config: &AppConfig) -> Result<Option<Storage>> {
    let path = config.db_path()?;
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(Storage::open_readonly(&path).await?))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_generate(
    config: &AppConfig,
    topic: &str,
    user: &str,
    no_polish: bool,
    no_save: bool,
    json: bool,
) -> Result<()> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(eyre!("topic must not be empty"));
    }

    let pipeline = build_pipeline(config, !no_polish)?;
    info!(topic, user, save = !no_save, "generating blog");

    let reporter = CliProgress::new()?;

    if no_save {
        let result = pipeline.process_topic(topic, &reporter).await;
        if json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            print_article(&result.blog_content, result.research_summary.as_deref());
            println!("  Sources: {}", result.search_results_count);
        }
        return Ok(());
    }

    let storage = Storage::open(&config.db_path()?).await?;
    let service = BlogService::new(pipeline, storage);
    let outcome = service.generate_blog(user, topic, &reporter).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_article(&outcome.content, outcome.research_summary.as_deref());
        println!("  Sources: {}", outcome.search_results_count);
        println!("  Chat:    {}", outcome.chat_id);
        println!("  Blog:    {}", outcome.blog_id);
        println!();
    }

    Ok(())
}

fn print_article(content: &str, research_summary: Option<&str>) {
    println!();
    println!("{content}");
    println!();
    if let Some(summary) = research_summary {
        println!("---");
        println!("Research summary:");
        println!("{summary}");
        println!();
    }
}

async fn cmd_chats_list(config: &AppConfig, user: &str) -> Result<()> {
    let Some(storage) = open_existing(config).await? else {
        println!("No chats yet.");
        return Ok(());
    };
    let Some(user_record) = storage.find_user(user).await? else {
        println!("No chats for user '{user}'.");
        return Ok(());
    };

    let chats = storage.list_chats(&user_record.id).await?;
    if chats.is_empty() {
        println!("No chats for user '{user}'.");
        return Ok(());
    }
    for chat in chats {
        println!(
            "{}  {}  {}",
            chat.id,
            chat.updated_at.format("%Y-%m-%d %H:%M"),
            chat.title
        );
    }
    Ok(())
}

async fn cmd_chats_messages(config: &AppConfig, chat_id: &str) -> Result<()> {
    let storage = open_existing(config)
        .await?
        .ok_or_else(|| eyre!("chat '{chat_id}' not found"))?;
    let chat = storage
        .get_chat(chat_id)
        .await?
        .ok_or_else(|| eyre!("chat '{chat_id}' not found"))?;

    println!("# {}", chat.title);
    for message in storage.get_chat_messages(chat_id).await? {
        println!();
        println!(
            "[{}] {}",
            message.role.as_str(),
            message.created_at.format("%Y-%m-%d %H:%M:%S")
        );
        println!("{}", message.content);
    }
    Ok(())
}

async fn cmd_chats_delete(config: &AppConfig, chat_id: &str) -> Result<()> {
    let storage = Storage::open(&config.db_path()?).await?;
    storage.delete_chat(chat_id).await?;
    println!("Deleted chat {chat_id}");
    Ok(())
}

async fn cmd_blogs_list(config: &AppConfig, user: &str) -> Result<()> {
    let Some(storage) = open_existing(config).await? else {
        println!("No blogs yet.");
        return Ok(());
    };
    let Some(user_record) = storage.find_user(user).await? else {
        println!("No blogs for user '{user}'.");
        return Ok(());
    };

    let blogs = storage.list_blogs(&user_record.id).await?;
    if blogs.is_empty() {
        println!("No blogs for user '{user}'.");
        return Ok(());
    }
    for blog in blogs {
        println!(
            "{}  {}  {}",
            blog.id,
            blog.created_at.format("%Y-%m-%d %H:%M"),
            blog.topic
        );
    }
    Ok(())
}

async fn cmd_blogs_show(config: &AppConfig, blog_id: &str) -> Result<()> {
    let storage = open_existing(config)
        .await?
        .ok_or_else(|| eyre!("blog '{blog_id}' not found"))?;
    let blog = storage
        .get_blog(blog_id)
        .await?
        .ok_or_else(|| eyre!("blog '{blog_id}' not found"))?;

    println!("# {}", blog.topic);
    println!("Created: {}", blog.created_at.to_rfc3339());
    if let Some(chat_id) = &blog.chat_id {
        println!("Chat:    {chat_id}");
    }
    println!();
    println!("{}", blog.content);
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Result<Self> {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")?
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(Duration::from_millis(80));
        Ok(Self { spinner })
    }
}

impl PipelineProgress for CliProgress {
    fn stage(&self, stage: Stage) {
        self.spinner.set_message(stage.label());
    }

    fn researched(&self, results: usize) {
        self.spinner
            .set_message(format!("Found {results} unique search results"));
    }

    fn done(&self, _result: &GenerationResult) {
        self.spinner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_generate_flags() {
        let cli = Cli::try_parse_from([
            "topicpress",
            "generate",
            "Benefits of AI",
            "--user",
            "alice",
            "--no-polish",
            "--json",
        ])
        .unwrap();

        match cli.command {
            Command::Generate {
                topic,
                user,
                no_polish,
                no_save,
                json,
            } => {
                assert_eq!(topic, "Benefits of AI");
                assert_eq!(user.as_deref(), Some("alice"));
                assert!(no_polish);
                assert!(!no_save);
                assert!(json);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "topicpress",
            "blogs",
            "list",
            "-vv",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.log_format, LogFormat::Json));
        assert!(matches!(
            cli.command,
            Command::Blogs {
                action: BlogsAction::List { user: None }
            }
        ));
    }

    #[test]
    fn chats_delete_requires_id() {
        assert!(Cli::try_parse_from(["topicpress", "chats", "delete"]).is_err());
    }
}
