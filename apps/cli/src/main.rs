//! TopicPress CLI — research-backed blog articles from a single topic.
//!
//! Searches the web for a topic, has a Gemini model summarize and write an
//! article, and keeps the conversation and article in a local database.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
