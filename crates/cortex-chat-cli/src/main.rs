use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

use cortex_chat::config::Settings;
use cortex_chat::connection::Connection;
use cortex_chat::conversation::Conversation;
use cortex_chat::providers::cortex::CortexAgentProvider;

mod prompt;
mod session;

use prompt::rustyline::RustylinePrompt;
use prompt::{format_table, TITLE};
use session::Session;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the secrets file (defaults to ~/.config/cortex-chat/secrets.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum number of search results the agent may use
    #[arg(short, long, default_value_t = 1)]
    limit: u32,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start an interactive chat session
    Chat,

    /// Ask a single question and stream the answer to stdout
    Ask {
        /// The question to ask
        query: String,
    },

    /// Run a SQL statement and print the rows
    Sql {
        /// The statement to run
        query: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;

    println!("{}", style(TITLE).bold());
    let connection = match Connection::open(&settings.snowflake).await {
        Ok(connection) => {
            cliclack::log::success("Snowflake connection established!")?;
            Some(connection)
        }
        Err(e) => {
            tracing::error!("{}", e);
            cliclack::log::error(
                "Connection not established. Check that you have correctly entered your Snowflake credentials!",
            )?;
            None
        }
    };

    let agent = CortexAgentProvider::new().context("Failed to create agent client")?;
    let conversation = Conversation::new(Box::new(agent), connection, cli.limit);

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => {
            let prompt = RustylinePrompt::new()?;
            let mut session = Session::new(conversation, Box::new(prompt));
            session.start().await?;
        }
        Command::Ask { query } => {
            let prompt = RustylinePrompt::new()?;
            let mut session = Session::new(conversation, Box::new(prompt));
            session.headless_ask(&query).await?;
        }
        Command::Sql { query } => {
            let rows = conversation.run_sql(&query).await?;
            println!("{}", format_table(&rows));
        }
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
