use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod bootstrap;
mod commands;
mod logging;
mod render;

#[derive(Parser)]
#[command(name = "chatdeck")]
#[command(about = "chatdeck - tabbed chat sessions against a local LLM backend", long_about = None)]
struct Cli {
    /// Mirror logs to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of ~/.config/chatdeck/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List saved sessions
    Sessions,
    /// Print the history of a saved session
    Show {
        thread_id: String,
        /// Print the loaded view as JSON
        #[arg(long)]
        json: bool,
    },
    /// Send one message, optionally continuing a saved session
    Send {
        /// Session to continue; a new session is created when omitted
        #[arg(long)]
        thread: Option<String>,
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Replace the content of one message in a saved session
    Edit {
        thread_id: String,
        index: i64,
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Rename a saved session
    Rename { thread_id: String, name: String },
    /// Delete a saved session
    Delete { thread_id: String },
    /// Push generation settings to the backend as its defaults
    ApplySettings(commands::settings::SettingsArgs),
    /// Interactive tabbed chat
    Repl,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init(cli.verbose);

    let app = bootstrap::build(cli.config.clone())?;

    match cli.command {
        Commands::Sessions => commands::session::list(&app).await?,
        Commands::Show { thread_id, json } => commands::session::show(&app, &thread_id, json).await?,
        Commands::Send { thread, text } => {
            commands::send::run(&app, thread.as_deref(), &text.join(" ")).await?
        }
        Commands::Edit {
            thread_id,
            index,
            text,
        } => commands::session::edit(&app, &thread_id, index, &text.join(" ")).await?,
        Commands::Rename { thread_id, name } => {
            commands::session::rename(&app, &thread_id, &name).await?
        }
        Commands::Delete { thread_id } => commands::session::delete(&app, &thread_id).await?,
        Commands::ApplySettings(args) => commands::settings::apply(&app, args).await?,
        Commands::Repl => commands::repl::run(&app).await?,
    }

    Ok(())
}
