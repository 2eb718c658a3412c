// Docwright - LLM-assisted technical document generation
// Main entry point

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use docwright::cli::{self, commands, Console, GenerateOptions, TerminalConsole};
use docwright::config::{load_config, Config};
use docwright::store::ContentStore;

#[derive(Parser, Debug)]
#[command(
    name = "docwright",
    about = "Co-author, validate and repair technical documents with an LLM",
    version
)]
struct Args {
    /// Configuration file (defaults to ~/.docwright/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pick an idea from the backlog (default)
    Menu,

    /// Generate a single document
    Generate {
        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Fetch this URL and use it as guidance (automatic mode only)
        #[arg(long)]
        source_url: Option<String>,

        /// Never prompt; use synthesised instructions
        #[arg(long)]
        auto: bool,
    },

    /// Print a saved document
    Show { title: String },

    /// Delete a saved document and all its artifacts
    Delete { title: String },

    /// List saved documents
    List,

    /// Manage the idea backlog
    Ideas {
        #[command(subcommand)]
        command: IdeasCommand,
    },
}

#[derive(Subcommand, Debug)]
enum IdeasCommand {
    /// Add a candidate document
    Add { title: String, description: String },

    /// List candidates, failed and passed entries
    List,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "docwright=debug" } else { "docwright=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config: Config = load_config(args.config.as_deref())?;
    init_tracing(args.verbose || config.features.debug_logging);

    let console: Arc<dyn Console> = Arc::new(TerminalConsole::new(config.editor.clone()));
    let store = ContentStore::new(&config.storage.data_dir);

    match args.command.unwrap_or(Command::Menu) {
        Command::Menu => {
            let bench = cli::build_workbench(&config, console)?;
            commands::menu(&bench, &config).await?;
        }
        Command::Generate {
            title,
            description,
            source_url,
            auto,
        } => {
            let bench = cli::build_workbench(&config, console)?;
            let passed = commands::generate(
                &bench,
                GenerateOptions {
                    title,
                    description,
                    source_url,
                    auto,
                },
            )
            .await?;
            if !passed {
                std::process::exit(2);
            }
        }
        Command::Show { title } => commands::show(&store, console.as_ref(), &title)?,
        Command::Delete { title } => commands::delete(&store, console.as_ref(), &title)?,
        Command::List => commands::list_documents(&store, console.as_ref())?,
        Command::Ideas { command } => match command {
            IdeasCommand::Add { title, description } => {
                commands::add_idea(&config, console.as_ref(), &title, &description)?
            }
            IdeasCommand::List => commands::list_ideas(&config, console.as_ref())?,
        },
    }

    Ok(())
}
