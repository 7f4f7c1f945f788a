use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use sesmatch::{Action, Category, Config, Revision};

mod commands;

#[derive(Parser)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Match engineers and projects through embedding search", long_about = None)]
struct Cli {
    /// Config file (default: ./sesmatch.toml, then ~/.sesmatch/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Form revision (mock, embedded, categorized)
    #[arg(long, global = true)]
    revision: Option<Revision>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the matching form over HTTP
    Serve {
        /// Host to bind to (default from config: 127.0.0.1)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (default from config: 8787)
        #[arg(long)]
        port: Option<u16>,

        /// Use random vectors and an in-memory store instead of hosted services
        #[arg(long)]
        offline: bool,
    },

    /// Register an entry in the vector database
    Register {
        #[command(flatten)]
        args: EntryArgs,
    },

    /// Search for entries of the opposite category
    Search {
        #[command(flatten)]
        args: EntryArgs,
    },

    /// Print the filter a search would send, without calling anything
    Filter {
        /// Exact-match identifier
        #[arg(long)]
        id: Option<String>,

        /// Selected category (the filter targets the other one)
        #[arg(long)]
        category: Option<Category>,
    },
}

#[derive(Args)]
struct EntryArgs {
    /// Free-text content to embed
    #[arg(long)]
    content: String,

    /// Optional identifier
    #[arg(long, default_value = "")]
    id: String,

    /// Selected category (project, engineer)
    #[arg(long)]
    category: Option<Category>,

    /// Print the whole form state as JSON instead of the response
    #[arg(short, long)]
    json: bool,
}

impl From<EntryArgs> for commands::action::EntryInput {
    fn from(args: EntryArgs) -> Self {
        Self {
            content: args.content,
            id: args.id,
            category: args.category,
            json: args.json,
        }
    }
}

fn main() -> Result<()> {
    // .env may carry RUST_LOG
    sesmatch::config::load_dotenv();
    sesmatch::init_tracing();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(revision) = cli.revision {
        config.form.revision = revision;
    }

    match cli.command {
        Commands::Serve {
            host,
            port,
            offline,
        } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            commands::serve::execute(&config, commands::serve::ServeOptions { offline })?;
        }
        Commands::Register { args } => {
            commands::action::execute(&config, Action::Register, args.into())?;
        }
        Commands::Search { args } => {
            commands::action::execute(&config, Action::Search, args.into())?;
        }
        Commands::Filter { id, category } => {
            commands::filter::execute(&config, id, category)?;
        }
    }

    Ok(())
}
