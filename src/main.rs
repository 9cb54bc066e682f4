//! FormCraft CLI - serve the form builder API and inspect its storage

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use formcraft::config::{self, FallbackKind, FormcraftConfig};
use formcraft::storage::Dispatcher;
use formcraft::ui;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "formcraft")]
#[command(version)]
#[command(about = "FormCraft - build categorize, cloze and comprehension forms and collect responses")]
#[command(long_about = r#"
FormCraft serves a JSON API for building forms and collecting responses.

Storage is picked once at startup: the database named by DATABASE_URL when
it can be opened, otherwise an in-memory or JSON-file fallback.

Example usage:
  formcraft serve --port 8080
  formcraft serve --database sqlite://formcraft.db
  formcraft stats --fallback file --data-dir .formcraft
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Default)]
struct StorageArgs {
    /// Database URL (overrides DATABASE_URL)
    #[arg(short, long)]
    database: Option<String>,

    /// Fallback store when no database is reachable
    #[arg(long, value_enum)]
    fallback: Option<FallbackKind>,

    /// Directory for the JSON file fallback
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

impl StorageArgs {
    fn apply(self, config: &mut FormcraftConfig) {
        if let Some(database) = self.database {
            config.storage.database_url = Some(database);
        }
        if let Some(fallback) = self.fallback {
            config.storage.fallback = fallback;
        }
        if let Some(dir) = self.data_dir {
            config.storage.data_dir = dir;
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Port to listen on (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Serve the built client from the static directory
        #[arg(long)]
        production: bool,

        #[command(flatten)]
        storage: StorageArgs,
    },

    /// Show storage statistics
    Stats {
        #[command(flatten)]
        storage: StorageArgs,
    },

    /// List stored forms
    Forms {
        #[command(flatten)]
        storage: StorageArgs,
    },

    /// Write a default formcraft.toml
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let mut settings = config::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { port, production, storage } => {
            storage.apply(&mut settings);
            if let Some(port) = port {
                settings.server.port = port;
            }
            if production {
                settings.server.production = true;
            }

            let dispatcher = Dispatcher::connect(&settings.storage).await?;
            ui::storage_ready(dispatcher.backend());
            formcraft::server::start_server(&settings.server, dispatcher).await?;
        }

        Commands::Stats { storage } => {
            storage.apply(&mut settings);
            let dispatcher = Dispatcher::connect(&settings.storage).await?;
            let stats = dispatcher.stats().await?;
            ui::storage_ready(dispatcher.backend());

            ui::section(&format!("{} FormCraft Statistics", ui::Icons::STATS));
            println!("{}", ui::stats_table(&stats));
        }

        Commands::Forms { storage } => {
            storage.apply(&mut settings);
            let dispatcher = Dispatcher::connect(&settings.storage).await?;
            let forms = dispatcher.list_form_summaries().await?;

            if forms.is_empty() {
                ui::info("Forms", "none stored");
            } else {
                println!("{}", ui::forms_table(&forms));
            }
        }

        Commands::Init { force } => {
            let path = cli.config.unwrap_or_else(config::default_config_path);
            if let Err(e) = config::write_config(&path, &FormcraftConfig::default(), force) {
                ui::error(&e.to_string());
                return Err(e);
            }
            ui::success(&format!("Wrote {}", path.display()));
        }
    }

    Ok(())
}
