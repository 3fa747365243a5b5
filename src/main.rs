//! personal-memory: Command-line interface for the personal notes MCP server

use anyhow::{anyhow, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use personal_memory::config::{path_resolver, AppConfig};
use personal_memory::mcp::{messages, NotesMcpServer};
use personal_memory::{NewNote, NoteStore, StorageFactory};
use rmcp::ServiceExt;
use std::path::Path;
use tokio::io::{stdin, stdout};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// ============================================================================
// CLI Implementation
// ============================================================================

/// personal-memory: MCP server for storing and searching personal notes
#[derive(Parser)]
#[command(name = "personal-memory")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    storage: StorageArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Storage selection shared by every subcommand
#[derive(Args)]
struct StorageArgs {
    /// Path to a config file (default: ~/.config/personal-memory/config.toml)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Storage backend: file, memory, or database
    #[arg(short, long, global = true)]
    backend: Option<String>,

    /// JSON file used by the file backend
    #[arg(long, global = true)]
    file_path: Option<String>,

    /// Database file used by the database backend
    #[arg(long, global = true)]
    db_path: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize personal-memory configuration
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
    /// Start the MCP server on stdio
    Serve,
    /// Store a note
    Add {
        /// Note text
        text: String,

        /// ISO-8601 timestamp (default: now)
        #[arg(long)]
        timestamp: Option<String>,

        /// Tag to attach - can be specified multiple times
        #[arg(short, long = "tag", action = ArgAction::Append)]
        tags: Vec<String>,
    },
    /// Search notes (case-insensitive substring)
    Search {
        /// Search query
        query: String,
    },
    /// List all notes
    List,
    /// Delete a note by ID
    Delete {
        /// Note ID
        id: String,
    },
}

/// Build the effective configuration: CLI > environment > config file > defaults
fn load_config(args: &StorageArgs) -> Result<AppConfig> {
    let file_config = match &args.config {
        Some(path) => AppConfig::from_file(&path_resolver::resolve_path(path)?)?,
        None => AppConfig::load_default()?,
    };
    let mut config = file_config.merge_with(&AppConfig::from_env());

    if let Some(backend) = &args.backend {
        config = config.with_storage(backend);
    }
    if let Some(path) = &args.file_path {
        config = config.with_file_path(path);
    }
    if let Some(path) = &args.db_path {
        config = config.with_db_path(path);
    }

    config.validate()?;
    Ok(config)
}

fn open_store(args: &StorageArgs) -> Result<Box<dyn NoteStore>> {
    let config = load_config(args)?;
    let kind = config.storage_kind()?;
    let (store, _report) = StorageFactory::open(kind, &config.storage_options());
    Ok(store)
}

fn init_config(force: bool) -> Result<()> {
    let config_dir = path_resolver::config_dir();
    let config_path = config_dir.join("config.toml");

    eprintln!("Initializing personal-memory configuration...");
    eprintln!("Config directory: {}", config_dir.display());

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        eprintln!("Created config directory");
    }

    if config_path.exists() && !force {
        eprintln!("Configuration file already exists: {}", config_path.display());
        eprintln!("Use --force to overwrite");
        return Ok(());
    }

    let toml_content = AppConfig::default().to_toml()?;
    write_config(&config_path, &toml_content)?;

    eprintln!("Created configuration file: {}", config_path.display());
    eprintln!("\nConfiguration initialized successfully!");
    eprintln!("Edit {} to customize settings.", config_path.display());
    Ok(())
}

fn write_config(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content)
        .map_err(|e| anyhow!("Failed to write config file {}: {}", path.display(), e))
}

fn print_notes(store: &mut dyn NoteStore, query: Option<&str>) -> Result<()> {
    let notes = match query {
        Some(query) => store.search_notes(query),
        None => store.get_all_notes(),
    };
    println!("{}", messages::notes_or_empty(&notes)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging (to stderr to not interfere with MCP stdio)
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::Init { force } => init_config(force),
        Commands::Serve => serve(open_store(&cli.storage)?).await,
        Commands::Add {
            text,
            timestamp,
            tags,
        } => {
            let mut store = open_store(&cli.storage)?;
            let new_note = NewNote {
                text,
                timestamp,
                tags: if tags.is_empty() { None } else { Some(tags) },
            };
            let note = store.add_note(new_note);
            store.flush().await;
            println!("{}", messages::note_stored(&note));
            Ok(())
        }
        Commands::Search { query } => {
            let mut store = open_store(&cli.storage)?;
            print_notes(store.as_mut(), Some(query.as_str()))
        }
        Commands::List => {
            let mut store = open_store(&cli.storage)?;
            print_notes(store.as_mut(), None)
        }
        Commands::Delete { id } => {
            let mut store = open_store(&cli.storage)?;
            let deleted = store.delete_note(&id);
            store.flush().await;
            if deleted {
                println!("{}", messages::note_deleted(&id));
            } else {
                println!("{}", messages::note_not_found(&id));
            }
            Ok(())
        }
    }
}

async fn serve(store: Box<dyn NoteStore>) -> Result<()> {
    tracing::info!("Starting MCP server with {} storage", store.kind());
    eprintln!(
        "personal-memory MCP server starting... (storage: {})",
        store.kind()
    );

    let server = NotesMcpServer::new(store);
    let storage = server.storage();

    // Serve via stdio transport
    let transport = (stdin(), stdout());
    let service = server.serve(transport).await?;
    eprintln!("Personal Memory MCP Server started on stdio.");

    let _quit_reason = service.waiting().await?;

    // Let background saves land before exiting.
    storage.lock().await.flush().await;
    Ok(())
}
