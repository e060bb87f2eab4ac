//! restmodel CLI
//!
//! Command-line client for JSON REST resources.
//!
//! # Commands
//!
//! - `get` - Load one entity
//! - `list` - Load a collection, optionally filtered by query parameters
//! - `create` - Create an entity from a JSON object
//! - `update` - Apply a JSON object to an entity and save it
//! - `delete` - Delete an entity

mod commands;

use clap::{Parser, Subcommand};
use commands::Context;
use restmodel_core::{ResourceDef, DEFAULT_ID_ATTRIBUTE};
use restmodel_http::{HttpConfig, ReqwestClient};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Command-line client for JSON REST resources.
#[derive(Parser)]
#[command(name = "restmodel")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Base URL of the API (e.g. https://api.example.com)
    #[arg(global = true, short, long)]
    base_url: Option<String>,

    /// Attribute holding the entity identifier
    #[arg(global = true, short, long, default_value = DEFAULT_ID_ATTRIBUTE)]
    id_attribute: String,

    /// Request timeout in seconds
    #[arg(global = true, long, default_value = "30")]
    timeout_secs: u64,

    /// Extra request header (Name: value), repeatable
    #[arg(global = true, short = 'H', long = "header")]
    headers: Vec<String>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load one entity
    Get {
        /// Resource root (e.g. /users)
        resource: String,

        /// Entity identifier
        id: String,
    },

    /// Load a collection
    List {
        /// Resource root (e.g. /users)
        resource: String,

        /// Query parameter (key=value), repeatable
        #[arg(short, long)]
        query: Vec<String>,

        /// Listing URL when it differs from the resource root
        #[arg(short, long)]
        endpoint: Option<String>,
    },

    /// Create an entity
    Create {
        /// Resource root (e.g. /users)
        resource: String,

        /// Attributes as a JSON object
        data: String,
    },

    /// Update an entity
    Update {
        /// Resource root (e.g. /users)
        resource: String,

        /// Entity identifier
        id: String,

        /// Attributes to change as a JSON object
        data: String,

        /// Send only the given attributes instead of merging into the loaded record
        #[arg(short, long)]
        replace: bool,
    },

    /// Delete an entity
    Delete {
        /// Resource root (e.g. /users)
        resource: String,

        /// Entity identifier
        id: String,
    },
}

impl Commands {
    fn resource(&self) -> &str {
        match self {
            Commands::Get { resource, .. }
            | Commands::List { resource, .. }
            | Commands::Create { resource, .. }
            | Commands::Update { resource, .. }
            | Commands::Delete { resource, .. } => resource,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let base_url = cli.base_url.as_deref().ok_or("--base-url is required")?;
    let mut config = HttpConfig::new(base_url).with_timeout(Duration::from_secs(cli.timeout_secs));
    for raw in &cli.headers {
        let (name, value) = commands::parse_header(raw)?;
        config = config.with_header(name, value);
    }
    let client = Arc::new(ReqwestClient::new(config)?);

    let root = cli.command.resource();
    let name = root.trim_end_matches('/').rsplit('/').next().unwrap_or(root);
    let resource = Arc::new(ResourceDef::new(name, root).with_id_attribute(cli.id_attribute.as_str()));
    let ctx = Context::new(resource, client);

    let output = match &cli.command {
        Commands::Get { id, .. } => commands::get::run(&ctx, id).await?,
        Commands::List {
            query, endpoint, ..
        } => commands::list::run(&ctx, endpoint.as_deref(), query).await?,
        Commands::Create { data, .. } => commands::create::run(&ctx, data).await?,
        Commands::Update {
            id, data, replace, ..
        } => commands::update::run(&ctx, id, data, *replace).await?,
        Commands::Delete { id, .. } => commands::delete::run(&ctx, id).await?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
