//! Meshreg Binary Entry Point
//!
//! Registers component definitions from files and lists stored components.
//! Core functionality is provided by the `meshreg` library crate.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use meshreg::{
    ComponentDefinition, ComponentFilter, DatabaseEngine, OrderField, SortOrder,
    config::{AppConfig, ConfigError},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Meshreg - content-addressed component registry
#[derive(Parser, Debug)]
#[command(name = "meshreg", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "MESHREG_CONFIG")]
    config: Option<PathBuf>,

    /// Storage engine (overrides config file); required without a config file
    #[arg(long, env = "MESHREG_ENGINE")]
    engine: Option<DatabaseEngine>,

    /// Database path (overrides config file)
    #[arg(long, env = "MESHREG_DB_PATH")]
    db_path: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a component definition (JSON or YAML, with embedded model)
    Register {
        /// Definition file
        file: PathBuf,
    },
    /// List stored components as JSON
    List(ListArgs),
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Component kind
    #[arg(long)]
    name: Option<String>,

    /// Prefix-match the kind instead of matching exactly
    #[arg(long)]
    greedy: bool,

    #[arg(long)]
    api_version: Option<String>,

    #[arg(long)]
    model_name: Option<String>,

    #[arg(long)]
    model_version: Option<String>,

    /// Column to order on (kind, api_version, display_name, format,
    /// created_at, updated_at, model_name, model_version)
    #[arg(long)]
    order_on: Option<OrderField>,

    /// "desc" sorts descending; anything else ascending
    #[arg(long, default_value = "asc")]
    sort: String,

    /// Maximum rows; 0 returns everything
    #[arg(long, default_value_t = 0)]
    limit: u32,

    #[arg(long, default_value_t = 0)]
    offset: u32,
}

impl From<ListArgs> for ComponentFilter {
    fn from(args: ListArgs) -> Self {
        Self {
            name: args.name.unwrap_or_default(),
            api_version: args.api_version.unwrap_or_default(),
            greedy: args.greedy,
            model_name: args.model_name.unwrap_or_default(),
            version: args.model_version.unwrap_or_default(),
            sort: SortOrder::from_loose(&args.sort),
            order_on: args.order_on,
            limit: args.limit,
            offset: args.offset,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,meshreg=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration from file, or fall back to defaults
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            AppConfig::load(path)?
        }
        None => AppConfig::default(),
    };

    // Apply CLI/env overrides (CLI > ENV > config file)
    if let Some(engine) = cli.engine {
        config.database.engine = Some(engine);
    }
    if let Some(path) = cli.db_path {
        config.database.path = path;
    }
    config.validate()?;

    if let Some(engine) = config.database.engine {
        tracing::info!("Database: {} ({})", config.database.path, engine);
    }

    let handles = config.registry_builder().build().await?;

    let result = match cli.command {
        Command::Register { file } => register(&handles, &file).await,
        Command::List(args) => list(&handles, args.into()).await,
    };

    handles.shutdown().await?;
    result
}

/// Register the definition stored in `file` and print its id.
async fn register(
    handles: &meshreg::RegistryHandles,
    file: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = tokio::fs::read_to_string(file).await?;
    let component = parse_definition(file, &content)?;

    let id = handles.components.register(&component).await?;
    tracing::info!(
        component_id = %id,
        kind = %component.kind(),
        model = %component.model.name,
        "Registered component"
    );
    println!("{id}");
    Ok(())
}

/// Print components matching `filter` as a JSON array.
async fn list(
    handles: &meshreg::RegistryHandles,
    filter: ComponentFilter,
) -> Result<(), Box<dyn std::error::Error>> {
    let components = handles.components.query(&filter).await?;
    tracing::debug!(count = components.len(), "Components matched");
    println!("{}", serde_json::to_string_pretty(&components)?);
    Ok(())
}

/// Parse a definition as JSON when the extension says so, YAML otherwise.
fn parse_definition(file: &Path, content: &str) -> Result<ComponentDefinition, ConfigError> {
    let is_json = file
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(content).map_err(|e| {
            ConfigError::ValidationError(format!("invalid definition '{}': {e}", file.display()))
        })
    } else {
        Ok(serde_yaml::from_str(content)?)
    }
}
