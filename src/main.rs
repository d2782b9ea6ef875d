//! searchforge CLI (Rust)
//!
//! Commands:
//! - `search` - Build and run a tuned full-text query, print the result page as JSON
//! - `init` - Provision every configured index (mapping, analyzers, inference pipeline)
//! - `sync` - Project entities from a file and bulk-index them
//! - `drop-index` - Delete an index and wait until it is gone
//! - `schema` - Print the JSON schema of search options

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use searchforge::config::load_config;
use searchforge::error::SearchError;
use searchforge::index::JsonProjector;
use searchforge::search::{DocumentResult, SearchOptions};
use searchforge::sync::{SyncOperation, SyncPayload};
use searchforge::{EngineConfig, SearchService};
use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity flags
    let log_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr) // Log to stderr to keep stdout clean
        .init();

    let result = match cli.command {
        Some(Commands::Search(args)) => execute_search_cli(cli.config.as_deref(), args).await,
        Some(Commands::Init) => execute_init_cli(cli.config.as_deref()).await,
        Some(Commands::Sync(args)) => execute_sync_cli(cli.config.as_deref(), args).await,
        Some(Commands::DropIndex(args)) => execute_drop_index_cli(cli.config.as_deref(), args).await,
        Some(Commands::Schema) => execute_schema_cli(),
        None => {
            eprintln!("Error: No command specified. Use --help for usage information.");
            std::process::exit(1);
        }
    };

    match result {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(get_exit_code(&e));
        }
    }
}

fn load(path: Option<&Path>) -> Result<EngineConfig> {
    let config = load_config(path)?;
    info!(
        "Using engine at {} (enabled: {}, prefix: '{}')",
        config.url, config.enabled, config.index_prefix
    );
    Ok(config)
}

/// Execute search command in CLI mode
async fn execute_search_cli(config: Option<&Path>, args: cli::SearchArgs) -> Result<String> {
    let options: SearchOptions = args.to_options()?;
    let service = SearchService::builder(load(config)?).build()?;

    let result: DocumentResult = if args.fields.is_empty() {
        service.search_registered(&args.index, &args.query, &options).await?
    } else {
        service.search(&args.index, &args.fields, &args.query, &options).await?
    };

    if result.semantic_unavailable() {
        warn!("Semantic model is not deployed; results use lexical matching only");
    }
    Ok(serde_json::to_string_pretty(&result)?)
}

/// Execute init command in CLI mode
async fn execute_init_cli(config: Option<&Path>) -> Result<String> {
    let service = SearchService::builder(load(config)?).build()?;
    let report = service.initialize_registered_indexes().await;
    let output = serde_json::to_string_pretty(&report)?;

    if !report.failed.is_empty() {
        println!("{}", output);
        let (index, reason) = &report.failed[0];
        return Err(SearchError::Provisioning {
            index: index.clone(),
            reason: reason.clone(),
        }
        .into());
    }
    Ok(output)
}

/// Execute sync command in CLI mode
async fn execute_sync_cli(config: Option<&Path>, args: cli::SyncArgs) -> Result<String> {
    let mut builder = SearchService::builder(load(config)?);
    if !args.fields.is_empty() {
        builder = builder.register_index(&args.index, args.fields.as_slice())?;
    }
    let service = builder.build()?;

    let entities = read_entities(&args.file)?;
    service.ensure_registered_index(&args.index).await?;

    let fields = service.registry().fields(&args.index)?.to_vec();
    let projector = JsonProjector::new(args.index.clone(), fields);

    let mut payloads = Vec::with_capacity(entities.len());
    let mut rejected = 0;
    for entity in &entities {
        match projector.project(entity) {
            Ok(doc) => payloads.push(SyncPayload::new(args.index.clone(), SyncOperation::Index(doc))),
            Err(e) => {
                warn!("Skipping entity: {}", e);
                rejected += 1;
            }
        }
    }

    let mut report = service.sync().bulk_sync(&payloads).await;
    report.attempted += rejected;
    report.failed += rejected;
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Execute drop-index command in CLI mode
async fn execute_drop_index_cli(config: Option<&Path>, args: cli::DropIndexArgs) -> Result<String> {
    let service = SearchService::builder(load(config)?).build()?;
    let target = service.config().qualified_index(&args.index);

    let deleted = service.manager().drop_index(&target).await?;
    Ok(if deleted {
        format!("Deleted index {}", target)
    } else {
        format!("Index {} does not exist", target)
    })
}

/// Execute schema command in CLI mode
fn execute_schema_cli() -> Result<String> {
    let schema = schemars::schema_for!(SearchOptions);
    Ok(serde_json::to_string_pretty(&schema)?)
}

/// A JSON array of entities, or one entity per line
fn read_entities(path: &Path) -> Result<Vec<Value>> {
    let data = std::fs::read_to_string(path).map_err(SearchError::from)?;
    let trimmed = data.trim_start();

    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str::<Vec<Value>>(trimmed)
            .map_err(|e| SearchError::InvalidInput(format!("{}: {}", path.display(), e)))?);
    }

    let mut entities = Vec::new();
    for (line_no, line) in data.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let entity = serde_json::from_str::<Value>(line).map_err(|e| {
            SearchError::InvalidInput(format!("{} line {}: {}", path.display(), line_no + 1, e))
        })?;
        entities.push(entity);
    }
    Ok(entities)
}

/// Map an error to a process exit code
fn get_exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<SearchError>() {
        Some(e) if e.is_input_error() => 1, // Invalid arguments or query
        Some(e) if e.is_transport_error() => 2, // Engine unreachable or misbehaving
        Some(SearchError::Provisioning { .. }) => 2,
        Some(SearchError::EngineDisabled) | Some(SearchError::Config(_)) => 3,
        Some(_) => 5,
        None => {
            let err_str = err.to_string().to_lowercase();
            if err_str.contains("invalid") || err_str.contains("usage") {
                1
            } else if err_str.contains("config") {
                3
            } else {
                5
            }
        }
    }
}
