use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use intake_engine::{
    BackendClient, MemoryBackend, ModelLocator, RecordResolver, ResolverConfig,
    config::{load_config, load_config_from_path, validate_config},
};
use intake_types::ModelDescriptor;
use serde_json::{Value, json};
use tracing::debug;

/// Resolve records by identifier against a backend fixture.
#[derive(Parser, Debug)]
#[command(name = "intake", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve one record and print it as JSON, or `null`
    Fetch {
        #[command(flatten)]
        backend: BackendArgs,

        /// Record identifier
        #[arg(long)]
        id: String,

        /// Override the execution timeout
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Print the entity model name the locator settles on, or `null`
    Locate {
        #[command(flatten)]
        backend: BackendArgs,
    },
    /// List the fixture's schema registry
    Models {
        /// Path to the backend fixture JSON
        #[arg(long)]
        fixture: PathBuf,
    },
}

#[derive(Args, Debug)]
struct BackendArgs {
    /// Path to the backend fixture JSON
    #[arg(long)]
    fixture: PathBuf,

    /// Resolver settings file; defaults to INTAKE_CONFIG_PATH or the user config dir
    #[arg(long)]
    config: Option<PathBuf>,
}

impl BackendArgs {
    fn load(&self) -> Result<(MemoryBackend, ResolverConfig)> {
        let backend = MemoryBackend::from_path(&self.fixture)?;
        debug!(fixture = %self.fixture.display(), models = backend.fixture().models.len(), "backend fixture loaded");
        let config = match &self.config {
            Some(path) => load_config_from_path(path)?,
            None => load_config()?,
        };
        Ok((backend, config))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let output = run(Cli::parse()).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run(cli: Cli) -> Result<Value> {
    match cli.command {
        Command::Fetch { backend, id, timeout_ms } => {
            let (backend, mut config) = backend.load()?;
            if let Some(timeout_ms) = timeout_ms {
                config = config.with_execution_timeout(Duration::from_millis(timeout_ms));
                validate_config(&config)?;
            }
            let resolver = RecordResolver::with_client(config, Arc::new(backend));
            let record = resolver.fetch_by_id(&id).await;
            Ok(serde_json::to_value(record)?)
        }
        Command::Locate { backend } => {
            let (backend, config) = backend.load()?;
            let located = ModelLocator::from_config(&config).resolve(&backend);
            Ok(located.map_or(Value::Null, |located| json!(located.name)))
        }
        Command::Models { fixture } => {
            let backend = MemoryBackend::from_path(&fixture)?;
            let entries = backend.schema_registry()?;
            Ok(Value::Array(entries.into_iter().map(|(key, descriptor)| model_entry(key, descriptor)).collect()))
        }
    }
}

fn model_entry(key: String, descriptor: ModelDescriptor) -> Value {
    json!({
        "key": key,
        "name": descriptor.name,
        "displayLabel": descriptor.display_label,
        "label": descriptor.label,
    })
}
