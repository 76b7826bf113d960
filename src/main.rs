//! Command line client for one remote CRUD resource.
//!
//! ```text
//! resource-cli --base-url https://apistreamline.com/mock/PROJECT --resource users list
//! resource-cli create --data '{"name":"John Doe","email":"john@example.com","role":"developer"}'
//! resource-cli update 1 --data '{"role":"senior developer"}'
//! resource-cli delete 1
//! resource-cli demo
//! ```

use clap::{Parser, Subcommand};
use serde_json::json;
use std::future::Future;
use std::path::PathBuf;

use resource_client::config::{load_config, ClientConfig, RetryConfig};
use resource_client::observability::{logging, metrics};
use resource_client::{Fields, RecordId, ResourceClient};

#[derive(Parser)]
#[command(name = "resource-cli")]
#[command(about = "CRUD client for a single remote REST resource", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Service base URL (overrides the config file).
    #[arg(short, long)]
    base_url: Option<String>,

    /// Resource name (overrides the config file).
    #[arg(short, long)]
    resource: Option<String>,

    /// Per-attempt request timeout in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Make a single attempt per operation.
    #[arg(long)]
    no_retry: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch all records
    List,
    /// Create a record from a JSON object
    Create {
        #[arg(short, long)]
        data: String,
    },
    /// Apply a partial update to a record
    Update {
        id: String,
        #[arg(short, long)]
        data: String,
    },
    /// Delete a record
    Delete { id: String },
    /// List, create, update and delete a sample record
    Demo,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };
    if let Some(base_url) = cli.base_url {
        config.endpoint.base_url = base_url;
    }
    if let Some(resource) = cli.resource {
        config.endpoint.resource = resource;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.timeouts.request_ms = timeout_ms;
    }
    if cli.no_retry {
        config.retries = RetryConfig::disabled();
    }

    logging::init_logging(&config.observability)?;

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let client: ResourceClient<Fields> = ResourceClient::new(config)?;
    tracing::info!(collection_url = %client.collection_url(), "Client ready");

    let result = until_interrupted(run(&client, cli.command), ctrl_c()).await;
    if matches!(&result, Err(e) if e.is::<Interrupted>()) {
        tracing::warn!(in_flight = client.in_flight().len(), "Interrupted, cancelled in-flight operation");
    }
    result
}

/// The command was cancelled by a signal before it finished.
#[derive(Debug, thiserror::Error)]
#[error("interrupted before the operation completed")]
struct Interrupted;

/// Drive `work` to completion unless `interrupt` resolves first, in which
/// case `work` is dropped and the result is [`Interrupted`].
async fn until_interrupted<F, S>(work: F, interrupt: S) -> Result<(), Box<dyn std::error::Error>>
where
    F: Future<Output = Result<(), Box<dyn std::error::Error>>>,
    S: Future<Output = ()>,
{
    tokio::select! {
        result = work => result,
        _ = interrupt => Err(Interrupted.into()),
    }
}

async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::error!("Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}

async fn run(client: &ResourceClient<Fields>, command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::List => {
            let records = client.list().await?;
            print_json(&records)?;
        }
        Commands::Create { data } => {
            let payload: Fields = serde_json::from_str(&data)?;
            let record = client.create(&payload).await?;
            print_json(&record)?;
        }
        Commands::Update { id, data } => {
            let id = parse_id(id)?;
            let patch: Fields = serde_json::from_str(&data)?;
            let record = client.update(&id, &patch).await?;
            print_json(&record)?;
        }
        Commands::Delete { id } => {
            let id = parse_id(id)?;
            client.remove(&id).await?;
            println!("Deleted {}", id);
        }
        Commands::Demo => run_demo(client).await?,
    }
    Ok(())
}

async fn run_demo(client: &ResourceClient<Fields>) -> Result<(), Box<dyn std::error::Error>> {
    println!("Fetching all records...");
    let records = client.list().await?;
    println!("Found {} records", records.len());
    if let Some(first) = records.first() {
        println!("Sample record: {}", serde_json::to_string(first)?);
    }

    println!("\nCreating record...");
    let payload: Fields = serde_json::from_value(json!({
        "name": "John Doe",
        "email": "john@example.com",
        "role": "developer",
    }))?;
    let created = client.create(&payload).await?;
    print_json(&created)?;

    println!("\nUpdating record {}...", created.id);
    let updated = client.update(&created.id, &json!({"role": "senior developer"})).await?;
    print_json(&updated)?;

    println!("\nDeleting record {}...", created.id);
    client.remove(&created.id).await?;
    println!("Deleted {}", created.id);

    let cached = client.snapshot().map_or(0, |records| records.len());
    println!("\nCache holds {} records", cached);
    Ok(())
}

fn parse_id(id: String) -> Result<RecordId, Box<dyn std::error::Error>> {
    RecordId::new(id).ok_or_else(|| "record id must not be empty".into())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
