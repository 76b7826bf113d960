//! Local stand-in for the hosted mock API.
//!
//! ```text
//! cargo run --features mock --bin mock-server -- --bind 127.0.0.1:3000 --base-path /api
//! resource-cli --base-url http://127.0.0.1:3000/api demo
//! ```

use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use resource_client::mock::{serve, MockOptions, MockState};

#[derive(Parser)]
#[command(name = "mock-server")]
#[command(about = "In-memory CRUD service for trying out resource-cli", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "127.0.0.1:3000")]
    bind: String,

    #[arg(short, long, default_value = "users")]
    resource: String,

    #[arg(long, default_value = "/api")]
    base_path: String,

    /// Fields that must be present on create (repeatable).
    #[arg(long = "require")]
    required_fields: Vec<String>,

    /// Answer 204 when deleting an id that does not exist.
    #[arg(long)]
    idempotent_delete: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resource_client=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let options = MockOptions {
        resource: cli.resource,
        base_path: cli.base_path,
        required_fields: cli.required_fields,
        idempotent_delete: cli.idempotent_delete,
    };

    let listener = TcpListener::bind(&cli.bind).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(
        address = %local_addr,
        resource = %options.resource,
        base_path = %options.normalized_base_path(),
        "Mock service listening"
    );

    let state = Arc::new(MockState::new(options));
    serve(listener, state, shutdown_signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::error!("Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
