//! Bloggy - blog post CRUD service

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bloggy::{config::Args, server, storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("bloggy={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Bloggy");
    info!("======================================");
    info!("Node ID: {}", args.node_id);
    info!("Listen: {}", args.listen);
    info!("Backend: {}", args.backend);
    if args.backend == bloggy::config::Backend::Mongo {
        info!(
            "MongoDB: {}.{}",
            args.mongo.mongodb_db, args.mongo.mongodb_collection
        );
    }
    info!("Request timeout: {}ms", args.request_timeout_ms);
    info!("======================================");

    let store = match storage::open(args.backend, &args.mongo).await {
        Ok(store) => store,
        Err(e) => {
            error!("Storage initialization failed: {}", e);
            std::process::exit(1);
        }
    };

    let state = Arc::new(server::AppState::new(args, Arc::clone(&store)));

    tokio::select! {
        result = server::run(state) => {
            if let Err(e) = result {
                error!("Server error: {:?}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    if let Err(e) = store.disconnect().await {
        warn!("Storage disconnect failed: {}", e);
    }

    Ok(())
}
