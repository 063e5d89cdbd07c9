//! Assurance - chaining schedules for field inspections

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};

use assurance::{
    config::Args,
    db::{MongoClient, MongoStore},
    logging, server,
    store::InMemoryStore,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    logging::init(&args.log_level, args.log_json);

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Assurance - chaining scheduler");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("MongoDB: {} / {}", args.mongodb_uri, args.mongodb_db);
    info!("Default timezone: {}", args.default_timezone);
    info!("======================================");

    // MongoDB is optional in dev mode
    let state = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => {
            let store = Arc::new(MongoStore::open(&client).await?);
            info!("MongoDB store ready");
            AppState::new(args, store, "mongodb")?
        }
        Err(e) => {
            if args.dev_mode {
                warn!("MongoDB connection failed (dev mode, using in-memory store): {}", e);
                AppState::new(args, Arc::new(InMemoryStore::new()), "memory")?
            } else {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        }
    };

    server::run(Arc::new(state)).await?;

    Ok(())
}
