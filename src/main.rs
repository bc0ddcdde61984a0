// Initialize configuration
// Set up logging
// Pick the storage backend
// Start the indexer and run until Ctrl-C

use chain_indexer::{
    db::{connection, MemoryDatabase, SqliteDatabase},
    normalize_address, AddressIndexStore, Config, HttpNodeClient, Indexer, NodeClient, Storage,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting chain-indexer");

    let config = Config::from_env();
    info!("Configuration loaded: {:?}", config);

    let storage: Arc<dyn Storage> = match &config.database_url {
        Some(url) => {
            let pool = connection::establish_connection(url).await?;
            Arc::new(AddressIndexStore::new(SqliteDatabase::new(pool)))
        }
        None => Arc::new(AddressIndexStore::new(MemoryDatabase::new())),
    };

    let client: Arc<dyn NodeClient> = Arc::new(HttpNodeClient::new(&config)?);
    let indexer = Indexer::new(&config, client, storage).await?;

    for address in &config.subscribe_addresses {
        match normalize_address(address) {
            Ok(address) => {
                indexer.subscribe_address(&address).await?;
                info!("Address {} subscribed", address);
            }
            Err(e) => warn!("Ignoring subscription: {}", e),
        }
    }

    indexer.start().await;

    tokio::signal::ctrl_c().await?;
    info!("Stopping indexer...");
    indexer.stop().await;

    Ok(())
}
