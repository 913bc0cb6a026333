use std::path::Path;
use std::sync::Arc;

use salvo::conn::TcpListener;
use salvo::logging::Logger;
use salvo::{Listener, Router};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

use cadence_app::app::api::routes;
use cadence_app::config::ConfigHandler;
use cadence_app::store_handler::StoreHandler;
use cadence_core::config::load_config;
use cadence_db::db::memory::MemoryStore;
use cadence_db::db::snapshot::load_snapshot;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting Cadence scheduling server");

    let config = load_config()?;

    tracing::info!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping debug");
    }

    let store = match &config.seed {
        Some(seed) => {
            let store = load_snapshot(Path::new(&seed.path))?;
            tracing::info!(path = %seed.path, "Store seeded from snapshot");
            store
        }
        None => MemoryStore::default(),
    };

    let bind_addr = config.server.bind_addr();
    let acceptor = TcpListener::new(bind_addr.clone()).bind().await;

    let router = Router::new()
        .hoop(Logger::new())
        .hoop(StoreHandler {
            store: Arc::new(store),
        })
        .hoop(ConfigHandler {
            settings: config.clone(),
        })
        .push(routes()?);

    tracing::info!("Server listening on {bind_addr}");

    salvo::Server::new(acceptor).serve(router).await;

    Ok(())
}
