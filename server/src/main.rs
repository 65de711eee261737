mod config;
mod error;
mod handler;
mod http;
mod router;
mod server;
mod store;

use std::{process, sync::Arc};

use server::Server;
use store::{fs::DirectoryStore, ByteStore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = match crate::config::Config::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("{err:#}");
            process::exit(1);
        }
    };
    tracing::debug!(?config, "loaded configuration");

    let store = DirectoryStore::new(&config.directory);
    tracing::info!(root = ?store.root(), "serving files");

    let state = AppState {
        store: Arc::new(store),
    };

    let server = Server::new(state, router::route_request, &config);

    if let Err(err) = server.bind(config.address.as_str()).await {
        tracing::error!(%err, "server failed");
        process::exit(1);
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ByteStore + Send + Sync>,
}
