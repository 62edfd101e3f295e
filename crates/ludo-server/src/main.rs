//! Game server binary for Ludo Arena.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `ludo-config.yaml` (or `LUDO_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Connect the room store: `Dragonfly` when configured, else memory
//! 4. Build the room registry and serve HTTP + `WebSocket` until `Ctrl-C`

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use ludo_core::config::LoggingConfig;
use ludo_core::{InMemoryRepository, LudoConfig, RoomRegistry, RoomRepository};
use ludo_db::DragonflyRepository;
use ludo_server::{AppState, start_server};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "ludo-config.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!(
        host = %config.server.host,
        port = config.server.port,
        seed = ?config.seed,
        "ludo-server starting"
    );

    // 3. Room store.
    let repo: Arc<dyn RoomRepository> = match &config.store.dragonfly_url {
        Some(url) => {
            let store = DragonflyRepository::connect(url, config.store.room_ttl_seconds)
                .await
                .context("connecting to Dragonfly")?;
            Arc::new(store)
        }
        None => {
            info!("No Dragonfly URL configured, rooms are kept in memory");
            Arc::new(InMemoryRepository::new())
        }
    };

    // 4. Serve.
    let host = config.server.host.clone();
    let port = config.server.port;
    let registry = RoomRegistry::new(Arc::new(config), repo);
    let state = Arc::new(AppState::new(registry));
    start_server(&host, port, state).await?;
    Ok(())
}

/// Load `LUDO_CONFIG` or the default file; fall back to defaults plus
/// environment overrides when the file is absent.
fn load_config() -> anyhow::Result<LudoConfig> {
    let path = std::env::var("LUDO_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_owned());
    let path = Path::new(&path);
    if path.exists() {
        LudoConfig::from_file(path).with_context(|| format!("loading {}", path.display()))
    } else {
        let mut config = LudoConfig::default();
        config.apply_env_overrides();
        Ok(config)
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    if logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}
