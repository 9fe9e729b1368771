//! poa-daemon: drives reward distribution for a proof-of-authority network.
//!
//! Single OS process running a Tokio async runtime. Rotation state and the
//! distribution log live in `$POA_DATA_DIR/rewards.db`; the validator set
//! is read from a TOML file on every refresh.

mod config;
mod events;
mod trigger;

use std::sync::Arc;
use std::time::Duration;

use poa_db::SqliteStore;
use poa_registry::FileRegistry;
use poa_rewards::SystemClock;
use tracing::{debug, info};

use crate::config::DaemonConfig;
use crate::events::{Event, EventBus};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = DaemonConfig::load()?;

    // 2. Initialize tracing; RUST_LOG overrides the configured level
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(config.log_directives()))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("poa reward daemon starting");

    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)?;

    // 3. Open database and registry
    let db_path = data_dir.join(poa_db::DB_FILE_NAME);
    let store = SqliteStore::open(&db_path)?;
    let registry = FileRegistry::new(config.validators_path());
    info!(
        db = %db_path.display(),
        validators = %registry.path().display(),
        "storage opened"
    );

    // 4. Attach the scheduler
    let proxy = trigger::build_proxy(&config, store, Arc::new(SystemClock))?;

    // 5. Create event bus and a logging subscriber
    let event_bus = EventBus::new(1000);
    let mut log_rx = event_bus.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = log_rx.recv().await {
            debug!(
                event_type = %event.event_type,
                payload = %event.payload,
                "event"
            );
        }
    });

    event_bus.emit(Event {
        event_type: "DaemonStarted".to_string(),
        timestamp: std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs(),
        payload: serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "implementation": proxy.implementation(),
        }),
    });

    // 6. Run the trigger until shutdown
    let period = Duration::from_secs(config.advanced.poll_interval_secs);
    tokio::select! {
        _ = trigger::run(
            proxy,
            &registry,
            config.access.system_address,
            event_bus.clone(),
            period,
        ) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }

    info!(events = event_bus.sequence(), "Daemon stopped");
    Ok(())
}
