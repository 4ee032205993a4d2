use std::sync::Arc;

use tracing::{info, warn};

use roombook::clock::{Clock, SystemClock};
use roombook::compactor::{maybe_compact, run_compactor};
use roombook::config::{Config, seed_rooms};
use roombook::notify::NotifyHub;
use roombook::scheduler::Scheduler;
use roombook::store::{RoomStore, WalStore};

const HOUR_MS: i64 = 3_600_000;

/// Host process: durable store, seeded rooms, metrics, compaction and a
/// notice log. Embedders drive the scheduler in-process.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env();
    roombook::observability::init(config.metrics_port)?;

    std::fs::create_dir_all(&config.data_dir)?;
    let store = Arc::new(WalStore::open(&config.wal_path())?);
    let created = seed_rooms(store.as_ref(), &config.seed_rooms).await?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let hub = Arc::new(NotifyHub::new(clock.clone()));
    let scheduler = Scheduler::new(clock.clone(), store.clone(), hub.clone());

    let now = clock.now();
    let free = scheduler.get_available_rooms(now, now + HOUR_MS).await?;
    info!("roombook ready");
    info!("  wal: {}", config.wal_path().display());
    info!("  rooms: {} ({created} seeded, {} free this hour)", store.room_count(), free.len());
    info!("  metrics: {}", config.metrics_port.map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics")));

    let mut notices = hub.subscribe_all();
    let notice_log = tokio::spawn(async move {
        while let Ok(notice) = notices.recv().await {
            match notice.to_json() {
                Ok(line) => info!("notice {line}"),
                Err(e) => warn!("unrenderable notice: {e}"),
            }
        }
    });
    let compactor = tokio::spawn(run_compactor(store.clone(), config.compact_threshold));

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    compactor.abort();
    notice_log.abort();

    // Leave a short log behind for the next start
    if maybe_compact(&store, 1).await {
        info!("final compaction done");
    }
    let rooms = store.find_all().await?;
    info!("roombook stopped with {} rooms", rooms.len());
    Ok(())
}
