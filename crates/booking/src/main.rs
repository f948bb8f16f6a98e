//! Maintenance entry point: runs the cache rebuild (and optionally the
//! legacy re-keying migration) against a JSON store snapshot file.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use practicum_booking::config::BookingConfig;
use practicum_booking::context::SystemClock;
use practicum_booking::notify::LogDispatcher;
use practicum_booking::{AppContext, RepairService};
use practicum_db::MemoryStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "practicum_maintenance=info,practicum_booking=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let snapshot = std::env::var("STORE_SNAPSHOT")
        .context("STORE_SNAPSHOT must point to a JSON store snapshot file")?;
    let rekey = std::env::var("REKEY_LEGACY")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let path = Path::new(&snapshot);
    let store = MemoryStore::load_snapshot(path)
        .await
        .with_context(|| format!("loading snapshot from {snapshot}"))?;
    let ctx = AppContext::new(
        Arc::new(store.clone()),
        Arc::new(LogDispatcher),
        Arc::new(SystemClock),
        BookingConfig::from_env(),
    );

    if rekey {
        let summary = RepairService::rekey_legacy_reservations(&ctx)
            .await
            .context("legacy re-keying failed")?;
        tracing::info!(?summary, "Re-keying done");
    }

    let summary = RepairService::rebuild_availability_caches(&ctx)
        .await
        .context("cache rebuild failed")?;
    tracing::info!(?summary, "Rebuild done");

    store
        .dump_snapshot(path)
        .await
        .with_context(|| format!("writing snapshot back to {snapshot}"))?;
    Ok(())
}
