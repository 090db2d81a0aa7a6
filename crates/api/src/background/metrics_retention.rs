//! Periodic cleanup of old node metric samples.
//!
//! Agents push a sample every few seconds, so `node_metrics` grows without
//! bound unless old rows are removed.

use std::time::Duration;

use angus_db::repositories::NodeRepo;
use chrono::Utc;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// How often the cleanup job runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

/// Delete samples older than `retention_hours` once per interval until
/// `cancel` fires.
pub async fn run(pool: PgPool, retention_hours: i64, cancel: CancellationToken) {
    tracing::info!(
        retention_hours,
        interval_secs = CLEANUP_INTERVAL.as_secs(),
        "Metrics retention job started"
    );

    let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Metrics retention job stopping");
                break;
            }
            _ = interval.tick() => {
                let cutoff = Utc::now() - chrono::Duration::hours(retention_hours);
                match NodeRepo::delete_metrics_older_than(&pool, cutoff).await {
                    Ok(0) => tracing::debug!("Metrics retention: no rows to purge"),
                    Ok(deleted) => tracing::info!(deleted, "Metrics retention: purged old rows"),
                    Err(e) => tracing::error!(error = %e, "Metrics retention: cleanup failed"),
                }
            }
        }
    }
}
