use std::sync::Arc;

use crate::cache::SettingsCache;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the pool is reference counted and the rest sits behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub pool: angus_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Tenant settings read-through cache.
    pub settings: Arc<SettingsCache>,
}

impl AppState {
    pub fn new(pool: angus_db::DbPool, config: ServerConfig) -> Self {
        let settings = Arc::new(SettingsCache::new(std::time::Duration::from_secs(
            config.settings_cache_ttl_secs,
        )));
        Self {
            pool,
            config: Arc::new(config),
            settings,
        }
    }
}
