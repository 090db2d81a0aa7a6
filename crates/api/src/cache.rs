//! In-process read-through cache of tenant settings.
//!
//! Settings are read on most indicator lookups and change rarely. Entries
//! expire after a fixed TTL and every settings write evicts its tenant.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use angus_core::types::DbId;
use angus_db::models::setting::TenantSettings;
use angus_db::repositories::SettingRepo;
use sqlx::PgPool;
use tokio::sync::RwLock;

pub struct SettingsCache {
    ttl: Duration,
    entries: RwLock<HashMap<DbId, (TenantSettings, Instant)>>,
}

impl SettingsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// A fresh cached entry, if any.
    pub async fn get(&self, tenant_id: DbId) -> Option<TenantSettings> {
        let entries = self.entries.read().await;
        entries
            .get(&tenant_id)
            .filter(|(_, loaded_at)| loaded_at.elapsed() < self.ttl)
            .map(|(settings, _)| settings.clone())
    }

    pub async fn put(&self, settings: TenantSettings) {
        let mut entries = self.entries.write().await;
        entries.insert(settings.tenant_id, (settings, Instant::now()));
    }

    pub async fn evict(&self, tenant_id: DbId) {
        self.entries.write().await.remove(&tenant_id);
    }

    /// Cached settings, loading them on a miss.
    pub async fn get_or_load(
        &self,
        pool: &PgPool,
        tenant_id: DbId,
    ) -> Result<TenantSettings, sqlx::Error> {
        if let Some(hit) = self.get(tenant_id).await {
            return Ok(hit);
        }
        let settings = SettingRepo::get_settings(pool, tenant_id).await?;
        self.put(settings.clone()).await;
        tracing::debug!(tenant_id, "Tenant settings loaded into cache");
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get() {
        let cache = SettingsCache::new(Duration::from_secs(60));
        cache.put(TenantSettings::defaults(4)).await;
        assert_eq!(cache.get(4).await, Some(TenantSettings::defaults(4)));
        assert_eq!(cache.get(5).await, None);
    }

    #[tokio::test]
    async fn evict_drops_entry() {
        let cache = SettingsCache::new(Duration::from_secs(60));
        cache.put(TenantSettings::defaults(4)).await;
        cache.evict(4).await;
        assert_eq!(cache.get(4).await, None);
    }

    #[tokio::test]
    async fn expired_entries_miss() {
        let cache = SettingsCache::new(Duration::ZERO);
        cache.put(TenantSettings::defaults(4)).await;
        assert_eq!(cache.get(4).await, None);
    }
}
