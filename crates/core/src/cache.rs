//! Stale-while-revalidate account-info cache.
//!
//! Wraps the orchestrator's client-facing entry point: a cached snapshot is
//! handed out immediately while a fresh one is fetched over the bus, and
//! the caller's callback is re-notified when the fresh data lands. A failed
//! refresh never overwrites a previously good entry.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use lnb_protocol::{AccountInfoRes, AccountSnapshot};
use lnb_runtime::{Error, Result, RpcBus};
use serde_json::Value;
use tokio::sync::Mutex;

/// Pluggable key-value persistence collaborator for account snapshots.
///
/// Assumed durable across process restarts within a session, but not
/// required to survive indefinitely. The store is read and written as a
/// whole map; [`AccountInfoCache`] is responsible for making per-key
/// updates atomic.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get_all(&self) -> Result<HashMap<String, AccountSnapshot>>;
    async fn set_all(&self, snapshots: HashMap<String, AccountSnapshot>) -> Result<()>;
    async fn remove_one(&self, id: &str) -> Result<()>;
}

/// In-process cache store backed by a concurrent map.
#[derive(Default)]
pub struct MemoryCacheStore {
    snapshots: DashMap<String, AccountSnapshot>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get_all(&self) -> Result<HashMap<String, AccountSnapshot>> {
        Ok(self
            .snapshots
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect())
    }

    async fn set_all(&self, snapshots: HashMap<String, AccountSnapshot>) -> Result<()> {
        self.snapshots.clear();
        for (id, snapshot) in snapshots {
            self.snapshots.insert(id, snapshot);
        }
        Ok(())
    }

    async fn remove_one(&self, id: &str) -> Result<()> {
        self.snapshots.remove(id);
        Ok(())
    }
}

/// Account-info cache with stale-while-revalidate semantics.
///
/// Cheaply cloneable; clones share the store, the bus, and the write lock.
#[derive(Clone)]
pub struct AccountInfoCache {
    bus: Arc<RpcBus>,
    store: Arc<dyn CacheStore>,
    /// Serializes read-modify-write cycles on the store. Whole-map
    /// read/replace without this lock loses concurrent updates for other
    /// keys.
    write_lock: Arc<Mutex<()>>,
}

impl AccountInfoCache {
    pub fn new(bus: Arc<RpcBus>, store: Arc<dyn CacheStore>) -> Self {
        Self {
            bus,
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Stale-while-revalidate account info.
    ///
    /// With a cached entry for `id` (and `skip_cache` false), `on_update`
    /// is invoked with the stale entry, the refresh continues on a
    /// background task, and the stale entry is returned immediately -
    /// first resolution wins. Otherwise the refresh is awaited inline.
    ///
    /// `on_update` sees the stale entry and, on refresh success, the fresh
    /// snapshot - always in that order, at most twice. An error envelope
    /// from the orchestrator becomes an error-tagged snapshot that is never
    /// written to the cache; a transport-level refresh failure is the only
    /// `Err` path, and only when nothing stale was served (with stale data
    /// on screen it is logged instead).
    pub async fn swr_get_account_info<F>(
        &self,
        id: &str,
        mut on_update: F,
        skip_cache: bool,
    ) -> Result<AccountSnapshot>
    where
        F: FnMut(&AccountSnapshot) + Send + 'static,
    {
        let snapshots = self.store.get_all().await?;
        let stale = if skip_cache {
            None
        } else {
            snapshots.get(id).cloned()
        };

        let Some(stale) = stale else {
            return self.refresh(id, None, &mut on_update).await;
        };

        on_update(&stale);

        let cache = self.clone();
        let id = id.to_string();
        let stale_name = stale.name.clone();
        tokio::spawn(async move {
            match cache.refresh(&id, Some(&stale_name), &mut on_update).await {
                // An error-tagged snapshot is a recovered backend fault;
                // surface it in the log since the caller only sees stale
                // data.
                Ok(snapshot) => {
                    if let Some(error) = snapshot.error {
                        tracing::warn!(
                            account = %id,
                            "background account info refresh failed: {error}"
                        );
                    }
                }
                Err(e) => {
                    tracing::warn!(account = %id, "background account info refresh failed: {e}");
                }
            }
        });

        Ok(stale)
    }

    /// Returns the cached snapshot for `id`, if any.
    pub async fn get(&self, id: &str) -> Result<Option<AccountSnapshot>> {
        Ok(self.store.get_all().await?.get(id).cloned())
    }

    /// Purges one entry (account removal path).
    pub async fn remove(&self, id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.store.remove_one(id).await
    }

    async fn refresh<F>(
        &self,
        id: &str,
        fallback_name: Option<&str>,
        on_update: &mut F,
    ) -> Result<AccountSnapshot>
    where
        F: FnMut(&AccountSnapshot) + Send,
    {
        let envelope = self
            .bus
            .request("accountInfo", Value::Null)
            .await?
            .into_typed::<AccountInfoRes>()?;

        if let Some(error) = envelope.error {
            // Preserve last good data across transient backend faults: no
            // cache write, no callback.
            return Ok(AccountSnapshot::from_error(
                id,
                fallback_name.unwrap_or_default(),
                error,
            ));
        }

        let info = envelope
            .data
            .ok_or_else(|| Error::Protocol("empty accountInfo envelope".to_string()))?;

        let snapshot = AccountSnapshot::from_info(id, &info);
        self.store_snapshot(snapshot.clone()).await?;
        on_update(&snapshot);
        Ok(snapshot)
    }

    /// Atomic per-key upsert: read-modify-write under the write lock.
    async fn store_snapshot(&self, snapshot: AccountSnapshot) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut snapshots = self.store.get_all().await?;
        snapshots.insert(snapshot.id.clone(), snapshot);
        self.store.set_all(snapshots).await
    }
}
