//! Synchronization coordinator.
//!
//! Replaces a tenant's persisted sections with ones freshly derived from the
//! definition when the decision heuristic asks for it. Calls for the same
//! `tenant:layout_type` key are serialized in-process: a caller that finds a
//! sync already in flight awaits that sync's outcome instead of starting its
//! own. Across processes, the store's IMMEDIATE transaction is the only
//! guard.

use crate::decision::sync_reason;
use crate::error::{EngineError, EngineResult};
use crate::nesting::fold_block_settings;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use storefront_store::CustomizationStore;
use storefront_types::layout::{is_global_section, persists_global_sections};
use storefront_types::LayoutDefinition;
use tracing::{debug, info, warn};

type PendingSync = Shared<BoxFuture<'static, EngineResult<SyncOutcome>>>;
type InFlight = Mutex<HashMap<String, PendingSync>>;

/// Result of one sync call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The record's sections were replaced from the definition.
    Replaced { sections: usize },
    /// Persisted sections were healthy and left alone.
    Unchanged,
    /// The tenant key did not resolve; nothing to write into.
    TenantMissing,
}

/// Counters describing coordinator activity since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Sync bodies actually executed.
    pub runs: usize,
    /// Calls that awaited another caller's in-flight sync.
    pub joins: usize,
    /// Destructive replaces committed.
    pub replacements: usize,
}

#[derive(Default)]
struct Counters {
    runs: AtomicUsize,
    joins: AtomicUsize,
    replacements: AtomicUsize,
}

/// Serializes and executes resyncs against the customization store.
pub struct SyncCoordinator {
    store: Arc<CustomizationStore>,
    in_flight: Arc<InFlight>,
    counters: Arc<Counters>,
}

fn coordination_key(tenant: &str, layout_type: &str) -> String {
    format!("{tenant}:{layout_type}")
}

fn lock(in_flight: &InFlight) -> MutexGuard<'_, HashMap<String, PendingSync>> {
    in_flight.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SyncCoordinator {
    /// Creates a coordinator with an empty in-flight map.
    pub fn new(store: Arc<CustomizationStore>) -> Self {
        Self {
            store,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Brings the persisted sections for (tenant, layout type) in line with
    /// `definition` if the heuristic requires it.
    ///
    /// A transaction failure is returned to every caller that was waiting on
    /// the same key, and the key is released so a later call can retry.
    /// Dropping the returned future does not cancel a sync that has started.
    pub async fn sync(
        &self,
        tenant: &str,
        theme: &str,
        layout_type: &str,
        definition: Arc<LayoutDefinition>,
    ) -> EngineResult<SyncOutcome> {
        let key = coordination_key(tenant, layout_type);
        let pending = {
            let mut in_flight = lock(&self.in_flight);
            match in_flight.get(&key) {
                Some(pending) => {
                    self.counters.joins.fetch_add(1, Ordering::Relaxed);
                    debug!("Joining in-flight sync for {}", key);
                    pending.clone()
                }
                None => {
                    let pending = self.start(key.clone(), tenant, theme, layout_type, definition);
                    in_flight.insert(key, pending.clone());
                    pending
                }
            }
        };
        pending.await
    }

    fn start(
        &self,
        key: String,
        tenant: &str,
        theme: &str,
        layout_type: &str,
        definition: Arc<LayoutDefinition>,
    ) -> PendingSync {
        let store = Arc::clone(&self.store);
        let in_flight = Arc::clone(&self.in_flight);
        let counters = Arc::clone(&self.counters);
        let tenant = tenant.to_string();
        let theme = theme.to_string();
        let layout_type = layout_type.to_string();

        counters.runs.fetch_add(1, Ordering::Relaxed);
        // Runs to completion even if every caller is dropped, so the key is
        // always released once the sync has ended.
        let task = tokio::spawn(async move {
            let result = match tokio::task::spawn_blocking(move || {
                run_sync(&store, &tenant, &theme, &layout_type, &definition)
            })
            .await
            {
                Ok(result) => result,
                Err(e) => Err(EngineError::from(e)),
            };

            match &result {
                Ok(SyncOutcome::Replaced { .. }) => {
                    counters.replacements.fetch_add(1, Ordering::Relaxed);
                }
                Ok(_) => {}
                Err(e) => warn!("Sync for {} failed: {}", key, e),
            }
            lock(&in_flight).remove(&key);
            result
        });

        async move {
            match task.await {
                Ok(result) => result,
                Err(e) => Err(EngineError::from(e)),
            }
        }
        .boxed()
        .shared()
    }

    /// Returns activity counters.
    pub fn stats(&self) -> SyncStats {
        SyncStats {
            runs: self.counters.runs.load(Ordering::Relaxed),
            joins: self.counters.joins.load(Ordering::Relaxed),
            replacements: self.counters.replacements.load(Ordering::Relaxed),
        }
    }

    /// Number of keys with a sync currently in flight.
    pub fn in_flight(&self) -> usize {
        lock(&self.in_flight).len()
    }
}

fn run_sync(
    store: &CustomizationStore,
    tenant: &str,
    theme: &str,
    layout_type: &str,
    definition: &LayoutDefinition,
) -> EngineResult<SyncOutcome> {
    let tenant_id = match store.resolve_tenant(tenant) {
        Ok(Some(id)) => id,
        Ok(None) => {
            debug!("Tenant {} not found, nothing to sync", tenant);
            return Ok(SyncOutcome::TenantMissing);
        }
        Err(e) => {
            warn!("Tenant lookup for {} failed: {}", tenant, e);
            return Ok(SyncOutcome::TenantMissing);
        }
    };

    store
        .transaction(|tx| {
            let record = tx.find_or_create_default_record(&tenant_id, layout_type)?;
            let existing = tx.sections_for_record(&record.id)?;

            let Some(reason) = sync_reason(&existing, &definition.sections) else {
                debug!("{}:{} is up to date", tenant, layout_type);
                return Ok(SyncOutcome::Unchanged);
            };
            info!(
                "Resyncing {}:{} from theme {} ({})",
                tenant, layout_type, theme, reason
            );

            tx.delete_blocks_for_record(&record.id)?;
            tx.delete_sections_for_record(&record.id)?;

            let keep_globals = persists_global_sections(layout_type);
            let mut position = 0u32;
            for section in &definition.sections {
                if is_global_section(&section.section_type) && !keep_globals {
                    continue;
                }
                let instance =
                    tx.insert_section(&record.id, &section.section_type, position, &section.settings)?;
                for (index, block) in section.blocks.iter().enumerate() {
                    tx.insert_block(
                        &instance.id,
                        &block.block_type,
                        index as u32,
                        &fold_block_settings(block),
                    )?;
                }
                position += 1;
            }

            Ok(SyncOutcome::Replaced {
                sections: position as usize,
            })
        })
        .map_err(EngineError::transaction)
}
