use crate::error::{StoreError, StoreResult};
use crate::rows;
use crate::transaction::StoreTransaction;
use rusqlite::{params, Connection, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use storefront_types::{Customization, CustomizationRecord, TenantId};
use tracing::debug;

/// How long a writer waits on another process holding the database lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Persistent store for tenant layout customizations backed by SQLite.
#[derive(Clone)]
pub struct CustomizationStore {
    conn: Arc<Mutex<Connection>>,
}

impl CustomizationStore {
    /// Opens (or creates) a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Self::with_connection(conn)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(rows::SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Runs `f` inside one IMMEDIATE transaction.
    ///
    /// Commits when `f` returns `Ok`; any error rolls back every write made
    /// through the handle and is returned unchanged.
    pub fn transaction<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&StoreTransaction<'_>) -> StoreResult<T>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&StoreTransaction::new(&tx))?;
        tx.commit()?;
        Ok(value)
    }

    // ── Tenants ──────────────────────────────────────────────────

    /// Registers a tenant under its external key, returning the existing id
    /// if it is already known.
    pub fn register_tenant(&self, subdomain: &str) -> StoreResult<TenantId> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR IGNORE INTO tenants (id, subdomain) VALUES (?1, ?2)",
            params![TenantId::new().to_string(), subdomain],
        )?;
        rows::find_tenant(&conn, subdomain)?
            .ok_or_else(|| StoreError::InvalidData(format!("tenant {subdomain} missing after insert")))
    }

    /// Resolves an external tenant key to its internal id.
    pub fn resolve_tenant(&self, subdomain: &str) -> StoreResult<Option<TenantId>> {
        let conn = self.lock()?;
        rows::find_tenant(&conn, subdomain)
    }

    // ── Customizations ───────────────────────────────────────────

    /// Returns the default record for (tenant, layout type), if any.
    pub fn find_default_record(
        &self,
        tenant_id: &TenantId,
        layout_type: &str,
    ) -> StoreResult<Option<CustomizationRecord>> {
        let conn = self.lock()?;
        rows::find_default_record(&conn, tenant_id, layout_type)
    }

    /// Ensures an empty default record exists for (tenant, layout type).
    pub fn ensure_default_record(
        &self,
        tenant_id: &TenantId,
        layout_type: &str,
    ) -> StoreResult<CustomizationRecord> {
        self.transaction(|tx| tx.find_or_create_default_record(tenant_id, layout_type))
    }

    /// Ensures a default record exists for every layout type in one
    /// transaction, returning how many were created.
    pub fn ensure_default_records<S: AsRef<str>>(
        &self,
        tenant_id: &TenantId,
        layout_types: &[S],
    ) -> StoreResult<usize> {
        self.transaction(|tx| {
            let mut created = 0usize;
            for layout_type in layout_types {
                let layout_type = layout_type.as_ref();
                if tx.find_default_record(tenant_id, layout_type)?.is_none() {
                    tx.find_or_create_default_record(tenant_id, layout_type)?;
                    created += 1;
                }
            }
            Ok(created)
        })
    }

    /// Loads the default record with its sections and blocks, ordered by
    /// position. Disabled sections and blocks are dropped unless
    /// `include_disabled` is set.
    pub fn load_customization(
        &self,
        tenant_id: &TenantId,
        layout_type: &str,
        include_disabled: bool,
    ) -> StoreResult<Option<Customization>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let Some(record) = rows::find_default_record(&tx, tenant_id, layout_type)? else {
            debug!("No customization for {}:{}", tenant_id, layout_type);
            return Ok(None);
        };
        let sections = rows::load_sections(&tx, &record.id, include_disabled)?;
        tx.commit()?;
        Ok(Some(Customization { record, sections }))
    }
}
