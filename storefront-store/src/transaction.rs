//! Write operations available inside a store transaction.

use crate::error::{StoreError, StoreResult};
use crate::rows;
use chrono::Utc;
use rusqlite::{params, Connection};
use storefront_types::{
    Block, BlockId, CustomizationRecord, RecordId, SectionId, SectionInstance, Settings, TenantId,
};

/// Handle passed to [`crate::CustomizationStore::transaction`] closures.
///
/// Every call runs against the same open transaction; nothing is visible to
/// other connections until the closure returns `Ok` and the store commits.
pub struct StoreTransaction<'a> {
    conn: &'a Connection,
}

impl<'a> StoreTransaction<'a> {
    pub(crate) fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Returns the default record for (tenant, layout type), creating an
    /// empty, enabled one if none exists.
    pub fn find_or_create_default_record(
        &self,
        tenant_id: &TenantId,
        layout_type: &str,
    ) -> StoreResult<CustomizationRecord> {
        self.conn.execute(
            "INSERT OR IGNORE INTO customizations
                (id, tenant_id, layout_type, is_default, enabled, settings, last_customized)
             VALUES (?1, ?2, ?3, 1, 1, '{}', NULL)",
            params![RecordId::new().to_string(), tenant_id.to_string(), layout_type],
        )?;
        rows::find_default_record(self.conn, tenant_id, layout_type)?.ok_or_else(|| {
            StoreError::InvalidData(format!(
                "default record for {tenant_id}:{layout_type} missing after insert"
            ))
        })
    }

    /// Returns the default record for (tenant, layout type), if any.
    pub fn find_default_record(
        &self,
        tenant_id: &TenantId,
        layout_type: &str,
    ) -> StoreResult<Option<CustomizationRecord>> {
        rows::find_default_record(self.conn, tenant_id, layout_type)
    }

    /// Loads every section of a record, disabled ones included, with blocks.
    pub fn sections_for_record(&self, record_id: &RecordId) -> StoreResult<Vec<SectionInstance>> {
        rows::load_sections(self.conn, record_id, true)
    }

    /// Deletes all blocks owned by the record's sections.
    pub fn delete_blocks_for_record(&self, record_id: &RecordId) -> StoreResult<usize> {
        Ok(self.conn.execute(
            "DELETE FROM blocks WHERE section_id IN
                (SELECT id FROM section_instances WHERE template_id = ?1)",
            params![record_id.to_string()],
        )?)
    }

    /// Deletes all sections owned by the record. Blocks must already be gone.
    pub fn delete_sections_for_record(&self, record_id: &RecordId) -> StoreResult<usize> {
        Ok(self.conn.execute(
            "DELETE FROM section_instances WHERE template_id = ?1",
            params![record_id.to_string()],
        )?)
    }

    /// Inserts an enabled section at `position`.
    pub fn insert_section(
        &self,
        record_id: &RecordId,
        section_type: &str,
        position: u32,
        settings: &Settings,
    ) -> StoreResult<SectionInstance> {
        let id = SectionId::new();
        self.conn.execute(
            "INSERT INTO section_instances (id, template_id, section_type, position, enabled, settings)
             VALUES (?1, ?2, ?3, ?4, 1, ?5)",
            params![
                id.to_string(),
                record_id.to_string(),
                section_type,
                position,
                rows::encode_settings(settings)?,
            ],
        )?;
        Ok(SectionInstance {
            id,
            template_id: *record_id,
            section_type: section_type.to_string(),
            position,
            enabled: true,
            settings: settings.clone(),
            blocks: Vec::new(),
        })
    }

    /// Inserts an enabled block at `position` within a section.
    pub fn insert_block(
        &self,
        section_id: &SectionId,
        block_type: &str,
        position: u32,
        settings: &Settings,
    ) -> StoreResult<Block> {
        let id = BlockId::new();
        self.conn.execute(
            "INSERT INTO blocks (id, section_id, block_type, position, enabled, settings)
             VALUES (?1, ?2, ?3, ?4, 1, ?5)",
            params![
                id.to_string(),
                section_id.to_string(),
                block_type,
                position,
                rows::encode_settings(settings)?,
            ],
        )?;
        Ok(Block {
            id,
            section_id: *section_id,
            block_type: block_type.to_string(),
            position,
            enabled: true,
            settings: settings.clone(),
        })
    }

    // ── Tenant edits ─────────────────────────────────────────────
    //
    // The editor that owns these writes lives outside this workspace; the
    // engine never calls them. They exist for provisioning and fixtures.

    /// Toggles a section's visibility and stamps the owning record.
    pub fn set_section_enabled(&self, section_id: &SectionId, enabled: bool) -> StoreResult<bool> {
        let changed = self.conn.execute(
            "UPDATE section_instances SET enabled = ?2 WHERE id = ?1",
            params![section_id.to_string(), enabled],
        )?;
        if changed > 0 {
            self.touch_record_of_section(section_id)?;
        }
        Ok(changed > 0)
    }

    /// Toggles a block's visibility and stamps the owning record.
    pub fn set_block_enabled(&self, block_id: &BlockId, enabled: bool) -> StoreResult<bool> {
        let changed = self.conn.execute(
            "UPDATE blocks SET enabled = ?2 WHERE id = ?1",
            params![block_id.to_string(), enabled],
        )?;
        if changed > 0 {
            self.conn.execute(
                "UPDATE customizations SET last_customized = ?2 WHERE id =
                    (SELECT s.template_id FROM section_instances s
                     JOIN blocks b ON b.section_id = s.id WHERE b.id = ?1)",
                params![block_id.to_string(), Utc::now().timestamp_millis()],
            )?;
        }
        Ok(changed > 0)
    }

    /// Replaces a section's settings wholesale and stamps the owning record.
    pub fn update_section_settings(
        &self,
        section_id: &SectionId,
        settings: &Settings,
    ) -> StoreResult<bool> {
        let changed = self.conn.execute(
            "UPDATE section_instances SET settings = ?2 WHERE id = ?1",
            params![section_id.to_string(), rows::encode_settings(settings)?],
        )?;
        if changed > 0 {
            self.touch_record_of_section(section_id)?;
        }
        Ok(changed > 0)
    }

    fn touch_record_of_section(&self, section_id: &SectionId) -> StoreResult<()> {
        self.conn.execute(
            "UPDATE customizations SET last_customized = ?2 WHERE id =
                (SELECT template_id FROM section_instances WHERE id = ?1)",
            params![section_id.to_string(), Utc::now().timestamp_millis()],
        )?;
        Ok(())
    }
}
