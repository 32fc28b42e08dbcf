//! Row readers shared by the store and its transactions.

use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use storefront_types::{
    Block, BlockId, CustomizationRecord, RecordId, SectionId, SectionInstance, Settings, TenantId,
};

pub(crate) const SCHEMA: &str = "
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS tenants (
        id TEXT PRIMARY KEY,
        subdomain TEXT NOT NULL UNIQUE
    );

    CREATE TABLE IF NOT EXISTS customizations (
        id TEXT PRIMARY KEY,
        tenant_id TEXT NOT NULL REFERENCES tenants(id),
        layout_type TEXT NOT NULL,
        is_default INTEGER NOT NULL DEFAULT 1,
        enabled INTEGER NOT NULL DEFAULT 1,
        settings TEXT NOT NULL DEFAULT '{}',
        last_customized INTEGER
    );

    CREATE UNIQUE INDEX IF NOT EXISTS idx_customizations_default
        ON customizations (tenant_id, layout_type) WHERE is_default = 1;

    CREATE TABLE IF NOT EXISTS section_instances (
        id TEXT PRIMARY KEY,
        template_id TEXT NOT NULL REFERENCES customizations(id),
        section_type TEXT NOT NULL,
        position INTEGER NOT NULL,
        enabled INTEGER NOT NULL DEFAULT 1,
        settings TEXT NOT NULL DEFAULT '{}'
    );

    CREATE INDEX IF NOT EXISTS idx_sections_template
        ON section_instances (template_id, position);

    CREATE TABLE IF NOT EXISTS blocks (
        id TEXT PRIMARY KEY,
        section_id TEXT NOT NULL REFERENCES section_instances(id),
        block_type TEXT NOT NULL,
        position INTEGER NOT NULL,
        enabled INTEGER NOT NULL DEFAULT 1,
        settings TEXT NOT NULL DEFAULT '{}'
    );

    CREATE INDEX IF NOT EXISTS idx_blocks_section
        ON blocks (section_id, position);
";

pub(crate) fn decode_settings(raw: &str) -> StoreResult<Settings> {
    Ok(serde_json::from_str(raw)?)
}

pub(crate) fn encode_settings(settings: &Settings) -> StoreResult<String> {
    Ok(serde_json::to_string(settings)?)
}

fn decode_timestamp(millis: Option<i64>) -> StoreResult<Option<DateTime<Utc>>> {
    match millis {
        None => Ok(None),
        Some(ms) => DateTime::<Utc>::from_timestamp_millis(ms)
            .map(Some)
            .ok_or_else(|| StoreError::InvalidData(format!("timestamp out of range: {ms}"))),
    }
}

pub(crate) fn find_tenant(conn: &Connection, subdomain: &str) -> StoreResult<Option<TenantId>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT id FROM tenants WHERE subdomain = ?1",
            params![subdomain],
            |row| row.get(0),
        )
        .optional()?;
    raw.map(|s| TenantId::parse(&s).map_err(StoreError::from))
        .transpose()
}

pub(crate) fn find_default_record(
    conn: &Connection,
    tenant_id: &TenantId,
    layout_type: &str,
) -> StoreResult<Option<CustomizationRecord>> {
    let raw = conn
        .query_row(
            "SELECT id, enabled, settings, last_customized FROM customizations
             WHERE tenant_id = ?1 AND layout_type = ?2 AND is_default = 1",
            params![tenant_id.to_string(), layout_type],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, bool>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<i64>>(3)?,
                ))
            },
        )
        .optional()?;

    let Some((id, enabled, settings, last_customized)) = raw else {
        return Ok(None);
    };

    Ok(Some(CustomizationRecord {
        id: RecordId::parse(&id)?,
        tenant_id: *tenant_id,
        layout_type: layout_type.to_string(),
        is_default: true,
        enabled,
        settings: decode_settings(&settings)?,
        last_customized: decode_timestamp(last_customized)?,
    }))
}

pub(crate) fn load_sections(
    conn: &Connection,
    record_id: &RecordId,
    include_disabled: bool,
) -> StoreResult<Vec<SectionInstance>> {
    let sql = if include_disabled {
        "SELECT id, section_type, position, enabled, settings FROM section_instances
         WHERE template_id = ?1 ORDER BY position, rowid"
    } else {
        "SELECT id, section_type, position, enabled, settings FROM section_instances
         WHERE template_id = ?1 AND enabled = 1 ORDER BY position, rowid"
    };
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![record_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, u32>(2)?,
            row.get::<_, bool>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut sections = Vec::new();
    for row in rows {
        let (id, section_type, position, enabled, settings) = row?;
        let id = SectionId::parse(&id)?;
        sections.push(SectionInstance {
            id,
            template_id: *record_id,
            section_type,
            position,
            enabled,
            settings: decode_settings(&settings)?,
            blocks: Vec::new(),
        });
    }

    for section in &mut sections {
        section.blocks = load_blocks(conn, &section.id, include_disabled)?;
    }
    Ok(sections)
}

fn load_blocks(
    conn: &Connection,
    section_id: &SectionId,
    include_disabled: bool,
) -> StoreResult<Vec<Block>> {
    let sql = if include_disabled {
        "SELECT id, block_type, position, enabled, settings FROM blocks
         WHERE section_id = ?1 ORDER BY position, rowid"
    } else {
        "SELECT id, block_type, position, enabled, settings FROM blocks
         WHERE section_id = ?1 AND enabled = 1 ORDER BY position, rowid"
    };
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![section_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, u32>(2)?,
            row.get::<_, bool>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut blocks = Vec::new();
    for row in rows {
        let (id, block_type, position, enabled, settings) = row?;
        blocks.push(Block {
            id: BlockId::parse(&id)?,
            section_id: *section_id,
            block_type,
            position,
            enabled,
            settings: decode_settings(&settings)?,
        });
    }
    Ok(blocks)
}
