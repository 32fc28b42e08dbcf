//! Persisted tenant customizations.
//!
//! Ownership is strictly hierarchical: a [`CustomizationRecord`] owns its
//! [`SectionInstance`]s, which own their [`Block`]s. A container block's
//! nested children are not rows at all; they live in the block's settings
//! under [`crate::layout::NESTED_BLOCKS_KEY`].

use crate::ids::{BlockId, RecordId, SectionId, TenantId};
use crate::settings::Settings;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One tenant's override of one layout type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomizationRecord {
    pub id: RecordId,
    pub tenant_id: TenantId,
    pub layout_type: String,
    pub is_default: bool,
    pub enabled: bool,
    pub settings: Settings,
    pub last_customized: Option<DateTime<Utc>>,
}

/// A persisted section, positioned within its record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionInstance {
    pub id: SectionId,
    /// Owning customization record.
    pub template_id: RecordId,
    pub section_type: String,
    pub position: u32,
    pub enabled: bool,
    pub settings: Settings,
    /// Owned blocks, ordered by position.
    pub blocks: Vec<Block>,
}

/// A persisted block, positioned within its section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: BlockId,
    pub section_id: SectionId,
    #[serde(rename = "type")]
    pub block_type: String,
    pub position: u32,
    pub enabled: bool,
    pub settings: Settings,
}

/// A customization record together with its owned sections and blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customization {
    pub record: CustomizationRecord,
    pub sections: Vec<SectionInstance>,
}

impl Customization {
    /// Returns true if the record owns no sections.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}
