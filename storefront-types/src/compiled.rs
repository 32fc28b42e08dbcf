//! Render-ready output of a compilation.

use crate::customization::CustomizationRecord;
use crate::definition::LayoutDefinition;
use crate::settings::Settings;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The merged, ordered layout for one (tenant, layout type) pair.
///
/// Transient: built per request and never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct CompiledTemplate {
    pub definition: Arc<LayoutDefinition>,
    /// The tenant's default record, if one exists.
    pub customization: Option<CustomizationRecord>,
    pub sections: Vec<CompiledSection>,
}

impl CompiledTemplate {
    /// Section types in render order.
    pub fn section_types(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.section_type.as_str()).collect()
    }
}

/// A section as the rendering layer consumes it.
///
/// `type` and `sectionType` carry the same value; consumers read either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledSection {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub section_type: String,
    pub position: u32,
    pub enabled: bool,
    pub settings: Settings,
    pub blocks: Vec<CompiledBlock>,
}

/// A block with container nesting restored into structural form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledBlock {
    pub id: String,
    #[serde(rename = "type")]
    pub block_type: String,
    pub position: u32,
    pub enabled: bool,
    pub settings: Settings,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<CompiledBlock>,
}
