//! Layout definitions as shipped by a theme.
//!
//! A definition is read-only: it is parsed once, cached by the loader and
//! never mutated by the engine.

use crate::settings::Settings;
use serde::{Deserialize, Serialize};

/// The default sections of one layout type within one theme.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutDefinition {
    pub theme: String,
    pub layout_type: String,
    pub sections: Vec<SectionDefinition>,
}

/// On-disk document shape: `{"sections": [...]}`.
#[derive(Debug, Deserialize)]
struct LayoutDocument {
    #[serde(default)]
    sections: Vec<SectionDefinition>,
}

impl LayoutDefinition {
    /// Parses a definition document for `(theme, layout_type)`.
    pub fn from_json(theme: &str, layout_type: &str, raw: &[u8]) -> crate::Result<Self> {
        let doc: LayoutDocument = serde_json::from_slice(raw)?;
        Ok(Self {
            theme: theme.to_string(),
            layout_type: layout_type.to_string(),
            sections: doc.sections,
        })
    }

    /// Returns the first section definition of the given type.
    pub fn section_of_type(&self, section_type: &str) -> Option<&SectionDefinition> {
        self.sections.iter().find(|s| s.section_type == section_type)
    }
}

/// A default section declared by the theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub section_type: String,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub blocks: Vec<BlockDefinition>,
}

/// A default block declared inside a section (or inside a container block).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDefinition {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<BlockDefinition>,
}
