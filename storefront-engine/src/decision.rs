//! Sync-necessity heuristic.
//!
//! Persisted sections are authoritative once they exist. A resync only
//! happens for an empty record, for `(type, position)` collisions, and for a
//! product section that lost its default blocks. A layout that simply
//! differs from the definition is never resynced.

use std::collections::HashSet;
use std::fmt;
use storefront_types::layout::PRODUCT_SECTION;
use storefront_types::{SectionDefinition, SectionInstance};

/// Why a record must be replaced from its definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncReason {
    /// The record has no sections yet.
    Bootstrap,
    /// Two sections share the same type and position.
    DuplicatePositions,
    /// A product section has no blocks but the definition declares some.
    MissingProductBlocks,
}

impl fmt::Display for SyncReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncReason::Bootstrap => "bootstrap",
            SyncReason::DuplicatePositions => "duplicate positions",
            SyncReason::MissingProductBlocks => "missing product blocks",
        };
        f.write_str(s)
    }
}

/// Returns the first rule that requires a resync, if any.
pub fn sync_reason(
    existing: &[SectionInstance],
    definition: &[SectionDefinition],
) -> Option<SyncReason> {
    if existing.is_empty() {
        return Some(SyncReason::Bootstrap);
    }

    let mut seen = HashSet::with_capacity(existing.len());
    for section in existing {
        if !seen.insert((section.section_type.as_str(), section.position)) {
            return Some(SyncReason::DuplicatePositions);
        }
    }

    let declares_product_blocks = definition
        .iter()
        .find(|s| s.section_type == PRODUCT_SECTION)
        .is_some_and(|s| !s.blocks.is_empty());
    if declares_product_blocks
        && existing
            .iter()
            .any(|s| s.section_type == PRODUCT_SECTION && s.blocks.is_empty())
    {
        return Some(SyncReason::MissingProductBlocks);
    }

    None
}

/// Returns true if the persisted sections must be replaced.
pub fn should_sync(existing: &[SectionInstance], definition: &[SectionDefinition]) -> bool {
    sync_reason(existing, definition).is_some()
}
