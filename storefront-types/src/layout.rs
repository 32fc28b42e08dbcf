//! Layout-type and section-type conventions shared by sync and merge.

/// The only layout type under which global sections are persisted.
pub const HOMEPAGE: &str = "homepage";

/// Section types shared by every page of a storefront.
///
/// They are persisted only under [`HOMEPAGE`]; every other layout receives
/// them from the global-sections collaborator at render time.
pub const GLOBAL_SECTION_TYPES: [&str; 3] = ["header", "footer", "announcement-bar"];

/// Block type whose nested children live inside its own settings map.
pub const CONTAINER_BLOCK: &str = "container";

/// Reserved settings key holding a container block's folded children.
pub const NESTED_BLOCKS_KEY: &str = "_blocks";

/// The section type whose missing default blocks trigger a resync.
pub const PRODUCT_SECTION: &str = "product";

/// Returns true if `section_type` is one of [`GLOBAL_SECTION_TYPES`].
pub fn is_global_section(section_type: &str) -> bool {
    GLOBAL_SECTION_TYPES.contains(&section_type)
}

/// Returns true if global sections are persisted for `layout_type`.
pub fn persists_global_sections(layout_type: &str) -> bool {
    layout_type == HOMEPAGE
}

/// Returns true if `block_type` nests children inside its settings.
pub fn is_container(block_type: &str) -> bool {
    block_type == CONTAINER_BLOCK
}
