//! Compiler configuration.

/// Layout types every storefront theme is expected to ship.
pub const DEFAULT_LAYOUT_TYPES: [&str; 8] = [
    "homepage",
    "product",
    "collection",
    "cart",
    "page",
    "blog",
    "article",
    "search",
];

/// Configuration for the template compiler.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Layout types that `initialize_defaults` creates record shells for.
    pub layout_types: Vec<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            layout_types: DEFAULT_LAYOUT_TYPES.iter().map(|t| t.to_string()).collect(),
        }
    }
}
