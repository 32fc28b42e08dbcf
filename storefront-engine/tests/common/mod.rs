#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Arc;
use storefront_engine::{FileDefinitionSource, TemplateCompiler};
use storefront_store::CustomizationStore;
use storefront_types::{
    Block, BlockId, LayoutDefinition, RecordId, SectionId, SectionInstance, Settings,
};
use tempfile::TempDir;

pub const THEME: &str = "dawn";
pub const TENANT: &str = "acme";

pub const HOMEPAGE_DEF: &str = r#"{
    "sections": [
        {"type": "announcement-bar", "settings": {"text": "Free shipping"}},
        {"type": "header", "settings": {"sticky": true}},
        {"type": "hero", "settings": {"title": "Welcome"},
         "blocks": [{"type": "button", "settings": {"label": "Shop now"}}]},
        {"type": "featured-collection", "settings": {"limit": 4}},
        {"type": "footer"}
    ]
}"#;

pub const PRODUCT_DEF: &str = r#"{
    "sections": [
        {"type": "header"},
        {"type": "product", "settings": {"gallery": "stacked"},
         "blocks": [
            {"type": "title"},
            {"type": "price", "settings": {"show_compare": true}},
            {"type": "container", "settings": {"layout": "row"},
             "blocks": [
                {"type": "text", "settings": {"body": "Ships in 2 days"}},
                {"type": "icon", "settings": {"name": "truck"}}
             ]}
         ]},
        {"type": "related-products", "settings": {"count": 4}},
        {"type": "footer"}
    ]
}"#;

pub const GLOBALS_DEF: &str = r#"{
    "sections": [
        {"type": "header"},
        {"type": "hero"},
        {"type": "footer"}
    ]
}"#;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Writes `<root>/<theme>/templates/<layout_type>.json`.
pub fn write_definition(root: &Path, theme: &str, layout_type: &str, json: &str) {
    let dir = root.join(theme).join("templates");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(format!("{layout_type}.json")), json).unwrap();
}

pub fn parse_definition(layout_type: &str, json: &str) -> Arc<LayoutDefinition> {
    Arc::new(LayoutDefinition::from_json(THEME, layout_type, json.as_bytes()).unwrap())
}

/// A themes directory with the standard homepage and product definitions.
pub fn themes_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_definition(dir.path(), THEME, "homepage", HOMEPAGE_DEF);
    write_definition(dir.path(), THEME, "product", PRODUCT_DEF);
    dir
}

/// In-memory store with [`TENANT`] registered.
pub fn store_with_tenant() -> Arc<CustomizationStore> {
    let store = CustomizationStore::open_in_memory().unwrap();
    store.register_tenant(TENANT).unwrap();
    Arc::new(store)
}

pub struct Fixture {
    pub themes: TempDir,
    pub store: Arc<CustomizationStore>,
    pub compiler: TemplateCompiler,
}

pub fn fixture() -> Fixture {
    init_tracing();
    let themes = themes_dir();
    let store = store_with_tenant();
    let source = Arc::new(FileDefinitionSource::new(themes.path()));
    let compiler = TemplateCompiler::new(source, Arc::clone(&store));
    Fixture {
        themes,
        store,
        compiler,
    }
}

/// A detached section instance for pure decision/merge tests.
pub fn section(section_type: &str, position: u32, block_types: &[&str]) -> SectionInstance {
    let id = SectionId::new();
    SectionInstance {
        id,
        template_id: RecordId::new(),
        section_type: section_type.to_string(),
        position,
        enabled: true,
        settings: Settings::new(),
        blocks: block_types
            .iter()
            .enumerate()
            .map(|(i, t)| block(id, t, i as u32, Settings::new()))
            .collect(),
    }
}

pub fn block(section_id: SectionId, block_type: &str, position: u32, settings: Settings) -> Block {
    Block {
        id: BlockId::new(),
        section_id,
        block_type: block_type.to_string(),
        position,
        enabled: true,
        settings,
    }
}

/// Loads every persisted section for the tenant's record, disabled included.
pub fn persisted(store: &CustomizationStore, layout_type: &str) -> Vec<SectionInstance> {
    let tenant = store.resolve_tenant(TENANT).unwrap().unwrap();
    store
        .load_customization(&tenant, layout_type, true)
        .unwrap()
        .map(|c| c.sections)
        .unwrap_or_default()
}

pub fn types_and_positions(sections: &[SectionInstance]) -> Vec<(String, u32)> {
    sections
        .iter()
        .map(|s| (s.section_type.clone(), s.position))
        .collect()
}
