//! Container block folding.
//!
//! A container's children are stored inside the container's own settings
//! under [`NESTED_BLOCKS_KEY`], each as `{"type": .., "settings": {..}}`.
//! A child that is itself a container carries its children the same way,
//! inside its own `settings`.

use storefront_types::layout::{is_container, NESTED_BLOCKS_KEY};
use storefront_types::{BlockDefinition, CompiledBlock, SettingValue, Settings};

const CHILD_TYPE: &str = "type";
const CHILD_SETTINGS: &str = "settings";
const CHILD_ENABLED: &str = "enabled";

/// Returns the settings to persist for a definition block, with container
/// children folded in.
pub fn fold_block_settings(block: &BlockDefinition) -> Settings {
    let mut settings = block.settings.clone();
    if is_container(&block.block_type) && !block.blocks.is_empty() {
        let children = block.blocks.iter().map(fold_child).collect();
        settings.insert(NESTED_BLOCKS_KEY.to_string(), SettingValue::List(children));
    }
    settings
}

fn fold_child(child: &BlockDefinition) -> SettingValue {
    let mut folded = Settings::new();
    folded.insert(CHILD_TYPE.to_string(), SettingValue::Text(child.block_type.clone()));
    folded.insert(
        CHILD_SETTINGS.to_string(),
        SettingValue::Map(fold_block_settings(child)),
    );
    SettingValue::Map(folded)
}

/// Builds a compiled block, lifting folded children out of a container's
/// settings into `blocks`.
///
/// Children get ids `<id>-<index>`. A reserved key that does not hold a list
/// is left in the settings untouched; malformed children are skipped, and so
/// are disabled children unless `include_disabled` is set.
pub fn unfold_block(
    id: String,
    block_type: &str,
    position: u32,
    enabled: bool,
    mut settings: Settings,
    include_disabled: bool,
) -> CompiledBlock {
    let mut blocks = Vec::new();
    if is_container(block_type)
        && matches!(settings.get(NESTED_BLOCKS_KEY), Some(SettingValue::List(_)))
    {
        if let Some(SettingValue::List(children)) = settings.remove(NESTED_BLOCKS_KEY) {
            for (index, child) in children.into_iter().enumerate() {
                match unfold_child(&id, index, child, include_disabled) {
                    Some(block) if include_disabled || block.enabled => blocks.push(block),
                    _ => {}
                }
            }
        }
    }

    CompiledBlock {
        id,
        block_type: block_type.to_string(),
        position,
        enabled,
        settings,
        blocks,
    }
}

fn unfold_child(
    parent_id: &str,
    index: usize,
    child: SettingValue,
    include_disabled: bool,
) -> Option<CompiledBlock> {
    let SettingValue::Map(mut child) = child else {
        return None;
    };
    let Some(SettingValue::Text(block_type)) = child.remove(CHILD_TYPE) else {
        return None;
    };
    let settings = match child.remove(CHILD_SETTINGS) {
        Some(SettingValue::Map(settings)) => settings,
        _ => Settings::new(),
    };
    let enabled = child
        .get(CHILD_ENABLED)
        .and_then(SettingValue::as_bool)
        .unwrap_or(true);

    Some(unfold_block(
        format!("{parent_id}-{index}"),
        &block_type,
        index as u32,
        enabled,
        settings,
        include_disabled,
    ))
}
