//! Merge of persisted customization and shipped definition.
//!
//! A non-empty customization replaces the definition wholesale; the
//! definition is only a fallback for tenants with nothing persisted.

use crate::nesting::{fold_block_settings, unfold_block};
use std::sync::Arc;
use storefront_types::layout::is_global_section;
use storefront_types::{
    CompiledSection, CompiledTemplate, Customization, LayoutDefinition, SectionDefinition,
    SectionInstance,
};

/// Produces the render-ready template.
///
/// With `exclude_global_sections`, header, footer and announcement-bar
/// sections are dropped from either branch. Everything the customization
/// carries is kept, nested children included.
pub fn merge(
    definition: &Arc<LayoutDefinition>,
    customization: Option<Customization>,
    exclude_global_sections: bool,
) -> CompiledTemplate {
    merge_filtered(definition, customization, exclude_global_sections, true)
}

/// Like [`merge`], but drops disabled nested container children unless
/// `include_disabled` is set.
///
/// Disabled sections and blocks are rows and are filtered when the
/// customization is read; nested children live inside settings and can
/// only be filtered here.
pub fn merge_filtered(
    definition: &Arc<LayoutDefinition>,
    customization: Option<Customization>,
    exclude_global_sections: bool,
    include_disabled: bool,
) -> CompiledTemplate {
    let (record, mut sections) = match customization {
        Some(customization) if !customization.is_empty() => {
            let mut sections: Vec<CompiledSection> = customization
                .sections
                .into_iter()
                .map(|section| compile_instance(section, include_disabled))
                .collect();
            sections.sort_by_key(|s| s.position);
            (Some(customization.record), sections)
        }
        other => {
            let sections = definition
                .sections
                .iter()
                .enumerate()
                .map(|(index, section)| compile_definition(index, section))
                .collect();
            (other.map(|c| c.record), sections)
        }
    };

    if exclude_global_sections {
        sections.retain(|s| !is_global_section(&s.section_type));
    }

    CompiledTemplate {
        definition: Arc::clone(definition),
        customization: record,
        sections,
    }
}

fn compile_instance(section: SectionInstance, include_disabled: bool) -> CompiledSection {
    let mut blocks = section.blocks;
    blocks.sort_by_key(|b| b.position);

    CompiledSection {
        id: section.id.to_string(),
        kind: section.section_type.clone(),
        section_type: section.section_type,
        position: section.position,
        enabled: section.enabled,
        settings: section.settings,
        blocks: blocks
            .into_iter()
            .map(|b| {
                unfold_block(
                    b.id.to_string(),
                    &b.block_type,
                    b.position,
                    b.enabled,
                    b.settings,
                    include_disabled,
                )
            })
            .collect(),
    }
}

fn compile_definition(index: usize, section: &SectionDefinition) -> CompiledSection {
    let id = section
        .id
        .clone()
        .unwrap_or_else(|| format!("{}-{}", section.section_type, index));

    let blocks = section
        .blocks
        .iter()
        .enumerate()
        .map(|(i, block)| {
            unfold_block(
                format!("{id}-{i}"),
                &block.block_type,
                i as u32,
                true,
                fold_block_settings(block),
                true,
            )
        })
        .collect();

    CompiledSection {
        kind: section.section_type.clone(),
        section_type: section.section_type.clone(),
        position: index as u32,
        enabled: true,
        settings: section.settings.clone(),
        blocks,
        id,
    }
}
