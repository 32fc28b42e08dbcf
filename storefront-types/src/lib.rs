//! Core type definitions for the storefront layout engine.
//!
//! This crate defines the data model shared by the store and the engine:
//! - Tenant, record, section and block identifiers (UUID v7)
//! - The opaque settings value union carried by sections and blocks
//! - Layout definitions as shipped by a theme (read-only)
//! - Persisted customizations (one record per tenant + layout type)
//! - The compiled, render-ready template handed to the rendering layer
//!
//! Nothing here performs I/O.

mod compiled;
mod customization;
mod definition;
mod ids;
pub mod layout;
mod settings;

pub use compiled::{CompiledBlock, CompiledSection, CompiledTemplate};
pub use customization::{Block, Customization, CustomizationRecord, SectionInstance};
pub use definition::{BlockDefinition, LayoutDefinition, SectionDefinition};
pub use ids::{BlockId, RecordId, SectionId, TenantId};
pub use settings::{SettingValue, Settings};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),
}
