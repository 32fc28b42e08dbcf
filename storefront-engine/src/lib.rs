//! Template compilation and synchronization engine for storefront layouts.
//!
//! Produces one authoritative, ordered layout per (tenant, layout type) by
//! combining a theme's shipped definition with the tenant's persisted
//! customization.
//!
//! ## Components
//!
//! - **Source**: read-only catalog of definition documents
//! - **Loader**: parses and caches definitions per `theme:layout_type`
//! - **Decision**: pure heuristic deciding whether a resync is needed
//! - **Coordinator**: runs the transactional replace, one per key at a time
//! - **Merge**: builds the compiled template, customization first
//! - **Compiler**: the facade the rendering layer calls
//!
//! ## Pipeline
//!
//! 1. Load the definition (cache hit or source read); none means no result
//! 2. Sync the persisted sections (usually a no-op)
//! 3. Read the current customization
//! 4. Merge, dropping global sections
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use storefront_engine::{FileDefinitionSource, TemplateCompiler};
//! use storefront_store::CustomizationStore;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(CustomizationStore::open("layouts.db")?);
//! let source = Arc::new(FileDefinitionSource::new("themes"));
//! let compiler = TemplateCompiler::new(source, store);
//!
//! if let Some(template) = compiler
//!     .get_compiled_template("acme", "dawn", "product", false)
//!     .await?
//! {
//!     println!("{:?}", template.section_types());
//! }
//! # Ok(())
//! # }
//! ```

mod compiler;
pub mod config;
pub mod coordinator;
pub mod decision;
mod error;
pub mod loader;
pub mod merge;
pub mod nesting;
pub mod source;

pub use compiler::TemplateCompiler;
pub use config::CompilerConfig;
pub use coordinator::{SyncCoordinator, SyncOutcome, SyncStats};
pub use decision::{should_sync, sync_reason, SyncReason};
pub use error::{EngineError, EngineResult};
pub use loader::DefinitionLoader;
pub use merge::{merge, merge_filtered};
pub use source::{DefinitionSource, FileDefinitionSource, SourceError};
