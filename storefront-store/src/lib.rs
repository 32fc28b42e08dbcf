//! SQLite persistence for storefront layout customizations.
//!
//! Holds one default customization record per (tenant, layout type), each
//! owning an ordered list of section instances, each owning an ordered list
//! of blocks. Container children are never rows: they stay folded inside
//! their parent block's settings column.
//!
//! # Tables
//!
//! - `tenants`: external key (subdomain) to internal id
//! - `customizations`: records, unique on (tenant, layout) where default
//! - `section_instances`: sections keyed by owning record
//! - `blocks`: blocks keyed by owning section
//!
//! All multi-row writes go through [`CustomizationStore::transaction`], which
//! runs the closure in a single IMMEDIATE transaction so concurrent processes
//! sharing the database file serialize on the write lock.

mod error;
mod rows;
mod store;
mod transaction;

pub use error::{StoreError, StoreResult};
pub use store::CustomizationStore;
pub use transaction::StoreTransaction;
