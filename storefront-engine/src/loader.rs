//! Definition loader with a process-wide, append-only cache.

use crate::source::{DefinitionSource, SourceError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use storefront_types::LayoutDefinition;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Loads layout definitions and memoizes them per `theme:layout_type`.
///
/// Entries never expire. [`DefinitionLoader::clear_cache`] drops all of them
/// at once; there is no per-key invalidation.
pub struct DefinitionLoader {
    source: Arc<dyn DefinitionSource>,
    cache: RwLock<HashMap<String, Arc<LayoutDefinition>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

fn cache_key(theme: &str, layout_type: &str) -> String {
    format!("{theme}:{layout_type}")
}

impl DefinitionLoader {
    /// Creates an empty loader over `source`.
    pub fn new(source: Arc<dyn DefinitionSource>) -> Self {
        Self {
            source,
            cache: RwLock::new(HashMap::new()),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// Returns the definition for (theme, layout type).
    ///
    /// `None` covers both a missing document and a malformed one; either way
    /// nothing can be compiled and the failure is logged, not returned.
    pub async fn load(&self, theme: &str, layout_type: &str) -> Option<Arc<LayoutDefinition>> {
        let key = cache_key(theme, layout_type);

        let cached = self.cache.read().await.get(&key).cloned();
        if let Some(definition) = cached {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Definition cache hit for {}", key);
            return Some(definition);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let raw = match self.source.read_definition(theme, layout_type).await {
            Ok(raw) => raw,
            Err(SourceError::NotFound { .. }) => {
                debug!("No definition for {}", key);
                return None;
            }
            Err(e) => {
                warn!("Failed to read definition {}: {}", key, e);
                return None;
            }
        };

        let definition = match LayoutDefinition::from_json(theme, layout_type, &raw) {
            Ok(definition) => Arc::new(definition),
            Err(e) => {
                warn!("Malformed definition {}: {}", key, e);
                return None;
            }
        };

        let mut cache = self.cache.write().await;
        Some(cache.entry(key).or_insert(definition).clone())
    }

    /// Empties the cache.
    pub async fn clear_cache(&self) {
        let mut cache = self.cache.write().await;
        debug!("Clearing {} cached definitions", cache.len());
        cache.clear();
    }

    /// Number of cached definitions.
    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    /// Returns true if nothing is cached.
    pub async fn is_empty(&self) -> bool {
        self.cache.read().await.is_empty()
    }

    /// Cache statistics as `(hits, misses)`.
    pub fn stats(&self) -> (usize, usize) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }

    /// Lists the layout types the source offers for `theme`.
    ///
    /// Source failures degrade to an empty list.
    pub async fn list_layout_types(&self, theme: &str) -> Vec<String> {
        match self.source.list_layout_types(theme).await {
            Ok(layout_types) => layout_types,
            Err(e) => {
                warn!("Failed to list layout types for theme {}: {}", theme, e);
                Vec::new()
            }
        }
    }
}
