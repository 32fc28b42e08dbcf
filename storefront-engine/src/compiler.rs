//! Compilation facade.

use crate::config::CompilerConfig;
use crate::coordinator::SyncCoordinator;
use crate::error::{EngineError, EngineResult};
use crate::loader::DefinitionLoader;
use crate::merge::merge_filtered;
use crate::source::DefinitionSource;
use std::sync::Arc;
use storefront_store::CustomizationStore;
use storefront_types::{CompiledTemplate, Customization};
use tracing::{debug, info, warn};

/// Entry point for the rendering layer.
///
/// Composes the loader, the sync coordinator, the store read and the merge
/// in a fixed order. Each instance owns its own definition cache and
/// in-flight map.
pub struct TemplateCompiler {
    loader: DefinitionLoader,
    coordinator: SyncCoordinator,
    store: Arc<CustomizationStore>,
    config: CompilerConfig,
}

impl TemplateCompiler {
    /// Creates a compiler with the default configuration.
    pub fn new(source: Arc<dyn DefinitionSource>, store: Arc<CustomizationStore>) -> Self {
        Self::with_config(source, store, CompilerConfig::default())
    }

    /// Creates a compiler with a custom configuration.
    pub fn with_config(
        source: Arc<dyn DefinitionSource>,
        store: Arc<CustomizationStore>,
        config: CompilerConfig,
    ) -> Self {
        Self {
            loader: DefinitionLoader::new(source),
            coordinator: SyncCoordinator::new(Arc::clone(&store)),
            store,
            config,
        }
    }

    /// Returns the definition loader and its cache.
    pub fn loader(&self) -> &DefinitionLoader {
        &self.loader
    }

    /// Returns the sync coordinator, mainly for its stats.
    pub fn coordinator(&self) -> &SyncCoordinator {
        &self.coordinator
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compiles the layout for (tenant, theme, layout type).
    ///
    /// Returns `Ok(None)` when the theme ships no usable definition. An
    /// unknown tenant compiles from the definition alone. Only a failed sync
    /// transaction or a failed store read is an error.
    pub async fn get_compiled_template(
        &self,
        tenant: &str,
        theme: &str,
        layout_type: &str,
        include_disabled: bool,
    ) -> EngineResult<Option<CompiledTemplate>> {
        let Some(definition) = self.loader.load(theme, layout_type).await else {
            return Ok(None);
        };

        self.coordinator
            .sync(tenant, theme, layout_type, Arc::clone(&definition))
            .await?;

        let customization = self
            .read_customization(tenant, layout_type, include_disabled)
            .await?;
        Ok(Some(merge_filtered(
            &definition,
            customization,
            true,
            include_disabled,
        )))
    }

    async fn read_customization(
        &self,
        tenant: &str,
        layout_type: &str,
        include_disabled: bool,
    ) -> EngineResult<Option<Customization>> {
        let store = Arc::clone(&self.store);
        let tenant = tenant.to_string();
        let layout_type = layout_type.to_string();

        tokio::task::spawn_blocking(move || -> EngineResult<Option<Customization>> {
            let tenant_id = match store.resolve_tenant(&tenant) {
                Ok(Some(id)) => id,
                Ok(None) => return Ok(None),
                Err(e) => {
                    warn!("Tenant lookup for {} failed: {}", tenant, e);
                    return Ok(None);
                }
            };
            store
                .load_customization(&tenant_id, &layout_type, include_disabled)
                .map_err(EngineError::store)
        })
        .await?
    }

    /// Drops every cached definition.
    pub async fn clear_cache(&self) {
        self.loader.clear_cache().await;
    }

    /// Lists the layout types `theme` ships.
    pub async fn list_available_layout_types(&self, theme: &str) -> Vec<String> {
        self.loader.list_layout_types(theme).await
    }

    /// Creates an empty default record for every configured layout type the
    /// tenant does not have yet. Sections are populated on first compile.
    ///
    /// Returns how many records were created; an unknown tenant creates none.
    pub async fn initialize_defaults(&self, tenant: &str) -> EngineResult<usize> {
        let store = Arc::clone(&self.store);
        let tenant = tenant.to_string();
        let layout_types = self.config.layout_types.clone();

        tokio::task::spawn_blocking(move || -> EngineResult<usize> {
            let tenant_id = match store.resolve_tenant(&tenant) {
                Ok(Some(id)) => id,
                Ok(None) => {
                    warn!("Cannot initialize defaults: tenant {} not found", tenant);
                    return Ok(0);
                }
                Err(e) => {
                    warn!("Tenant lookup for {} failed: {}", tenant, e);
                    return Ok(0);
                }
            };

            let created = store
                .ensure_default_records(&tenant_id, &layout_types)
                .map_err(EngineError::transaction)?;

            if created > 0 {
                info!("Initialized {} layout records for {}", created, tenant);
            } else {
                debug!("Layout records for {} already initialized", tenant);
            }
            Ok(created)
        })
        .await?
    }
}
