//! Request context
//!
//! One [`PentContext`] per logical request. It owns the only [`PentLoader`]
//! that request uses, so dropping the context drops its cache. Contexts are
//! not meant to be reused across requests.

use std::sync::Arc;
use tracing::error;

use crate::config::LoaderConfig;
use crate::domain::{EdgeDefinition, GraphStore};
use crate::error::{PentError, PentResult};
use crate::loader::PentLoader;
use crate::registry::{PentClass, TypeRegistry};

pub struct PentContext {
    store: Arc<dyn GraphStore>,
    registry: Arc<TypeRegistry>,
    loader: PentLoader,
}

impl PentContext {
    pub fn new(store: Arc<dyn GraphStore>, registry: Arc<TypeRegistry>) -> Self {
        Self::with_config(store, registry, LoaderConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn GraphStore>,
        registry: Arc<TypeRegistry>,
        config: LoaderConfig,
    ) -> Self {
        let loader = PentLoader::new(Arc::clone(&store), Arc::clone(&registry), config);
        Self {
            store,
            registry,
            loader,
        }
    }

    pub fn store(&self) -> &dyn GraphStore {
        self.store.as_ref()
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn loader(&self) -> &PentLoader {
        &self.loader
    }

    /// Entity class registered under `name`.
    pub fn class_named(&self, name: &str) -> PentResult<PentClass> {
        self.registry.class_named(name).map_err(|e| {
            error!(class = name, "Class name not registered");
            e
        })
    }

    /// Edge definition known to the store under `edge_name`.
    pub fn edge_definition_named(&self, edge_name: &str) -> PentResult<EdgeDefinition> {
        self.store.edge_definition_named(edge_name).ok_or_else(|| {
            error!(edge = edge_name, "Edge definition not found");
            PentError::UnknownEdge(edge_name.to_string())
        })
    }
}

impl std::fmt::Debug for PentContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PentContext")
            .field("registry", &self.registry)
            .field("loader", &self.loader)
            .finish()
    }
}
