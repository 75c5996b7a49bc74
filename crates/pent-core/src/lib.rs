//! Pent runtime core
//!
//! Request-scoped access to typed entities stored in a graph key/edge store:
//! batched and deduplicated keyed loads, a per-request cache kept coherent
//! across writes, cursor-paginated scans and edge traversal.

pub mod config;
pub mod context;
pub mod crud;
pub mod domain;
pub mod error;
pub mod loader;
pub mod mutation;
pub mod pent;
pub mod registry;

// Re-export key types for convenient usage
pub use config::LoaderConfig;
pub use context::PentContext;
pub use crud::{
    create_pent, create_pent_dynamic, delete_pent, delete_pent_dynamic, update_pent,
    update_pent_dynamic,
};
pub use domain::{
    EdgeDefinition, EdgeId, EdgeRecord, GraphStore, IndexDefinition, ObjectDefinition,
    RawRecord, StoreSchema, TypeId, OBJ_ID_FIELD, TYPE_ID_FIELD,
};
pub use error::{PentError, PentResult, StoreError};
pub use loader::{LoaderStats, PentLoader};
pub use mutation::{MutationData, MutationValue};
pub use pent::{gen_browse_pents_dynamic, gen_pent_dynamic, Pent, PentObject};
pub use registry::{PentClass, RegistryBuilder, TypeRegistry};

/// Install a global fmt subscriber filtered by `RUST_LOG`.
///
/// Does nothing if a subscriber is already installed.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .try_init();
}
