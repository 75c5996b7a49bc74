//! Store-facing data model: identifiers, records, schema and the store trait

pub mod ids;
pub mod record;
pub mod schema;
pub mod store;

pub use ids::{EdgeId, TypeId};
pub use record::{EdgeRecord, RawRecord, OBJ_ID_FIELD, TYPE_ID_FIELD};
pub use schema::{EdgeDefinition, IndexDefinition, ObjectDefinition, StoreSchema};
pub use store::GraphStore;
