//! GraphStore trait definition for the object/edge/index store

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

use super::ids::TypeId;
use super::record::{EdgeRecord, RawRecord};
use super::schema::EdgeDefinition;
use crate::error::StoreError;

/// Interface to the underlying object/edge store.
///
/// The store owns durability, index maintenance and its own I/O safety; one
/// handle may be shared by many concurrent request contexts. The runtime
/// performs no retries, so any retry policy belongs to the implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GraphStore: Send + Sync + 'static {
    /// Fetch the records for a set of identifiers in one round trip.
    ///
    /// Missing identifiers may be omitted or mapped to `None`.
    async fn fetch_objects(
        &self,
        ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Option<RawRecord>>, StoreError>;

    /// Scan objects of one type in store order, strictly after `after`.
    async fn scan_objects_of_type(
        &self,
        type_id: TypeId,
        after: Option<Uuid>,
        limit: usize,
    ) -> Result<Vec<(Uuid, RawRecord)>, StoreError>;

    /// Insert a new object and return its freshly issued identifier.
    async fn insert_object(&self, type_id: TypeId, fields: RawRecord) -> Result<Uuid, StoreError>;

    /// Merge `fields` into an existing object.
    async fn update_object(&self, obj_id: Uuid, fields: RawRecord) -> Result<(), StoreError>;

    /// Delete an object, returning the identifier that was deleted.
    async fn delete_object(&self, obj_id: Uuid) -> Result<Uuid, StoreError>;

    /// Edges of one definition leaving `from_id`, ordered by ordering key,
    /// strictly after `after`, at most `limit` of them.
    async fn fetch_edges(
        &self,
        edge: &EdgeDefinition,
        from_id: Uuid,
        after: Option<Uuid>,
        limit: Option<usize>,
    ) -> Result<Vec<EdgeRecord>, StoreError>;

    /// Resolve an identifier through a secondary index.
    ///
    /// Index updates are not atomic with object writes, so a match may be
    /// transiently stale or missing.
    async fn lookup_id_by_index(
        &self,
        index_name: &str,
        value: &Value,
    ) -> Result<Option<Uuid>, StoreError>;

    /// Look up an edge definition by name.
    fn edge_definition_named(&self, edge_name: &str) -> Option<EdgeDefinition>;
}
