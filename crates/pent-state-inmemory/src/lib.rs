//! In-memory graph store for the Pent runtime
//!
//! Implements [`GraphStore`] over plain ordered maps. Useful for development
//! and tests; nothing is persisted. Objects and edges are ordered by
//! identifier, and identifiers are time-ordered (UUIDv7), so store order is
//! creation order.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use pent_core::domain::record::record_type_id;
use pent_core::{
    EdgeDefinition, EdgeId, EdgeRecord, GraphStore, RawRecord, StoreError, StoreSchema, TypeId,
    OBJ_ID_FIELD, TYPE_ID_FIELD,
};


type EdgeKey = (EdgeId, Uuid);

#[derive(Default)]
struct Tables {
    objects: BTreeMap<Uuid, RawRecord>,
    edges: HashMap<EdgeKey, BTreeMap<Uuid, EdgeRecord>>,
}

/// In-memory [`GraphStore`].
///
/// Clones share the same tables.
#[derive(Clone)]
pub struct InMemoryGraphStore {
    schema: Arc<StoreSchema>,
    tables: Arc<RwLock<Tables>>,
    fetch_log: Arc<Mutex<Vec<Vec<Uuid>>>>,
}

impl InMemoryGraphStore {
    pub fn new(schema: StoreSchema) -> Self {
        Self {
            schema: Arc::new(schema),
            tables: Arc::new(RwLock::new(Tables::default())),
            fetch_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn schema(&self) -> &StoreSchema {
        &self.schema
    }

    /// Add an edge by name outside of object insertion.
    pub async fn add_edge(
        &self,
        edge_name: &str,
        from_id: Uuid,
        to_id: Uuid,
        data: Option<Value>,
    ) -> Result<(), StoreError> {
        let edge = self
            .schema
            .edge_named(edge_name)
            .ok_or_else(|| StoreError::InvalidInput(format!("unknown edge {}", edge_name)))?;
        let mut tables = self.tables.write().await;
        insert_edge(&mut tables, edge.edge_id, from_id, to_id, data);
        Ok(())
    }

    /// Number of `fetch_objects` calls served so far.
    pub fn fetch_calls(&self) -> usize {
        self.fetch_log.lock().len()
    }

    /// Identifiers requested by each `fetch_objects` call, oldest first.
    pub fn fetch_log(&self) -> Vec<Vec<Uuid>> {
        self.fetch_log.lock().clone()
    }

    pub async fn object_count(&self) -> usize {
        self.tables.read().await.objects.len()
    }
}

fn insert_edge(tables: &mut Tables, edge_id: EdgeId, from_id: Uuid, to_id: Uuid, data: Option<Value>) {
    tables.edges.entry((edge_id, from_id)).or_default().insert(
        to_id,
        EdgeRecord {
            edge_id,
            from_id,
            to_id,
            data,
        },
    );
}

fn after_bound(after: Option<Uuid>) -> (Bound<Uuid>, Bound<Uuid>) {
    match after {
        Some(after) => (Bound::Excluded(after), Bound::Unbounded),
        None => (Bound::Unbounded, Bound::Unbounded),
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn fetch_objects(
        &self,
        ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Option<RawRecord>>, StoreError> {
        self.fetch_log.lock().push(ids.to_vec());
        let tables = self.tables.read().await;
        let found = ids
            .iter()
            .filter_map(|id| tables.objects.get(id).map(|r| (*id, Some(r.clone()))))
            .collect::<HashMap<_, _>>();
        debug!(requested = ids.len(), found = found.len(), "Fetched objects");
        Ok(found)
    }

    async fn scan_objects_of_type(
        &self,
        type_id: TypeId,
        after: Option<Uuid>,
        limit: usize,
    ) -> Result<Vec<(Uuid, RawRecord)>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .objects
            .range(after_bound(after))
            .filter(|(_, record)| record_type_id(record) == Some(type_id))
            .take(limit)
            .map(|(id, record)| (*id, record.clone()))
            .collect())
    }

    async fn insert_object(&self, type_id: TypeId, fields: RawRecord) -> Result<Uuid, StoreError> {
        if !self.schema.objects.iter().any(|o| o.type_id == type_id) {
            return Err(StoreError::InvalidInput(format!("unknown type id {}", type_id)));
        }

        let obj_id = Uuid::now_v7();
        let mut record = fields;
        record.insert(OBJ_ID_FIELD.to_string(), Value::String(obj_id.to_string()));
        record.insert(TYPE_ID_FIELD.to_string(), Value::from(type_id.0));

        let mut tables = self.tables.write().await;
        for edge in &self.schema.edges {
            let Some(attr) = edge.from_id_attr.as_deref() else {
                continue;
            };
            match record.get(attr).and_then(Value::as_str).map(Uuid::parse_str) {
                Some(Ok(from_id)) => insert_edge(&mut tables, edge.edge_id, from_id, obj_id, None),
                Some(Err(_)) => warn!(edge = %edge.edge_name, attr, "Edge source is not an identifier"),
                None => {}
            }
        }
        tables.objects.insert(obj_id, record);

        debug!(%obj_id, %type_id, "Inserted object");
        Ok(obj_id)
    }

    async fn update_object(&self, obj_id: Uuid, fields: RawRecord) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let record = tables
            .objects
            .get_mut(&obj_id)
            .ok_or_else(|| StoreError::InvalidInput(format!("object {} not found", obj_id)))?;
        for (name, value) in fields {
            if name != OBJ_ID_FIELD && name != TYPE_ID_FIELD {
                record.insert(name, value);
            }
        }
        debug!(%obj_id, "Updated object");
        Ok(())
    }

    async fn delete_object(&self, obj_id: Uuid) -> Result<Uuid, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.objects.remove(&obj_id).is_none() {
            return Err(StoreError::InvalidInput(format!("object {} not found", obj_id)));
        }
        tables.edges.retain(|(_, from_id), _| *from_id != obj_id);
        for targets in tables.edges.values_mut() {
            targets.remove(&obj_id);
        }
        debug!(%obj_id, "Deleted object");
        Ok(obj_id)
    }

    async fn fetch_edges(
        &self,
        edge: &EdgeDefinition,
        from_id: Uuid,
        after: Option<Uuid>,
        limit: Option<usize>,
    ) -> Result<Vec<EdgeRecord>, StoreError> {
        let tables = self.tables.read().await;
        let Some(targets) = tables.edges.get(&(edge.edge_id, from_id)) else {
            return Ok(Vec::new());
        };
        Ok(targets
            .range(after_bound(after))
            .take(limit.unwrap_or(usize::MAX))
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn lookup_id_by_index(
        &self,
        index_name: &str,
        value: &Value,
    ) -> Result<Option<Uuid>, StoreError> {
        let index = self
            .schema
            .index_named(index_name)
            .ok_or_else(|| StoreError::InvalidInput(format!("unknown index {}", index_name)))?;
        let tables = self.tables.read().await;
        Ok(tables
            .objects
            .iter()
            .find(|(_, record)| record.get(&index.indexed_attr) == Some(value))
            .map(|(id, _)| *id))
    }

    fn edge_definition_named(&self, edge_name: &str) -> Option<EdgeDefinition> {
        self.schema.edge_named(edge_name).cloned()
    }
}
