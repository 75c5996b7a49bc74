//! Entities
//!
//! [`PentObject`] is the untyped projection over one stored record and is what
//! the loader caches. Concrete entity types wrap a `PentObject` and implement
//! [`Pent`], which supplies every load, scan, index and edge operation through
//! default methods routed via a [`PentContext`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::context::PentContext;
use crate::domain::record::record_type_id;
use crate::domain::{EdgeRecord, RawRecord, TypeId};
use crate::error::{PentError, PentResult};
use crate::registry::{PentClass, TypeRegistry};

/// One stored object, bound to its registered class.
///
/// Cheap to clone; the record itself is shared.
#[derive(Debug, Clone, PartialEq)]
pub struct PentObject {
    obj_id: Uuid,
    type_id: TypeId,
    class: PentClass,
    data: Arc<RawRecord>,
}

impl PentObject {
    pub fn new(obj_id: Uuid, type_id: TypeId, class: PentClass, data: RawRecord) -> Self {
        Self {
            obj_id,
            type_id,
            class,
            data: Arc::new(data),
        }
    }

    /// Build an object from a fetched record, resolving its class from the
    /// record's type tag.
    pub fn from_record(
        registry: &TypeRegistry,
        obj_id: Uuid,
        data: RawRecord,
    ) -> PentResult<Self> {
        let type_id = record_type_id(&data).ok_or_else(|| PentError::InvalidRecord {
            obj_id,
            reason: "missing or malformed type_id".to_string(),
        })?;
        let class = registry.type_of(type_id)?;
        Ok(Self::new(obj_id, type_id, class, data))
    }

    pub fn obj_id(&self) -> Uuid {
        self.obj_id
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn class(&self) -> PentClass {
        self.class
    }

    pub fn data(&self) -> &RawRecord {
        &self.data
    }

    /// Field value; JSON `null` reads as absent.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field).filter(|v| !v.is_null())
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(Value::as_bool)
    }

    pub fn get_uuid(&self, field: &str) -> Option<Uuid> {
        self.get_str(field).and_then(|s| Uuid::parse_str(s).ok())
    }

    /// Deserialize a field into `T`.
    pub fn field<T: DeserializeOwned>(&self, field: &str) -> PentResult<Option<T>> {
        match self.get(field) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| PentError::InvalidRecord {
                    obj_id: self.obj_id,
                    reason: format!("field {}: {}", field, e),
                }),
        }
    }

    /// Identifier stored in `field`, if any.
    pub fn stored_id(&self, field: &str) -> PentResult<Option<Uuid>> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::String(s)) => Uuid::parse_str(s).map(Some).map_err(|_| {
                PentError::InvalidRecord {
                    obj_id: self.obj_id,
                    reason: format!("field {} is not an identifier: {}", field, s),
                }
            }),
            Some(other) => Err(PentError::InvalidRecord {
                obj_id: self.obj_id,
                reason: format!("field {} is not an identifier: {}", field, other),
            }),
        }
    }

    /// Require this object to be exactly `class`.
    pub fn expect_class(self, class: PentClass) -> PentResult<Self> {
        if self.class == class {
            Ok(self)
        } else {
            Err(mismatch(&self, class.name()))
        }
    }
}

fn mismatch(object: &PentObject, expected: &str) -> PentError {
    PentError::TypeMismatch {
        obj_id: object.obj_id,
        expected: expected.to_string(),
        actual: object.class.name().to_string(),
    }
}

/// A typed entity.
///
/// Implementors provide the type name and the wrapping; everything else has a
/// default. The context is always passed in, never stored on the entity.
#[async_trait]
pub trait Pent: Sized + Send + Sync + 'static {
    /// Schema type name this entity is registered under.
    const TYPE_NAME: &'static str;

    fn from_object(object: PentObject) -> Self;

    fn object(&self) -> &PentObject;

    /// Whether an object of `class` can be viewed as `Self`.
    fn accepts_class(class: PentClass) -> bool {
        class.is::<Self>()
    }

    fn obj_id(&self) -> Uuid {
        self.object().obj_id()
    }

    fn data(&self) -> &RawRecord {
        self.object().data()
    }

    /// View a loaded object as `Self`, failing on a foreign class.
    fn cast(object: PentObject) -> PentResult<Self> {
        if Self::accepts_class(object.class()) {
            Ok(Self::from_object(object))
        } else {
            Err(mismatch(&object, Self::TYPE_NAME))
        }
    }

    /// Load one entity through the context's loader.
    async fn gen(context: &PentContext, obj_id: Uuid) -> PentResult<Option<Self>> {
        context
            .loader()
            .load(obj_id)
            .await?
            .map(Self::cast)
            .transpose()
    }

    /// Load many entities in one batch, in the order asked for.
    async fn gen_list(context: &PentContext, obj_ids: &[Uuid]) -> PentResult<Vec<Option<Self>>> {
        context
            .loader()
            .load_many(obj_ids)
            .await?
            .into_iter()
            .map(|object| object.map(Self::cast).transpose())
            .collect()
    }

    /// Like [`gen_list`](Pent::gen_list), keyed by identifier. Missing
    /// identifiers have no entry.
    async fn gen_dict(context: &PentContext, obj_ids: &[Uuid]) -> PentResult<HashMap<Uuid, Self>> {
        let entities = Self::gen_list(context, obj_ids).await?;
        Ok(obj_ids
            .iter()
            .copied()
            .zip(entities)
            .filter_map(|(obj_id, entity)| entity.map(|e| (obj_id, e)))
            .collect())
    }

    /// Scan entities of this type in store order, strictly after `after`,
    /// at most `first` of them. Bypasses the loader cache.
    async fn gen_browse(
        context: &PentContext,
        after: Option<Uuid>,
        first: usize,
    ) -> PentResult<Vec<Self>> {
        let class = PentClass::of::<Self>();
        Ok(browse(context, class, after, first)
            .await?
            .into_iter()
            .map(Self::from_object)
            .collect())
    }

    /// Resolve through a secondary index, then load.
    ///
    /// Index entries may be transiently stale or missing relative to writes.
    async fn gen_from_index(
        context: &PentContext,
        index_name: &str,
        value: &Value,
    ) -> PentResult<Option<Self>> {
        match context.store().lookup_id_by_index(index_name, value).await? {
            Some(obj_id) => Self::gen(context, obj_id).await,
            None => {
                debug!(index = index_name, "No index match");
                Ok(None)
            }
        }
    }

    /// Edges named `edge_name` leaving this entity, after `after`, at most
    /// `first` of them.
    async fn gen_edges_to(
        &self,
        context: &PentContext,
        edge_name: &str,
        after: Option<Uuid>,
        first: Option<usize>,
    ) -> PentResult<Vec<EdgeRecord>> {
        let edge = context.edge_definition_named(edge_name)?;
        let mut edges = context
            .store()
            .fetch_edges(&edge, self.obj_id(), after, first)
            .await?;
        if let Some(first) = first {
            edges.truncate(first);
        }
        trace!(edge = edge_name, count = edges.len(), "Fetched edges");
        Ok(edges)
    }

    /// Targets of [`gen_edges_to`](Pent::gen_edges_to), loaded as `T` in
    /// edge order. Targets that no longer exist are skipped.
    async fn gen_associated_pents<T: Pent>(
        &self,
        context: &PentContext,
        edge_name: &str,
        after: Option<Uuid>,
        first: Option<usize>,
    ) -> PentResult<Vec<T>> {
        let edges = self.gen_edges_to(context, edge_name, after, first).await?;
        let ids: Vec<Uuid> = edges.iter().map(|e| e.to_id).collect();
        Ok(T::gen_list(context, &ids).await?.into_iter().flatten().collect())
    }

    /// [`gen_associated_pents`](Pent::gen_associated_pents) with the target
    /// class looked up by name.
    async fn gen_associated_pents_dynamic(
        &self,
        context: &PentContext,
        class_name: &str,
        edge_name: &str,
        after: Option<Uuid>,
        first: Option<usize>,
    ) -> PentResult<Vec<PentObject>> {
        let class = context.class_named(class_name)?;
        let edges = self.gen_edges_to(context, edge_name, after, first).await?;
        let ids: Vec<Uuid> = edges.iter().map(|e| e.to_id).collect();
        context
            .loader()
            .load_many(&ids)
            .await?
            .into_iter()
            .flatten()
            .map(|object| object.expect_class(class))
            .collect()
    }

    /// Load the entity whose identifier this record stores under `key`.
    async fn gen_from_stored_id<T: Pent>(
        &self,
        context: &PentContext,
        key: &str,
    ) -> PentResult<Option<T>> {
        match self.object().stored_id(key)? {
            Some(obj_id) => T::gen(context, obj_id).await,
            None => Ok(None),
        }
    }

    async fn gen_from_stored_id_dynamic(
        &self,
        context: &PentContext,
        class_name: &str,
        key: &str,
    ) -> PentResult<Option<PentObject>> {
        match self.object().stored_id(key)? {
            Some(obj_id) => gen_pent_dynamic(context, class_name, obj_id).await,
            None => Ok(None),
        }
    }
}

/// The untyped view accepts every class.
impl Pent for PentObject {
    const TYPE_NAME: &'static str = "Pent";

    fn from_object(object: PentObject) -> Self {
        object
    }

    fn object(&self) -> &PentObject {
        self
    }

    fn accepts_class(_class: PentClass) -> bool {
        true
    }
}

async fn browse(
    context: &PentContext,
    class: PentClass,
    after: Option<Uuid>,
    first: usize,
) -> PentResult<Vec<PentObject>> {
    let type_id = context.registry().type_id_of(class)?;
    if first == 0 {
        return Ok(Vec::new());
    }
    let records = context
        .store()
        .scan_objects_of_type(type_id, after, first)
        .await?;
    debug!(class = %class, count = records.len(), "Browsed objects");
    Ok(records
        .into_iter()
        .take(first)
        .map(|(obj_id, record)| PentObject::new(obj_id, type_id, class, record))
        .collect())
}

/// Load one object, requiring it to be of the class named `class_name`.
pub async fn gen_pent_dynamic(
    context: &PentContext,
    class_name: &str,
    obj_id: Uuid,
) -> PentResult<Option<PentObject>> {
    let class = context.class_named(class_name)?;
    context
        .loader()
        .load(obj_id)
        .await?
        .map(|object| object.expect_class(class))
        .transpose()
}

/// Browse objects of the class named `class_name`.
pub async fn gen_browse_pents_dynamic(
    context: &PentContext,
    class_name: &str,
    after: Option<Uuid>,
    first: usize,
) -> PentResult<Vec<PentObject>> {
    let class = context.class_named(class_name)?;
    browse(context, class, after, first).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct Widget(PentObject);

    impl Pent for Widget {
        const TYPE_NAME: &'static str = "Widget";
        fn from_object(object: PentObject) -> Self {
            Widget(object)
        }
        fn object(&self) -> &PentObject {
            &self.0
        }
    }

    struct Gadget(PentObject);

    impl Pent for Gadget {
        const TYPE_NAME: &'static str = "Gadget";
        fn from_object(object: PentObject) -> Self {
            Gadget(object)
        }
        fn object(&self) -> &PentObject {
            &self.0
        }
    }

    fn widget(data: Value) -> PentObject {
        let record = data.as_object().cloned().unwrap_or_default();
        PentObject::new(Uuid::new_v4(), TypeId(1), PentClass::of::<Widget>(), record)
    }

    #[test]
    fn test_field_accessors() {
        let owner = Uuid::new_v4();
        let object = widget(json!({
            "name": "spanner",
            "count": 3,
            "active": true,
            "owner_id": owner.to_string(),
            "note": null,
            "tags": ["a", "b"],
        }));

        assert_eq!(object.get_str("name"), Some("spanner"));
        assert_eq!(object.get_i64("count"), Some(3));
        assert_eq!(object.get_bool("active"), Some(true));
        assert_eq!(object.get_uuid("owner_id"), Some(owner));
        assert_eq!(object.get("note"), None);
        assert_eq!(object.get("missing"), None);
        assert_eq!(
            object.field::<Vec<String>>("tags").unwrap(),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert!(object.field::<u32>("name").is_err());
    }

    #[test]
    fn test_stored_id() {
        let owner = Uuid::new_v4();
        let object = widget(json!({
            "owner_id": owner.to_string(),
            "empty": null,
            "bad": "not-an-id",
            "number": 4,
        }));

        assert_eq!(object.stored_id("owner_id").unwrap(), Some(owner));
        assert_eq!(object.stored_id("empty").unwrap(), None);
        assert_eq!(object.stored_id("absent").unwrap(), None);
        assert!(matches!(
            object.stored_id("bad"),
            Err(PentError::InvalidRecord { .. })
        ));
        assert!(object.stored_id("number").is_err());
    }

    #[test]
    fn test_cast_checks_class() {
        let object = widget(json!({}));
        let obj_id = object.obj_id();

        assert!(Widget::cast(object.clone()).is_ok());
        assert!(PentObject::cast(object.clone()).is_ok());
        assert_eq!(
            Gadget::cast(object).err(),
            Some(PentError::TypeMismatch {
                obj_id,
                expected: "Gadget".to_string(),
                actual: "Widget".to_string(),
            })
        );
    }

    #[test]
    fn test_expect_class() {
        let object = widget(json!({}));
        assert!(object.clone().expect_class(PentClass::of::<Widget>()).is_ok());
        assert!(object.expect_class(PentClass::of::<Gadget>()).is_err());
    }
}
