//! Type registry
//!
//! Static bidirectional mapping between store type tags and entity types,
//! built once from an explicit registration table plus the store schema.
//! Read-only after construction, so it is shared freely behind an `Arc`.

use std::any::TypeId as RustTypeId;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, error};

use crate::domain::{StoreSchema, TypeId};
use crate::error::{PentError, PentResult};
use crate::pent::Pent;

/// Handle to a registered entity type.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PentClass {
    name: &'static str,
    rust_type: RustTypeId,
}

impl PentClass {
    /// Class handle for an entity type.
    pub fn of<T: Pent>() -> Self {
        Self {
            name: T::TYPE_NAME,
            rust_type: RustTypeId::of::<T>(),
        }
    }

    /// Schema type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether this class is the Rust type `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.rust_type == RustTypeId::of::<T>()
    }
}

impl fmt::Debug for PentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PentClass").field(&self.name).finish()
    }
}

impl fmt::Display for PentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Collects entity types before they are checked against the schema.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    classes: Vec<PentClass>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity type under its schema type name.
    pub fn register<T: Pent>(mut self) -> Self {
        self.classes.push(PentClass::of::<T>());
        self
    }

    pub fn build(self, schema: &StoreSchema) -> PentResult<TypeRegistry> {
        TypeRegistry::new(self.classes, schema)
    }
}

/// Bijection between type name, store [`TypeId`] and [`PentClass`].
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    by_type_id: HashMap<TypeId, PentClass>,
    by_name: HashMap<&'static str, PentClass>,
    by_rust_type: HashMap<RustTypeId, TypeId>,
}

impl TypeRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Build the registry, failing if any class lacks a schema type or any
    /// schema type lacks a class.
    pub fn new(
        classes: impl IntoIterator<Item = PentClass>,
        schema: &StoreSchema,
    ) -> PentResult<Self> {
        schema.validate()?;

        let mut by_type_id = HashMap::new();
        let mut by_name = HashMap::new();
        let mut by_rust_type = HashMap::new();

        for class in classes {
            let object = schema.object_named(class.name).ok_or_else(|| {
                error!(type_name = class.name, "Entity type has no schema object");
                PentError::RegistryMismatch(format!(
                    "type {} is not in the store schema",
                    class.name
                ))
            })?;

            if by_name.insert(class.name, class).is_some()
                || by_rust_type.insert(class.rust_type, object.type_id).is_some()
            {
                return Err(PentError::RegistryMismatch(format!(
                    "type {} registered twice",
                    class.name
                )));
            }
            by_type_id.insert(object.type_id, class);
        }

        if let Some(missing) = schema
            .objects
            .iter()
            .find(|o| !by_type_id.contains_key(&o.type_id))
        {
            error!(type_name = %missing.type_name, type_id = %missing.type_id, "Schema object has no entity type");
            return Err(PentError::RegistryMismatch(format!(
                "schema type {} ({}) has no registered entity type",
                missing.type_name, missing.type_id
            )));
        }

        debug!(types = by_type_id.len(), "Type registry built");
        Ok(Self {
            by_type_id,
            by_name,
            by_rust_type,
        })
    }

    /// Entity class for a store type tag.
    pub fn type_of(&self, type_id: TypeId) -> PentResult<PentClass> {
        self.by_type_id
            .get(&type_id)
            .copied()
            .ok_or(PentError::UnknownTypeId(type_id))
    }

    /// Store type tag for an entity class.
    pub fn type_id_of(&self, class: PentClass) -> PentResult<TypeId> {
        self.by_rust_type
            .get(&class.rust_type)
            .copied()
            .ok_or_else(|| PentError::UnregisteredType(class.name.to_string()))
    }

    pub fn type_id_for<T: Pent>(&self) -> PentResult<TypeId> {
        self.type_id_of(PentClass::of::<T>())
    }

    /// Entity class registered under a schema type name.
    pub fn class_named(&self, name: &str) -> PentResult<PentClass> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| PentError::UnregisteredType(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.by_type_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_type_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ObjectDefinition;
    use crate::pent::PentObject;

    struct Alpha(PentObject);
    struct Beta(PentObject);

    impl Pent for Alpha {
        const TYPE_NAME: &'static str = "Alpha";
        fn from_object(object: PentObject) -> Self {
            Alpha(object)
        }
        fn object(&self) -> &PentObject {
            &self.0
        }
    }

    impl Pent for Beta {
        const TYPE_NAME: &'static str = "Beta";
        fn from_object(object: PentObject) -> Self {
            Beta(object)
        }
        fn object(&self) -> &PentObject {
            &self.0
        }
    }

    fn schema(objects: &[(&str, i32)]) -> StoreSchema {
        StoreSchema {
            objects: objects
                .iter()
                .map(|(name, id)| ObjectDefinition {
                    type_name: name.to_string(),
                    type_id: TypeId(*id),
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_lookups_in_both_directions() {
        let registry = TypeRegistry::builder()
            .register::<Alpha>()
            .register::<Beta>()
            .build(&schema(&[("Alpha", 1), ("Beta", 2)]))
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.type_of(TypeId(1)).unwrap(), PentClass::of::<Alpha>());
        assert_eq!(registry.type_id_for::<Beta>().unwrap(), TypeId(2));
        assert!(registry.class_named("Beta").unwrap().is::<Beta>());
        assert_eq!(registry.class_named("Alpha").unwrap().name(), "Alpha");
    }

    #[test]
    fn test_unknown_lookups_fail_loudly() {
        let registry = TypeRegistry::builder()
            .register::<Alpha>()
            .build(&schema(&[("Alpha", 1)]))
            .unwrap();

        assert_eq!(registry.type_of(TypeId(9)), Err(PentError::UnknownTypeId(TypeId(9))));
        assert_eq!(
            registry.type_id_for::<Beta>(),
            Err(PentError::UnregisteredType("Beta".to_string()))
        );
        assert!(matches!(
            registry.class_named("Gamma"),
            Err(PentError::UnregisteredType(name)) if name == "Gamma"
        ));
    }

    #[test]
    fn test_class_without_schema_type_is_rejected() {
        let result = TypeRegistry::builder()
            .register::<Alpha>()
            .register::<Beta>()
            .build(&schema(&[("Alpha", 1)]));
        assert!(matches!(result, Err(PentError::RegistryMismatch(msg)) if msg.contains("Beta")));
    }

    #[test]
    fn test_schema_type_without_class_is_rejected() {
        let result = TypeRegistry::builder()
            .register::<Alpha>()
            .build(&schema(&[("Alpha", 1), ("Beta", 2)]));
        assert!(matches!(result, Err(PentError::RegistryMismatch(msg)) if msg.contains("Beta")));
    }

    #[test]
    fn test_double_registration_is_rejected() {
        let result = TypeRegistry::builder()
            .register::<Alpha>()
            .register::<Alpha>()
            .build(&schema(&[("Alpha", 1)]));
        assert!(matches!(result, Err(PentError::RegistryMismatch(_))));
    }
}
