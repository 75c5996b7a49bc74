//! Todo schema shared by the integration tests

#![allow(dead_code)]

use std::sync::Arc;
use uuid::Uuid;

use pent_core::{Pent, PentContext, PentObject, PentResult, StoreSchema, TypeRegistry};
use pent_state_inmemory::InMemoryGraphStore;

pub const TODO_SCHEMA: &str = r#"
objects:
  - type_name: TodoUser
    type_id: 100000
  - type_name: TodoList
    type_id: 100001
edges:
  - edge_name: user_to_list
    edge_id: 9283
    from_id_attr: owner_id
indexes:
  - index_name: user_name_index
    indexed_attr: name
"#;

pub struct TodoUser(PentObject);

impl Pent for TodoUser {
    const TYPE_NAME: &'static str = "TodoUser";

    fn from_object(object: PentObject) -> Self {
        TodoUser(object)
    }

    fn object(&self) -> &PentObject {
        &self.0
    }
}

impl TodoUser {
    pub fn name(&self) -> Option<&str> {
        self.0.get_str("name")
    }

    pub async fn gen_todo_lists(
        &self,
        context: &PentContext,
        after: Option<Uuid>,
        first: Option<usize>,
    ) -> PentResult<Vec<TodoList>> {
        self.gen_associated_pents(context, "user_to_list", after, first)
            .await
    }
}

pub struct TodoList(PentObject);

impl Pent for TodoList {
    const TYPE_NAME: &'static str = "TodoList";

    fn from_object(object: PentObject) -> Self {
        TodoList(object)
    }

    fn object(&self) -> &PentObject {
        &self.0
    }
}

impl TodoList {
    pub fn name(&self) -> Option<&str> {
        self.0.get_str("name")
    }

    pub async fn gen_owner(&self, context: &PentContext) -> PentResult<Option<TodoUser>> {
        self.gen_from_stored_id(context, "owner_id").await
    }
}

pub struct Harness {
    pub store: InMemoryGraphStore,
    pub registry: Arc<TypeRegistry>,
}

impl Harness {
    pub fn new() -> Self {
        let schema = StoreSchema::from_yaml(TODO_SCHEMA).expect("schema parses");
        let registry = TypeRegistry::builder()
            .register::<TodoUser>()
            .register::<TodoList>()
            .build(&schema)
            .expect("registry matches schema");
        Self {
            store: InMemoryGraphStore::new(schema),
            registry: Arc::new(registry),
        }
    }

    /// A fresh request context over the shared store.
    pub fn context(&self) -> PentContext {
        PentContext::new(Arc::new(self.store.clone()), Arc::clone(&self.registry))
    }
}
