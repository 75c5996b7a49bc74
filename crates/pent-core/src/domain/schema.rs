//! Store schema descriptor
//!
//! Describes the object types, edge definitions and secondary indexes the
//! store knows about. It is the store-side half of the input the
//! [`TypeRegistry`](crate::TypeRegistry) is built from.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::ids::{EdgeId, TypeId};
use crate::error::{PentError, PentResult};

/// One object type known to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDefinition {
    pub type_name: String,
    pub type_id: TypeId,
}

/// A named, directed edge type.
///
/// When `from_id_attr` is set, inserting an object that carries that field
/// creates an edge from the referenced object to the new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDefinition {
    pub edge_name: String,
    pub edge_id: EdgeId,
    #[serde(default)]
    pub from_id_attr: Option<String>,
}

/// A unique secondary index over one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub index_name: String,
    pub indexed_attr: String,
}

/// Full schema descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSchema {
    #[serde(default)]
    pub objects: Vec<ObjectDefinition>,
    #[serde(default)]
    pub edges: Vec<EdgeDefinition>,
    #[serde(default)]
    pub indexes: Vec<IndexDefinition>,
}

impl StoreSchema {
    /// Parse and validate a schema written in YAML.
    pub fn from_yaml(source: &str) -> PentResult<Self> {
        let schema: StoreSchema = serde_yaml::from_str(source)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Parse and validate a schema written in JSON.
    pub fn from_json(source: &str) -> PentResult<Self> {
        let schema: StoreSchema = serde_json::from_str(source)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Check that names and tags are unique within each section.
    pub fn validate(&self) -> PentResult<()> {
        let mut names = HashSet::new();
        let mut type_ids = HashSet::new();
        for object in &self.objects {
            if !names.insert(object.type_name.as_str()) {
                return Err(PentError::Configuration(format!(
                    "duplicate object type name {}",
                    object.type_name
                )));
            }
            if !type_ids.insert(object.type_id) {
                return Err(PentError::Configuration(format!(
                    "duplicate type id {}",
                    object.type_id
                )));
            }
        }

        let mut edge_names = HashSet::new();
        for edge in &self.edges {
            if !edge_names.insert(edge.edge_name.as_str()) {
                return Err(PentError::Configuration(format!(
                    "duplicate edge name {}",
                    edge.edge_name
                )));
            }
        }

        let mut index_names = HashSet::new();
        for index in &self.indexes {
            if !index_names.insert(index.index_name.as_str()) {
                return Err(PentError::Configuration(format!(
                    "duplicate index name {}",
                    index.index_name
                )));
            }
        }
        Ok(())
    }

    pub fn object_named(&self, type_name: &str) -> Option<&ObjectDefinition> {
        self.objects.iter().find(|o| o.type_name == type_name)
    }

    pub fn edge_named(&self, edge_name: &str) -> Option<&EdgeDefinition> {
        self.edges.iter().find(|e| e.edge_name == edge_name)
    }

    pub fn index_named(&self, index_name: &str) -> Option<&IndexDefinition> {
        self.indexes.iter().find(|i| i.index_name == index_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TODO_SCHEMA: &str = r#"
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

    #[test]
    fn test_from_yaml() {
        let schema = StoreSchema::from_yaml(TODO_SCHEMA).unwrap();
        assert_eq!(schema.objects.len(), 2);
        assert_eq!(
            schema.object_named("TodoList"),
            Some(&ObjectDefinition {
                type_name: "TodoList".to_string(),
                type_id: TypeId(100001),
            })
        );
        assert_eq!(
            schema.edge_named("user_to_list").and_then(|e| e.from_id_attr.as_deref()),
            Some("owner_id")
        );
        assert_eq!(
            schema.index_named("user_name_index").map(|i| i.indexed_attr.as_str()),
            Some("name")
        );
        assert!(schema.edge_named("missing").is_none());
    }

    #[test]
    fn test_from_json_with_missing_sections() {
        let schema =
            StoreSchema::from_json(r#"{"objects": [{"type_name": "A", "type_id": 1}]}"#).unwrap();
        assert_eq!(schema.objects.len(), 1);
        assert!(schema.edges.is_empty());
        assert!(schema.indexes.is_empty());
    }

    #[test]
    fn test_duplicate_type_id_rejected() {
        let result = StoreSchema::from_json(
            r#"{"objects": [{"type_name": "A", "type_id": 1}, {"type_name": "B", "type_id": 1}]}"#,
        );
        assert!(matches!(result, Err(PentError::Configuration(msg)) if msg.contains("type id 1")));
    }

    #[test]
    fn test_duplicate_edge_rejected() {
        let schema = StoreSchema {
            edges: vec![
                EdgeDefinition {
                    edge_name: "e".to_string(),
                    edge_id: EdgeId(1),
                    from_id_attr: None,
                },
                EdgeDefinition {
                    edge_name: "e".to_string(),
                    edge_id: EdgeId(2),
                    from_id_attr: None,
                },
            ],
            ..Default::default()
        };
        assert!(schema.validate().is_err());
    }
}
