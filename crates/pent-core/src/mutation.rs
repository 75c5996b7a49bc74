//! Write payloads
//!
//! A [`MutationData`] holds only the fields a caller set. Setting a field to
//! null is the same as not setting it: nulls never reach the store.

use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::RawRecord;

/// One payload field value.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationValue {
    Null,
    Value(Value),
    Data(MutationData),
    List(Vec<MutationValue>),
}

impl MutationValue {
    pub fn is_null(&self) -> bool {
        matches!(self, MutationValue::Null | MutationValue::Value(Value::Null))
    }

    fn to_value(&self) -> Value {
        match self {
            MutationValue::Null => Value::Null,
            MutationValue::Value(value) => value.clone(),
            MutationValue::Data(data) => Value::Object(data.to_sparse_map()),
            MutationValue::List(items) => {
                Value::Array(items.iter().map(MutationValue::to_value).collect())
            }
        }
    }
}

impl From<Value> for MutationValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => MutationValue::Null,
            other => MutationValue::Value(other),
        }
    }
}

impl From<MutationData> for MutationValue {
    fn from(data: MutationData) -> Self {
        MutationValue::Data(data)
    }
}

impl From<Vec<MutationData>> for MutationValue {
    fn from(items: Vec<MutationData>) -> Self {
        MutationValue::List(items.into_iter().map(MutationValue::Data).collect())
    }
}

impl From<&str> for MutationValue {
    fn from(value: &str) -> Self {
        MutationValue::Value(Value::String(value.to_string()))
    }
}

impl From<String> for MutationValue {
    fn from(value: String) -> Self {
        MutationValue::Value(Value::String(value))
    }
}

impl From<i64> for MutationValue {
    fn from(value: i64) -> Self {
        MutationValue::Value(Value::from(value))
    }
}

impl From<bool> for MutationValue {
    fn from(value: bool) -> Self {
        MutationValue::Value(Value::Bool(value))
    }
}

impl From<Uuid> for MutationValue {
    fn from(value: Uuid) -> Self {
        MutationValue::Value(Value::String(value.to_string()))
    }
}

impl<T: Into<MutationValue>> From<Option<T>> for MutationValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(MutationValue::Null, Into::into)
    }
}

/// Sparse, possibly nested write payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationData {
    fields: BTreeMap<String, MutationValue>,
}

impl MutationData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](MutationData::insert).
    pub fn set(mut self, name: impl Into<String>, value: impl Into<MutationValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<MutationValue>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&MutationValue> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    /// True when `name` was set to something other than null.
    pub fn has_field(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Field map as sent to the store: nulls dropped, nested payloads
    /// flattened recursively, lists mapped element by element.
    pub fn to_sparse_map(&self) -> RawRecord {
        self.fields
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(name, value)| (name.clone(), value.to_value()))
            .collect()
    }
}

impl Serialize for MutationData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_sparse_map().serialize(serializer)
    }
}
