//! Raw store records and edge records

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::ids::{EdgeId, TypeId};

/// Field holding a record's own identifier.
pub const OBJ_ID_FIELD: &str = "obj_id";

/// Field holding a record's type tag.
pub const TYPE_ID_FIELD: &str = "type_id";

/// Field name to opaque value, as returned by the store for one identifier.
///
/// Always carries [`OBJ_ID_FIELD`] and [`TYPE_ID_FIELD`].
pub type RawRecord = serde_json::Map<String, Value>;

/// Read the identifier a record carries about itself.
pub fn record_obj_id(record: &RawRecord) -> Option<Uuid> {
    record
        .get(OBJ_ID_FIELD)
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
}

/// Read the type tag a record carries.
pub fn record_type_id(record: &RawRecord) -> Option<TypeId> {
    record
        .get(TYPE_ID_FIELD)
        .and_then(Value::as_i64)
        .and_then(|v| i32::try_from(v).ok())
        .map(TypeId)
}

/// Directed, named relation between two objects.
///
/// Edges are ordered for pagination by `to_id`; the in-memory store issues
/// time-ordered identifiers so this is also insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub edge_id: EdgeId,
    pub from_id: Uuid,
    pub to_id: Uuid,
    #[serde(default)]
    pub data: Option<Value>,
}

impl EdgeRecord {
    /// Cursor value used for `after` pagination.
    pub fn ordering_key(&self) -> Uuid {
        self.to_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_accessors() {
        let id = Uuid::new_v4();
        let record = json!({ "obj_id": id.to_string(), "type_id": 1000, "name": "x" });
        let record = record.as_object().unwrap().clone();

        assert_eq!(record_obj_id(&record), Some(id));
        assert_eq!(record_type_id(&record), Some(TypeId(1000)));
    }

    #[test]
    fn test_record_accessors_reject_malformed_values() {
        let record = json!({ "obj_id": "not-a-uuid", "type_id": "1000" });
        let record = record.as_object().unwrap().clone();

        assert_eq!(record_obj_id(&record), None);
        assert_eq!(record_type_id(&record), None);
        assert_eq!(record_obj_id(&RawRecord::new()), None);
    }
}
