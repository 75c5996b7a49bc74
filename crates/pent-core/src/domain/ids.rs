//! Identifier types shared between the runtime and the store

use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-level tag identifying the concrete type of an object.
///
/// Stable for the lifetime of the store's schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(pub i32);

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for TypeId {
    fn from(value: i32) -> Self {
        TypeId(value)
    }
}

/// Store-level tag identifying an edge definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub i32);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_id_serializes_as_integer() {
        let serialized = serde_json::to_string(&TypeId(100_000)).unwrap();
        assert_eq!(serialized, "100000");

        let parsed: TypeId = serde_json::from_str("42").unwrap();
        assert_eq!(parsed, TypeId(42));
    }

    #[test]
    fn test_display() {
        assert_eq!(TypeId(3).to_string(), "3");
        assert_eq!(EdgeId(9).to_string(), "9");
    }
}
