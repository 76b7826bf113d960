//! Record and identifier types for a remote collection.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Field map used when the resource schema is not known at compile time.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// Server-assigned record identifier.
///
/// Always non-empty. Servers that emit numeric ids are accepted; the number
/// is kept in its decimal string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
    /// Build an id, rejecting empty strings.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.is_empty() {
            None
        } else {
            Some(Self(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor;

        impl Visitor<'_> for IdVisitor {
            type Value = RecordId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-empty string or integer id")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<RecordId, E> {
                RecordId::new(v).ok_or_else(|| E::custom("record id is empty"))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<RecordId, E> {
                Ok(RecordId(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<RecordId, E> {
                Ok(RecordId(v.to_string()))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

/// One resource instance as returned by the server.
///
/// Encoded as a flat JSON object: `id` alongside the fields of `T`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<T = Fields> {
    pub id: RecordId,
    #[serde(flatten)]
    pub fields: T,
}

impl<T> Record<T> {
    pub fn new(id: RecordId, fields: T) -> Self {
        Self { id, fields }
    }
}

/// Records in server response order.
pub type Collection<T = Fields> = Vec<Record<T>>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct User {
        name: String,
        role: String,
    }

    #[test]
    fn test_numeric_id_normalized() {
        let record: Record = serde_json::from_value(json!({"id": 42, "name": "a"})).unwrap();
        assert_eq!(record.id.as_str(), "42");
        assert_eq!(record.fields.get("name"), Some(&json!("a")));
        assert!(!record.fields.contains_key("id"));
    }

    #[test]
    fn test_empty_or_missing_id_rejected() {
        assert!(serde_json::from_value::<Record>(json!({"id": "", "name": "a"})).is_err());
        assert!(serde_json::from_value::<Record>(json!({"name": "a"})).is_err());
        assert!(serde_json::from_value::<Record>(json!({"id": null})).is_err());
        assert!(RecordId::new("").is_none());
    }

    #[test]
    fn test_typed_record_flattens() {
        let record = Record::new(
            RecordId::new("7").unwrap(),
            User { name: "Ada".into(), role: "dev".into() },
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value, json!({"id": "7", "name": "Ada", "role": "dev"}));

        let back: Record<User> = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }
}
