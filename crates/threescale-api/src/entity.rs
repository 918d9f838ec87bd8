// ── Entity model ──
//
// `Entity` is the attribute mapping exchanged over the wire; `EntityId`
// identifies one remote entity in URLs. Both are deliberately schemaless:
// typed views are layered on top with `Entity::view`.

use std::borrow::Cow;
use std::fmt;
use std::ops::Index;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;

// ── EntityId ────────────────────────────────────────────────────────

/// Identifier of one remote entity.
///
/// Most resources use numeric ids; application keys are addressed by their
/// string value. Numeric ids select `read`, names select `read_by_name`
/// when a manager is indexed with [`lookup`](crate::Manager::lookup).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Numeric(u64),
    Name(String),
}

impl EntityId {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Numeric(_))
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Numeric(n) => Some(*n),
            Self::Name(_) => None,
        }
    }

    /// Read an id out of an attribute value (`42` or `"abc"`).
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_u64().map(Self::Numeric),
            Value::String(s) => Some(Self::Name(s.clone())),
            _ => None,
        }
    }

    /// The id as one percent-encoded URL path segment.
    pub fn path_segment(&self) -> Cow<'_, str> {
        match self {
            Self::Numeric(n) => Cow::Owned(n.to_string()),
            Self::Name(name) => urlencoding::encode(name),
        }
    }

    /// `true` if `value` carries this id, in either numeric or string form.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Numeric(n), Value::Number(v)) => v.as_u64() == Some(*n),
            (Self::Numeric(n), Value::String(s)) => s.parse::<u64>().ok() == Some(*n),
            (Self::Name(name), Value::String(s)) => name == s,
            _ => false,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Name(s) => write!(f, "{s}"),
        }
    }
}

impl From<u64> for EntityId {
    fn from(n: u64) -> Self {
        Self::Numeric(n)
    }
}

impl From<u32> for EntityId {
    fn from(n: u32) -> Self {
        Self::Numeric(u64::from(n))
    }
}

// Negative numbers are never remote ids; they are kept verbatim as names so
// the conversion stays total.
impl From<i64> for EntityId {
    fn from(n: i64) -> Self {
        u64::try_from(n).map_or_else(|_| Self::Name(n.to_string()), Self::Numeric)
    }
}

impl From<i32> for EntityId {
    fn from(n: i32) -> Self {
        Self::from(i64::from(n))
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self::Name(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::Name(s.to_owned())
    }
}

impl From<&EntityId> for EntityId {
    fn from(id: &EntityId) -> Self {
        id.clone()
    }
}

impl From<EntityId> for Value {
    fn from(id: EntityId) -> Self {
        match id {
            EntityId::Numeric(n) => Value::from(n),
            EntityId::Name(s) => Value::String(s),
        }
    }
}

// ── Entity ──────────────────────────────────────────────────────────

static NULL: Value = Value::Null;

/// One remote entity's attribute mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity(Map<String, Value>);

impl Entity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from any JSON value; only objects are accepted.
    pub fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(Error::UnrecognizedResponse {
                message: format!("expected an attribute mapping, got {other}"),
            }),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Deserialize one attribute; `Ok(None)` when absent or null.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, Error> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| Error::Deserialization {
                    message: format!("attribute '{key}': {e}"),
                    body: value.to_string(),
                }),
        }
    }

    /// String attribute, if present and a string.
    pub fn str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// `true` when the attribute is literally `true`.
    pub fn is_true(&self, key: &str) -> bool {
        matches!(self.0.get(key), Some(Value::Bool(true)))
    }

    /// Set an attribute, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Copy every attribute of `defaults` that this entity lacks.
    pub fn merge_missing(&mut self, defaults: &Entity) {
        for (key, value) in &defaults.0 {
            if !self.0.contains_key(key) {
                self.0.insert(key.clone(), value.clone());
            }
        }
    }

    /// The id stored under `field`, if it has a usable shape.
    pub fn id_at(&self, field: &str) -> Option<EntityId> {
        self.0.get(field).and_then(EntityId::from_value)
    }

    /// Deserialize the whole mapping into a typed view.
    pub fn view<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_value(Value::Object(self.0.clone())).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: self.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl Index<&str> for Entity {
    type Output = Value;

    /// Missing attributes index as `Value::Null`, like `serde_json::Value`.
    fn index(&self, key: &str) -> &Value {
        self.0.get(key).unwrap_or(&NULL)
    }
}

impl From<Map<String, Value>> for Entity {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Entity {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Error> {
        Self::from_value(value)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Entity {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&self.0) {
            Ok(json) => f.write_str(&json),
            Err(_) => f.write_str("{..}"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn entity_id_from_integer_literal() {
        assert_eq!(EntityId::from(42), EntityId::Numeric(42));
        assert_eq!(EntityId::from(-1), EntityId::Name("-1".into()));
    }

    #[test]
    fn entity_id_from_value() {
        assert_eq!(EntityId::from_value(&json!(7)), Some(EntityId::Numeric(7)));
        assert_eq!(
            EntityId::from_value(&json!("abc")),
            Some(EntityId::Name("abc".into()))
        );
        assert_eq!(EntityId::from_value(&json!(null)), None);
    }

    #[test]
    fn entity_id_matches_string_encoded_numbers() {
        assert!(EntityId::from(5).matches(&json!("5")));
        assert!(EntityId::from(5).matches(&json!(5)));
        assert!(!EntityId::from("k").matches(&json!(5)));
    }

    #[test]
    fn name_ids_are_percent_encoded_as_segments() {
        assert_eq!(EntityId::from(12).path_segment(), "12");
        assert_eq!(EntityId::from("plain-key").path_segment(), "plain-key");
        assert_eq!(EntityId::from("a/b#c?d").path_segment(), "a%2Fb%23c%3Fd");
    }

    #[test]
    fn entity_id_deserializes_untagged() {
        let ids: Vec<EntityId> = serde_json::from_value(json!([1, "a"])).unwrap();
        assert_eq!(ids, vec![EntityId::Numeric(1), EntityId::Name("a".into())]);
    }

    #[test]
    fn entity_rejects_non_objects() {
        assert!(Entity::from_value(json!([1, 2])).is_err());
        assert!(Entity::from_value(json!({"id": 1})).is_ok());
    }

    #[test]
    fn missing_attributes_index_as_null() {
        let entity = Entity::from_value(json!({"name": "x"})).unwrap();
        assert_eq!(entity["name"], "x");
        assert!(entity["nope"].is_null());
    }

    #[test]
    fn get_as_treats_null_as_absent() {
        let entity = Entity::from_value(json!({"id": 3, "gone": null})).unwrap();
        assert_eq!(entity.get_as::<u64>("id").unwrap(), Some(3));
        assert_eq!(entity.get_as::<u64>("gone").unwrap(), None);
        assert!(entity.get_as::<u64>("id").is_ok());
        assert!(Entity::from_value(json!({"id": "x"})).unwrap().get_as::<u64>("id").is_err());
    }

    #[test]
    fn merge_missing_keeps_existing_values() {
        let mut entity: Entity = [("metric_id", json!(1))].into_iter().collect();
        let defaults: Entity = [("metric_id", json!(9)), ("delta", json!(1))]
            .into_iter()
            .collect();
        entity.merge_missing(&defaults);
        assert_eq!(entity["metric_id"], 1);
        assert_eq!(entity["delta"], 1);
    }
}
