// Envelope extraction
//
// The management API wraps single entities as `{"service": {...}}` and
// collections as `{"services": [{"service": {...}}, ...]}`. Some endpoints
// skip one level or the other; extraction degrades to the bare shape instead
// of failing.

use serde_json::{Map, Value};

use crate::error::Error;

/// Outcome of unwrapping one response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    Single(Value),
    Collection(Vec<Value>),
    /// The body was absent or null.
    Empty,
}

impl Extracted {
    /// Collapse back into a plain value (`Empty` becomes `Null`).
    pub fn into_value(self) -> Value {
        match self {
            Self::Single(value) => value,
            Self::Collection(items) => Value::Array(items),
            Self::Empty => Value::Null,
        }
    }
}

/// Unwrap the entity (or entities) from a decoded body.
///
/// When `collection_key` is given the body must be a mapping that contains
/// it; anything else is [`Error::MissingCollection`].
pub fn extract(
    body: Option<Value>,
    entity_key: &str,
    collection_key: Option<&str>,
) -> Result<Extracted, Error> {
    let mut body = match body {
        None | Some(Value::Null) => return Ok(Extracted::Empty),
        Some(value) => value,
    };

    if let Some(key) = collection_key {
        body = match body {
            Value::Object(mut map) => map.remove(key).ok_or_else(|| Error::MissingCollection {
                key: key.to_owned(),
            })?,
            _ => {
                return Err(Error::MissingCollection {
                    key: key.to_owned(),
                });
            }
        };
    }

    match body {
        Value::Null => Ok(Extracted::Empty),
        Value::Array(items) => Ok(Extracted::Collection(
            items
                .into_iter()
                .map(|item| unwrap_member(item, entity_key))
                .collect(),
        )),
        Value::Object(mut map) => match map.remove(entity_key) {
            Some(inner) => Ok(Extracted::Single(inner)),
            None => Ok(Extracted::Single(Value::Object(map))),
        },
        other => Err(Error::UnrecognizedResponse {
            message: format!("expected a mapping or a sequence, got {other}"),
        }),
    }
}

fn unwrap_member(item: Value, entity_key: &str) -> Value {
    match item {
        Value::Object(mut map) if map.contains_key(entity_key) => {
            map.remove(entity_key).unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Raise the remote validation payload carried by a decoded body, if any.
///
/// A mapping whose `error` or `errors` attribute is present and not
/// null/false is an [`Error::Api`]; any other value passes.
pub fn check_response(value: &Value) -> Result<(), Error> {
    let Value::Object(map) = value else {
        return Ok(());
    };
    for key in ["error", "errors"] {
        match map.get(key) {
            None | Some(Value::Null | Value::Bool(false)) => {}
            Some(payload) => {
                return Err(Error::Api {
                    message: describe(payload),
                    payload: value.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Flatten a validation payload into one line:
/// `{"name": ["can't be blank"]}` becomes `name can't be blank`.
fn describe(payload: &Value) -> String {
    match payload {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(describe).collect::<Vec<_>>().join("; "),
        Value::Object(map) => map
            .iter()
            .map(|(field, messages)| format!("{field} {}", describe(messages)))
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    }
}

/// Wrap one entity as `{entity_key: entity}`.
pub fn wrap_single(entity_key: &str, entity: Value) -> Value {
    let mut map = Map::new();
    map.insert(entity_key.to_owned(), entity);
    Value::Object(map)
}

/// Wrap entities as `{collection_key: [{entity_key: e}, ...]}`.
pub fn wrap_collection(
    collection_key: &str,
    entity_key: &str,
    entities: impl IntoIterator<Item = Value>,
) -> Value {
    let items = entities
        .into_iter()
        .map(|entity| wrap_single(entity_key, entity))
        .collect();
    wrap_single(collection_key, Value::Array(items))
}
