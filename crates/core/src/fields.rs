//! Typed access to a decoded JSON/YAML object.
//!
//! Every accessor either yields a value of the requested shape or a
//! [`ValidationError`] tagged with the field's path. Explicit `null` is
//! treated the same as an absent key.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::path::FieldPath;

/// Build a typed value from a decoded structured value.
///
/// Implementations are all-or-nothing: the first missing or mis-shaped field
/// aborts construction.
pub trait FromValue: Sized {
    fn from_value(value: &Value, path: &FieldPath) -> Result<Self, ValidationError>;
}

/// String-valued field restricted to a fixed set of spellings.
pub trait ClosedSet: Sized + 'static {
    const VARIANTS: &'static [&'static str];

    fn parse(s: &str) -> Option<Self>;
}

/// Short name of a value's JSON shape, used in mismatch reports
pub fn shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn as_i32(value: &Value, path: &FieldPath) -> Result<i32, ValidationError> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i32::try_from(i)
                .map_err(|_| ValidationError::mismatch(path.clone(), "int32", i.to_string())),
            None => Err(ValidationError::mismatch(path.clone(), "int32", n.to_string())),
        },
        other => Err(ValidationError::mismatch(path.clone(), "int32", shape(other))),
    }
}

fn as_string(value: &Value, path: &FieldPath) -> Result<String, ValidationError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ValidationError::mismatch(path.clone(), "string", shape(value)))
}

fn as_enum<T: ClosedSet>(value: &Value, path: &FieldPath) -> Result<T, ValidationError> {
    let expected = || format!("one of [{}]", T::VARIANTS.join(", "));
    let s = value
        .as_str()
        .ok_or_else(|| ValidationError::mismatch(path.clone(), expected(), shape(value)))?;
    T::parse(s).ok_or_else(|| ValidationError::mismatch(path.clone(), expected(), format!("'{s}'")))
}

/// Read-only view over one object in the input, positioned at `path`.
pub struct Fields<'a> {
    map: &'a Map<String, Value>,
    path: FieldPath,
}

impl<'a> Fields<'a> {
    pub fn new(value: &'a Value, path: &FieldPath) -> Result<Self, ValidationError> {
        match value {
            Value::Object(map) => Ok(Self {
                map,
                path: path.clone(),
            }),
            other => Err(ValidationError::mismatch(path.clone(), "object", shape(other))),
        }
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    pub fn field_path(&self, key: &str) -> FieldPath {
        self.path.key(key)
    }

    /// Raw value of `key`, `None` when absent or null
    pub fn optional(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    pub fn required(&self, key: &str) -> Result<&'a Value, ValidationError> {
        self.optional(key)
            .ok_or_else(|| ValidationError::missing(self.field_path(key)))
    }

    pub fn required_string(&self, key: &str) -> Result<String, ValidationError> {
        as_string(self.required(key)?, &self.field_path(key))
    }

    pub fn optional_string(&self, key: &str) -> Result<Option<String>, ValidationError> {
        self.optional(key)
            .map(|v| as_string(v, &self.field_path(key)))
            .transpose()
    }

    pub fn optional_bool(&self, key: &str) -> Result<Option<bool>, ValidationError> {
        self.optional(key)
            .map(|v| {
                v.as_bool().ok_or_else(|| {
                    ValidationError::mismatch(self.field_path(key), "boolean", shape(v))
                })
            })
            .transpose()
    }

    pub fn required_i32(&self, key: &str) -> Result<i32, ValidationError> {
        as_i32(self.required(key)?, &self.field_path(key))
    }

    pub fn optional_i32(&self, key: &str) -> Result<Option<i32>, ValidationError> {
        self.optional(key)
            .map(|v| as_i32(v, &self.field_path(key)))
            .transpose()
    }

    pub fn required_enum<T: ClosedSet>(&self, key: &str) -> Result<T, ValidationError> {
        as_enum(self.required(key)?, &self.field_path(key))
    }

    pub fn optional_enum<T: ClosedSet>(&self, key: &str) -> Result<Option<T>, ValidationError> {
        self.optional(key)
            .map(|v| as_enum(v, &self.field_path(key)))
            .transpose()
    }

    /// List of strings; absent means empty.
    pub fn string_list(&self, key: &str) -> Result<Vec<String>, ValidationError> {
        self.elements(key)?
            .iter()
            .enumerate()
            .map(|(i, v)| as_string(v, &self.field_path(key).index(i)))
            .collect()
    }

    pub fn nested<T: FromValue>(&self, key: &str) -> Result<T, ValidationError> {
        T::from_value(self.required(key)?, &self.field_path(key))
    }

    pub fn optional_nested<T: FromValue>(&self, key: &str) -> Result<Option<T>, ValidationError> {
        self.optional(key)
            .map(|v| T::from_value(v, &self.field_path(key)))
            .transpose()
    }

    /// List of nested objects; absent means empty.
    pub fn list<T: FromValue>(&self, key: &str) -> Result<Vec<T>, ValidationError> {
        let path = self.field_path(key);
        self.elements(key)?
            .iter()
            .enumerate()
            .map(|(i, v)| T::from_value(v, &path.index(i)))
            .collect()
    }

    /// List of nested objects that must hold at least one element.
    pub fn non_empty_list<T: FromValue>(&self, key: &str) -> Result<Vec<T>, ValidationError> {
        let items = self.list(key)?;
        if items.is_empty() {
            return Err(ValidationError::missing(self.field_path(key)));
        }
        Ok(items)
    }

    /// Decode a field this layer does not interpret (metadata, templates)
    /// straight through serde.
    pub fn opaque<T: DeserializeOwned>(
        &self,
        key: &str,
        expected: &str,
    ) -> Result<Option<T>, ValidationError> {
        self.optional(key)
            .map(|v| {
                serde_json::from_value(v.clone()).map_err(|e| {
                    ValidationError::mismatch(self.field_path(key), expected, e.to_string())
                })
            })
            .transpose()
    }

    fn elements(&self, key: &str) -> Result<&'a [Value], ValidationError> {
        match self.optional(key) {
            None => Ok(&[]),
            Some(Value::Array(items)) => Ok(items),
            Some(other) => Err(ValidationError::mismatch(
                self.field_path(key),
                "array",
                shape(other),
            )),
        }
    }
}
