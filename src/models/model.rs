use serde_json::{Map, Value};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use super::field::{init_field, FieldValue, Schema};

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Malformed {model} payload: expected an object, found {found}")]
    MalformedInput {
        model: &'static str,
        found: &'static str,
    },
}

/// Advisory back-reference from a nested model to the field it occupies.
/// Never followed during serialization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParentLink {
    pub parent: &'static str,
    pub name: &'static str,
}

/// Field storage shared by every model variant.
pub struct Record {
    schema: &'static Schema,
    values: Vec<(&'static str, FieldValue)>,
    aliases: BTreeMap<&'static str, &'static str>,
    link: Option<ParentLink>,
}

impl Record {
    pub fn new(schema: &'static Schema) -> Self {
        Self {
            schema,
            values: Vec::with_capacity(schema.fields.len()),
            aliases: BTreeMap::new(),
            link: None,
        }
    }

    pub fn build(schema: &'static Schema, source: &Value) -> Self {
        let mut record = Self::new(schema);
        for field in schema.fields.iter() {
            init_field(&mut record, field, source);
        }
        record
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn aliases(&self) -> &BTreeMap<&'static str, &'static str> {
        &self.aliases
    }

    pub fn link(&self) -> Option<&ParentLink> {
        self.link.as_ref()
    }

    pub(crate) fn set_link(&mut self, link: ParentLink) {
        self.link = Some(link);
    }

    pub(crate) fn add_alias(&mut self, key: &'static str, alias: &'static str) {
        self.aliases.insert(key, alias);
    }

    pub(crate) fn assign(&mut self, key: &'static str, value: FieldValue) {
        match self.values.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.values.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.values
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, value)| value)
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.get(key).and_then(FieldValue::as_value)
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_str)
    }

    pub fn boolean(&self, key: &str) -> bool {
        self.value(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn model<T: Model>(&self, key: &str) -> Option<&T> {
        self.get(key).and_then(FieldValue::as_model::<T>)
    }

    pub fn list<T: Model>(&self, key: &str) -> impl Iterator<Item = &T> + '_ {
        self.get(key)
            .and_then(FieldValue::as_list)
            .unwrap_or(&[])
            .iter()
            .filter_map(FieldValue::as_model::<T>)
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.schema.name);
        for (key, value) in self.values.iter() {
            s.field(key, value);
        }
        s.finish()
    }
}

pub trait Serializable {
    fn to_json_with(&self, remove_null: bool) -> Value;

    fn to_json(&self) -> Value {
        self.to_json_with(true)
    }
}

pub trait Validatable {
    fn is_valid(&self) -> bool;
}

pub trait Model: Serializable + fmt::Debug + Send + Sync + 'static {
    fn schema() -> &'static Schema
    where
        Self: Sized;

    /// Lenient constructor: a source that is not an object reads as absent.
    fn from_source(source: &Value) -> Self
    where
        Self: Sized;

    fn try_from_source(source: &Value) -> Result<Self, ModelError>
    where
        Self: Sized,
    {
        match source {
            Value::Null | Value::Object(_) => Ok(Self::from_source(source)),
            other => Err(ModelError::MalformedInput {
                model: Self::schema().name,
                found: kind_of(other),
            }),
        }
    }

    fn record(&self) -> &Record;

    fn record_mut(&mut self) -> &mut Record;

    fn as_any(&self) -> &dyn Any;

    fn is_empty(&self) -> bool {
        is_model_empty(self.record())
    }

    fn post_construct(&mut self) {}

    /// Values computed at construction rather than read from a field. They
    /// are written after the declared fields and ignored by `is_empty`.
    fn derived_fields(&self) -> Vec<(&'static str, Value)> {
        vec![]
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A model with no declared keys is never considered empty.
pub fn is_model_empty(record: &Record) -> bool {
    let schema = record.schema();
    if schema.fields.is_empty() {
        return false;
    }

    schema
        .keys()
        .all(|key| record.get(key).map(FieldValue::is_empty).unwrap_or(true))
}

pub fn get_json_object(value: &FieldValue) -> Value {
    match value {
        FieldValue::Scalar(value) => value.clone(),
        FieldValue::Model(model) => model.to_json(),
        FieldValue::List(items) => Value::Array(items.iter().map(get_json_object).collect()),
    }
}

pub fn convert_to_json(record: &Record, remove_null: bool) -> Value {
    let mut json = Map::new();

    for key in record.schema().keys() {
        let name = record.aliases().get(key).copied().unwrap_or(key);
        let value = record.get(key).map(get_json_object).unwrap_or(Value::Null);

        match value {
            Value::Array(items) => {
                let items = items.into_iter().filter(|item| !item.is_null()).collect();
                json.insert(name.to_string(), Value::Array(items));
            }
            Value::Null if remove_null => {}
            value => {
                json.insert(name.to_string(), value);
            }
        }
    }

    if remove_null && json.is_empty() {
        Value::Null
    } else {
        Value::Object(json)
    }
}

pub fn append_derived_fields(
    json: Value,
    derived: Vec<(&'static str, Value)>,
    remove_null: bool,
) -> Value {
    if derived.is_empty() {
        return json;
    }

    let mut json = match json {
        Value::Object(json) => json,
        _ => Map::new(),
    };
    for (name, value) in derived {
        if !(remove_null && value.is_null()) {
            json.insert(name.to_string(), value);
        }
    }

    if remove_null && json.is_empty() {
        Value::Null
    } else {
        Value::Object(json)
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::models::field::FieldDescriptor;
    use crate::models::transformers::*;
    use serde_json::json;

    #[derive(Debug)]
    struct Bare {
        record: Record,
    }

    #[derive(Debug)]
    struct Tag {
        record: Record,
    }

    #[derive(Debug)]
    struct Note {
        record: Record,
    }

    lazy_static! {
        static ref BARE: Schema = Schema::new("Bare", vec![]);
        static ref TAG: Schema = Schema::new("Tag", vec![FieldDescriptor::scalar("label")]);
        static ref NOTE: Schema = Schema::new(
            "Note",
            vec![
                FieldDescriptor::scalar("text").aliased("body"),
                FieldDescriptor::nested("tag", model_transformer::<Tag>()),
                FieldDescriptor::list("tags", model_processor::<Tag>()),
                FieldDescriptor::scalar("extra"),
            ]
        );
    }

    model!(Bare, BARE);
    model!(Tag, TAG);
    model!(Note, NOTE);

    #[test]
    fn test_model_without_keys_is_not_empty() {
        let bare = Bare::from_source(&json!({}));
        assert!(!bare.is_empty());
    }

    #[test]
    fn test_model_of_empty_defaults_is_empty() {
        let tag = Tag::from_source(&json!({}));
        assert!(tag.is_empty());
        assert_eq!(tag.to_json(), Value::Null);
        assert_eq!(tag.to_json_with(false), json!({"label": null}));
    }

    #[test]
    fn test_serialization_uses_aliases() {
        let note = Note::from_source(&json!({"body": "hello"}));
        assert_eq!(note.record().str("text"), Some("hello"));
        assert_eq!(note.to_json(), json!({"body": "hello", "tags": []}));
    }

    #[test]
    fn test_empty_nested_model_is_pruned() {
        let note = Note::from_source(&json!({"text": "t", "tags": [{}, {"label": "a"}]}));
        assert_eq!(note.to_json(), json!({"body": "t", "tags": [{"label": "a"}]}));
    }

    #[test]
    fn test_scalar_arrays_are_compacted() {
        let note = Note::from_source(&json!({"extra": [1, null, 2]}));
        assert_eq!(note.to_json()["extra"], json!([1, 2]));
    }

    #[test]
    fn test_keep_nulls() {
        let note = Note::from_source(&json!({"text": "t"}));
        assert_eq!(
            note.to_json_with(false),
            json!({"body": "t", "tag": null, "tags": [], "extra": null})
        );
    }

    #[test]
    fn test_is_empty_recurses_into_nested_models() {
        let note = Note::from_source(&json!({"tag": {"label": ""}}));
        assert!(note.record().model::<Tag>("tag").is_some());
        assert!(note.is_empty());
    }

    #[test]
    fn test_try_from_source_rejects_non_objects() {
        assert!(Note::try_from_source(&json!({"text": "t"})).is_ok());
        assert!(Note::try_from_source(&Value::Null).is_ok());

        let error = Note::try_from_source(&json!("oops")).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Malformed Note payload: expected an object, found a string"
        );
    }

    #[test]
    fn test_lenient_constructor_accepts_non_objects() {
        let note = Note::from_source(&json!(42));
        assert_eq!(note.record().str("text"), None);
    }

    #[test]
    fn test_derived_fields_follow_declared_ones() {
        let json = append_derived_fields(json!({"label": "a"}), vec![("kind", json!("k"))], true);
        assert_eq!(json, json!({"label": "a", "kind": "k"}));

        // An otherwise empty model still carries its derived values
        let json = append_derived_fields(Value::Null, vec![("kind", json!("k"))], true);
        assert_eq!(json, json!({"kind": "k"}));

        let json = append_derived_fields(Value::Null, vec![("kind", Value::Null)], true);
        assert_eq!(json, Value::Null);
        assert_eq!(append_derived_fields(Value::Null, vec![], true), Value::Null);
    }
}
