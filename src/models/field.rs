use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use super::core::{is_empty, lookup};
use super::model::{Model, ParentLink, Record};

/// Maps the raw source value of a field (`Value::Null` when absent) to the
/// stored value.
pub type Transformer = Arc<dyn Fn(&Value) -> FieldValue + Send + Sync>;

/// Maps one element of a source list; `None` drops the element.
pub type Processor = Arc<dyn Fn(&Value) -> Option<FieldValue> + Send + Sync>;

#[derive(Debug)]
pub enum FieldValue {
    Scalar(Value),
    Model(Box<dyn Model>),
    List(Vec<FieldValue>),
}

impl FieldValue {
    pub fn null() -> Self {
        Self::Scalar(Value::Null)
    }

    fn from_default(default: &Value) -> Self {
        match default {
            Value::Array(items) => Self::List(items.iter().cloned().map(Self::Scalar).collect()),
            other => Self::Scalar(other.clone()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Scalar(Value::Null))
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Scalar(value) => is_empty(value, false),
            Self::Model(model) => model.is_empty(),
            Self::List(items) => items.is_empty(),
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Scalar(Value::Null) => None,
            Self::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    pub fn as_model<T: Model>(&self) -> Option<&T> {
        match self {
            Self::Model(model) => model.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            Self::List(items) => Some(&items[..]),
            _ => None,
        }
    }
}

pub enum FieldKind {
    /// Single value, optionally transformed. The transformer sees the raw
    /// value even when it is absent.
    Scalar(Option<Transformer>),
    /// Nested model built by a model transformer; absent or empty raw values
    /// resolve to the field default.
    Nested(Transformer),
    /// List of processed elements.
    List(Processor),
}

impl fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(None) => write!(f, "Scalar"),
            Self::Scalar(Some(_)) => write!(f, "Scalar(transformed)"),
            Self::Nested(_) => write!(f, "Nested"),
            Self::List(_) => write!(f, "List"),
        }
    }
}

#[derive(Debug)]
pub struct FieldDescriptor {
    pub key: &'static str,
    pub alias: &'static str,
    pub default: Value,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub fn scalar(key: &'static str) -> Self {
        Self {
            key,
            alias: key,
            default: Value::Null,
            kind: FieldKind::Scalar(None),
        }
    }

    pub fn transformed(key: &'static str, transformer: Transformer) -> Self {
        Self {
            kind: FieldKind::Scalar(Some(transformer)),
            ..Self::scalar(key)
        }
    }

    pub fn nested(key: &'static str, transformer: Transformer) -> Self {
        Self {
            kind: FieldKind::Nested(transformer),
            ..Self::scalar(key)
        }
    }

    pub fn list(key: &'static str, processor: Processor) -> Self {
        Self {
            default: Value::Array(vec![]),
            kind: FieldKind::List(processor),
            ..Self::scalar(key)
        }
    }

    pub fn with_default(self, default: Value) -> Self {
        Self { default, ..self }
    }

    pub fn aliased(self, alias: &'static str) -> Self {
        Self { alias, ..self }
    }
}

/// Ordered field declarations of one model variant.
#[derive(Debug)]
pub struct Schema {
    pub name: &'static str,
    pub fields: Vec<FieldDescriptor>,
}

impl Schema {
    pub fn new(name: &'static str, fields: Vec<FieldDescriptor>) -> Self {
        Self { name, fields }
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|field| field.key)
    }
}

/// Populates exactly one field of `target` from `source`.
pub fn init_field(target: &mut Record, field: &FieldDescriptor, source: &Value) {
    if field.alias != field.key {
        target.add_alias(field.key, field.alias);
    }

    let mut value = if is_empty(source, false) {
        FieldValue::from_default(&field.default)
    } else {
        match &field.kind {
            FieldKind::Scalar(Some(transformer)) => transformer(lookup(source, field.alias, field.key)),
            FieldKind::Scalar(None) => match lookup(source, field.alias, field.key) {
                Value::Null => FieldValue::from_default(&field.default),
                raw => FieldValue::Scalar(raw.clone()),
            },
            FieldKind::Nested(transformer) => {
                let raw = lookup(source, field.alias, field.key);
                if is_empty(raw, false) {
                    FieldValue::from_default(&field.default)
                } else {
                    transformer(raw)
                }
            }
            FieldKind::List(processor) => process_list(processor, field, source),
        }
    };

    if let FieldValue::Model(ref mut nested) = value {
        nested.record_mut().set_link(ParentLink {
            parent: target.schema().name,
            name: field.alias,
        });
        nested.post_construct();
    }

    target.assign(field.key, value);
}

fn process_list(processor: &Processor, field: &FieldDescriptor, source: &Value) -> FieldValue {
    let mut items = match FieldValue::from_default(&field.default) {
        FieldValue::List(items) => items,
        _ => vec![],
    };

    match lookup(source, field.alias, field.key) {
        Value::Array(raw) => items.extend(raw.iter().filter_map(|element| process_element(processor, element))),
        Value::Null => {}
        other => debug!("Ignoring non-list value for field {}: {}", field.key, other),
    }

    FieldValue::List(items)
}

fn process_element(processor: &Processor, element: &Value) -> Option<FieldValue> {
    processor(element).filter(|value| !value.is_null())
}
