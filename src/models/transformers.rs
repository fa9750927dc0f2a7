use serde_json::Value;
use std::sync::Arc;

use super::core::to_boolean;
use super::field::{FieldValue, Processor, Transformer};
use super::model::{Model, Validatable};

pub fn boolean_transformer() -> Transformer {
    Arc::new(|value: &Value| FieldValue::Scalar(Value::Bool(to_boolean(value))))
}

pub fn identity_transformer() -> Transformer {
    Arc::new(|value: &Value| FieldValue::Scalar(value.clone()))
}

pub fn default_list_transformer() -> Transformer {
    Arc::new(|value: &Value| match value {
        Value::Null => FieldValue::List(vec![]),
        other => FieldValue::Scalar(other.clone()),
    })
}

/// Wraps the raw value in a `T`.
pub fn model_transformer<T: Model>() -> Transformer {
    Arc::new(|value: &Value| FieldValue::Model(Box::new(T::from_source(value))))
}

/// Keeps every element, valid or not. Validation is opt-in through
/// `validating_processor`.
pub fn model_processor<T: Model>() -> Processor {
    Arc::new(|value: &Value| Some(FieldValue::Model(Box::new(T::from_source(value)))))
}

/// Like `model_processor`, dropping elements that fail `is_valid`.
pub fn validating_processor<T: Model + Validatable>() -> Processor {
    Arc::new(|value: &Value| {
        let model = T::from_source(value);
        if model.is_valid() {
            Some(FieldValue::Model(Box::new(model)))
        } else {
            debug!("Dropping invalid {} element", T::schema().name);
            None
        }
    })
}
