#[macro_use]
mod macros;

pub mod core;
mod field;
mod model;
pub mod transformers;

mod album;
mod photos;

pub use self::field::{
    init_field, FieldDescriptor, FieldKind, FieldValue, Processor, Schema, Transformer,
};
pub use self::model::{
    append_derived_fields, convert_to_json, get_json_object, is_model_empty, Model, ModelError, ParentLink, Record,
    Serializable, Validatable,
};

pub use album::*;
pub use photos::*;
