// Wires a struct holding a `record: Record` field to its schema. The short
// form builds the record straight from the source; pass a block to provide
// the rest of the `Model` impl (at least `from_source`) yourself.
macro_rules! model {
    ($model:ident, $schema:ident) => {
        model!($model, $schema {
            fn from_source(source: &serde_json::Value) -> Self {
                Self {
                    record: $crate::models::Record::build(&*$schema, source),
                }
            }
        });
    };
    ($model:ident, $schema:ident { $($body:tt)* }) => {
        impl $crate::models::Serializable for $model {
            fn to_json_with(&self, remove_null: bool) -> serde_json::Value {
                $crate::models::append_derived_fields(
                    $crate::models::convert_to_json(&self.record, remove_null),
                    $crate::models::Model::derived_fields(self),
                    remove_null,
                )
            }
        }

        impl $crate::models::Model for $model {
            fn schema() -> &'static $crate::models::Schema {
                &*$schema
            }

            fn record(&self) -> &$crate::models::Record {
                &self.record
            }

            fn record_mut(&mut self) -> &mut $crate::models::Record {
                &mut self.record
            }

            fn as_any(&self) -> &dyn std::any::Any {
                self
            }

            $($body)*
        }
    };
}
