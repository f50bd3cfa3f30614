//! Record to JSON.

use serde_json::{Map, Number, Value};
use tracing::trace;

use crate::access::{FieldRef, Record, Scalar};
use crate::error::{Error, Result};
use crate::options::{EncodeOptions, EnumRepr};
use crate::path::FieldPath;
use crate::schema::{FieldType, RecordSchema, SchemaRegistry};

/// Serializes `record` as described by `schema` into a JSON object whose keys
/// follow the schema's field order. The record is not modified.
pub fn serialize(
    registry: &SchemaRegistry,
    schema: &RecordSchema,
    record: &dyn Record,
    options: &EncodeOptions,
) -> Result<Map<String, Value>> {
    let encoder = Encoder { registry, options };
    encoder.record(schema, record, &mut FieldPath::root())
}

struct Encoder<'a> {
    registry: &'a SchemaRegistry,
    options: &'a EncodeOptions,
}

impl Encoder<'_> {
    fn record(
        &self,
        schema: &RecordSchema,
        record: &dyn Record,
        path: &mut FieldPath,
    ) -> Result<Map<String, Value>> {
        trace!(type_name = schema.type_name(), %path, "serializing record");
        let mut object = Map::with_capacity(schema.fields().len());
        for field in schema.fields() {
            path.push_field(field.name());
            let value = record
                .field(field.name())
                .ok_or_else(|| Error::missing_accessor(path, schema.type_name()))?;
            let json = self.value(field.field_type(), value, path)?;
            object.insert(field.name().to_owned(), json);
            path.pop();
        }
        Ok(object)
    }

    fn value(&self, field_type: &FieldType, value: FieldRef<'_>, path: &mut FieldPath) -> Result<Value> {
        match (field_type, value) {
            (FieldType::Record(name), FieldRef::Record(nested)) => {
                let schema = self.registry.record(name)?;
                Ok(Value::Object(self.record(schema, nested, path)?))
            }
            (FieldType::FixedArray(element, len), FieldRef::Array(items)) => {
                if items.len() != *len {
                    return Err(Error::schema_mismatch(format!(
                        "`{path}` holds {} elements but the schema declares {len}",
                        items.len()
                    )));
                }
                let mut array = Vec::with_capacity(*len);
                for i in 0..*len {
                    path.push_index(i);
                    let item = items.element(i).ok_or_else(|| {
                        Error::schema_mismatch(format!("`{path}` has no element accessor"))
                    })?;
                    array.push(self.value(element, item, path)?);
                    path.pop();
                }
                Ok(Value::Array(array))
            }
            (FieldType::FixedString(_) | FieldType::Text, FieldRef::Str(text)) => {
                Ok(Value::String(text.to_owned()))
            }
            (field_type, FieldRef::Scalar(scalar)) if scalar.fits(field_type) => {
                self.scalar(field_type, scalar, path)
            }
            (field_type, other) => Err(Error::schema_mismatch(format!(
                "`{path}` is declared as {field_type} but its accessor provides {}",
                other.kind()
            ))),
        }
    }

    fn scalar(&self, field_type: &FieldType, scalar: Scalar, path: &FieldPath) -> Result<Value> {
        Ok(match scalar {
            Scalar::Int8(v) => Value::from(v),
            Scalar::Int32(v) => Value::from(v),
            Scalar::UInt32(v) => Value::from(v),
            Scalar::Bool(v) => Value::Bool(v),
            Scalar::Float32(v) => float32_to_json(v).ok_or_else(|| Error::non_finite(path))?,
            Scalar::Float64(v) => Number::from_f64(v)
                .map(Value::Number)
                .ok_or_else(|| Error::non_finite(path))?,
            Scalar::Enum(v) => match (self.options.enum_repr, field_type) {
                (EnumRepr::Name, FieldType::Enum(name)) => {
                    match self.registry.enumeration(name)?.name_of(v) {
                        Some(label) => Value::String(label.to_owned()),
                        None => Value::from(v),
                    }
                }
                _ => Value::from(v),
            },
        })
    }
}

/// Writes an `f32` as the shortest decimal that reads back to the same `f32`,
/// so `0.1f32` becomes `0.1` rather than `0.10000000149011612`.
fn float32_to_json(v: f32) -> Option<Value> {
    if !v.is_finite() {
        return None;
    }
    let widened = v.to_string().parse::<f64>().unwrap_or(f64::from(v));
    Number::from_f64(widened).map(Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::{DynRecord, DynValue};
    use crate::schema::EnumSchema;
    use serde_json::json;

    fn registry() -> SchemaRegistry {
        let mut builder = SchemaRegistry::builder();
        builder
            .add_record(
                RecordSchema::new("Point")
                    .with_field("x", FieldType::Float32)
                    .with_field("y", FieldType::Float32),
            )
            .unwrap();
        builder
            .add_record(
                RecordSchema::new("Marker")
                    .with_field("at", FieldType::record("Point"))
                    .with_field("tone", FieldType::enumeration("Tone"))
                    .with_field("weights", FieldType::array(FieldType::Float64, 2))
                    .with_field("label", FieldType::FixedString(8)),
            )
            .unwrap();
        builder
            .add_enum(EnumSchema::new("Tone").with_value(0, "TONE_LOW").with_value(2, "TONE_HIGH"))
            .unwrap();
        builder.build().unwrap()
    }

    fn marker(registry: &SchemaRegistry) -> DynRecord {
        let mut marker = DynRecord::zeroed(registry, "Marker").unwrap();
        *marker.get_mut("tone").unwrap() = DynValue::Scalar(Scalar::Enum(2));
        *marker.get_mut("label").unwrap() = DynValue::Text("pin".into());
        if let Some(DynValue::Record(at)) = marker.get_mut("at") {
            *at.get_mut("x").unwrap() = DynValue::Scalar(Scalar::Float32(0.1));
        }
        marker
    }

    #[test]
    fn writes_fields_in_schema_order() {
        let registry = registry();
        let marker = marker(&registry);
        let schema = registry.record("Marker").unwrap();
        let object = serialize(&registry, schema, &marker, &EncodeOptions::default()).unwrap();

        assert_eq!(
            Value::Object(object.clone()),
            json!({
                "at": { "x": 0.1, "y": 0.0 },
                "tone": 2,
                "weights": [0.0, 0.0],
                "label": "pin"
            })
        );
        let keys: Vec<&str> = object.keys().map(String::as_str).collect();
        assert_eq!(keys, ["at", "tone", "weights", "label"]);
    }

    #[test]
    fn named_enums_are_opt_in() {
        let registry = registry();
        let mut marker = marker(&registry);
        let schema = registry.record("Marker").unwrap();
        let options = EncodeOptions {
            enum_repr: EnumRepr::Name,
            ..EncodeOptions::default()
        };
        let object = serialize(&registry, schema, &marker, &options).unwrap();
        assert_eq!(object["tone"], json!("TONE_HIGH"));

        *marker.get_mut("tone").unwrap() = DynValue::Scalar(Scalar::Enum(1));
        let object = serialize(&registry, schema, &marker, &options).unwrap();
        assert_eq!(object["tone"], json!(1));
    }

    #[test]
    fn non_finite_floats_are_rejected() {
        let registry = registry();
        let mut point = DynRecord::zeroed(&registry, "Point").unwrap();
        *point.get_mut("y").unwrap() = DynValue::Scalar(Scalar::Float32(f32::NAN));
        let schema = registry.record("Point").unwrap();
        let err = serialize(&registry, schema, &point, &EncodeOptions::default()).unwrap_err();
        assert!(matches!(err, Error::NonFiniteNumber { ref path } if path == "y"));
    }

    #[test]
    fn accessor_kind_disagreeing_with_schema_is_schema_mismatch() {
        let registry = registry();
        let mut point = DynRecord::zeroed(&registry, "Point").unwrap();
        *point.get_mut("x").unwrap() = DynValue::Scalar(Scalar::Int32(1));
        let schema = registry.record("Point").unwrap();
        let err = serialize(&registry, schema, &point, &EncodeOptions::default()).unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch(_)), "{err}");
    }

    #[test]
    fn float32_uses_shortest_round_trip_form() {
        assert_eq!(float32_to_json(0.3), Some(json!(0.3)));
        assert_eq!(float32_to_json(1.0), Some(json!(1.0)));
        assert_eq!(float32_to_json(f32::INFINITY), None);
    }
}
