//! JSON to record.
//!
//! Fields absent from the JSON object keep whatever value the target already
//! holds. Everything else that does not fit the schema is an error; nothing
//! is coerced silently except numeric narrowing.

use serde_json::{Map, Number, Value};
use tracing::trace;

use crate::access::{FieldMut, Record, Scalar, truncate_to};
use crate::error::{Error, Result, json_kind};
use crate::options::DecodeOptions;
use crate::path::FieldPath;
use crate::schema::{FieldType, RecordSchema, SchemaRegistry};

/// Populates `target` from `json` as described by `schema`.
///
/// On error `target` may be partially updated; fields are written in schema
/// order and the walk stops at the first failure.
pub fn deserialize_into(
    registry: &SchemaRegistry,
    schema: &RecordSchema,
    json: &Value,
    target: &mut dyn Record,
    options: &DecodeOptions,
) -> Result<()> {
    let mut path = FieldPath::root();
    let object = json.as_object().ok_or_else(|| {
        Error::structure_mismatch(&path, format!("expected an object, found {}", json_kind(json)))
    })?;
    let decoder = Decoder { registry, options };
    decoder.record(schema, object, target, &mut path)
}

struct Decoder<'a> {
    registry: &'a SchemaRegistry,
    options: &'a DecodeOptions,
}

impl Decoder<'_> {
    fn record(
        &self,
        schema: &RecordSchema,
        object: &Map<String, Value>,
        target: &mut dyn Record,
        path: &mut FieldPath,
    ) -> Result<()> {
        trace!(type_name = schema.type_name(), %path, "deserializing record");
        if self.options.strict {
            if let Some(key) = object.keys().find(|key| schema.field(key).is_none()) {
                path.push_field(key);
                return Err(Error::unknown_field(path));
            }
        }

        for field in schema.fields() {
            path.push_field(field.name());
            match object.get(field.name()) {
                Some(json) => {
                    let slot = target
                        .field_mut(field.name())
                        .ok_or_else(|| Error::missing_accessor(path, schema.type_name()))?;
                    self.value(field.field_type(), json, slot, path)?;
                }
                None if self.options.strict => return Err(Error::missing_field(path)),
                None => {}
            }
            path.pop();
        }
        Ok(())
    }

    fn value(
        &self,
        field_type: &FieldType,
        json: &Value,
        slot: FieldMut<'_>,
        path: &mut FieldPath,
    ) -> Result<()> {
        match (field_type, slot) {
            (FieldType::Record(name), FieldMut::Record(nested)) => {
                let schema = self.registry.record(name)?;
                let object = json.as_object().ok_or_else(|| {
                    Error::structure_mismatch(
                        path,
                        format!("expected an object, found {}", json_kind(json)),
                    )
                })?;
                self.record(schema, object, nested, path)
            }
            (FieldType::FixedArray(element, len), FieldMut::Array(items)) => {
                let array = json.as_array().ok_or_else(|| {
                    Error::structure_mismatch(
                        path,
                        format!("expected an array of {len}, found {}", json_kind(json)),
                    )
                })?;
                if array.len() != *len {
                    return Err(Error::structure_mismatch(
                        path,
                        format!("expected {len} elements, found {}", array.len()),
                    ));
                }
                if items.len() != *len {
                    return Err(Error::schema_mismatch(format!(
                        "`{path}` holds {} elements but the schema declares {len}",
                        items.len()
                    )));
                }
                for (i, item) in array.iter().enumerate() {
                    path.push_index(i);
                    let slot = items.element_mut(i).ok_or_else(|| {
                        Error::schema_mismatch(format!("`{path}` has no element accessor"))
                    })?;
                    self.value(element, item, slot, path)?;
                    path.pop();
                }
                Ok(())
            }
            (FieldType::FixedString(capacity), FieldMut::Str(text)) => {
                let s = json
                    .as_str()
                    .ok_or_else(|| Error::field_type_mismatch(path, field_type, json))?;
                *text = truncate_to(s, capacity.saturating_sub(1)).to_owned();
                Ok(())
            }
            (FieldType::Text, FieldMut::Str(text)) => {
                let s = json
                    .as_str()
                    .ok_or_else(|| Error::field_type_mismatch(path, field_type, json))?;
                *text = s.to_owned();
                Ok(())
            }
            (field_type, FieldMut::Scalar(slot)) if slot.load().fits(field_type) => {
                let scalar = self.scalar(field_type, json, path)?;
                slot.store(scalar)
            }
            (field_type, other) => Err(Error::schema_mismatch(format!(
                "`{path}` is declared as {field_type} but its accessor provides {}",
                other.kind()
            ))),
        }
    }

    fn scalar(&self, field_type: &FieldType, json: &Value, path: &FieldPath) -> Result<Scalar> {
        let mismatch = || Error::field_type_mismatch(path, field_type, json);
        let int = |min: i64, max: i64| self.integer(json, min, max).ok_or_else(mismatch);
        Ok(match field_type {
            FieldType::Int8 => Scalar::Int8(int(i8::MIN.into(), i8::MAX.into())? as i8),
            FieldType::Int32 => Scalar::Int32(int(i32::MIN.into(), i32::MAX.into())? as i32),
            FieldType::UInt32 => Scalar::UInt32(int(0, u32::MAX.into())? as u32),
            FieldType::Float32 => Scalar::Float32(json.as_f64().ok_or_else(mismatch)? as f32),
            FieldType::Float64 => Scalar::Float64(json.as_f64().ok_or_else(mismatch)?),
            FieldType::Bool => match json {
                Value::Bool(b) => Scalar::Bool(*b),
                Value::Number(n) if !self.options.strict => {
                    Scalar::Bool(n.as_f64().is_some_and(|v| v != 0.0))
                }
                _ => return Err(mismatch()),
            },
            FieldType::Enum(name) => match json {
                Value::String(label) => {
                    let schema = self.registry.enumeration(name)?;
                    if schema.values().next().is_none() {
                        return Err(mismatch());
                    }
                    let value = schema
                        .value_of(label)
                        .ok_or_else(|| Error::unknown_enum_value(name.as_str(), label))?;
                    Scalar::Enum(value)
                }
                _ => Scalar::Enum(int(i32::MIN.into(), i32::MAX.into())? as i32),
            },
            _ => return Err(mismatch()),
        })
    }

    /// Reads an integer in `min..=max`. Outside strict mode fractions are
    /// truncated and out-of-range values saturate.
    fn integer(&self, json: &Value, min: i64, max: i64) -> Option<i64> {
        let number: &Number = match json {
            Value::Number(n) => n,
            _ => return None,
        };
        let strict = self.options.strict;
        if let Some(v) = number.as_i64() {
            return if (min..=max).contains(&v) {
                Some(v)
            } else if strict {
                None
            } else {
                Some(v.clamp(min, max))
            };
        }
        if number.is_u64() {
            return (!strict).then_some(max);
        }
        let v = number.as_f64()?;
        if strict && (v.fract() != 0.0 || v < min as f64 || v > max as f64) {
            return None;
        }
        Some((v.trunc() as i64).clamp(min, max))
    }
}
