//! Schema-shaped records for types that have no Rust struct.

use crate::access::{Field, FieldMut, FieldRef, Record, Scalar, ScalarSlot};
use crate::error::{Error, Result};
use crate::schema::{FieldType, SchemaRegistry};

/// A record whose shape comes from a [`RecordSchema`](crate::RecordSchema)
/// at runtime. Field order follows the schema.
#[derive(Debug, Clone, PartialEq)]
pub struct DynRecord {
    type_name: String,
    fields: Vec<(String, DynValue)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DynValue {
    Scalar(Scalar),
    Text(String),
    Record(DynRecord),
    Array(Vec<DynValue>),
}

impl DynRecord {
    /// A zero-initialized instance of `type_name`: numbers and enums are 0,
    /// bools false, strings empty, arrays filled to their declared length.
    pub fn zeroed(registry: &SchemaRegistry, type_name: &str) -> Result<Self> {
        let schema = registry.record(type_name)?;
        let fields = schema
            .fields()
            .iter()
            .map(|field| Ok((field.name().to_owned(), DynValue::zeroed(registry, field.field_type())?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            type_name: schema.type_name().to_owned(),
            fields,
        })
    }

    pub fn get(&self, name: &str) -> Option<&DynValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut DynValue> {
        self.fields.iter_mut().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &DynValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl DynValue {
    pub fn zeroed(registry: &SchemaRegistry, field_type: &FieldType) -> Result<Self> {
        Ok(match field_type {
            FieldType::Record(name) => DynValue::Record(DynRecord::zeroed(registry, name)?),
            FieldType::FixedArray(element, len) => {
                let zero = DynValue::zeroed(registry, element)?;
                DynValue::Array(vec![zero; *len])
            }
            FieldType::FixedString(_) | FieldType::Text => DynValue::Text(String::new()),
            scalar => DynValue::Scalar(Scalar::zero(scalar).ok_or_else(|| {
                Error::schema_mismatch(format!("{scalar} has no zero value"))
            })?),
        })
    }
}

impl Record for DynRecord {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        self.get(name).map(Field::field_ref)
    }

    fn field_mut(&mut self, name: &str) -> Option<FieldMut<'_>> {
        self.get_mut(name).map(Field::field_mut)
    }
}

impl Field for DynValue {
    fn field_ref(&self) -> FieldRef<'_> {
        match self {
            DynValue::Scalar(scalar) => FieldRef::Scalar(*scalar),
            DynValue::Text(text) => FieldRef::Str(text),
            DynValue::Record(record) => FieldRef::Record(record),
            DynValue::Array(items) => FieldRef::Array(items),
        }
    }

    fn field_mut(&mut self) -> FieldMut<'_> {
        match self {
            DynValue::Scalar(scalar) => FieldMut::Scalar(scalar),
            DynValue::Text(text) => FieldMut::Str(text),
            DynValue::Record(record) => FieldMut::Record(record),
            DynValue::Array(items) => FieldMut::Array(items),
        }
    }
}

/// A dynamic scalar keeps its kind: storing a different kind fails.
impl ScalarSlot for Scalar {
    fn load(&self) -> Scalar {
        *self
    }

    fn store(&mut self, value: Scalar) -> Result<()> {
        if !self.same_kind(&value) {
            return Err(Error::schema_mismatch(format!(
                "cannot store {} into a {} slot",
                value.kind(),
                self.kind()
            )));
        }
        *self = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EnumSchema, RecordSchema};

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
                RecordSchema::new("Path")
                    .with_field("points", FieldType::array(FieldType::record("Point"), 2))
                    .with_field("name", FieldType::FixedString(8))
                    .with_field("kind", FieldType::enumeration("Kind")),
            )
            .unwrap();
        builder.add_enum(EnumSchema::new("Kind")).unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn zeroed_follows_schema_shape() {
        let registry = registry();
        let path = DynRecord::zeroed(&registry, "Path").unwrap();
        assert_eq!(path.type_name(), "Path");
        let names: Vec<&str> = path.fields().map(|(n, _)| n).collect();
        assert_eq!(names, ["points", "name", "kind"]);

        let Some(DynValue::Array(points)) = path.get("points") else {
            panic!("points is not an array");
        };
        assert_eq!(points.len(), 2);
        assert!(matches!(&points[0], DynValue::Record(p) if p.get("x") == Some(&DynValue::Scalar(Scalar::Float32(0.0)))));
        assert_eq!(path.get("kind"), Some(&DynValue::Scalar(Scalar::Enum(0))));
    }

    #[test]
    fn unknown_type_is_schema_mismatch() {
        let err = DynRecord::zeroed(&registry(), "Missing").unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch(_)));
    }

    #[test]
    fn dynamic_scalars_keep_their_kind() {
        let mut slot = Scalar::Float64(1.0);
        slot.store(Scalar::Float64(2.5)).unwrap();
        assert_eq!(slot, Scalar::Float64(2.5));
        assert!(slot.store(Scalar::Float32(1.0)).is_err());
    }
}
