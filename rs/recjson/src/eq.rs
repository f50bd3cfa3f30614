//! Tolerance-based record equality.

use tracing::{trace, warn};

use crate::access::{FieldRef, Record, Scalar};
use crate::error::{Error, Result};
use crate::options::Tolerance;
use crate::path::FieldPath;
use crate::schema::{FieldType, RecordSchema, SchemaRegistry};

/// Compares two records field by field, stopping at the first difference.
///
/// `Float32` and `Float64` fields are equal when they differ by at most the
/// matching epsilon of `tolerance`; every other kind must match exactly.
pub fn try_equals(
    registry: &SchemaRegistry,
    schema: &RecordSchema,
    a: &dyn Record,
    b: &dyn Record,
    tolerance: &Tolerance,
) -> Result<bool> {
    let comparer = Comparer { registry, tolerance };
    comparer.record(schema, a, b, &mut FieldPath::root())
}

/// Like [`try_equals`], treating a failed walk as "not equal".
pub fn equals(
    registry: &SchemaRegistry,
    schema: &RecordSchema,
    a: &dyn Record,
    b: &dyn Record,
    tolerance: &Tolerance,
) -> bool {
    try_equals(registry, schema, a, b, tolerance).unwrap_or_else(|err| {
        warn!(type_name = schema.type_name(), error = %err, "records could not be compared");
        false
    })
}

struct Comparer<'a> {
    registry: &'a SchemaRegistry,
    tolerance: &'a Tolerance,
}

impl Comparer<'_> {
    fn record(
        &self,
        schema: &RecordSchema,
        a: &dyn Record,
        b: &dyn Record,
        path: &mut FieldPath,
    ) -> Result<bool> {
        for field in schema.fields() {
            path.push_field(field.name());
            let left = a
                .field(field.name())
                .ok_or_else(|| Error::missing_accessor(path, a.type_name()))?;
            let right = b
                .field(field.name())
                .ok_or_else(|| Error::missing_accessor(path, b.type_name()))?;
            if !self.value(field.field_type(), left, right, path)? {
                trace!(%path, "records differ");
                return Ok(false);
            }
            path.pop();
        }
        Ok(true)
    }

    fn value(
        &self,
        field_type: &FieldType,
        left: FieldRef<'_>,
        right: FieldRef<'_>,
        path: &mut FieldPath,
    ) -> Result<bool> {
        match (field_type, left, right) {
            (FieldType::Record(name), FieldRef::Record(a), FieldRef::Record(b)) => {
                self.record(self.registry.record(name)?, a, b, path)
            }
            (FieldType::FixedArray(element, len), FieldRef::Array(a), FieldRef::Array(b)) => {
                if a.len() != *len || b.len() != *len {
                    return Err(Error::schema_mismatch(format!(
                        "`{path}` holds {} and {} elements but the schema declares {len}",
                        a.len(),
                        b.len()
                    )));
                }
                for i in 0..*len {
                    path.push_index(i);
                    let (Some(left), Some(right)) = (a.element(i), b.element(i)) else {
                        return Err(Error::schema_mismatch(format!(
                            "`{path}` has no element accessor"
                        )));
                    };
                    if !self.value(element, left, right, path)? {
                        return Ok(false);
                    }
                    path.pop();
                }
                Ok(true)
            }
            (FieldType::FixedString(_) | FieldType::Text, FieldRef::Str(a), FieldRef::Str(b)) => {
                Ok(a == b)
            }
            (field_type, FieldRef::Scalar(a), FieldRef::Scalar(b))
                if a.fits(field_type) && b.fits(field_type) =>
            {
                Ok(self.scalars(a, b))
            }
            (field_type, left, right) => Err(Error::schema_mismatch(format!(
                "`{path}` is declared as {field_type} but its accessors provide {} and {}",
                left.kind(),
                right.kind()
            ))),
        }
    }

    fn scalars(&self, a: Scalar, b: Scalar) -> bool {
        match (a, b) {
            (Scalar::Float32(a), Scalar::Float32(b)) => {
                a == b || (a - b).abs() <= self.tolerance.float32
            }
            (Scalar::Float64(a), Scalar::Float64(b)) => {
                a == b || (a - b).abs() <= self.tolerance.float64
            }
            (a, b) => a == b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::{DynRecord, DynValue};

    fn registry() -> SchemaRegistry {
        let mut builder = SchemaRegistry::builder();
        builder
            .add_record(
                RecordSchema::new("Sample")
                    .with_field("single", FieldType::Float32)
                    .with_field("double", FieldType::Float64)
                    .with_field("count", FieldType::Int32)
                    .with_field("history", FieldType::array(FieldType::Float32, 2)),
            )
            .unwrap();
        builder.build().unwrap()
    }

    fn sample(registry: &SchemaRegistry, single: f32, double: f64) -> DynRecord {
        let mut sample = DynRecord::zeroed(registry, "Sample").unwrap();
        *sample.get_mut("single").unwrap() = DynValue::Scalar(Scalar::Float32(single));
        *sample.get_mut("double").unwrap() = DynValue::Scalar(Scalar::Float64(double));
        sample
    }

    fn eq(a: &DynRecord, b: &DynRecord, registry: &SchemaRegistry) -> bool {
        let schema = registry.record("Sample").unwrap();
        try_equals(registry, schema, a, b, &Tolerance::default()).unwrap()
    }

    #[test]
    fn float32_tolerance_boundary() {
        let registry = registry();
        let base = sample(&registry, 0.0, 0.0);
        assert!(eq(&base, &sample(&registry, 1e-6, 0.0), &registry));
        assert!(eq(&base, &sample(&registry, 5e-7, 0.0), &registry));
        assert!(!eq(&base, &sample(&registry, 2e-6, 0.0), &registry));
    }

    #[test]
    fn float64_tolerance_boundary() {
        let registry = registry();
        let base = sample(&registry, 0.0, 0.0);
        assert!(eq(&base, &sample(&registry, 0.0, 1e-9), &registry));
        assert!(!eq(&base, &sample(&registry, 0.0, 2e-9), &registry));
    }

    #[test]
    fn integers_compare_exactly() {
        let registry = registry();
        let a = sample(&registry, 1.0, 1.0);
        let mut b = a.clone();
        *b.get_mut("count").unwrap() = DynValue::Scalar(Scalar::Int32(1));
        assert!(!eq(&a, &b, &registry));
    }

    #[test]
    fn arrays_compare_pairwise() {
        let registry = registry();
        let a = sample(&registry, 1.0, 1.0);
        let mut b = a.clone();
        if let Some(DynValue::Array(items)) = b.get_mut("history") {
            items[1] = DynValue::Scalar(Scalar::Float32(0.5));
        }
        assert!(!eq(&a, &b, &registry));
        assert!(eq(&b, &b.clone(), &registry));
    }

    #[test]
    fn nan_is_never_equal() {
        let registry = registry();
        let a = sample(&registry, f32::NAN, 0.0);
        assert!(!eq(&a, &a.clone(), &registry));
    }

    #[test]
    fn walk_failure_reports_error_and_compares_unequal() {
        let registry = registry();
        let schema = registry.record("Sample").unwrap();
        let a = sample(&registry, 1.0, 1.0);
        let mut b = a.clone();
        *b.get_mut("count").unwrap() = DynValue::Text("1".into());
        assert!(try_equals(&registry, schema, &a, &b, &Tolerance::default()).is_err());
        assert!(!equals(&registry, schema, &a, &b, &Tolerance::default()));
    }

    #[test]
    fn custom_tolerance_widens_float_equality() {
        let registry = registry();
        let schema = registry.record("Sample").unwrap();
        let a = sample(&registry, 0.0, 0.0);
        let b = sample(&registry, 0.0, 1e-7);
        let loose = Tolerance {
            float64: 1e-6,
            ..Tolerance::default()
        };
        assert!(!equals(&registry, schema, &a, &b, &Tolerance::default()));
        assert!(equals(&registry, schema, &a, &b, &loose));
    }
}
