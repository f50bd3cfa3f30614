//! Accessor traits through which the walkers read and write record fields.
//!
//! The walkers never see concrete struct types. A record hands out a
//! [`FieldRef`] or [`FieldMut`] per field name, and the schema decides how
//! that field is encoded. Concrete structs get these impls from the
//! [`record!`](crate::record) and [`record_enum!`](crate::record_enum)
//! macros; [`DynRecord`](crate::DynRecord) implements them from a schema.

use std::fmt;
use std::mem;

use crate::error::{Error, Result};
use crate::schema::{FieldType, RecordSchema, RegistryBuilder};

/// A single scalar field value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Int8(i8),
    Int32(i32),
    UInt32(u32),
    Float32(f32),
    Float64(f64),
    Bool(bool),
    /// Underlying value of a C-like enum.
    Enum(i32),
}

impl Scalar {
    /// The zero value for a scalar field type, `None` for non-scalars.
    pub fn zero(field_type: &FieldType) -> Option<Scalar> {
        Some(match field_type {
            FieldType::Int8 => Scalar::Int8(0),
            FieldType::Int32 => Scalar::Int32(0),
            FieldType::UInt32 => Scalar::UInt32(0),
            FieldType::Float32 => Scalar::Float32(0.0),
            FieldType::Float64 => Scalar::Float64(0.0),
            FieldType::Bool => Scalar::Bool(false),
            FieldType::Enum(_) => Scalar::Enum(0),
            _ => return None,
        })
    }

    /// Whether this value can live in a field of `field_type`.
    pub fn fits(&self, field_type: &FieldType) -> bool {
        matches!(
            (self, field_type),
            (Scalar::Int8(_), FieldType::Int8)
                | (Scalar::Int32(_), FieldType::Int32)
                | (Scalar::UInt32(_), FieldType::UInt32)
                | (Scalar::Float32(_), FieldType::Float32)
                | (Scalar::Float64(_), FieldType::Float64)
                | (Scalar::Bool(_), FieldType::Bool)
                | (Scalar::Enum(_), FieldType::Enum(_))
        )
    }

    pub fn same_kind(&self, other: &Scalar) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Scalar::Int8(_) => "int8",
            Scalar::Int32(_) => "int32",
            Scalar::UInt32(_) => "uint32",
            Scalar::Float32(_) => "float32",
            Scalar::Float64(_) => "float64",
            Scalar::Bool(_) => "bool",
            Scalar::Enum(_) => "enum",
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int8(v) => write!(f, "{v}"),
            Scalar::Int32(v) | Scalar::Enum(v) => write!(f, "{v}"),
            Scalar::UInt32(v) => write!(f, "{v}"),
            Scalar::Float32(v) => write!(f, "{v}"),
            Scalar::Float64(v) => write!(f, "{v}"),
            Scalar::Bool(v) => write!(f, "{v}"),
        }
    }
}

/// Read access to one field.
pub enum FieldRef<'a> {
    Scalar(Scalar),
    Str(&'a str),
    Record(&'a dyn Record),
    Array(&'a dyn Elements),
}

/// Write access to one field.
pub enum FieldMut<'a> {
    Scalar(&'a mut dyn ScalarSlot),
    Str(&'a mut String),
    Record(&'a mut dyn Record),
    Array(&'a mut dyn Elements),
}

impl FieldRef<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            FieldRef::Scalar(scalar) => scalar.kind(),
            FieldRef::Str(_) => "string",
            FieldRef::Record(_) => "record",
            FieldRef::Array(_) => "array",
        }
    }
}

impl FieldMut<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            FieldMut::Scalar(slot) => slot.load().kind(),
            FieldMut::Str(_) => "string",
            FieldMut::Record(_) => "record",
            FieldMut::Array(_) => "array",
        }
    }
}

/// Storage for a scalar value.
pub trait ScalarSlot {
    fn load(&self) -> Scalar;

    /// Stores `value`. Fails when the value has the wrong kind or, for enums,
    /// names no variant.
    fn store(&mut self, value: Scalar) -> Result<()>;
}

/// A value that can sit in a record field.
pub trait Field {
    fn field_ref(&self) -> FieldRef<'_>;
    fn field_mut(&mut self) -> FieldMut<'_>;
}

/// Indexed access to the elements of a fixed array.
pub trait Elements {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn element(&self, index: usize) -> Option<FieldRef<'_>>;
    fn element_mut(&mut self, index: usize) -> Option<FieldMut<'_>>;
}

/// A record instance, accessed by field name.
pub trait Record {
    fn type_name(&self) -> &str;
    fn field(&self, name: &str) -> Option<FieldRef<'_>>;
    fn field_mut(&mut self, name: &str) -> Option<FieldMut<'_>>;
}

/// Static schema information for a field type.
pub trait Described {
    fn field_type() -> FieldType;

    /// Registers the records and enums this type refers to.
    fn describe(builder: &mut RegistryBuilder) -> Result<()> {
        let _ = builder;
        Ok(())
    }
}

/// A concrete record type with a schema known at compile time.
pub trait RecordType: Record + Default {
    const TYPE_NAME: &'static str;

    fn schema() -> RecordSchema;

    /// Registers the types of every field.
    fn describe_fields(builder: &mut RegistryBuilder) -> Result<()>;
}

macro_rules! scalar_field {
    ($ty:ty, $variant:ident, $field_type:ident) => {
        impl ScalarSlot for $ty {
            fn load(&self) -> Scalar {
                Scalar::$variant(*self)
            }

            fn store(&mut self, value: Scalar) -> Result<()> {
                match value {
                    Scalar::$variant(v) => {
                        *self = v;
                        Ok(())
                    }
                    other => Err(Error::schema_mismatch(format!(
                        "cannot store {} into a {} slot",
                        other.kind(),
                        stringify!($ty)
                    ))),
                }
            }
        }

        impl Field for $ty {
            fn field_ref(&self) -> FieldRef<'_> {
                FieldRef::Scalar(self.load())
            }

            fn field_mut(&mut self) -> FieldMut<'_> {
                FieldMut::Scalar(self)
            }
        }

        impl Described for $ty {
            fn field_type() -> FieldType {
                FieldType::$field_type
            }
        }
    };
}

scalar_field!(i8, Int8, Int8);
scalar_field!(i32, Int32, Int32);
scalar_field!(u32, UInt32, UInt32);
scalar_field!(f32, Float32, Float32);
scalar_field!(f64, Float64, Float64);
scalar_field!(bool, Bool, Bool);

impl Field for String {
    fn field_ref(&self) -> FieldRef<'_> {
        FieldRef::Str(self)
    }

    fn field_mut(&mut self) -> FieldMut<'_> {
        FieldMut::Str(self)
    }
}

impl Described for String {
    fn field_type() -> FieldType {
        FieldType::Text
    }
}

impl<T: Field, const N: usize> Elements for [T; N] {
    fn len(&self) -> usize {
        N
    }

    fn element(&self, index: usize) -> Option<FieldRef<'_>> {
        self.get(index).map(Field::field_ref)
    }

    fn element_mut(&mut self, index: usize) -> Option<FieldMut<'_>> {
        self.get_mut(index).map(Field::field_mut)
    }
}

impl<T: Field, const N: usize> Field for [T; N] {
    fn field_ref(&self) -> FieldRef<'_> {
        FieldRef::Array(self)
    }

    fn field_mut(&mut self) -> FieldMut<'_> {
        FieldMut::Array(self)
    }
}

impl<T: Described, const N: usize> Described for [T; N] {
    fn field_type() -> FieldType {
        FieldType::array(T::field_type(), N)
    }

    fn describe(builder: &mut RegistryBuilder) -> Result<()> {
        T::describe(builder)
    }
}

impl<T: Field> Elements for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn element(&self, index: usize) -> Option<FieldRef<'_>> {
        self.get(index).map(Field::field_ref)
    }

    fn element_mut(&mut self, index: usize) -> Option<FieldMut<'_>> {
        self.get_mut(index).map(Field::field_mut)
    }
}

/// A `char[N]` field: holds at most `N - 1` bytes, cut on a char boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FixedString<const N: usize>(String);

impl<const N: usize> FixedString<N> {
    pub fn new(s: &str) -> Self {
        Self(truncate_to(s, N.saturating_sub(1)).to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<const N: usize> From<&str> for FixedString<N> {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl<const N: usize> fmt::Display for FixedString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<const N: usize> Field for FixedString<N> {
    fn field_ref(&self) -> FieldRef<'_> {
        FieldRef::Str(&self.0)
    }

    fn field_mut(&mut self) -> FieldMut<'_> {
        FieldMut::Str(&mut self.0)
    }
}

impl<const N: usize> Described for FixedString<N> {
    fn field_type() -> FieldType {
        FieldType::FixedString(N)
    }
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a char.
pub(crate) fn truncate_to(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_slot_rejects_other_kinds() {
        let mut value = 3i32;
        value.store(Scalar::Int32(7)).unwrap();
        assert_eq!(value, 7);
        assert!(value.store(Scalar::Float32(1.0)).is_err());
        assert_eq!(value, 7);
    }

    #[test]
    fn arrays_describe_their_length() {
        assert_eq!(
            <[f32; 5]>::field_type(),
            FieldType::array(FieldType::Float32, 5)
        );
        let values = [1.0f32, 2.0, 3.0];
        assert_eq!(Elements::len(&values), 3);
        assert!(values.element(3).is_none());
        assert!(matches!(
            values.element(1),
            Some(FieldRef::Scalar(Scalar::Float32(v))) if v == 2.0
        ));
    }

    #[test]
    fn fixed_string_truncates_on_char_boundary() {
        let s = FixedString::<4>::new("héllo");
        assert_eq!(s.as_str(), "hé");
        assert_eq!(FixedString::<8>::from("abc").as_str(), "abc");
        assert_eq!(<FixedString<8>>::field_type(), FieldType::FixedString(8));
    }

    #[test]
    fn zero_matches_field_type() {
        for ty in [
            FieldType::Int8,
            FieldType::UInt32,
            FieldType::Float64,
            FieldType::enumeration("Color"),
        ] {
            assert!(Scalar::zero(&ty).unwrap().fits(&ty));
        }
        assert!(Scalar::zero(&FieldType::Text).is_none());
    }
}
