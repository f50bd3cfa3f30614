/// Declares a plain struct together with its [`Record`](crate::Record),
/// [`Field`](crate::Field), [`Described`](crate::Described) and
/// [`RecordType`](crate::RecordType) impls.
///
/// The schema type name defaults to the struct name; `as "name"` overrides it.
/// The struct must implement `Default`.
///
/// ```
/// recjson::record! {
///     #[derive(Debug, Default, Clone, Copy, PartialEq)]
///     pub struct Point {
///         pub x: f32,
///         pub y: f32,
///     }
/// }
///
/// recjson::record! {
///     #[derive(Debug, Default, Clone, PartialEq)]
///     pub struct Polygon as "polygon" {
///         pub corners: [Point; 3],
///     }
/// }
///
/// use recjson::RecordType;
/// assert_eq!(Polygon::TYPE_NAME, "polygon");
/// assert_eq!(Polygon::schema().fields()[0].name(), "corners");
/// ```
#[macro_export]
macro_rules! record {
    (@impls $name:ident [$type_name:expr] { $( $field:ident : $field_ty:ty ),* }) => {
        impl $crate::Record for $name {
            fn type_name(&self) -> &str {
                $type_name
            }

            fn field(&self, name: &str) -> ::core::option::Option<$crate::FieldRef<'_>> {
                match name {
                    $( stringify!($field) => ::core::option::Option::Some($crate::Field::field_ref(&self.$field)), )*
                    _ => ::core::option::Option::None,
                }
            }

            fn field_mut(&mut self, name: &str) -> ::core::option::Option<$crate::FieldMut<'_>> {
                match name {
                    $( stringify!($field) => ::core::option::Option::Some($crate::Field::field_mut(&mut self.$field)), )*
                    _ => ::core::option::Option::None,
                }
            }
        }

        impl $crate::Field for $name {
            fn field_ref(&self) -> $crate::FieldRef<'_> {
                $crate::FieldRef::Record(self)
            }

            fn field_mut(&mut self) -> $crate::FieldMut<'_> {
                $crate::FieldMut::Record(self)
            }
        }

        impl $crate::Described for $name {
            fn field_type() -> $crate::FieldType {
                $crate::FieldType::record($type_name)
            }

            fn describe(builder: &mut $crate::RegistryBuilder) -> $crate::Result<()> {
                builder.register::<Self>().map(|_| ())
            }
        }

        impl $crate::RecordType for $name {
            const TYPE_NAME: &'static str = $type_name;

            fn schema() -> $crate::RecordSchema {
                $crate::RecordSchema::new($type_name)
                    $( .with_field(stringify!($field), <$field_ty as $crate::Described>::field_type()) )*
            }

            fn describe_fields(builder: &mut $crate::RegistryBuilder) -> $crate::Result<()> {
                $( <$field_ty as $crate::Described>::describe(builder)?; )*
                let _ = builder;
                ::core::result::Result::Ok(())
            }
        }
    };

    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident as $type_name:literal {
            $( $(#[$field_meta:meta])* $field_vis:vis $field:ident : $field_ty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $( $(#[$field_meta])* $field_vis $field: $field_ty, )*
        }

        $crate::record!(@impls $name [$type_name] { $( $field : $field_ty ),* });
    };

    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $(#[$field_meta:meta])* $field_vis:vis $field:ident : $field_ty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $( $(#[$field_meta])* $field_vis $field: $field_ty, )*
        }

        $crate::record!(@impls $name [stringify!($name)] { $( $field : $field_ty ),* });
    };
}

/// Declares a C-like enum backed by `i32`, with a name table used for
/// optional named JSON output.
///
/// ```
/// recjson::record_enum! {
///     #[derive(Default)]
///     pub enum Color {
///         #[default]
///         Red = 0 => "COLOR_RED",
///         Green = 1 => "COLOR_GREEN",
///     }
/// }
///
/// assert_eq!(Color::try_from(1).unwrap(), Color::Green);
/// assert_eq!(Color::enum_schema().name_of(0), Some("COLOR_RED"));
/// ```
#[macro_export]
macro_rules! record_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$variant_meta:meta])* $variant:ident = $value:literal => $label:literal ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(i32)]
        $vis enum $name {
            $( $(#[$variant_meta])* $variant = $value, )*
        }

        impl $name {
            pub fn enum_schema() -> $crate::EnumSchema {
                $crate::EnumSchema::new(stringify!($name))
                    $( .with_value($value, $label) )*
            }
        }

        impl ::core::convert::TryFrom<i32> for $name {
            type Error = $crate::Error;

            fn try_from(value: i32) -> ::core::result::Result<Self, Self::Error> {
                match value {
                    $( $value => ::core::result::Result::Ok($name::$variant), )*
                    other => ::core::result::Result::Err($crate::Error::unknown_enum_value(stringify!($name), other)),
                }
            }
        }

        impl $crate::ScalarSlot for $name {
            fn load(&self) -> $crate::Scalar {
                $crate::Scalar::Enum(*self as i32)
            }

            fn store(&mut self, value: $crate::Scalar) -> $crate::Result<()> {
                match value {
                    $crate::Scalar::Enum(raw) => {
                        *self = <$name as ::core::convert::TryFrom<i32>>::try_from(raw)?;
                        ::core::result::Result::Ok(())
                    }
                    other => ::core::result::Result::Err($crate::Error::schema_mismatch(::std::format!(
                        "cannot store {} into enum `{}`",
                        other.kind(),
                        stringify!($name)
                    ))),
                }
            }
        }

        impl $crate::Field for $name {
            fn field_ref(&self) -> $crate::FieldRef<'_> {
                $crate::FieldRef::Scalar($crate::ScalarSlot::load(self))
            }

            fn field_mut(&mut self) -> $crate::FieldMut<'_> {
                $crate::FieldMut::Scalar(self)
            }
        }

        impl $crate::Described for $name {
            fn field_type() -> $crate::FieldType {
                $crate::FieldType::enumeration(stringify!($name))
            }

            fn describe(builder: &mut $crate::RegistryBuilder) -> $crate::Result<()> {
                builder.add_enum(Self::enum_schema()).map(|_| ())
            }
        }
    };
}
