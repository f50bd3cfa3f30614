// Enables feature flag documentation on things in docs.rs https://github.com/rust-lang/rust/issues/43781 http://doc.rust-lang.org/rustdoc/unstable-features.html#doccfg-and-docauto_cfg
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Schema-driven JSON encoding for fixed-layout records.
//!
//! A [`SchemaRegistry`] describes each record type as an ordered list of typed
//! fields. Three generic walkers interpret it:
//!
//! - [`ser::serialize`] writes a record as a JSON object,
//! - [`de::deserialize_into`] populates a record from a JSON object,
//! - [`eq::equals`] compares two records with float tolerance.
//!
//! Records are reached through the accessor traits in [`access`]. The
//! [`record!`] and [`record_enum!`] macros implement them for plain structs
//! and C-like enums, [`DynRecord`] implements them from a schema at runtime,
//! and [`Layout`] builds schemas from C struct layout descriptions.
//!
//! [`Codec`] bundles a registry with [`CodecOptions`] and is the usual entry
//! point.

mod macros;

pub mod access;
pub mod codec;
pub mod de;
pub mod dynamic;
pub mod eq;
pub mod error;
pub mod layout;
pub mod options;
pub mod path;
pub mod schema;
pub mod ser;

pub use access::{
    Described, Elements, Field, FieldMut, FieldRef, FixedString, Record, RecordType, Scalar,
    ScalarSlot,
};
pub use codec::Codec;
pub use dynamic::{DynRecord, DynValue};
pub use error::{Error, Result};
pub use layout::Layout;
pub use options::{
    CodecOptions, DecodeOptions, EncodeOptions, EnumRepr, FLOAT32_EPSILON, FLOAT64_EPSILON,
    Tolerance,
};
pub use path::FieldPath;
pub use schema::{
    EnumSchema, FieldDescriptor, FieldType, RecordSchema, RegistryBuilder, SchemaRegistry,
};
