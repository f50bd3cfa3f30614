//! Error type shared by the registry, the layout loader and the three walkers.
//!
//! Construct errors through the helper functions rather than the variants so
//! that messages stay consistent across call sites.

use std::borrow::Cow;
use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

use crate::path::FieldPath;
use crate::schema::FieldType;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A schema references an unregistered type, or an accessor is missing or
    /// disagrees with the declared field type.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(Cow<'static, str>),

    /// A JSON value's kind is incompatible with the declared field type.
    #[error("field `{path}` expected {expected}, found {found}")]
    FieldTypeMismatch {
        path: String,
        expected: String,
        found: &'static str,
    },

    /// A nested object or array has the wrong shape.
    #[error("structure mismatch at `{path}`: {reason}")]
    StructureMismatch { path: String, reason: String },

    /// A schema definition is malformed: duplicate names, zero-length arrays,
    /// unknown layout type strings or dependency cycles.
    #[error("invalid schema: {0}")]
    InvalidSchema(Cow<'static, str>),

    #[error("enum `{enum_name}` has no value {value}")]
    UnknownEnumValue { enum_name: String, value: String },

    /// Strict decoding only.
    #[error("missing field `{path}`")]
    MissingField { path: String },

    /// Strict decoding only.
    #[error("unknown field `{path}`")]
    UnknownField { path: String },

    #[error("field `{path}` holds a non-finite number, which JSON cannot represent")]
    NonFiniteNumber { path: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    #[cold]
    pub fn schema_mismatch<S: Into<Cow<'static, str>>>(s: S) -> Self {
        Error::SchemaMismatch(s.into())
    }

    #[cold]
    pub fn invalid_schema<S: Into<Cow<'static, str>>>(s: S) -> Self {
        Error::InvalidSchema(s.into())
    }

    #[cold]
    pub fn field_type_mismatch(path: &FieldPath, expected: &FieldType, found: &Value) -> Self {
        Error::FieldTypeMismatch {
            path: path.to_string(),
            expected: expected.to_string(),
            found: json_kind(found),
        }
    }

    #[cold]
    pub fn structure_mismatch<S: Into<String>>(path: &FieldPath, reason: S) -> Self {
        Error::StructureMismatch {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    #[cold]
    pub fn unknown_enum_value<N: Into<String>, V: ToString>(enum_name: N, value: V) -> Self {
        Error::UnknownEnumValue {
            enum_name: enum_name.into(),
            value: value.to_string(),
        }
    }

    #[cold]
    pub fn missing_field(path: &FieldPath) -> Self {
        Error::MissingField {
            path: path.to_string(),
        }
    }

    #[cold]
    pub fn unknown_field(path: &FieldPath) -> Self {
        Error::UnknownField {
            path: path.to_string(),
        }
    }

    #[cold]
    pub fn non_finite(path: &FieldPath) -> Self {
        Error::NonFiniteNumber {
            path: path.to_string(),
        }
    }

    #[cold]
    pub fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Error for a field the schema declares but the record does not expose.
    #[cold]
    pub(crate) fn missing_accessor(path: &FieldPath, type_name: &str) -> Self {
        Error::schema_mismatch(format!(
            "`{type_name}` has no accessor for field `{path}`"
        ))
    }
}

/// Short name of a JSON value's kind, used in mismatch messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
