use serde_json::{Map, Value};
use tracing::warn;

use crate::access::{Record, RecordType};
use crate::de;
use crate::dynamic::DynRecord;
use crate::eq;
use crate::error::Result;
use crate::options::CodecOptions;
use crate::schema::{RecordSchema, SchemaRegistry};
use crate::ser;

/// Entry point pairing a sealed registry with codec options.
///
/// Records are matched to their schema through [`Record::type_name`].
///
/// ```
/// use recjson::{Codec, SchemaRegistry};
///
/// recjson::record! {
///     #[derive(Debug, Default, Clone, PartialEq)]
///     pub struct Size {
///         pub width: f64,
///         pub height: f64,
///     }
/// }
///
/// let mut builder = SchemaRegistry::builder();
/// builder.register::<Size>().unwrap();
/// let registry = builder.build().unwrap();
/// let codec = Codec::new(&registry);
///
/// let size = Size { width: 3.0, height: 4.0 };
/// let text = codec.to_string(&size).unwrap();
/// assert_eq!(text, r#"{"width":3.0,"height":4.0}"#);
///
/// let back: Size = codec.from_str(&text).unwrap();
/// assert!(codec.equals(&size, &back));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Codec<'r> {
    registry: &'r SchemaRegistry,
    options: CodecOptions,
}

impl<'r> Codec<'r> {
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self {
            registry,
            options: CodecOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CodecOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &'r SchemaRegistry {
        self.registry
    }

    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    fn schema_for(&self, record: &dyn Record) -> Result<&'r RecordSchema> {
        self.registry.record(record.type_name())
    }

    /// Serializes a record into a JSON object.
    pub fn serialize(&self, record: &dyn Record) -> Result<Map<String, Value>> {
        let schema = self.schema_for(record)?;
        ser::serialize(self.registry, schema, record, &self.options.encode)
    }

    pub fn to_value(&self, record: &dyn Record) -> Result<Value> {
        self.serialize(record).map(Value::Object)
    }

    /// Serializes a record to JSON text, indented when `encode.pretty` is set.
    pub fn to_string(&self, record: &dyn Record) -> Result<String> {
        let value = self.to_value(record)?;
        let text = if self.options.encode.pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        };
        Ok(text)
    }

    /// Populates `target` from a JSON object. Keys missing from `json` leave
    /// the matching fields untouched.
    pub fn deserialize_into(&self, json: &Value, target: &mut dyn Record) -> Result<()> {
        let schema = self.schema_for(target)?;
        de::deserialize_into(self.registry, schema, json, target, &self.options.decode)
    }

    /// Deserializes into a fresh `T::default()`.
    pub fn deserialize<T: RecordType>(&self, json: &Value) -> Result<T> {
        let mut value = T::default();
        self.deserialize_into(json, &mut value)?;
        Ok(value)
    }

    /// Deserializes into a zero-initialized [`DynRecord`] of `type_name`.
    pub fn deserialize_dyn(&self, type_name: &str, json: &Value) -> Result<DynRecord> {
        let mut value = DynRecord::zeroed(self.registry, type_name)?;
        self.deserialize_into(json, &mut value)?;
        Ok(value)
    }

    /// Parses JSON text and deserializes it into a fresh `T::default()`.
    pub fn from_str<T: RecordType>(&self, text: &str) -> Result<T> {
        let json: Value = serde_json::from_str(text)?;
        self.deserialize(&json)
    }

    /// Tolerance-based equality; `false` when the records cannot be walked.
    pub fn equals(&self, a: &dyn Record, b: &dyn Record) -> bool {
        match self.schema_for(a) {
            Ok(schema) => eq::equals(self.registry, schema, a, b, &self.options.tolerance),
            Err(err) => {
                warn!(type_name = a.type_name(), error = %err, "records could not be compared");
                false
            }
        }
    }

    /// Like [`Codec::equals`] but reports why a walk failed.
    pub fn try_equals(&self, a: &dyn Record, b: &dyn Record) -> Result<bool> {
        let schema = self.schema_for(a)?;
        eq::try_equals(self.registry, schema, a, b, &self.options.tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::options::{DecodeOptions, EncodeOptions};
    use serde_json::json;

    crate::record! {
        #[derive(Debug, Default, Clone, Copy, PartialEq)]
        struct Point {
            x: f32,
            y: f32,
        }
    }

    crate::record! {
        #[derive(Debug, Default, Clone, PartialEq)]
        struct Trace as "trace" {
            points: [Point; 2],
            label: String,
        }
    }

    fn registry() -> SchemaRegistry {
        let mut builder = SchemaRegistry::builder();
        builder.register::<Trace>().unwrap();
        builder.build().unwrap()
    }

    fn trace() -> Trace {
        Trace {
            points: [Point { x: 1.0, y: 2.0 }, Point { x: 0.25, y: -4.5 }],
            label: "route".into(),
        }
    }

    #[test]
    fn register_pulls_in_nested_records() {
        let registry = registry();
        assert!(registry.get_record("Point").is_some());
        assert!(registry.get_record("trace").is_some());
    }

    #[test]
    fn typed_round_trip() {
        let registry = registry();
        let codec = Codec::new(&registry);
        let value = codec.to_value(&trace()).unwrap();
        assert_eq!(
            value,
            json!({ "points": [{ "x": 1.0, "y": 2.0 }, { "x": 0.25, "y": -4.5 }], "label": "route" })
        );
        let back: Trace = codec.deserialize(&value).unwrap();
        assert_eq!(back, trace());
        assert!(codec.equals(&trace(), &back));
    }

    #[test]
    fn dynamic_and_typed_records_interoperate() {
        let registry = registry();
        let codec = Codec::new(&registry);
        let value = codec.to_value(&trace()).unwrap();
        let dynamic = codec.deserialize_dyn("trace", &value).unwrap();
        assert!(codec.equals(&trace(), &dynamic));
        assert_eq!(codec.to_value(&dynamic).unwrap(), value);
    }

    #[test]
    fn pretty_output_is_opt_in() {
        let registry = registry();
        let options = CodecOptions {
            encode: EncodeOptions {
                pretty: true,
                ..EncodeOptions::default()
            },
            ..CodecOptions::default()
        };
        let text = Codec::new(&registry).with_options(options).to_string(&trace()).unwrap();
        assert!(text.contains("\n  \"points\""));
        assert!(!Codec::new(&registry).to_string(&trace()).unwrap().contains('\n'));
    }

    #[test]
    fn strict_codec_rejects_partial_input() {
        let registry = registry();
        let options = CodecOptions {
            decode: DecodeOptions { strict: true },
            ..CodecOptions::default()
        };
        let codec = Codec::new(&registry).with_options(options);
        let err = codec.from_str::<Trace>(r#"{ "label": "x" }"#).unwrap_err();
        assert!(matches!(err, Error::MissingField { ref path } if path == "points"));
    }

    #[test]
    fn unregistered_record_is_schema_mismatch() {
        let registry = SchemaRegistry::builder().build().unwrap();
        let codec = Codec::new(&registry);
        assert!(matches!(codec.serialize(&trace()), Err(Error::SchemaMismatch(_))));
        assert!(!codec.equals(&trace(), &trace()));
    }

    #[test]
    fn malformed_text_is_json_error() {
        let registry = registry();
        let codec = Codec::new(&registry);
        assert!(matches!(codec.from_str::<Trace>("{"), Err(Error::Json(_))));
    }
}
