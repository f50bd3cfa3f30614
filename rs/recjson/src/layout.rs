//! Schemas from C struct layout descriptions.
//!
//! Two document shapes are accepted. A multi-type map:
//!
//! ```json
//! { "types": {
//!     "Point": { "kind": "struct", "size": 8, "fields": [
//!         { "name": "x", "type": "float", "offset": 0 },
//!         { "name": "y", "type": "float", "offset": 4 } ] },
//!     "Color": { "kind": "enum", "underlying": "int",
//!                "values": { "COLOR_RED": 0, "COLOR_GREEN": 1 } } } }
//! ```
//!
//! and a single struct, `{ "struct": "Point", "size": 8, "fields": [...] }`.
//! Files may be UTF-8, or UTF-16/UTF-32 marked by a byte order mark.
//! Several documents merge into one [`Layout`]; a later definition of a name
//! replaces the earlier one.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::schema::{EnumSchema, FieldDescriptor, FieldType, RecordSchema, SchemaRegistry};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    #[default]
    Struct,
    Enum,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TypeDef {
    #[serde(default)]
    pub kind: TypeKind,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub fields: Vec<LayoutField>,
    /// Underlying integer type of an enum. Only 32-bit ints are supported.
    #[serde(default)]
    pub underlying: Option<String>,
    /// Enum value names.
    #[serde(default)]
    pub values: BTreeMap<String, i32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LayoutField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub offset: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SingleStruct {
    #[serde(rename = "struct")]
    name: String,
    #[serde(default)]
    size: Option<u64>,
    fields: Vec<LayoutField>,
}

/// Type definitions gathered from one or more layout documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    types: Vec<(String, TypeDef)>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
        let text = decode_text(bytes).map_err(|e| Error::io(path, e))?;
        let layout: Layout = text.parse()?;
        debug!(path = %path.display(), types = layout.types.len(), "loaded layout");
        Ok(layout)
    }

    /// Loads and merges several layout files in order.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut layout = Layout::new();
        for path in paths {
            layout.merge(Layout::from_file(path)?);
        }
        Ok(layout)
    }

    pub fn insert<S: Into<String>>(&mut self, name: S, def: TypeDef) {
        let name = name.into();
        match self.types.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = def,
            None => self.types.push((name, def)),
        }
    }

    pub fn merge(&mut self, other: Layout) {
        for (name, def) in other.types {
            self.insert(name, def);
        }
    }

    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.types.iter().find(|(n, _)| n == name).map(|(_, d)| d)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|(n, _)| n.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Builds a sealed registry from every definition in the layout.
    pub fn to_registry(&self) -> Result<SchemaRegistry> {
        let kinds: HashMap<&str, TypeKind> = self
            .types
            .iter()
            .map(|(name, def)| (name.as_str(), def.kind))
            .collect();
        let lookup = |name: &str| kinds.get(name).copied();

        let mut builder = SchemaRegistry::builder();
        for (name, def) in &self.types {
            match def.kind {
                TypeKind::Struct => {
                    builder.add_record(record_schema(name, def, &lookup)?)?;
                }
                TypeKind::Enum => {
                    builder.add_enum(enum_schema(name, def)?)?;
                }
            }
        }
        builder.build()
    }
}

impl FromStr for Layout {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let document: Value = serde_json::from_str(text)?;
        let mut layout = Layout::new();

        if let Some(types) = document.get("types") {
            let types = types
                .as_object()
                .ok_or_else(|| Error::invalid_schema("layout `types` must be an object"))?;
            for (name, def) in types {
                layout.insert(name.as_str(), TypeDef::deserialize(def)?);
            }
        } else if document.get("struct").is_some() && document.get("fields").is_some() {
            let single = SingleStruct::deserialize(&document)?;
            layout.insert(
                single.name,
                TypeDef {
                    size: single.size,
                    fields: single.fields,
                    ..TypeDef::default()
                },
            );
        } else {
            return Err(Error::invalid_schema(
                "layout document needs a `types` map or a `struct` with `fields`",
            ));
        }
        Ok(layout)
    }
}

/// Decodes layout file bytes. A byte order mark selects UTF-16 or UTF-32 in
/// either endianness; without one the bytes must be UTF-8.
fn decode_text(bytes: Vec<u8>) -> io::Result<String> {
    let invalid = |encoding: &str| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("stream did not contain valid {encoding}"),
        )
    };
    if let Some(rest) = bytes.strip_prefix(b"\xFF\xFE\x00\x00") {
        return utf32(rest, u32::from_le_bytes).ok_or_else(|| invalid("UTF-32LE"));
    }
    if let Some(rest) = bytes.strip_prefix(b"\x00\x00\xFE\xFF") {
        return utf32(rest, u32::from_be_bytes).ok_or_else(|| invalid("UTF-32BE"));
    }
    if let Some(rest) = bytes.strip_prefix(b"\xFF\xFE") {
        return utf16(rest, u16::from_le_bytes).ok_or_else(|| invalid("UTF-16LE"));
    }
    if let Some(rest) = bytes.strip_prefix(b"\xFE\xFF") {
        return utf16(rest, u16::from_be_bytes).ok_or_else(|| invalid("UTF-16BE"));
    }
    String::from_utf8(bytes).map_err(|_| invalid("UTF-8"))
}

fn utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = bytes.chunks_exact(2).map(|c| unit([c[0], c[1]])).collect();
    String::from_utf16(&units).ok()
}

fn utf32(bytes: &[u8], unit: fn([u8; 4]) -> u32) -> Option<String> {
    if bytes.len() % 4 != 0 {
        return None;
    }
    bytes
        .chunks_exact(4)
        .map(|c| char::from_u32(unit([c[0], c[1], c[2], c[3]])))
        .collect()
}

fn record_schema(
    name: &str,
    def: &TypeDef,
    lookup: &dyn Fn(&str) -> Option<TypeKind>,
) -> Result<RecordSchema> {
    let mut schema = RecordSchema::new(name);
    if let Some(size) = def.size {
        schema = schema.with_size(size);
    }
    for field in &def.fields {
        let field_type = parse_field_type(&field.type_name, lookup).ok_or_else(|| {
            Error::invalid_schema(format!(
                "field `{name}.{}` has unsupported type `{}`",
                field.name, field.type_name
            ))
        })?;
        let mut descriptor = FieldDescriptor::new(field.name.as_str(), field_type);
        if let Some(offset) = field.offset {
            descriptor = descriptor.with_offset(offset);
        }
        schema.push_field(descriptor);
    }
    Ok(schema)
}

fn enum_schema(name: &str, def: &TypeDef) -> Result<EnumSchema> {
    if let Some(underlying) = def.underlying.as_deref() {
        if primitive(underlying).is_none_or(|ty| !matches!(ty, FieldType::Int32 | FieldType::UInt32)) {
            return Err(Error::invalid_schema(format!(
                "enum `{name}` has unsupported underlying type `{underlying}`"
            )));
        }
    }
    let mut values: Vec<(i32, &str)> = def.values.iter().map(|(n, v)| (*v, n.as_str())).collect();
    values.sort();
    Ok(values
        .into_iter()
        .fold(EnumSchema::new(name), |schema, (value, label)| schema.with_value(value, label)))
}

/// Maps a C type string to a field type. `lookup` says whether a name is a
/// struct or an enum; unknown names yield `None`.
///
/// `T[a][b]` follows C order: `a` arrays of `b` elements. The innermost
/// dimension of a `char` array is a fixed string.
pub fn parse_field_type(text: &str, lookup: &dyn Fn(&str) -> Option<TypeKind>) -> Option<FieldType> {
    let text = text.trim();
    if let Some(open) = text.find('[') {
        let base = text[..open].trim();
        let dims = parse_dims(&text[open..])?;
        let (&innermost, outer) = dims.split_last()?;
        let mut field_type = if base == "char" {
            FieldType::FixedString(innermost)
        } else {
            FieldType::array(parse_field_type(base, lookup)?, innermost)
        };
        for &len in outer.iter().rev() {
            field_type = FieldType::array(field_type, len);
        }
        return Some(field_type);
    }

    let compact: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let pointer = compact.replace(' ', "");
    if pointer == "char*" || pointer == "constchar*" {
        return Some(FieldType::Text);
    }
    if let Some(field_type) = primitive(&compact) {
        return Some(field_type);
    }
    match lookup(&compact)? {
        TypeKind::Struct => Some(FieldType::Record(compact)),
        TypeKind::Enum => Some(FieldType::Enum(compact)),
    }
}

fn parse_dims(text: &str) -> Option<Vec<usize>> {
    let mut dims = Vec::new();
    let mut rest = text.trim();
    while !rest.is_empty() {
        let inner = rest.strip_prefix('[')?;
        let close = inner.find(']')?;
        dims.push(inner[..close].trim().parse().ok()?);
        rest = inner[close + 1..].trim_start();
    }
    Some(dims)
}

fn primitive(name: &str) -> Option<FieldType> {
    Some(match name {
        "char" | "signed char" | "int8_t" => FieldType::Int8,
        "int" | "signed int" | "long" | "long int" | "signed long" | "int32_t" => FieldType::Int32,
        "unsigned int" | "unsigned" | "unsigned long" | "unsigned long int" | "uint32_t" => {
            FieldType::UInt32
        }
        "float" => FieldType::Float32,
        "double" => FieldType::Float64,
        "bool" | "_Bool" => FieldType::Bool,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MULTI: &str = r#"{
        "types": {
            "myTestStruct": {
                "kind": "struct",
                "size": 48,
                "fields": [
                    { "name": "center", "type": "Point", "offset": 0 },
                    { "name": "bounding", "type": "Size", "offset": 8 },
                    { "name": "color", "type": "Color", "offset": 24 },
                    { "name": "values", "type": "float[5]", "offset": 28 }
                ]
            },
            "Point": {
                "fields": [
                    { "name": "x", "type": "float" },
                    { "name": "y", "type": "float" }
                ]
            },
            "Size": {
                "kind": "struct",
                "fields": [
                    { "name": "width", "type": "double" },
                    { "name": "height", "type": "double" }
                ]
            },
            "Color": { "kind": "enum", "underlying": "int",
                       "values": { "COLOR_GREEN": 1, "COLOR_RED": 0, "COLOR_BLUE": 2 } }
        }
    }"#;

    fn no_types(_: &str) -> Option<TypeKind> {
        None
    }

    #[test]
    fn multi_type_layout_builds_registry() {
        let layout: Layout = MULTI.parse().unwrap();
        let registry = layout.to_registry().unwrap();

        let schema = registry.record("myTestStruct").unwrap();
        assert_eq!(schema.size(), Some(48));
        assert_eq!(schema.fields()[2].field_type(), &FieldType::enumeration("Color"));
        assert_eq!(schema.fields()[3].field_type(), &FieldType::array(FieldType::Float32, 5));
        assert_eq!(schema.fields()[1].offset(), Some(8));

        let color = registry.enumeration("Color").unwrap();
        let values: Vec<(i32, &str)> = color.values().collect();
        assert_eq!(values, [(0, "COLOR_RED"), (1, "COLOR_GREEN"), (2, "COLOR_BLUE")]);

        assert_eq!(
            registry.dependency_order(&["myTestStruct"]).unwrap(),
            ["Point", "Size", "myTestStruct"]
        );
    }

    #[test]
    fn single_struct_documents_merge() {
        let mut layout: Layout = r#"{ "struct": "Point", "size": 8, "fields": [
            { "name": "x", "type": "float" }, { "name": "y", "type": "float" } ] }"#
            .parse()
            .unwrap();
        let segment: Layout = "\u{feff}{ \"struct\": \"Segment\", \"fields\": [ { \"name\": \"ends\", \"type\": \"Point[2]\" } ] }"
            .parse()
            .unwrap();
        layout.merge(segment);

        let registry = layout.to_registry().unwrap();
        assert_eq!(
            registry.record("Segment").unwrap().fields()[0].field_type(),
            &FieldType::array(FieldType::record("Point"), 2)
        );
        assert_eq!(registry.record("Point").unwrap().size(), Some(8));
    }

    #[test]
    fn later_definitions_replace_earlier_ones() {
        let mut layout = Layout::new();
        layout.insert("Point", TypeDef::default());
        layout.insert(
            "Point",
            TypeDef {
                fields: vec![LayoutField {
                    name: "x".into(),
                    type_name: "double".into(),
                    offset: None,
                }],
                ..TypeDef::default()
            },
        );
        assert_eq!(layout.type_names().count(), 1);
        assert_eq!(layout.get("Point").unwrap().fields.len(), 1);
    }

    #[test]
    fn unknown_field_type_is_invalid_schema() {
        let layout: Layout = r#"{ "struct": "Odd", "fields": [ { "name": "v", "type": "Mystery" } ] }"#
            .parse()
            .unwrap();
        let err = layout.to_registry().unwrap_err();
        assert!(matches!(err, Error::InvalidSchema(ref m) if m.contains("Odd.v")), "{err}");
    }

    #[test]
    fn unrecognized_document_is_rejected() {
        assert!("{ \"fields\": [] }".parse::<Layout>().is_err());
        assert!(matches!("not json".parse::<Layout>(), Err(Error::Json(_))));
    }

    #[test]
    fn parses_c_type_strings() {
        assert_eq!(parse_field_type("unsigned long", &no_types), Some(FieldType::UInt32));
        assert_eq!(parse_field_type("signed  char", &no_types), Some(FieldType::Int8));
        assert_eq!(parse_field_type("_Bool", &no_types), Some(FieldType::Bool));
        assert_eq!(parse_field_type("char[16]", &no_types), Some(FieldType::FixedString(16)));
        assert_eq!(parse_field_type("char *", &no_types), Some(FieldType::Text));
        assert_eq!(
            parse_field_type("float[2][3]", &no_types),
            Some(FieldType::array(FieldType::array(FieldType::Float32, 3), 2))
        );
        assert_eq!(
            parse_field_type("char[2][8]", &no_types),
            Some(FieldType::array(FieldType::FixedString(8), 2))
        );
        assert_eq!(parse_field_type("float[x]", &no_types), None);
        assert_eq!(parse_field_type("Point", &no_types), None);
        assert_eq!(
            parse_field_type("Point", &|n| (n == "Point").then_some(TypeKind::Struct)),
            Some(FieldType::record("Point"))
        );
    }

    #[test]
    fn enum_with_wide_underlying_type_is_rejected() {
        let layout: Layout = r#"{ "types": { "Big": { "kind": "enum", "underlying": "double" } } }"#
            .parse()
            .unwrap();
        assert!(layout.to_registry().is_err());
    }

    #[test]
    fn loads_files_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.json");
        fs::write(&path, MULTI).unwrap();
        let layout = Layout::load(&[&path]).unwrap();
        assert_eq!(layout.type_names().count(), 4);

        let err = Layout::from_file(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn loads_utf16_and_utf32_files_with_byte_order_mark() {
        let dir = tempfile::tempdir().unwrap();

        let utf16le = dir.path().join("utf16le.json");
        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend(MULTI.encode_utf16().flat_map(u16::to_le_bytes));
        fs::write(&utf16le, bytes).unwrap();
        let layout = Layout::from_file(&utf16le).unwrap();
        assert_eq!(layout, MULTI.parse::<Layout>().unwrap());

        let utf32be = dir.path().join("utf32be.json");
        let single = r#"{ "struct": "Point", "fields": [ { "name": "x", "type": "float", "size": 4 } ] }"#;
        let mut bytes = vec![0x00, 0x00, 0xFE, 0xFF];
        bytes.extend(single.chars().flat_map(|c| u32::from(c).to_be_bytes()));
        fs::write(&utf32be, bytes).unwrap();
        let registry = Layout::from_file(&utf32be).unwrap().to_registry().unwrap();
        assert_eq!(registry.record("Point").unwrap().fields().len(), 1);

        let truncated = dir.path().join("truncated.json");
        fs::write(&truncated, [0xFF, 0xFE, b'{']).unwrap();
        let err = Layout::from_file(&truncated).unwrap_err();
        assert!(matches!(err, Error::Io { ref source, .. } if source.kind() == io::ErrorKind::InvalidData));
    }
}
