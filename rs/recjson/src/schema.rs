//! Record schemas and the registry that resolves them.
//!
//! A [`SchemaRegistry`] is assembled once through a [`RegistryBuilder`] and is
//! immutable afterwards. Building validates that every `Record`/`Enum`
//! reference resolves, that names are unique and that records do not contain
//! themselves, so the walkers never meet an unresolvable type.

use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::debug;

use crate::access::RecordType;
use crate::error::{Error, Result};

/// Semantic type of a record field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Int8,
    Int32,
    UInt32,
    Float32,
    Float64,
    Bool,
    /// C-like enum stored as its underlying `i32`.
    Enum(String),
    /// Nested record, by type name.
    Record(String),
    FixedArray(Box<FieldType>, usize),
    /// `char[N]`: a string holding at most `N - 1` bytes.
    FixedString(usize),
    /// `char*`: an unbounded string.
    Text,
}

impl FieldType {
    pub fn record<S: Into<String>>(name: S) -> Self {
        FieldType::Record(name.into())
    }

    pub fn enumeration<S: Into<String>>(name: S) -> Self {
        FieldType::Enum(name.into())
    }

    pub fn array(element: FieldType, len: usize) -> Self {
        FieldType::FixedArray(Box::new(element), len)
    }

    /// The named record this type refers to, looking through arrays.
    pub fn referenced_record(&self) -> Option<&str> {
        match self {
            FieldType::Record(name) => Some(name),
            FieldType::FixedArray(element, _) => element.referenced_record(),
            _ => None,
        }
    }

    /// The named enum this type refers to, looking through arrays.
    pub fn referenced_enum(&self) -> Option<&str> {
        match self {
            FieldType::Enum(name) => Some(name),
            FieldType::FixedArray(element, _) => element.referenced_enum(),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Int8 => f.write_str("int8"),
            FieldType::Int32 => f.write_str("int32"),
            FieldType::UInt32 => f.write_str("uint32"),
            FieldType::Float32 => f.write_str("float32"),
            FieldType::Float64 => f.write_str("float64"),
            FieldType::Bool => f.write_str("bool"),
            FieldType::Enum(name) => write!(f, "enum {name}"),
            FieldType::Record(name) => write!(f, "record {name}"),
            FieldType::FixedArray(element, len) => write!(f, "[{element}; {len}]"),
            FieldType::FixedString(capacity) => write!(f, "char[{capacity}]"),
            FieldType::Text => f.write_str("string"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: String,
    field_type: FieldType,
    offset: Option<u64>,
}

impl FieldDescriptor {
    pub fn new<S: Into<String>>(name: S, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            offset: None,
        }
    }

    /// Byte offset inside the C layout. Informational only.
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSchema {
    type_name: String,
    fields: Vec<FieldDescriptor>,
    size: Option<u64>,
}

impl RecordSchema {
    pub fn new<S: Into<String>>(type_name: S) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
            size: None,
        }
    }

    pub fn with_field<S: Into<String>>(mut self, name: S, field_type: FieldType) -> Self {
        self.fields.push(FieldDescriptor::new(name, field_type));
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn push_field(&mut self, field: FieldDescriptor) {
        self.fields.push(field);
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn size(&self) -> Option<u64> {
        self.size
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(Error::invalid_schema(format!(
                    "record `{}` declares field `{}` twice",
                    self.type_name, field.name
                )));
            }
            validate_field_type(&self.type_name, &field.name, &field.field_type)?;
        }
        Ok(())
    }
}

fn validate_field_type(record: &str, field: &str, field_type: &FieldType) -> Result<()> {
    match field_type {
        FieldType::FixedArray(_, 0) | FieldType::FixedString(0) => Err(Error::invalid_schema(
            format!("field `{record}.{field}` has zero length"),
        )),
        FieldType::FixedArray(element, _) => validate_field_type(record, field, element),
        _ => Ok(()),
    }
}

/// Integer-to-name table for a C-like enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumSchema {
    type_name: String,
    values: Vec<(i32, String)>,
}

impl EnumSchema {
    pub fn new<S: Into<String>>(type_name: S) -> Self {
        Self {
            type_name: type_name.into(),
            values: Vec::new(),
        }
    }

    pub fn with_value<S: Into<String>>(mut self, value: i32, name: S) -> Self {
        self.values.push((value, name.into()));
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn values(&self) -> impl Iterator<Item = (i32, &str)> {
        self.values.iter().map(|(v, n)| (*v, n.as_str()))
    }

    pub fn name_of(&self, value: i32) -> Option<&str> {
        self.values
            .iter()
            .find(|(v, _)| *v == value)
            .map(|(_, n)| n.as_str())
    }

    pub fn value_of(&self, name: &str) -> Option<i32> {
        self.values.iter().find(|(_, n)| n == name).map(|(v, _)| *v)
    }

    fn validate(&self) -> Result<()> {
        let mut values = HashSet::new();
        let mut names = HashSet::new();
        for (value, name) in &self.values {
            if !values.insert(*value) || !names.insert(name.as_str()) {
                return Err(Error::invalid_schema(format!(
                    "enum `{}` maps `{name}` = {value} ambiguously",
                    self.type_name
                )));
            }
        }
        Ok(())
    }
}

/// Collects schemas before they are sealed into a [`SchemaRegistry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    records: Vec<RecordSchema>,
    enums: Vec<EnumSchema>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` and every record and enum it refers to.
    pub fn register<T: RecordType>(&mut self) -> Result<&mut Self> {
        if self.records.iter().any(|r| r.type_name == T::TYPE_NAME) {
            return Ok(self);
        }
        self.add_record(T::schema())?;
        T::describe_fields(self)?;
        Ok(self)
    }

    /// Adds a record schema. Adding an identical schema twice is a no-op,
    /// adding a different schema under a taken name is an error.
    pub fn add_record(&mut self, schema: RecordSchema) -> Result<&mut Self> {
        schema.validate()?;
        if let Some(existing) = self
            .records
            .iter()
            .find(|r| r.type_name == schema.type_name)
        {
            if *existing == schema {
                return Ok(self);
            }
            return Err(Error::invalid_schema(format!(
                "record `{}` registered twice with different fields",
                schema.type_name
            )));
        }
        debug!(
            type_name = schema.type_name(),
            fields = schema.fields.len(),
            "registered record schema"
        );
        self.records.push(schema);
        Ok(self)
    }

    pub fn add_enum(&mut self, schema: EnumSchema) -> Result<&mut Self> {
        schema.validate()?;
        if let Some(existing) = self.enums.iter().find(|e| e.type_name == schema.type_name) {
            if *existing == schema {
                return Ok(self);
            }
            return Err(Error::invalid_schema(format!(
                "enum `{}` registered twice with different values",
                schema.type_name
            )));
        }
        debug!(type_name = schema.type_name(), "registered enum schema");
        self.enums.push(schema);
        Ok(self)
    }

    /// Validates cross references and seals the registry.
    pub fn build(self) -> Result<SchemaRegistry> {
        let mut record_index = HashMap::with_capacity(self.records.len());
        for (i, record) in self.records.iter().enumerate() {
            if self.enums.iter().any(|e| e.type_name == record.type_name) {
                return Err(Error::invalid_schema(format!(
                    "`{}` is registered both as a record and as an enum",
                    record.type_name
                )));
            }
            record_index.insert(record.type_name.clone(), i);
        }
        let enum_index: HashMap<String, usize> = self
            .enums
            .iter()
            .enumerate()
            .map(|(i, e)| (e.type_name.clone(), i))
            .collect();

        for record in &self.records {
            for field in &record.fields {
                if let Some(name) = field.field_type.referenced_record() {
                    if !record_index.contains_key(name) {
                        return Err(Error::schema_mismatch(format!(
                            "field `{}.{}` refers to unregistered record `{name}`",
                            record.type_name, field.name
                        )));
                    }
                }
                if let Some(name) = field.field_type.referenced_enum() {
                    if !enum_index.contains_key(name) {
                        return Err(Error::schema_mismatch(format!(
                            "field `{}.{}` refers to unregistered enum `{name}`",
                            record.type_name, field.name
                        )));
                    }
                }
            }
        }

        let registry = SchemaRegistry {
            records: self.records,
            enums: self.enums,
            record_index,
            enum_index,
        };
        // Rejects records that contain themselves.
        registry.dependency_order::<&str>(&[])?;
        debug!(
            records = registry.records.len(),
            enums = registry.enums.len(),
            "schema registry sealed"
        );
        Ok(registry)
    }
}

/// Immutable set of record and enum schemas.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    records: Vec<RecordSchema>,
    enums: Vec<EnumSchema>,
    record_index: HashMap<String, usize>,
    enum_index: HashMap<String, usize>,
}

impl SchemaRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Looks up a record schema, failing with `SchemaMismatch` when absent.
    pub fn record(&self, type_name: &str) -> Result<&RecordSchema> {
        self.get_record(type_name).ok_or_else(|| {
            Error::schema_mismatch(format!("record `{type_name}` is not registered"))
        })
    }

    pub fn get_record(&self, type_name: &str) -> Option<&RecordSchema> {
        self.record_index.get(type_name).map(|&i| &self.records[i])
    }

    pub fn enumeration(&self, type_name: &str) -> Result<&EnumSchema> {
        self.get_enum(type_name).ok_or_else(|| {
            Error::schema_mismatch(format!("enum `{type_name}` is not registered"))
        })
    }

    pub fn get_enum(&self, type_name: &str) -> Option<&EnumSchema> {
        self.enum_index.get(type_name).map(|&i| &self.enums[i])
    }

    pub fn schema_of<T: RecordType>(&self) -> Result<&RecordSchema> {
        self.record(T::TYPE_NAME)
    }

    /// Record schemas in registration order.
    pub fn records(&self) -> impl Iterator<Item = &RecordSchema> {
        self.records.iter()
    }

    pub fn enums(&self) -> impl Iterator<Item = &EnumSchema> {
        self.enums.iter()
    }

    /// Record types reachable from `roots`, each listed after every record it
    /// contains. Roots are visited in the given order and duplicates are
    /// dropped. With no roots every registered record is visited.
    pub fn dependency_order<S: AsRef<str>>(&self, roots: &[S]) -> Result<Vec<&str>> {
        let roots: Vec<&str> = if roots.is_empty() {
            self.records.iter().map(|r| r.type_name.as_str()).collect()
        } else {
            roots.iter().map(AsRef::as_ref).collect()
        };

        let mut order = Vec::new();
        let mut done = HashSet::new();
        let mut visiting = Vec::new();
        for root in roots {
            let schema = self.get_record(root).ok_or_else(|| {
                Error::invalid_schema(format!("root `{root}` is not a registered record"))
            })?;
            self.visit(schema, &mut visiting, &mut done, &mut order)?;
        }
        Ok(order)
    }

    fn visit<'a>(
        &'a self,
        schema: &'a RecordSchema,
        visiting: &mut Vec<&'a str>,
        done: &mut HashSet<&'a str>,
        order: &mut Vec<&'a str>,
    ) -> Result<()> {
        let name = schema.type_name.as_str();
        if done.contains(name) {
            return Ok(());
        }
        if visiting.contains(&name) {
            let mut cycle = visiting.join(" -> ");
            cycle.push_str(" -> ");
            cycle.push_str(name);
            return Err(Error::invalid_schema(format!(
                "records contain themselves: {cycle}"
            )));
        }
        visiting.push(name);
        for field in &schema.fields {
            if let Some(dependency) = field.field_type.referenced_record() {
                self.visit(self.record(dependency)?, visiting, done, order)?;
            }
        }
        visiting.pop();
        done.insert(name);
        order.push(name);
        Ok(())
    }
}
