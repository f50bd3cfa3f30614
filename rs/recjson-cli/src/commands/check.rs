use std::fmt::Write as _;

use recjson::SchemaRegistry;

use super::{LayoutArgs, load_registry};

/// Validates the layout and prints one line per type.
pub fn handle_check(args: LayoutArgs) -> anyhow::Result<()> {
    let registry = load_registry(&args.layouts)?;
    print!("{}", summarize(&registry, &args.roots)?);
    Ok(())
}

/// Renders the summary printed by `check`. With roots, only the records
/// reachable from them are listed.
pub(crate) fn summarize(registry: &SchemaRegistry, roots: &[String]) -> anyhow::Result<String> {
    let order = registry.dependency_order(roots)?;
    let mut out = String::new();
    for name in &order {
        let schema = registry.record(name)?;
        match schema.size() {
            Some(size) => writeln!(out, "struct {name}: {} fields, {size} bytes", schema.fields().len())?,
            None => writeln!(out, "struct {name}: {} fields", schema.fields().len())?,
        }
    }
    let mut enums = 0;
    for schema in registry.enums() {
        let used = order.iter().any(|name| {
            registry.get_record(name).is_some_and(|record| {
                record
                    .fields()
                    .iter()
                    .any(|field| field.field_type().referenced_enum() == Some(schema.type_name()))
            })
        });
        if roots.is_empty() || used {
            writeln!(out, "enum {}: {} values", schema.type_name(), schema.values().count())?;
            enums += 1;
        }
    }
    writeln!(out, "ok: {} record types, {enums} enum types", order.len())?;
    Ok(out)
}
