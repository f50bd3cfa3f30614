use super::{LayoutArgs, load_registry};

/// Prints record types one per line, dependencies before dependents.
pub fn handle_order(args: LayoutArgs) -> anyhow::Result<()> {
    let registry = load_registry(&args.layouts)?;
    for name in registry.dependency_order(&args.roots)? {
        println!("{name}");
    }
    Ok(())
}
