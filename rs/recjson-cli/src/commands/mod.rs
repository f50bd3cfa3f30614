//! Command handlers. Each returns `anyhow::Result<()>`; `main` maps errors
//! to exit code 1.

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Args;
use recjson::{Layout, SchemaRegistry};
use tracing::info;

pub mod check;
pub mod order;
pub mod roundtrip;
pub mod run;

/// Layout files plus optional root types.
#[derive(Args, Debug)]
pub struct LayoutArgs {
    /// Layout JSON file; repeat to merge several, later files win
    #[arg(short, long = "layout", required = true)]
    pub layouts: Vec<PathBuf>,

    /// Root record type; repeat for several. Defaults to every record
    #[arg(short, long = "root")]
    pub roots: Vec<String>,
}

/// Loads and merges layout files into a sealed registry.
pub(crate) fn load_registry(paths: &[PathBuf]) -> anyhow::Result<SchemaRegistry> {
    let layout = Layout::load(paths).context("failed to load layout")?;
    if layout.is_empty() {
        bail!("layout files define no types");
    }
    let registry = layout
        .to_registry()
        .context("layout does not describe a valid schema")?;
    info!(
        files = paths.len(),
        records = registry.records().count(),
        enums = registry.enums().count(),
        "layout loaded"
    );
    Ok(registry)
}
