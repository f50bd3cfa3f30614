use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use recjson::Codec;
use tracing::{info, warn};

use super::check::summarize;
use super::load_registry;
use super::roundtrip::roundtrip_file;
use crate::config::JobFile;

/// Arguments for the run command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// TOML job file
    #[arg(short, long)]
    pub config: PathBuf,
}

/// Checks every job's layout, prints its dependency order and round-trips
/// its inputs with the `[codec]` options of the job file.
pub fn handle_run(args: RunArgs) -> anyhow::Result<()> {
    let file = JobFile::from_file(&args.config)?;
    info!(jobs = file.jobs.len(), config = %args.config.display(), "running job file");

    for job in &file.jobs {
        let layout = file.layout_path(job);
        let registry = load_registry(std::slice::from_ref(&layout))
            .with_context(|| format!("job `{}`", job.name))?;
        let roots = [job.root().to_owned()];

        println!("[{}]", job.name);
        print!("{}", summarize(&registry, &roots).with_context(|| format!("job `{}`", job.name))?);
        println!("order: {}", registry.dependency_order(&roots)?.join(", "));

        let inputs = file.input_paths(job);
        if inputs.is_empty() {
            warn!(job = %job.name, "no inputs to round-trip");
        }
        let codec = Codec::new(&registry).with_options(file.codec);
        for input in inputs {
            roundtrip_file(&codec, job.root(), &input)
                .with_context(|| format!("job `{}`", job.name))?;
            println!("roundtrip ok: {}", input.display());
        }
    }
    println!("all jobs done");
    Ok(())
}
