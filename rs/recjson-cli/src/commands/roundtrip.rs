use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::Args;
use recjson::{Codec, CodecOptions, EnumRepr};
use serde_json::Value;
use tracing::info;

use super::load_registry;

/// Arguments for the roundtrip command.
#[derive(Args, Debug)]
pub struct RoundtripArgs {
    /// Layout JSON file; repeat to merge several
    #[arg(short, long = "layout", required = true)]
    pub layouts: Vec<PathBuf>,

    /// Record type of the input file
    #[arg(short = 't', long = "type")]
    pub type_name: String,

    /// JSON file holding one record
    #[arg(short, long)]
    pub input: PathBuf,

    /// Reject missing keys, unknown keys and lossy integers
    #[arg(long)]
    pub strict: bool,

    /// Indent the output
    #[arg(long)]
    pub pretty: bool,

    /// Write enum fields by name instead of by value
    #[arg(long)]
    pub named_enums: bool,
}

pub fn handle_roundtrip(args: RoundtripArgs) -> anyhow::Result<()> {
    let registry = load_registry(&args.layouts)?;
    let mut options = CodecOptions::default();
    options.decode.strict = args.strict;
    options.encode.pretty = args.pretty;
    if args.named_enums {
        options.encode.enum_repr = EnumRepr::Name;
    }
    let codec = Codec::new(&registry).with_options(options);
    println!("{}", roundtrip_file(&codec, &args.type_name, &args.input)?);
    Ok(())
}

/// Decodes `input` as `type_name`, encodes it, decodes the encoding again
/// and checks both decodes are equal. Returns the encoded text.
pub(crate) fn roundtrip_file(codec: &Codec<'_>, type_name: &str, input: &Path) -> anyhow::Result<String> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let json: Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", input.display()))?;

    let record = codec
        .deserialize_dyn(type_name, &json)
        .with_context(|| format!("failed to decode {} as {type_name}", input.display()))?;
    let encoded = codec.to_value(&record)?;
    let again = codec
        .deserialize_dyn(type_name, &encoded)
        .context("failed to decode the re-encoded record")?;
    if !codec.try_equals(&record, &again)? {
        bail!("{} does not survive a round trip as {type_name}", input.display());
    }

    info!(input = %input.display(), type_name, "round trip verified");
    let text = if codec.options().encode.pretty {
        serde_json::to_string_pretty(&encoded)?
    } else {
        serde_json::to_string(&encoded)?
    };
    Ok(text)
}
