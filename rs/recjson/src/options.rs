use serde::{Deserialize, Serialize};

/// Default tolerance for `Float32` fields.
pub const FLOAT32_EPSILON: f32 = 1e-6;
/// Default tolerance for `Float64` fields.
pub const FLOAT64_EPSILON: f64 = 1e-9;

/// How enum fields are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnumRepr {
    /// The underlying integer.
    #[default]
    Integer,
    /// The variant name from the enum schema, falling back to the integer
    /// for values without a name.
    Name,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeOptions {
    pub enum_repr: EnumRepr,
    /// Indent text output.
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Reject missing keys, unknown keys, and integer values that do not fit
    /// the field exactly.
    pub strict: bool,
}

/// Epsilons used by the equality checker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerance {
    pub float32: f32,
    pub float64: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            float32: FLOAT32_EPSILON,
            float64: FLOAT64_EPSILON,
        }
    }
}

/// All codec settings, as read from the `[codec]` table of a job file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecOptions {
    pub encode: EncodeOptions,
    pub decode: DecodeOptions,
    pub tolerance: Tolerance,
}
