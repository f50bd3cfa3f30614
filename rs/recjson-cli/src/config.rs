//! TOML job files for `recjson run`.
//!
//! ```toml
//! [codec.decode]
//! strict = true
//!
//! [[struct]]
//! name = "myTestStruct"
//! layout = "layouts/my.json"   # defaults to "<name>.json"
//! inputs = ["data/sample.json"]
//! ```
//!
//! Relative paths resolve against the directory of the job file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use recjson::CodecOptions;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobFile {
    #[serde(default)]
    pub codec: CodecOptions,
    #[serde(default, rename = "struct")]
    pub jobs: Vec<StructJob>,
    #[serde(skip)]
    base_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StructJob {
    pub name: String,
    pub layout: Option<PathBuf>,
    /// Root record type; defaults to `name`.
    pub root: Option<String>,
    #[serde(default)]
    pub inputs: Vec<PathBuf>,
}

impl JobFile {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read job file {}", path.display()))?;
        let mut file: JobFile = toml::from_str(&content)
            .with_context(|| format!("failed to parse job file {}", path.display()))?;
        file.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        file.validate()?;
        Ok(file)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.jobs.is_empty() {
            bail!("job file has no [[struct]] entries");
        }
        for job in &self.jobs {
            if job.name.trim().is_empty() {
                bail!("[[struct]] entry with an empty name");
            }
        }
        Ok(())
    }

    pub fn layout_path(&self, job: &StructJob) -> PathBuf {
        match &job.layout {
            Some(layout) => self.resolve(layout),
            None => self.base_dir.join(format!("{}.json", job.name)),
        }
    }

    pub fn input_paths(&self, job: &StructJob) -> Vec<PathBuf> {
        job.inputs.iter().map(|input| self.resolve(input)).collect()
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

impl StructJob {
    pub fn root(&self) -> &str {
        self.root.as_deref().unwrap_or(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recjson::EnumRepr;

    fn write(dir: &Path, text: &str) -> PathBuf {
        let path = dir.join("jobs.toml");
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn paths_resolve_against_job_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            r#"
[codec.encode]
enum_repr = "name"

[[struct]]
name = "Point"

[[struct]]
name = "scene"
layout = "layouts/scene.json"
root = "Scene"
inputs = ["data/a.json"]
"#,
        );
        let file = JobFile::from_file(&path).unwrap();
        assert_eq!(file.codec.encode.enum_repr, EnumRepr::Name);
        assert!(!file.codec.decode.strict);

        let [point, scene] = &file.jobs[..] else {
            panic!("expected two jobs");
        };
        assert_eq!(file.layout_path(point), dir.path().join("Point.json"));
        assert_eq!(point.root(), "Point");
        assert_eq!(file.layout_path(scene), dir.path().join("layouts/scene.json"));
        assert_eq!(scene.root(), "Scene");
        assert_eq!(file.input_paths(scene), [dir.path().join("data/a.json")]);
    }

    #[test]
    fn empty_job_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "[codec.decode]\nstrict = true\n");
        let err = JobFile::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("no [[struct]] entries"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "[[struct]]\nname = \"A\"\nlayuot = \"a.json\"\n");
        assert!(JobFile::from_file(&path).is_err());
    }
}
