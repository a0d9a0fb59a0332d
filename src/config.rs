//! Generator configuration and input resolution

use crate::{GeneratorError, Result};
use std::path::{Path, PathBuf};

/// Default name of the generated crate
pub const DEFAULT_PROJECT_NAME: &str = "app";

/// Settings for one generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Root directory that receives the generated tree
    pub output_dir: PathBuf,
    /// Extra proto include paths passed to the compiler
    pub include_paths: Vec<PathBuf>,
    /// Package name of the generated crate
    pub project_name: String,
    /// Proto compiler binary
    pub protoc: PathBuf,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("out"),
            include_paths: Vec::new(),
            project_name: DEFAULT_PROJECT_NAME.to_string(),
            protoc: PathBuf::from("protoc"),
        }
    }
}

impl GeneratorConfig {
    /// Create a config writing into `output_dir`
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }
}

/// Resolve raw `--proto` arguments into a list of proto files
///
/// Arguments may be comma-separated lists; empty entries are dropped. An
/// entry with glob metacharacters (`*`, `?`, `[`) expands to its matches
/// and must match at least one file. A directory expands to the `.proto`
/// files directly inside it. Expansions are sorted by name; argument order
/// is preserved otherwise.
pub fn collect_proto_inputs<S: AsRef<str>>(raw: &[S]) -> Result<Vec<PathBuf>> {
    let mut protos = Vec::new();

    for entry in raw
        .iter()
        .flat_map(|arg| arg.as_ref().split(','))
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
    {
        if is_pattern(entry) {
            protos.extend(expand_pattern(entry)?);
            continue;
        }

        let path = PathBuf::from(entry);
        if path.is_dir() {
            protos.extend(proto_files_in(&path)?);
        } else {
            protos.push(path);
        }
    }

    if protos.is_empty() {
        return Err(GeneratorError::InvalidConfig(
            "no proto files given".to_string(),
        ));
    }

    Ok(protos)
}

fn is_pattern(entry: &str) -> bool {
    entry.contains(['*', '?', '['])
}

fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob::glob(pattern).map_err(|e| {
        GeneratorError::InvalidConfig(format!("invalid pattern {}: {}", pattern, e))
    })?;

    let mut files = Vec::new();
    for path in paths {
        let path = path.map_err(|e| {
            GeneratorError::InvalidConfig(format!("failed to expand {}: {}", pattern, e))
        })?;
        if path.is_file() {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(GeneratorError::InvalidConfig(format!(
            "pattern {} matched no files",
            pattern
        )));
    }
    files.sort();

    Ok(files)
}

fn proto_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        GeneratorError::InvalidConfig(format!("failed to read {}: {}", dir.display(), e))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| {
                GeneratorError::InvalidConfig(format!("failed to read {}: {}", dir.display(), e))
            })?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "proto") {
            files.push(path);
        }
    }
    files.sort();

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_comma_separated_list() {
        let protos = collect_proto_inputs(&["a.proto,,b.proto", " c.proto "]).unwrap();
        assert_eq!(
            protos,
            vec![
                PathBuf::from("a.proto"),
                PathBuf::from("b.proto"),
                PathBuf::from("c.proto")
            ]
        );
    }

    #[test]
    fn test_directory_expands_sorted() {
        let dir = TempDir::new().unwrap();
        for name in ["location.proto", "courier.proto", "notes.txt"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("nested.proto")).unwrap();

        let protos = collect_proto_inputs(&[dir.path().display().to_string()]).unwrap();
        assert_eq!(
            protos,
            vec![
                dir.path().join("courier.proto"),
                dir.path().join("location.proto")
            ]
        );
    }

    #[test]
    fn test_empty_input_rejected() {
        let err = collect_proto_inputs(&[",", ""]).unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidConfig(_)));
    }

    #[test]
    fn test_default_config() {
        let config = GeneratorConfig::new("target/gen");
        assert_eq!(config.output_dir, PathBuf::from("target/gen"));
        assert_eq!(config.project_name, "app");
        assert_eq!(config.protoc, PathBuf::from("protoc"));
    }

    #[test]
    fn test_glob_pattern_expands_sorted() {
        let dir = TempDir::new().unwrap();
        for name in ["location.proto", "courier.proto", "notes.txt"] {
            fs::write(dir.path().join(name), "").unwrap();
        }

        let pattern = dir.path().join("*.proto").display().to_string();
        let protos = collect_proto_inputs(&[pattern, "extra.proto".to_string()]).unwrap();
        assert_eq!(
            protos,
            vec![
                dir.path().join("courier.proto"),
                dir.path().join("location.proto"),
                PathBuf::from("extra.proto")
            ]
        );
    }

    #[test]
    fn test_glob_pattern_without_matches_is_rejected() {
        let dir = TempDir::new().unwrap();
        let pattern = dir.path().join("*.proto").display().to_string();
        let err = collect_proto_inputs(&[pattern]).unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidConfig(ref msg) if msg.contains("matched no files")));
    }
}
