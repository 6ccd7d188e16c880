//! Manifest discovery: one TOML file per named configuration under
//! `CONFIG_DIR`.

use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::manifest::{self, ConfigManifest};

/// Resolve `CONFIG_DIR`: the environment override if set, otherwise
/// `~/.gcs/configs`.
#[must_use]
pub fn config_dir() -> PathBuf {
    std::env::var("CONFIG_DIR").map(PathBuf::from).unwrap_or_else(|_| {
        directories::BaseDirs::new()
            .map(|b| b.home_dir().join(".gcs").join("configs"))
            .unwrap_or_else(|| PathBuf::from("configs"))
    })
}

/// Load the named configuration's manifest from `dir`.
///
/// # Errors
/// `NotFound` if `{dir}/{name}.toml` does not exist; `Io`/`Malformed`/
/// `Validation` as raised by [`manifest::parse`].
pub fn load_from(dir: &std::path::Path, name: &str) -> ConfigResult<ConfigManifest> {
    let path = dir.join(format!("{name}.toml"));
    if !path.exists() {
        return Err(ConfigError::NotFound(name.to_string()));
    }
    let raw = fs::read_to_string(&path)?;
    let parsed = manifest::parse(&raw)?;
    debug!(name = %parsed.name, tools = parsed.tools.len(), "configuration manifest loaded");
    Ok(parsed)
}

/// Load the named configuration's manifest from the resolved `CONFIG_DIR`.
///
/// # Errors
/// See [`load_from`].
pub fn load(name: &str) -> ConfigResult<ConfigManifest> {
    load_from(&config_dir(), name)
}

/// List the names of every configuration manifest present in `dir`.
///
/// # Errors
/// Returns `Io` if the directory cannot be read; a missing directory is
/// treated as an empty list.
pub fn list_from(dir: &std::path::Path) -> ConfigResult<Vec<String>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("toml") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

/// List the names of every configuration manifest under the resolved
/// `CONFIG_DIR`.
///
/// # Errors
/// See [`list_from`].
pub fn list() -> ConfigResult<Vec<String>> {
    list_from(&config_dir())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_from_reads_and_validates_manifest() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("default.toml"), "name = \"default\"\ntools = [\"website_check\"]\n").unwrap();

        let manifest = load_from(dir.path(), "default").unwrap();
        assert_eq!(manifest.name, "default");
    }

    #[test]
    fn load_from_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_from(dir.path(), "missing").unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(name) if name == "missing"));
    }

    #[test]
    fn list_from_enumerates_toml_stems_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.toml"), "name = \"b\"\n").unwrap();
        fs::write(dir.path().join("a.toml"), "name = \"a\"\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let names = list_from(dir.path()).unwrap();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn list_from_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        assert!(list_from(&missing).unwrap().is_empty());
    }
}
