// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use path_clean::clean;

pub type FindInParent = fn(&Path, &str) -> Option<PathBuf>;

/// Walks from `path` towards the filesystem root looking for `filename`.
pub fn find_in_parent(path: &Path, filename: &str) -> Option<PathBuf> {
    let mut current = path.to_path_buf();
    loop {
        let file_path = current.join(filename);
        if file_path.exists() {
            return Some(file_path);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Where the configuration file should come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigSource {
    /// Passed explicitly. It is an error for it not to exist.
    Explicit(PathBuf),
    /// Found by searching upwards from the working directory.
    Discovered(PathBuf),
    /// Nothing found; defaults and environment only.
    None,
}

pub fn resolve_config_path(
    find_in_parent: FindInParent,
    cwd: &Path,
    default_filename: &str,
    cli_file: Option<&Path>,
) -> ConfigSource {
    if let Some(cli_file) = cli_file {
        if cli_file.is_absolute() {
            return ConfigSource::Explicit(cli_file.to_path_buf());
        }
        return ConfigSource::Explicit(clean(cwd.join(cli_file)));
    }

    match find_in_parent(cwd, default_filename) {
        Some(found) => ConfigSource::Discovered(found),
        None => ConfigSource::None,
    }
}

/// Reads a YAML file, expanding `$VAR` and `${VAR}` references from the environment.
pub fn load_yaml_with_env(path: &Path) -> Result<String> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read configuration at {}", path.display()))?;
    let expanded = shellexpand::env(&raw)
        .with_context(|| format!("Could not expand variables in {}", path.display()))?;
    Ok(expanded.into_owned())
}
