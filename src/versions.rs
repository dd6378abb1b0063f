//! `forge_versions.txt`, the operator-maintained file naming the installed Forge build.

use std::path::Path;

use crate::error::LaunchError;

/// File name under the container root.
pub const VERSIONS_FILE_NAME: &str = "forge_versions.txt";

/// Values shipped in the template file; seeing one means the operator never filled it in.
pub const MC_VERSION_PLACEHOLDER: &str = "your_mc_version";
/// See [`MC_VERSION_PLACEHOLDER`].
pub const FORGE_VERSION_PLACEHOLDER: &str = "your_forge_version";

/// `MC_VERSION` and `FORGE_VERSION` from the version file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForgeVersions {
    /// Minecraft version, e.g. `1.20.1`.
    pub minecraft: String,
    /// Forge or NeoForge version, e.g. `47.2.0`.
    pub forge: String,
}

impl ForgeVersions {
    /// Read and validate the version file at `path`.
    pub fn load(path: &Path) -> Result<Self, LaunchError> {
        if !path.is_file() {
            return Err(LaunchError::MissingVersionFile {
                path: path.to_path_buf(),
            });
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(source) => {
                return Err(LaunchError::ReadVersionFile {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        Self::parse(&content, path)
    }

    /// `path` is only used for error messages.
    pub fn parse(content: &str, path: &Path) -> Result<Self, LaunchError> {
        let assignments = parse_assignments(content);
        let lookup = |key: &'static str, placeholder: &str| {
            // later assignments win, as when the file is sourced
            assignments
                .iter()
                .rev()
                .find(|(k, _)| k == key)
                .map(|(_, value)| value)
                .filter(|value| !value.is_empty() && *value != placeholder)
                .cloned()
                .ok_or_else(|| LaunchError::UnsetVersion {
                    key,
                    path: path.to_path_buf(),
                })
        };

        Ok(Self {
            minecraft: lookup("MC_VERSION", MC_VERSION_PLACEHOLDER)?,
            forge: lookup("FORGE_VERSION", FORGE_VERSION_PLACEHOLDER)?,
        })
    }

    /// Directory name the installers use under `libraries/`, e.g. `1.20.1-47.2.0`.
    pub fn key(&self) -> String {
        format!("{}-{}", self.minecraft, self.forge)
    }
}

/// Reads `KEY=value` lines the way a shell would source them, minus any expansion.
fn parse_assignments(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").map_or(line, str::trim_start);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() || key.contains(char::is_whitespace) {
                return None;
            }
            Some((key.to_owned(), unquote(value.trim())))
        })
        .collect()
}

fn unquote(value: &str) -> String {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.split_once(quote))
            .map(|(inner, _)| inner)
        {
            return inner.to_owned();
        }
    }

    // unquoted: a `#` after whitespace starts a comment
    match value.find(" #") {
        Some(idx) => value[..idx].trim_end().to_owned(),
        None => value.to_owned(),
    }
}
