//! Pre-start hook: patches server configuration files before launch.
//!
//! The hook is driven by a JSON document mapping file paths (relative to the
//! container root) to a parser and a set of keys to overwrite:
//!
//! ```json
//! {
//!   "files": {
//!     "server/server.properties": {
//!       "parser": "properties",
//!       "find": { "server-port": "{{server.build.default.port}}" }
//!     }
//!   }
//! }
//! ```
//!
//! Values may reference variables with `{{NAME}}`; see [`expand`].

mod expand;
mod lines;
mod properties;
mod yaml;

use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

pub use expand::{expand_value, to_native};

use crate::vars::Variables;

/// The hook config document.
#[derive(Debug, Default, Deserialize)]
pub struct HookConfig {
    /// Target path to its [`FileRule`], in file order.
    #[serde(default)]
    pub files: Map<String, Value>,
}

/// How one file is patched.
#[derive(Debug, Default, Deserialize)]
pub struct FileRule {
    /// `yaml`, `yml`, `properties` or `file`.
    #[serde(default)]
    pub parser: Option<String>,
    /// Keys to set and their unexpanded values.
    #[serde(default)]
    pub find: Option<Map<String, Value>>,
}

impl HookConfig {
    /// Read and parse a hook config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read hook config {}", path.display()))?;
        serde_json::from_str(&content)
            .wrap_err_with(|| format!("Failed to parse hook config {}", path.display()))
    }
}

/// Files touched by a hook run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct HookReport {
    /// Files written, in processing order.
    pub patched: Vec<PathBuf>,
    /// Entries with an invalid rule or an unknown parser.
    pub skipped: Vec<String>,
}

/// Run the hook described by `config_path`, resolving target files against `root`.
///
/// A missing config file means there is nothing to patch.
pub fn run(config_path: &Path, root: &Path, vars: &Variables) -> Result<HookReport> {
    if !config_path.is_file() {
        debug!(path = %config_path.display(), "no start hook config, skipping");
        return Ok(HookReport::default());
    }

    let config = HookConfig::from_file(config_path)?;
    let report = apply(&config, root, vars)?;
    debug!(patched = report.patched.len(), "file patching completed");
    Ok(report)
}

/// Patch every file named in `config`. Entries are processed in the order they are listed.
pub fn apply(config: &HookConfig, root: &Path, vars: &Variables) -> Result<HookReport> {
    let mut report = HookReport::default();

    for (relative, rule) in &config.files {
        let rule = match FileRule::deserialize(rule) {
            Ok(rule) => rule,
            Err(e) => {
                warn!(file = relative.as_str(), error = %e, "invalid hook rule, skipping");
                report.skipped.push(relative.clone());
                continue;
            }
        };
        let Some(parser) = rule.parser.as_deref().filter(|p| !p.is_empty()) else {
            continue;
        };
        let Some(find) = rule.find.filter(|find| !find.is_empty()) else {
            continue;
        };

        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
        }
        debug!(path = %path.display(), parser, "processing file");

        let patched = match parser {
            "yaml" | "yml" => yaml::patch(&path, &find, vars),
            "properties" => properties::patch(&path, &find, vars),
            "file" => lines::patch(&path, &find, vars),
            other => {
                warn!(parser = other, path = %path.display(), "unsupported hook parser, skipping");
                report.skipped.push(relative.clone());
                continue;
            }
        };
        patched.wrap_err_with(|| format!("Failed to patch {}", path.display()))?;
        report.patched.push(path);
    }

    Ok(report)
}

/// String form written into text formats.
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
