use std::io::ErrorKind;
use std::path::Path;

use color_eyre::eyre::Result;
use serde_json::{Map, Value};

use super::{expand_value, render};
use crate::vars::Variables;

/// Replace whole lines by prefix.
///
/// Every line whose trimmed content starts with a rule key is replaced by the
/// rule's expanded value. Keys that match no line are appended at the end.
pub(super) fn patch(path: &Path, rules: &Map<String, Value>, vars: &Variables) -> Result<()> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "file not found, it will be created");
            String::new()
        }
        Err(e) => return Err(e.into()),
    };

    let replacement = |value: &Value| render(&expand_value(value, vars));
    let mut matched = vec![false; rules.len()];
    let mut output = String::with_capacity(content.len());

    for line in content.split_inclusive('\n') {
        let trimmed = line.trim();
        let rule = rules
            .iter()
            .enumerate()
            .find(|(_, (key, _))| trimmed.starts_with(key.as_str()));
        match rule {
            Some((idx, (key, value))) => {
                tracing::debug!(key = key.as_str(), "replacing line");
                output.push_str(&replacement(value));
                output.push('\n');
                matched[idx] = true;
            }
            None => output.push_str(line),
        }
    }

    for ((key, value), done) in rules.iter().zip(&matched) {
        if *done {
            continue;
        }
        tracing::debug!(key = key.as_str(), "appending missing key");
        if !output.is_empty() && !output.ends_with('\n') {
            output.push('\n');
        }
        output.push_str(&replacement(value));
        output.push('\n');
    }

    std::fs::write(path, output)?;
    Ok(())
}
