use std::path::Path;

use color_eyre::eyre::Result;
use serde_json::{Map, Value};

use super::{expand_value, render};
use crate::vars::Variables;

/// Rewrite a `.properties` file with the given keys set.
///
/// Existing entries keep their order; comments and blank lines are not preserved.
pub(super) fn patch(path: &Path, rules: &Map<String, Value>, vars: &Variables) -> Result<()> {
    let mut props = if path.exists() {
        parse(&std::fs::read_to_string(path)?)
    } else {
        Vec::new()
    };

    for (key, value) in rules {
        let value = render(&expand_value(value, vars));
        tracing::debug!(key = key.as_str(), value = value.as_str(), "setting");
        match props.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value,
            None => props.push((key.clone(), value)),
        }
    }

    let content: String = props
        .iter()
        .map(|(key, value)| format!("{key}={value}\n"))
        .collect();
    std::fs::write(path, content)?;
    Ok(())
}

fn parse(content: &str) -> Vec<(String, String)> {
    let mut props: Vec<(String, String)> = Vec::new();
    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        match props.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value.to_owned(),
            None => props.push((key.to_owned(), value.to_owned())),
        }
    }
    props
}
