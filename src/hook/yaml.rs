use std::io::ErrorKind;
use std::path::Path;

use color_eyre::eyre::Result;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Map;
use serde_yaml_ng::{Mapping, Value};

use super::expand_value;
use crate::vars::Variables;

lazy_static! {
    static ref INDEXED: Regex = Regex::new(r"^(\w+)\[(\d+)\]$").unwrap();
}

pub(super) fn patch(
    path: &Path,
    rules: &Map<String, serde_json::Value>,
    vars: &Variables,
) -> Result<()> {
    let mut text = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "file not found, creating a new one");
            String::new()
        }
        Err(e) => return Err(e.into()),
    };

    for (key, value) in rules {
        let value = expand_value(value, vars);
        tracing::debug!(key = key.as_str(), %value, "setting");
        text = set_in_text(&text, key, serde_yaml_ng::to_value(value)?)?;
    }

    std::fs::write(path, text)?;
    Ok(())
}

/// Assign `value` at `path` in a YAML document given as text.
///
/// Scalars in block mappings are edited in place so comments and layout
/// survive. Every in-place edit must parse back to the same document as a
/// structural assignment; otherwise, and for list indices, the document is
/// re-serialized and loses its comments.
fn set_in_text(text: &str, path: &str, value: Value) -> Result<String> {
    let mut document = load(text)?;
    let edited = edit_in_place(text, path, &value);
    set_path(&mut document, path, value);

    match edited {
        Some(edited) if load(&edited).ok().as_ref() == Some(&document) => Ok(edited),
        Some(_) => {
            tracing::debug!(key = path, "in-place edit did not round-trip, rewriting file");
            Ok(serde_yaml_ng::to_string(&document)?)
        }
        None => {
            tracing::debug!(key = path, "cannot edit in place, rewriting file");
            Ok(serde_yaml_ng::to_string(&document)?)
        }
    }
}

/// Comment-only and empty files are an empty document.
fn load(text: &str) -> Result<Value, serde_yaml_ng::Error> {
    if !text.lines().any(is_content) {
        return Ok(Value::Null);
    }
    serde_yaml_ng::from_str(text)
}

/// Line-level edit of a block mapping. `None` when the document has a shape
/// this does not handle.
fn edit_in_place(text: &str, path: &str, value: &Value) -> Option<String> {
    let keys = split_path(path);
    if keys.iter().any(|key| key.is_empty() || indexed(key).is_some()) {
        return None;
    }
    let rendered = render_scalar(value)?;
    let directives = ["---", "...", "%"];
    if text
        .lines()
        .any(|line| directives.iter().any(|d| line.starts_with(d)))
    {
        return None;
    }

    let mut lines: Vec<String> = text.lines().map(str::to_owned).collect();
    let (mut start, mut end) = (0, lines.len());
    let mut parent_indent = None;

    for (depth, key) in keys.iter().enumerate() {
        let content: Vec<usize> = (start..end).filter(|&i| is_content(&lines[i])).collect();
        let Some(&first) = content.first() else {
            // nothing below the parent yet
            let (at, indent) = match parent_indent {
                Some(parent) => (start, parent + 2),
                None => (end, 0),
            };
            insert_block(&mut lines, at, indent, &keys[depth..], &rendered)?;
            return Some(finish(lines));
        };

        let indent = indent_of(&lines[first]);
        let mut found = None;
        for &i in &content {
            if indent_of(&lines[i]) != indent {
                continue;
            }
            let body = &lines[i][indent..];
            if body == "-" || body.starts_with("- ") {
                return None;
            }
            let (name, colon) = mapping_key(&lines[i])?;
            if name == *key {
                found = Some((i, colon));
                break;
            }
        }

        let Some((line, colon)) = found else {
            let at = content.last().map_or(end, |last| last + 1);
            insert_block(&mut lines, at, indent, &keys[depth..], &rendered)?;
            return Some(finish(lines));
        };

        let block_end = (line + 1..end)
            .find(|&i| is_content(&lines[i]) && indent_of(&lines[i]) <= indent)
            .unwrap_or(end);

        if depth + 1 < keys.len() {
            if !is_empty_value(&lines[line][colon + 1..]) {
                return None;
            }
            start = line + 1;
            end = block_end;
            parent_indent = Some(indent);
            continue;
        }

        let comment = inline_comment(&lines[line][colon + 1..]).map(str::to_owned);
        let mut replaced = format!("{}: {rendered}", &lines[line][..colon]);
        if let Some(comment) = comment {
            replaced.push(' ');
            replaced.push_str(&comment);
        }
        lines[line] = replaced;

        // a nested block under the key is replaced by the scalar
        let nested = (line + 1..block_end).rev().find(|&i| is_content(&lines[i]));
        if let Some(last) = nested {
            lines.drain(line + 1..=last);
        }
        return Some(finish(lines));
    }

    None
}

fn finish(lines: Vec<String>) -> String {
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

fn insert_block(
    lines: &mut Vec<String>,
    at: usize,
    indent: usize,
    keys: &[&str],
    rendered: &str,
) -> Option<()> {
    let mut block = Vec::with_capacity(keys.len());
    for (depth, key) in keys.iter().enumerate() {
        let key = render_scalar(&Value::String((*key).to_owned()))?;
        let pad = " ".repeat(indent + 2 * depth);
        if depth + 1 == keys.len() {
            block.push(format!("{pad}{key}: {rendered}"));
        } else {
            block.push(format!("{pad}{key}:"));
        }
    }
    lines.splice(at..at, block);
    Some(())
}

/// Single-line YAML for a scalar. Collections and multi-line strings have none.
fn render_scalar(value: &Value) -> Option<String> {
    if value.is_mapping() || value.is_sequence() {
        return None;
    }
    let rendered = serde_yaml_ng::to_string(value).ok()?;
    let rendered = rendered.trim_end();
    (!rendered.contains('\n')).then(|| rendered.to_owned())
}

fn is_content(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && !line.starts_with('#')
}

fn is_empty_value(rest: &str) -> bool {
    let rest = rest.trim();
    rest.is_empty() || rest.starts_with('#')
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// Key name and byte offset of its `:` on a `key: value` line.
fn mapping_key(line: &str) -> Option<(String, usize)> {
    let indent = indent_of(line);
    let body = &line[indent..];
    let is_separator = |rest: &str| rest.is_empty() || rest.starts_with([' ', '\t']);

    match body.chars().next()? {
        quote @ ('"' | '\'') => {
            let end = quoted_end(body, quote)?;
            let after = &body[end..];
            let colon = end + (after.len() - after.trim_start_matches(' ').len());
            let rest = body[colon..].strip_prefix(':')?;
            is_separator(rest).then(|| (body[1..end - 1].to_owned(), indent + colon))
        }
        '{' | '[' | '?' | '&' | '*' | '!' | '|' | '>' => None,
        _ => {
            let colon = body
                .match_indices(':')
                .map(|(i, _)| i)
                .find(|&i| is_separator(&body[i + 1..]))?;
            Some((body[..colon].trim_end().to_owned(), indent + colon))
        }
    }
}

/// Byte offset just past the closing quote of the quoted scalar `s` starts with.
fn quoted_end(s: &str, quote: char) -> Option<usize> {
    let mut chars = s.char_indices().skip(1).peekable();
    while let Some((i, c)) = chars.next() {
        if c == '\\' && quote == '"' {
            chars.next();
        } else if c == quote {
            // '' is an escaped quote inside single quotes
            if quote == '\'' && chars.peek().is_some_and(|&(_, next)| next == '\'') {
                chars.next();
                continue;
            }
            return Some(i + 1);
        }
    }
    None
}

/// The `# comment` trailing a value, if any.
fn inline_comment(rest: &str) -> Option<&str> {
    let value = rest.trim_start();
    let offset = rest.len() - value.len();
    let scan_from = match value.chars().next() {
        Some(quote @ ('"' | '\'')) => quoted_end(value, quote).unwrap_or(value.len()),
        _ => 0,
    };
    let bytes = value.as_bytes();
    (scan_from..bytes.len())
        .find(|&i| bytes[i] == b'#' && (i == 0 || bytes[i - 1].is_ascii_whitespace()))
        .map(|i| &rest[offset + i..])
}

/// Split `a.b[1].c` on dots that are not inside brackets.
fn split_path(path: &str) -> Vec<&str> {
    let mut keys = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in path.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '.' if depth == 0 => {
                keys.push(&path[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    keys.push(&path[start..]);
    keys
}

fn indexed(key: &str) -> Option<(&str, usize)> {
    let caps = INDEXED.captures(key)?;
    let index = caps.get(2)?.as_str().parse().ok()?;
    Some((caps.get(1)?.as_str(), index))
}

/// Assign `value` at a dotted key path, creating maps and lists on the way.
///
/// Lists are padded with empty maps when they are walked through and with nulls
/// when the final element is assigned.
fn set_path(root: &mut Value, path: &str, value: Value) {
    let keys = split_path(path);
    let Some((last, parents)) = keys.split_last() else {
        return;
    };

    let mut current = root;
    for key in parents {
        current = match indexed(key) {
            Some((name, index)) => {
                let list = child_sequence(as_mapping(current), name);
                pad(list, index, || Value::Mapping(Mapping::new()));
                &mut list[index]
            }
            None => {
                let child = as_mapping(current)
                    .entry(Value::String((*key).to_owned()))
                    .or_insert(Value::Null);
                if !child.is_mapping() {
                    *child = Value::Mapping(Mapping::new());
                }
                child
            }
        };
    }

    match indexed(last) {
        Some((name, index)) => {
            let list = child_sequence(as_mapping(current), name);
            pad(list, index, || Value::Null);
            list[index] = value;
        }
        None => {
            let key = Value::String((*last).to_owned());
            as_mapping(current).insert(key, value);
        }
    }
}

fn as_mapping(value: &mut Value) -> &mut Mapping {
    if !value.is_mapping() {
        *value = Value::Mapping(Mapping::new());
    }
    match value {
        Value::Mapping(mapping) => mapping,
        _ => unreachable!("value was just replaced with a mapping"),
    }
}

fn child_sequence<'a>(mapping: &'a mut Mapping, name: &str) -> &'a mut Vec<Value> {
    let child = mapping
        .entry(Value::String(name.to_owned()))
        .or_insert(Value::Null);
    if !child.is_sequence() {
        *child = Value::Sequence(Vec::new());
    }
    match child {
        Value::Sequence(items) => items,
        _ => unreachable!("value was just replaced with a sequence"),
    }
}

fn pad(list: &mut Vec<Value>, index: usize, fill: impl Fn() -> Value) {
    while list.len() <= index {
        list.push(fill());
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml_ng::from_str(s).unwrap()
    }

    fn set(text: &str, path: &str, value: impl Into<Value>) -> String {
        set_in_text(text, path, value.into()).unwrap()
    }

    #[test]
    fn split_respects_brackets() {
        assert_eq!(split_path("a.b.c"), ["a", "b", "c"]);
        assert_eq!(split_path("servers[0].address"), ["servers[0]", "address"]);
        assert_eq!(split_path("odd[1.2].x"), ["odd[1.2]", "x"]);
        assert_eq!(split_path("single"), ["single"]);
    }

    #[test]
    fn sets_nested_keys() {
        let mut doc = yaml("handler: vanilla_handler\nrcon:\n  enable: false\n");
        set_path(&mut doc, "rcon.enable", Value::Bool(true));
        set_path(&mut doc, "rcon.port", Value::from(25575));
        set_path(&mut doc, "new.deep.key", Value::from("x"));

        let expected = "handler: vanilla_handler
rcon:
  enable: true
  port: 25575
new:
  deep:
    key: x
";
        assert_eq!(doc, yaml(expected));
    }

    #[test]
    fn sets_indexed_keys() {
        let mut doc = Value::Null;
        set_path(&mut doc, "servers[1].port", Value::from(25566));
        set_path(&mut doc, "motd[2]", Value::from("hi"));

        let expected = "servers:\n  - {}\n  - port: 25566\nmotd:\n  - null\n  - null\n  - hi\n";
        assert_eq!(doc, yaml(expected));
    }

    #[test]
    fn scalar_intermediates_are_replaced() {
        let mut doc = yaml("a: 1\n");
        set_path(&mut doc, "a.b", Value::from(2));
        assert_eq!(doc, yaml("a:\n  b: 2\n"));
    }

    #[test]
    fn comments_survive_a_scalar_update() {
        let text = "# MCDR config\n# keep me\nport: 1 # inline\n";
        assert_eq!(
            set(text, "port", 2),
            "# MCDR config\n# keep me\nport: 2 # inline\n"
        );
    }

    #[test]
    fn nested_keys_are_edited_in_place() {
        let text = "\
# top
rcon:
  # rcon settings
  enable: false
handler: vanilla_handler # default
";
        let expected = "\
# top
rcon:
  # rcon settings
  enable: true
  port: 25575
handler: vanilla_handler # default
";
        let text = set(text, "rcon.enable", true);
        assert_eq!(set(&text, "rcon.port", 25575), expected);
    }

    #[test]
    fn missing_parents_are_appended() {
        let text = "# servers\nx: 1\n";
        assert_eq!(
            set(text, "a.b.c", "v"),
            "# servers\nx: 1\na:\n  b:\n    c: v\n"
        );
        assert_eq!(set("# empty\n", "key", "v"), "# empty\nkey: v\n");
        assert_eq!(set("", "key", "v"), "key: v\n");
    }

    #[test]
    fn values_are_quoted_when_needed() {
        let text = set("motd: hi # shown in the list\n", "motd", "a: b # c");
        assert_eq!(yaml(&text), yaml("motd: 'a: b # c'"));
        assert!(text.ends_with("# shown in the list\n"));
    }

    #[test]
    fn quoted_keys_and_values() {
        let text = "\"spaced key\": 'it''s # not a comment' # real\n";
        let text = set(text, "spaced key", 3);
        assert_eq!(text, "\"spaced key\": 3 # real\n");
    }

    #[test]
    fn block_value_replaced_by_scalar() {
        let text = "rcon:\n  enable: true\nx: 1\n";
        assert_eq!(set(text, "rcon", 5), "rcon: 5\nx: 1\n");
    }

    #[test]
    fn unsupported_shapes_fall_back_to_rewrite() {
        let text = "# list\nservers:\n  - port: 1\n";
        let text = set(text, "servers[0].port", 2);
        assert_eq!(yaml(&text), yaml("servers:\n  - port: 2\n"));

        let text = set("flow: {a: 1}\n", "flow.a", 2);
        assert_eq!(yaml(&text), yaml("flow:\n  a: 2\n"));
    }

    #[test]
    fn inline_comment_detection() {
        assert_eq!(inline_comment(" 1 # c"), Some("# c"));
        assert_eq!(inline_comment(" a#b"), None);
        assert_eq!(inline_comment(" \"x # y\" # z"), Some("# z"));
        assert_eq!(inline_comment(""), None);
    }

    #[test]
    fn patch_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        let rules = json!({ "start_command": "{{LAUNCH_COMMAND}}", "rcon.enable": "true" });
        let vars: Variables = [("LAUNCH_COMMAND", "java -jar server.jar")]
            .into_iter()
            .collect();

        patch(&path, rules.as_object().unwrap(), &vars).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "start_command: java -jar server.jar\nrcon:\n  enable: true\n"
        );
    }

    #[test]
    fn patch_keeps_operator_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        let original = "\
# Configuration file for MCDReforged
language: en_us

# The working directory of the server
working_directory: server

handler: vanilla_handler  # set by the panel
";
        std::fs::write(&path, original).unwrap();

        let rules = json!({ "handler": "{{MCDR_HANDLER}}" });
        let vars: Variables = [("MCDR_HANDLER", "forge_handler")].into_iter().collect();
        patch(&path, rules.as_object().unwrap(), &vars).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let expected = original.replace("vanilla_handler ", "forge_handler");
        assert_eq!(written, expected);
    }
}
