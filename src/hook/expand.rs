use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_json::Value;

use crate::vars::Variables;

/// Panel placeholder names and the environment variables that carry them.
const ALIASES: &[(&str, &str)] = &[
    ("server.build.default.port", "SERVER_PORT"),
    ("server.build.default.ip", "SERVER_IP"),
    ("server.memory", "SERVER_MEMORY"),
    ("server.uuid", "P_SERVER_UUID"),
    ("server.location", "P_SERVER_LOCATION"),
];

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{\{([^}]+)\}\}").unwrap();
}

/// Expand `{{name}}` placeholders in every string inside `value`.
///
/// `name` is looked up through the panel alias table first and then as a
/// variable name. Unknown placeholders are left untouched. Expanded strings are
/// converted with [`to_native`].
pub fn expand_value(value: &Value, vars: &Variables) -> Value {
    match value {
        Value::String(s) => to_native(&expand_str(s, vars)),
        Value::Array(items) => Value::Array(items.iter().map(|v| expand_value(v, vars)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), expand_value(v, vars)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn expand_str<'a>(s: &'a str, vars: &Variables) -> Cow<'a, str> {
    PLACEHOLDER.replace_all(s, |caps: &Captures<'_>| {
        let name = caps[1].trim();
        let key = ALIASES
            .iter()
            .find(|(alias, _)| *alias == name)
            .map_or(name, |&(_, var)| var);
        vars.get(key).unwrap_or(&caps[0]).to_owned()
    })
}

/// `true`/`false` in any case become booleans and plain digits become integers.
pub fn to_native(s: &str) -> Value {
    if s.eq_ignore_ascii_case("true") {
        Value::Bool(true)
    } else if s.eq_ignore_ascii_case("false") {
        Value::Bool(false)
    } else if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse::<u64>()
            .map_or_else(|_| Value::String(s.to_owned()), Value::from)
    } else {
        Value::String(s.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn vars() -> Variables {
        [
            ("SERVER_PORT", "25565"),
            ("SERVER_MEMORY", "4096"),
            ("MOTD", "A Minecraft Server"),
            ("ONLINE", "TRUE"),
        ]
        .into_iter()
        .collect()
    }

    fn expand(s: &str) -> Value {
        expand_value(&json!(s), &vars())
    }

    #[test]
    fn aliases_and_plain_names() {
        assert_eq!(expand("{{server.build.default.port}}"), json!(25565));
        assert_eq!(expand("{{ server.memory }}"), json!(4096));
        assert_eq!(expand("{{MOTD}}"), json!("A Minecraft Server"));
    }

    #[test]
    fn unknown_placeholders_are_kept() {
        assert_eq!(
            expand("{{server.uuid}}-{{NOPE}}"),
            json!("{{server.uuid}}-{{NOPE}}")
        );
    }

    #[test]
    fn mixed_text_stays_a_string() {
        assert_eq!(expand("0.0.0.0:{{SERVER_PORT}}"), json!("0.0.0.0:25565"));
    }

    #[test]
    fn nested_values() {
        let value = json!({
            "online": "{{ONLINE}}",
            "ports": ["{{SERVER_PORT}}", 1],
            "flag": false
        });
        assert_eq!(
            expand_value(&value, &vars()),
            json!({ "online": true, "ports": [25565, 1], "flag": false })
        );
    }

    #[test]
    fn native_conversion() {
        assert_eq!(to_native("False"), json!(false));
        assert_eq!(to_native("007"), json!(7));
        assert_eq!(to_native(""), json!(""));
        assert_eq!(to_native("-1"), json!("-1"));
        let overflow = "99999999999999999999999";
        assert_eq!(to_native(overflow), json!(overflow));
    }
}
