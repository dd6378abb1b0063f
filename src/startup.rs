//! Expansion of the panel's `STARTUP` template into an argument vector.
//!
//! Panel placeholders (`{{VAR}}`) are rewritten to `${VAR}` and references are
//! then substituted with shell quoting rules in mind: nothing is expanded inside
//! single quotes, `"${VAR}"` is always exactly one argument (possibly empty), and
//! an unquoted reference to an unset or empty variable disappears. Unlike a
//! shell, a substituted value is never split into several arguments.

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::error::LaunchError;
use crate::vars::Variables;

lazy_static! {
    static ref PLACEHOLDER: Regex =
        Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap();
    static ref REFERENCE: Regex =
        Regex::new(r"^(?:\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*))").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quote {
    None,
    Single,
    Double,
}

/// Rewrite panel placeholders (`{{VAR}}`) into shell references (`${VAR}`).
pub fn to_shell_form(template: &str) -> Cow<'_, str> {
    PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| format!("${{{}}}", &caps[1]))
}

/// Substitute `${VAR}` and `$VAR` references outside single quotes.
///
/// The result is still in shell syntax: each substituted value is escaped for
/// the quoting context it lands in, so splitting the result yields it verbatim.
pub fn expand_template(template: &str, vars: &Variables) -> String {
    let mut out = String::with_capacity(template.len());
    let mut quote = Quote::None;
    let mut rest = template;

    while let Some(c) = rest.chars().next() {
        if c == '$' && quote != Quote::Single {
            if let Some(caps) = REFERENCE.captures(rest) {
                let name = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .map_or("", |m| m.as_str());
                let value = vars.get(name).unwrap_or_default();
                match quote {
                    Quote::Double => out.push_str(&escape_double_quoted(value)),
                    _ if value.is_empty() => {}
                    _ => out.push_str(&shell_words::quote(value)),
                }
                rest = &rest[caps[0].len()..];
                continue;
            }
        }

        let len = match (c, quote) {
            ('\\', Quote::None | Quote::Double) => rest.chars().take(2).map(char::len_utf8).sum(),
            _ => c.len_utf8(),
        };
        quote = match (c, quote) {
            ('\'', Quote::None) => Quote::Single,
            ('\'', Quote::Single) => Quote::None,
            ('"', Quote::None) => Quote::Double,
            ('"', Quote::Double) => Quote::None,
            _ => quote,
        };
        out.push_str(&rest[..len]);
        rest = &rest[len..];
    }
    out
}

fn escape_double_quoted(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '"' | '$' | '`') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Turn `STARTUP` into the argument vector that replaces this process.
///
/// An unset or blank template falls back to `default`.
pub fn startup_argv(
    template: Option<&str>,
    default: &[String],
    vars: &Variables,
) -> Result<Vec<String>, LaunchError> {
    let Some(template) = template.map(str::trim).filter(|t| !t.is_empty()) else {
        tracing::debug!(?default, "STARTUP is not set, using the default supervisor command");
        return match default {
            [] => Err(LaunchError::EmptyStartup),
            _ => Ok(default.to_vec()),
        };
    };

    let expanded = expand_template(&to_shell_form(template), vars);
    let argv = shell_words::split(&expanded).map_err(|source| LaunchError::InvalidStartup {
        template: template.to_owned(),
        source,
    })?;

    if argv.is_empty() {
        return Err(LaunchError::EmptyStartup);
    }
    Ok(argv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macros::assert_matches;

    fn vars() -> Variables {
        [
            ("SERVER_JARFILE", "server.jar"),
            ("LAUNCH_COMMAND", "java -Xmx2G -jar server.jar --nogui"),
            ("SERVER_PORT", "25565"),
            ("HOME", "/home/container"),
        ]
        .into_iter()
        .collect()
    }

    fn default() -> Vec<String> {
        ["python3", "-m", "mcdreforged", "start"]
            .map(String::from)
            .to_vec()
    }

    fn argv(template: &str) -> Vec<String> {
        startup_argv(Some(template), &default(), &vars()).unwrap()
    }

    #[test]
    fn placeholders_become_references() {
        assert_eq!(
            to_shell_form("java -jar {{SERVER_JARFILE}}"),
            "java -jar ${SERVER_JARFILE}"
        );
        assert_eq!(to_shell_form("{{ A }}{{B}}"), "${A}${B}");
        assert_eq!(to_shell_form("no placeholders"), "no placeholders");
    }

    #[test]
    fn references_expand() {
        let vars = vars();
        assert_eq!(expand_template("${SERVER_JARFILE}", &vars), "server.jar");
        assert_eq!(
            expand_template("--port=$SERVER_PORT", &vars),
            "--port=25565"
        );
        assert_eq!(expand_template("${UNSET}x", &vars), "x");
        assert_eq!(
            expand_template("'$HOME' \\$HOME", &vars),
            "'$HOME' \\$HOME"
        );
        assert_eq!(
            expand_template("$LAUNCH_COMMAND", &vars),
            "'java -Xmx2G -jar server.jar --nogui'"
        );
    }

    #[test]
    fn expands_template() {
        assert_eq!(
            argv("python3 -m mcdreforged start --port {{SERVER_PORT}}"),
            ["python3", "-m", "mcdreforged", "start", "--port", "25565"]
        );
    }

    #[test]
    fn substituted_values_are_not_resplit() {
        let expected = ["sh", "-c", "java -Xmx2G -jar server.jar --nogui"];
        assert_eq!(argv("sh -c \"{{LAUNCH_COMMAND}}\""), expected);
        assert_eq!(argv("sh -c {{LAUNCH_COMMAND}}"), expected);
    }

    #[test]
    fn single_quotes_are_literal() {
        assert_eq!(
            argv("echo '$HOME' \"${UNSET}\" end"),
            ["echo", "$HOME", "", "end"]
        );
        assert_eq!(
            argv("sh -c 'exec {{LAUNCH_COMMAND}}'"),
            ["sh", "-c", "exec ${LAUNCH_COMMAND}"]
        );
    }

    #[test]
    fn values_with_shell_syntax_pass_through() {
        let motd = r#"it's "fine" $HOME \ `x`"#;
        let mut vars = vars();
        vars.insert("MOTD", motd);

        let split = |template| startup_argv(Some(template), &default(), &vars).unwrap();
        assert_eq!(split("--motd {{MOTD}}"), ["--motd", motd]);
        assert_eq!(split("--motd \"{{MOTD}}\""), ["--motd", motd]);
        assert_eq!(split("--motd=\"$MOTD\""), [format!("--motd={motd}")]);
    }

    #[test]
    fn unset_references_are_dropped_but_empty_literals_kept() {
        assert_eq!(argv("run {{MISSING}} '' end"), ["run", "", "end"]);
        assert_eq!(argv("run \"{{MISSING}}\" end"), ["run", "", "end"]);
    }

    #[test]
    fn default_when_unset() {
        assert_eq!(startup_argv(None, &default(), &vars()).unwrap(), default());
        assert_eq!(argv("   "), default());
        assert_matches!(
            startup_argv(None, &[], &vars()),
            Err(LaunchError::EmptyStartup)
        );
    }

    #[test]
    fn invalid_templates() {
        assert_matches!(
            startup_argv(Some("python3 'unterminated"), &default(), &vars()),
            Err(LaunchError::InvalidStartup { .. })
        );
        assert_matches!(
            startup_argv(Some("{{MISSING}}"), &default(), &vars()),
            Err(LaunchError::EmptyStartup)
        );
    }
}
