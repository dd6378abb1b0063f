//! Running java for diagnostics and handing the process over to the supervisor.

use std::convert::Infallible;
use std::path::Path;
use std::process::Command;

use crate::error::LaunchError;

/// Print `java -version` for the container log. Failures are only logged.
pub fn report_java_version(java: &str) {
    match Command::new(java).arg("-version").status() {
        Ok(status) if status.success() => {}
        Ok(status) => tracing::warn!(java, %status, "`java -version` failed"),
        Err(e) => tracing::warn!(java, error = %e, "could not run `java -version`"),
    }
}

/// Replace this process with `argv`, run from `cwd` with `vars` added to its environment.
///
/// Only returns on failure. On platforms without `exec` the command is run as a
/// child and this process exits with its status.
pub fn hand_off<K, V>(
    argv: &[String],
    cwd: &Path,
    vars: impl IntoIterator<Item = (K, V)>,
) -> Result<Infallible, LaunchError>
where
    K: AsRef<std::ffi::OsStr>,
    V: AsRef<std::ffi::OsStr>,
{
    let [program, args @ ..] = argv else {
        return Err(LaunchError::EmptyStartup);
    };

    let mut cmd = Command::new(program);
    cmd.args(args).current_dir(cwd).envs(vars);
    tracing::info!(command = %shell_words::join(argv), cwd = %cwd.display(), "handing off");

    replace_process(cmd).map_err(|source| LaunchError::ExecFailed {
        program: program.clone(),
        source,
    })
}

#[cfg(unix)]
fn replace_process(mut cmd: Command) -> std::io::Result<Infallible> {
    use std::os::unix::process::CommandExt;

    Err(cmd.exec())
}

#[cfg(not(unix))]
fn replace_process(mut cmd: Command) -> std::io::Result<Infallible> {
    let status = cmd.status()?;
    std::process::exit(status.code().unwrap_or(1))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::macros::assert_matches;

    #[test]
    fn empty_argv() {
        let vars: [(&str, &str); 0] = [];
        assert_matches!(
            hand_off(&[], Path::new("."), vars),
            Err(LaunchError::EmptyStartup)
        );
    }

    #[test]
    fn missing_program_returns() {
        let argv = vec!["/nonexistent/supervisor".to_owned()];
        let vars: [(&str, &str); 0] = [];
        assert_matches!(
            hand_off(&argv, Path::new("."), vars),
            Err(LaunchError::ExecFailed { .. })
        );
    }
}
