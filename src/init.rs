//! One-time setup gated by a marker file.

use std::path::Path;
use std::process::Command;

use crate::error::LaunchError;

/// Run the supervisor's setup command unless `marker` already exists.
///
/// Returns whether setup ran. The marker is only written after setup succeeds,
/// so a failed first run is retried on the next start. There is no locking; one
/// launcher runs per container.
pub fn ensure_initialized(
    marker: &Path,
    setup: &[String],
    cwd: &Path,
) -> Result<bool, LaunchError> {
    if marker.exists() {
        tracing::debug!(marker = %marker.display(), "already initialized");
        return Ok(false);
    }

    match setup {
        [] => tracing::info!("first run, no setup command configured"),
        [program, args @ ..] => {
            tracing::info!(command = %shell_words::join(setup), "first run, running setup");
            let status = Command::new(program)
                .args(args)
                .current_dir(cwd)
                .status()
                .map_err(|source| LaunchError::InitSpawn {
                    program: program.clone(),
                    source,
                })?;
            if !status.success() {
                return Err(LaunchError::InitFailed {
                    program: program.clone(),
                    status,
                });
            }
        }
    }

    write_marker(marker)?;
    Ok(true)
}

fn write_marker(marker: &Path) -> Result<(), LaunchError> {
    let result = match marker.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
    .and_then(|()| std::fs::File::create(marker).map(drop));

    result.map_err(|source| LaunchError::MarkerWrite {
        path: marker.to_path_buf(),
        source,
    })
}
