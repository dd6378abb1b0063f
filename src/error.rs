//! Fatal launch errors and how they are shown to operators.

use std::path::PathBuf;
use std::process::ExitStatus;

use color_eyre::eyre;
use derive_more::{Display, Error};

use crate::handler::HandlerKind;

const BORDER: &str = "======================================================================";

/// Configuration problems that must stop the launch before any command runs.
///
/// None of these are transient; each one needs an operator to fix the container
/// configuration, so nothing is retried.
#[derive(Debug, Display, Error)]
pub enum LaunchError {
    /// `forge_versions.txt` is missing.
    #[display("version file {} does not exist", path.display())]
    MissingVersionFile {
        /// Where the file was expected.
        path: PathBuf,
    },

    /// `forge_versions.txt` exists but could not be read.
    #[display("failed to read version file {}", path.display())]
    ReadVersionFile {
        /// The version file.
        path: PathBuf,
        /// Underlying read error.
        source: std::io::Error,
    },

    /// A version key is empty or still holds the template placeholder.
    #[display("{key} is unset or still set to its placeholder in {}", path.display())]
    UnsetVersion {
        /// `MC_VERSION` or `FORGE_VERSION`.
        key: &'static str,
        /// The version file.
        path: PathBuf,
    },

    /// Neither the Forge nor the NeoForge `unix_args.txt` exists.
    #[display(
        "no launch arguments file found at {} or {}",
        forge.display(),
        neoforge.display()
    )]
    MissingArgsFile {
        /// Forge location that was checked.
        forge: PathBuf,
        /// NeoForge location that was checked.
        neoforge: PathBuf,
    },

    /// `SERVER_JARFILE` is unset or empty for a handler that runs a jar.
    #[display("SERVER_JARFILE is not set but the {handler} handler requires it")]
    MissingJarFile {
        /// The handler that needed the jar.
        #[error(not(source))]
        handler: HandlerKind,
    },

    /// `STARTUP` has unbalanced quotes or a dangling escape.
    #[display("STARTUP could not be split into arguments: {template}")]
    InvalidStartup {
        /// The template as given.
        template: String,
        /// Splitter error.
        source: shell_words::ParseError,
    },

    /// There is no command to hand off to.
    #[display("STARTUP expanded to an empty command")]
    EmptyStartup,

    /// The first-run setup command could not be started.
    #[display("failed to run first-run setup `{program}`")]
    InitSpawn {
        /// Setup program.
        program: String,
        /// Spawn error.
        source: std::io::Error,
    },

    /// The first-run setup command exited unsuccessfully.
    #[display("first-run setup `{program}` exited with {status}")]
    InitFailed {
        /// Setup program.
        program: String,
        /// Its exit status.
        #[error(not(source))]
        status: ExitStatus,
    },

    /// The first-run marker could not be written.
    #[display("failed to create first-run marker {}", path.display())]
    MarkerWrite {
        /// Marker path.
        path: PathBuf,
        /// Write error.
        source: std::io::Error,
    },

    /// Replacing the process with the startup command failed.
    #[display("failed to execute `{program}`")]
    ExecFailed {
        /// Startup program.
        program: String,
        /// `exec` error.
        source: std::io::Error,
    },
}

impl LaunchError {
    /// What the operator should change to get past this error.
    pub fn hint(&self) -> &'static str {
        match self {
            Self::MissingVersionFile { .. } | Self::ReadVersionFile { .. } => {
                "Create forge_versions.txt next to the server directory with MC_VERSION and FORGE_VERSION."
            }
            Self::UnsetVersion { .. } => {
                "Replace the placeholder values in forge_versions.txt with the installed versions."
            }
            Self::MissingArgsFile { .. } => {
                "Run the Forge/NeoForge installer so that unix_args.txt exists for these versions."
            }
            Self::MissingJarFile { .. } => "Set SERVER_JARFILE to the server jar name.",
            Self::InvalidStartup { .. } | Self::EmptyStartup => {
                "Check the STARTUP variable for unbalanced quotes or a missing command."
            }
            Self::InitSpawn { .. } | Self::InitFailed { .. } | Self::MarkerWrite { .. } => {
                "Check that MCDReforged is installed and the working directory is writable."
            }
            Self::ExecFailed { .. } => "Check that the startup command exists and is executable.",
        }
    }

    /// Renders the bordered block printed on fatal exit.
    pub fn render(&self) -> String {
        format!("{BORDER}\n FATAL: {self}\n {}\n{BORDER}", self.hint())
    }
}

/// Print a failed run to stderr.
///
/// Launch errors anywhere in the chain get the bordered operator block; anything
/// else goes through the color-eyre report handler.
pub fn report(report: &eyre::Report) {
    match report
        .chain()
        .find_map(|cause| cause.downcast_ref::<LaunchError>())
    {
        Some(err) => eprintln!("{}", err.render()),
        None => eprintln!("Error: {report:?}"),
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::eyre::WrapErr;

    use super::*;

    #[test]
    fn render_is_bordered() {
        let err = LaunchError::MissingJarFile {
            handler: HandlerKind::Standard,
        };
        let rendered = err.render();
        let lines: Vec<_> = rendered.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], BORDER);
        assert_eq!(lines[3], BORDER);
        assert!(lines[1].contains("SERVER_JARFILE is not set"));
        assert!(lines[1].contains("standard"));
    }

    #[test]
    fn launch_error_found_through_context() {
        let report = Err::<(), _>(LaunchError::EmptyStartup)
            .wrap_err("while starting")
            .unwrap_err();

        let found = report
            .chain()
            .find_map(|cause| cause.downcast_ref::<LaunchError>());
        crate::macros::assert_matches!(found, Some(LaunchError::EmptyStartup));
    }
}
