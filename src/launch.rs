//! Derives the exact command used to start the game server.
//!
//! The builder reads a handful of environment values and on-disk files and either
//! produces a complete [`LaunchCommand`] or fails with a [`LaunchError`]; a
//! partially built command never escapes.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::LaunchError;
use crate::handler::HandlerKind;
use crate::memory::{java_memory_flag, MemoryFlag};
use crate::vars::Variables;
use crate::versions::ForgeVersions;

const FORGE_LIBRARIES: &str = "libraries/net/minecraftforge/forge";
const NEOFORGE_LIBRARIES: &str = "libraries/net/neoforged/neoforge";
const UNIX_ARGS_FILE: &str = "unix_args.txt";
/// JVM argument file shared by standard servers, relative to the server directory.
const SHARED_ARGS_FILE: &str = "../args.txt";
const PROXY_MIN_HEAP: &str = "-Xms128M";
const NO_GUI: &str = "--nogui";

/// Launch inputs taken from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchEnv {
    /// Raw `JAVA_MEMORY`.
    pub java_memory: Option<String>,
    /// Parsed `MCDR_HANDLER`.
    pub handler: HandlerKind,
    /// `SERVER_JARFILE`, required by every handler except Forge.
    pub server_jarfile: Option<String>,
}

impl LaunchEnv {
    /// Capture the launch inputs. Empty values count as unset.
    pub fn from_vars(vars: &Variables) -> Self {
        Self {
            java_memory: vars.non_empty("JAVA_MEMORY").map(str::to_owned),
            handler: HandlerKind::from_env_value(vars.get("MCDR_HANDLER")),
            server_jarfile: vars.non_empty("SERVER_JARFILE").map(str::to_owned),
        }
    }
}

/// Where the builder looks for files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Directory the server process runs in; argument file paths are relative to it.
    pub server_dir: PathBuf,
    /// `forge_versions.txt`, only read for Forge servers.
    pub versions_file: PathBuf,
}

/// The server command, split the same way operators see it in the panel.
///
/// Joining [`exec`](Self::exec), [`jvm_args`](Self::jvm_args),
/// [`main_spec`](Self::main_spec) and [`trailing_args`](Self::trailing_args) in
/// that order gives the argument vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchCommand {
    /// The java executable.
    pub exec: String,
    /// Heap and argument-file options.
    pub jvm_args: Vec<String>,
    /// `-jar <file>`, or the installer's `@unix_args.txt` for Forge.
    pub main_spec: Vec<String>,
    /// Arguments for the server itself.
    pub trailing_args: Vec<String>,
}

/// Flattened, shell-quoted form of each part. Empty groups are empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandParts {
    /// `LAUNCH_EXEC`
    pub exec: String,
    /// `LAUNCH_JVM_ARGS`
    pub jvm_args: String,
    /// `LAUNCH_MAIN`
    pub main_spec: String,
    /// `LAUNCH_ARGS`
    pub trailing_args: String,
}

impl CommandParts {
    /// The four parts in command order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        [
            self.exec.as_str(),
            self.jvm_args.as_str(),
            self.main_spec.as_str(),
            self.trailing_args.as_str(),
        ]
        .into_iter()
    }
}

impl LaunchCommand {
    /// Ordered argument list for spawning the process directly.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(&self.exec)
            .chain(&self.jvm_args)
            .chain(&self.main_spec)
            .chain(&self.trailing_args)
            .cloned()
            .collect()
    }

    /// Each part joined and quoted on its own.
    pub fn parts(&self) -> CommandParts {
        CommandParts {
            exec: join_quoted(std::slice::from_ref(&self.exec)),
            jvm_args: join_quoted(&self.jvm_args),
            main_spec: join_quoted(&self.main_spec),
            trailing_args: join_quoted(&self.trailing_args),
        }
    }
}

impl Display for LaunchCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&join_quoted(&self.argv()))
    }
}

/// Join arguments with single spaces, quoting each one for a POSIX shell.
pub fn join_quoted(args: &[String]) -> String {
    shell_words::join(args)
}

/// A built command together with the values derived on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    /// The handler the command was built for.
    pub handler: HandlerKind,
    /// Normalized heap flag, computed even when the command does not use it.
    pub memory: MemoryFlag,
    /// The server command.
    pub command: LaunchCommand,
}

impl LaunchPlan {
    /// Variables handed to the start hook, STARTUP expansion and the supervisor.
    pub fn variables(&self) -> Vec<(String, String)> {
        let parts = self.command.parts();
        vec![
            ("LAUNCH_COMMAND".into(), self.command.to_string()),
            ("LAUNCH_EXEC".into(), parts.exec),
            ("LAUNCH_JVM_ARGS".into(), parts.jvm_args),
            ("LAUNCH_MAIN".into(), parts.main_spec),
            ("LAUNCH_ARGS".into(), parts.trailing_args),
            ("JAVA_MEMORY_FLAG".into(), self.memory.to_string()),
        ]
    }
}

/// Build the launch command for the configured handler.
#[tracing::instrument(skip_all, fields(handler = %env.handler))]
pub fn build(env: &LaunchEnv, layout: &Layout, java: &str) -> Result<LaunchPlan, LaunchError> {
    let memory = java_memory_flag(env.java_memory.as_deref());
    tracing::debug!(%memory, "normalized heap size");

    let command = match env.handler {
        HandlerKind::Forge => forge_command(layout, java)?,
        HandlerKind::Proxy(_) => {
            let jar = require_jar(env)?;
            LaunchCommand {
                exec: java.to_owned(),
                jvm_args: vec![PROXY_MIN_HEAP.to_owned(), memory.to_string()],
                main_spec: vec!["-jar".to_owned(), jar.to_owned()],
                trailing_args: Vec::new(),
            }
        }
        HandlerKind::Standard => {
            let jar = require_jar(env)?;
            if !layout.server_dir.join(SHARED_ARGS_FILE).is_file() {
                tracing::warn!(
                    path = %layout.server_dir.join(SHARED_ARGS_FILE).display(),
                    "shared JVM argument file does not exist, java will refuse to start"
                );
            }
            LaunchCommand {
                exec: java.to_owned(),
                jvm_args: vec![memory.to_string(), format!("@{SHARED_ARGS_FILE}")],
                main_spec: vec!["-jar".to_owned(), jar.to_owned()],
                trailing_args: vec![NO_GUI.to_owned()],
            }
        }
    };

    Ok(LaunchPlan {
        handler: env.handler,
        memory,
        command,
    })
}

fn require_jar(env: &LaunchEnv) -> Result<&str, LaunchError> {
    env.server_jarfile
        .as_deref()
        .filter(|jar| !jar.is_empty())
        .ok_or(LaunchError::MissingJarFile {
            handler: env.handler,
        })
}

fn forge_command(layout: &Layout, java: &str) -> Result<LaunchCommand, LaunchError> {
    let versions = ForgeVersions::load(&layout.versions_file)?;
    let args_file = find_args_file(&layout.server_dir, &versions.key())?;
    tracing::info!(
        minecraft = %versions.minecraft,
        forge = %versions.forge,
        args_file = %args_file.display(),
        "using installer argument file"
    );

    Ok(LaunchCommand {
        exec: java.to_owned(),
        jvm_args: Vec::new(),
        main_spec: vec![format!("@{}", args_file.display())],
        trailing_args: vec![NO_GUI.to_owned()],
    })
}

/// Returns the Forge argument file if present, otherwise the NeoForge one.
/// The path is relative to `server_dir`.
fn find_args_file(server_dir: &Path, key: &str) -> Result<PathBuf, LaunchError> {
    let forge = Path::new(FORGE_LIBRARIES).join(key).join(UNIX_ARGS_FILE);
    let neoforge = Path::new(NEOFORGE_LIBRARIES).join(key).join(UNIX_ARGS_FILE);

    if server_dir.join(&forge).is_file() {
        return Ok(forge);
    }
    if server_dir.join(&neoforge).is_file() {
        return Ok(neoforge);
    }
    Err(LaunchError::MissingArgsFile {
        forge: server_dir.join(forge),
        neoforge: server_dir.join(neoforge),
    })
}
