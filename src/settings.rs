//! Launcher settings file.

use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};

use crate::launch::Layout;
use crate::versions::VERSIONS_FILE_NAME;

/// Settings file read when `--config` is not given. It is optional.
pub const DEFAULT_SETTINGS_PATH: &str = "/home/container/.mcdr-launch.toml";

/// Launcher settings. Every field has a default matching the stock container image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// `[paths]`
    pub paths: PathSettings,
    /// `[java]`
    pub java: JavaSettings,
    /// `[supervisor]`
    pub supervisor: SupervisorSettings,
}

/// Relative paths are resolved against `root`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// MCDReforged's working directory; the supervisor runs here.
    pub root: PathBuf,
    /// Directory the game server runs in.
    pub server_dir: PathBuf,
    /// `forge_versions.txt`
    pub versions_file: PathBuf,
    /// Written after first-run setup succeeds.
    pub marker: PathBuf,
    /// Start hook rules.
    pub hook_config: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/home/container"),
            server_dir: PathBuf::from("server"),
            versions_file: PathBuf::from(VERSIONS_FILE_NAME),
            marker: PathBuf::from(".mcdr_initialized"),
            hook_config: PathBuf::from("/start_hook.json"),
        }
    }
}

/// Java runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JavaSettings {
    /// Program name or path of the java binary.
    pub executable: String,
}

impl Default for JavaSettings {
    fn default() -> Self {
        Self {
            executable: "java".to_owned(),
        }
    }
}

/// MCDReforged commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorSettings {
    /// One-time setup, run when the first-run marker is missing.
    pub init: Vec<String>,
    /// Used when `STARTUP` is unset.
    pub start: Vec<String>,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        let mcdr = |action: &str| {
            ["python3", "-m", "mcdreforged", action]
                .map(String::from)
                .to_vec()
        };
        Self {
            init: mcdr("init"),
            start: mcdr("start"),
        }
    }
}

impl Settings {
    /// Read and parse a TOML settings file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read settings from {}", path.display()))?;
        toml::from_str(&content)
            .wrap_err_with(|| format!("Failed to parse settings in {}", path.display()))
    }

    /// Load an explicitly requested file, or the default one if it exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_SETTINGS_PATH).is_file() => {
                Self::from_file(DEFAULT_SETTINGS_PATH)
            }
            None => {
                tracing::debug!("no settings file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// The container root.
    pub fn root(&self) -> &Path {
        &self.paths.root
    }

    /// `path` relative to the root. Absolute paths are returned as is.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.paths.root.join(path)
    }

    /// Where the game server runs.
    pub fn server_dir(&self) -> PathBuf {
        self.resolve(&self.paths.server_dir)
    }

    /// The first-run marker file.
    pub fn marker(&self) -> PathBuf {
        self.resolve(&self.paths.marker)
    }

    /// The start hook rules file.
    pub fn hook_config(&self) -> PathBuf {
        self.resolve(&self.paths.hook_config)
    }

    /// File locations used to build the launch command.
    pub fn layout(&self) -> Layout {
        Layout {
            server_dir: self.server_dir(),
            versions_file: self.resolve(&self.paths.versions_file),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(
            settings.supervisor.start,
            ["python3", "-m", "mcdreforged", "start"]
        );
    }

    #[test]
    fn partial_override() {
        let settings: Settings = toml::from_str(
            r#"
            [paths]
            root = "/srv/mcdr"

            [supervisor]
            start = ["mcdreforged", "start"]
            "#,
        )
        .unwrap();

        assert_eq!(settings.server_dir(), Path::new("/srv/mcdr/server"));
        assert_eq!(
            settings.layout().versions_file,
            Path::new("/srv/mcdr/forge_versions.txt")
        );
        assert_eq!(settings.hook_config(), Path::new("/start_hook.json"));
        assert_eq!(settings.supervisor.start, ["mcdreforged", "start"]);
        assert_eq!(
            settings.supervisor.init,
            ["python3", "-m", "mcdreforged", "init"]
        );
        assert_eq!(settings.java.executable, "java");
    }

    #[test]
    fn from_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("launcher.toml");
        assert!(Settings::from_file(&path).is_err());

        std::fs::write(&path, "[paths\n").unwrap();
        assert!(Settings::from_file(&path).is_err());

        std::fs::write(&path, "[java]\nexecutable = \"/opt/jdk/bin/java\"\n").unwrap();
        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.java.executable, "/opt/jdk/bin/java");
    }
}
