use std::path::PathBuf;

use clap::Args;
use color_eyre::eyre::Result;

use crate::command::LauncherCommand;
use crate::hook;
use crate::settings::Settings;
use crate::vars::Variables;

/// `hook`: patch configuration files and exit.
#[derive(Debug, Args)]
pub struct HookCmd {
    /// Hook definition to apply instead of the configured one
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,
}

impl LauncherCommand for HookCmd {
    fn execute(&self, settings: &Settings) -> Result<()> {
        let path = self
            .file
            .clone()
            .unwrap_or_else(|| settings.hook_config());
        let report = hook::run(&path, settings.root(), &Variables::from_process())?;

        for patched in &report.patched {
            println!("patched {}", patched.display());
        }
        for skipped in &report.skipped {
            println!("skipped {skipped}");
        }
        Ok(())
    }
}
