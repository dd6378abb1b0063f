use clap::Args;
use color_eyre::eyre::Result;

use crate::command::LauncherCommand;
use crate::memory::java_memory_flag;
use crate::settings::Settings;

/// `memory`: normalize a heap size.
#[derive(Debug, Args)]
pub struct MemoryCmd {
    /// Memory specification, e.g. 2048, 1024M or 4G
    #[arg(env = "JAVA_MEMORY")]
    value: Option<String>,
}

impl LauncherCommand for MemoryCmd {
    fn execute(&self, _settings: &Settings) -> Result<()> {
        println!("{}", java_memory_flag(self.value.as_deref()));
        Ok(())
    }
}
