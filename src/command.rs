//! Subcommand implementations.

mod hook;
mod memory;
mod print;
mod start;

use color_eyre::eyre::Result;

pub use hook::HookCmd;
pub use memory::MemoryCmd;
pub use print::PrintCmd;
pub use start::StartCmd;

use crate::settings::Settings;

/// A subcommand that can be run once settings are loaded.
pub trait LauncherCommand {
    /// Run the command.
    fn execute(&self, settings: &Settings) -> Result<()>;
}
