//! Command line interface.

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::Result;

use crate::command::{HookCmd, LauncherCommand, MemoryCmd, PrintCmd, StartCmd};
use crate::settings::Settings;

/// Top-level parser.
#[derive(Debug, Parser)]
#[command(version, about, max_term_width = 100)]
pub struct Launcher {
    #[clap(flatten)]
    global: GlobalOpts,
    #[clap(subcommand)]
    command: Option<Command>,
}

impl Launcher {
    /// Run the selected subcommand, `start` when none was given.
    pub fn run(self) -> Result<()> {
        let settings = Settings::load(self.global.config.as_deref())?;
        tracing::trace!(?settings, "loaded settings");

        match self.command {
            Some(Command::Start(cmd)) => cmd.execute(&settings),
            Some(Command::Print(cmd)) => cmd.execute(&settings),
            Some(Command::Memory(cmd)) => cmd.execute(&settings),
            Some(Command::Hook(cmd)) => cmd.execute(&settings),
            None => StartCmd::default().execute(&settings),
        }
    }

    /// Number of `-v` flags given.
    pub fn verbose(&self) -> u8 {
        self.global.verbose
    }

    /// Whether log output should be colored.
    pub fn ansi(&self) -> bool {
        self.global.color.enabled()
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Initialize if needed, run the start hook and hand off to the supervisor (default).
    Start(StartCmd),
    /// Print the derived server launch command.
    Print(PrintCmd),
    /// Print the normalized maximum heap flag.
    Memory(MemoryCmd),
    /// Run the start hook on its own.
    Hook(HookCmd),
}

#[derive(Debug, Args)]
struct GlobalOpts {
    /// Settings file
    #[arg(long, global = true, env = "MCDR_LAUNCH_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Color
    #[arg(long, value_enum, global = true, default_value_t)]
    color: Color,

    /// Verbosity level (can be set multiple times)
    #[arg(long, short, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum Color {
    #[default]
    Auto,
    Always,
    Never,
}

impl Color {
    fn enabled(self) -> bool {
        match self {
            Color::Auto => std::io::stderr().is_terminal(),
            Color::Always => true,
            Color::Never => false,
        }
    }
}
