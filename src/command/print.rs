use clap::{Args, ValueEnum};
use color_eyre::eyre::Result;

use crate::command::LauncherCommand;
use crate::launch::{self, LaunchEnv};
use crate::settings::Settings;
use crate::vars::Variables;

/// `print`: show the launch command without running anything.
#[derive(Debug, Args)]
pub struct PrintCmd {
    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: Format,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum Format {
    /// The whole command on one line
    #[default]
    Plain,
    /// One `LAUNCH_*=` line per command part
    Parts,
    /// The argument groups as JSON
    Json,
}

impl LauncherCommand for PrintCmd {
    #[tracing::instrument(skip_all)]
    fn execute(&self, settings: &Settings) -> Result<()> {
        let env = LaunchEnv::from_vars(&Variables::from_process());
        let plan = launch::build(&env, &settings.layout(), &settings.java.executable)?;

        match self.format {
            Format::Plain => println!("{}", plan.command),
            Format::Parts => {
                let parts = plan.command.parts();
                println!("LAUNCH_EXEC={}", parts.exec);
                println!("LAUNCH_JVM_ARGS={}", parts.jvm_args);
                println!("LAUNCH_MAIN={}", parts.main_spec);
                println!("LAUNCH_ARGS={}", parts.trailing_args);
            }
            Format::Json => println!("{}", serde_json::to_string_pretty(&plan.command)?),
        }
        Ok(())
    }
}
