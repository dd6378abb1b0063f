use clap::Args;
use color_eyre::eyre::Result;

use crate::command::LauncherCommand;
use crate::launch::{self, LaunchEnv};
use crate::settings::Settings;
use crate::vars::Variables;
use crate::{exec, hook, init, startup};

/// `start`: the container entrypoint.
#[derive(Debug, Default, Args)]
pub struct StartCmd {
    /// Print the final command line instead of running it.
    ///
    /// First-run setup and the start hook are skipped.
    #[arg(long)]
    dry_run: bool,
}

impl LauncherCommand for StartCmd {
    #[tracing::instrument(skip_all, fields(dry_run = self.dry_run))]
    fn execute(&self, settings: &Settings) -> Result<()> {
        let root = settings.root();
        let marker = settings.marker();

        if self.dry_run {
            if !marker.exists() {
                tracing::info!(marker = %marker.display(), "first run, setup would run");
            }
        } else {
            init::ensure_initialized(&marker, &settings.supervisor.init, root)?;
            exec::report_java_version(&settings.java.executable);
        }

        let mut vars = Variables::from_process();
        let plan = launch::build(
            &LaunchEnv::from_vars(&vars),
            &settings.layout(),
            &settings.java.executable,
        )?;
        tracing::info!(command = %plan.command, handler = %plan.handler, "server launch command");

        let launch_vars = plan.variables();
        vars.extend(launch_vars.iter().cloned());

        if !self.dry_run {
            hook::run(&settings.hook_config(), root, &vars)?;
        }

        let startup = vars.get("STARTUP");
        let argv = startup::startup_argv(startup, &settings.supervisor.start, &vars)?;

        if self.dry_run {
            println!("{}", shell_words::join(&argv));
            return Ok(());
        }

        match exec::hand_off(&argv, root, launch_vars)? {}
    }
}
