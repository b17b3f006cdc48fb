//! Starship prompt installation.
use anyhow::Result;

use super::{Context, Task, TaskResult};

/// Upstream installer script.
const INSTALL_SCRIPT_URL: &str = "https://starship.rs/install.sh";

/// Install the starship prompt into `~/.local/bin` when it is not on `PATH`.
#[derive(Debug)]
pub struct InstallStarship;

impl InstallStarship {
    fn install_command(ctx: &Context) -> String {
        format!(
            "curl -fsSL {INSTALL_SCRIPT_URL} | sh -s -- -y --bin-dir {}",
            ctx.home().join(".local/bin").display()
        )
    }
}

impl Task for InstallStarship {
    fn name(&self) -> &'static str {
        "Install starship"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.setup.installs_tools()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if ctx.executor.which("starship") {
            ctx.log.info("starship is already installed");
            return Ok(TaskResult::Ok);
        }

        let command = Self::install_command(ctx);
        if ctx.dry_run {
            ctx.log.dry_run(&format!("would run '{command}'"));
            return Ok(TaskResult::DryRun);
        }

        ctx.log.debug(&format!("running '{command}'"));
        let result = ctx.executor.run_unchecked("sh", &["-c", &command])?;
        if !result.success {
            ctx.log.warn(&format!(
                "failed to install starship: {}",
                result.stderr.trim()
            ));
            return Ok(TaskResult::Skipped("starship installation failed".to_string()));
        }
        ctx.log.info("starship installed successfully");
        Ok(TaskResult::Ok)
    }
}
