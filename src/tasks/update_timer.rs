//! Systemd user timer that checks for dotfile updates.
use anyhow::Result;

use super::{Context, Task, TaskResult};

/// User timer that periodically checks the repository for updates.
pub const TIMER_UNIT: &str = "dotfiles-update-check.timer";

/// Enable the update-check user timer.
#[derive(Debug)]
pub struct UpdateTimer;

impl Task for UpdateTimer {
    fn name(&self) -> &'static str {
        "Update-check timer"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.executor.which("systemctl")
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let commands: [&[&str]; 2] = [
            &["--user", "daemon-reload"],
            &["--user", "enable", "--now", TIMER_UNIT],
        ];
        for args in commands {
            let command = format!("systemctl {}", args.join(" "));
            if ctx.dry_run {
                ctx.log.dry_run(&format!("would run '{command}'"));
                continue;
            }
            ctx.log.debug(&format!("configuring user timer: {command}"));
            let result = ctx.executor.run_unchecked("systemctl", args)?;
            if !result.success {
                ctx.log.warn(&format!(
                    "failed to run '{command}', timer setup skipped for now: {}",
                    result.stderr.trim()
                ));
                return Ok(TaskResult::Skipped(format!("'{command}' failed")));
            }
        }
        if ctx.dry_run {
            return Ok(TaskResult::DryRun);
        }
        ctx.log.info(&format!("{TIMER_UNIT} enabled"));
        Ok(TaskResult::Ok)
    }
}
