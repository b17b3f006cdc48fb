//! Apt package installation for new hosts.
use anyhow::{Context as _, Result};

use super::{Context, Task, TaskResult, TaskStats};
use crate::resources::package::{AptPackage, batch_install_packages, classify};

/// Install the configured apt packages in one batch.
#[derive(Debug)]
pub struct InstallAptPackages;

impl Task for InstallAptPackages {
    fn name(&self) -> &'static str {
        "Install apt packages"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.setup.installs_tools()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if !ctx.executor.which("apt-get") {
            return Ok(TaskResult::Skipped("apt-get not found".to_string()));
        }

        let with_ui = ctx.setup.with_ui();
        if !with_ui {
            ctx.log.info("not installing UI packages.");
        }
        let names = ctx.config.packages.selected(with_ui);
        if names.is_empty() {
            return Ok(TaskResult::Skipped("no packages configured".to_string()));
        }

        if ctx.dry_run {
            ctx.log.dry_run("would run 'sudo apt-get update'");
        } else {
            ctx.log.debug("refreshing apt package lists");
            ctx.executor
                .run("sudo", &["apt-get", "update"])
                .context("updating apt package lists")?;
        }

        let can_verify = ctx.executor.which("apt-cache");
        let packages: Vec<AptPackage<'_>> = names
            .into_iter()
            .map(|name| AptPackage::new(name, can_verify, &*ctx.executor))
            .collect();
        let classified = classify(&packages)?;

        for name in &classified.unavailable {
            ctx.log
                .warn(&format!("package '{name}' is not available, skipping"));
        }
        let stats = TaskStats {
            changed: classified.available.len(),
            already_ok: classified.installed.len(),
            skipped: classified.unavailable.len(),
        };
        if classified.available.is_empty() {
            ctx.log.info("all packages are already installed");
            return Ok(stats.finish(ctx));
        }

        let list = classified.available.join(" ");
        if ctx.dry_run {
            ctx.log
                .dry_run(&format!("would install packages: {list}"));
        } else {
            ctx.log.info(&format!("installing packages: {list}"));
            batch_install_packages(&*ctx.executor, &classified.available)
                .context("installing apt packages")?;
        }
        Ok(stats.finish(ctx))
    }
}
