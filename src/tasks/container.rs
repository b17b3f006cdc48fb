//! Zinit cache seeding and setup scripts inside containers.
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use super::{Context, Task, TaskResult};

/// Where the host's home directory is mounted inside the container.
pub const HOST_HOME_MOUNT: &str = "/mnt/host_home";

/// Extra setup script looked up in the repository root and the home directory.
const SETUP_SCRIPT: &str = "setup_in_container.sh";

/// Plugin cache shared with the host to avoid a fresh download per container.
const ZINIT_CACHE: &str = ".local/share/zinit";

/// Seed the zinit cache from the host and run container setup scripts.
#[derive(Debug)]
pub struct ContainerSetup {
    host_home: PathBuf,
}

impl Default for ContainerSetup {
    fn default() -> Self {
        Self::new(PathBuf::from(HOST_HOME_MOUNT))
    }
}

impl ContainerSetup {
    /// Create the task reading the host cache from `host_home`.
    #[must_use]
    pub const fn new(host_home: PathBuf) -> Self {
        Self { host_home }
    }

    fn seed_zinit_cache(&self, ctx: &Context) -> Result<()> {
        let host_cache = self.host_home.join(ZINIT_CACHE);
        let local_cache = ctx.home().join(ZINIT_CACHE);
        let source_exists = ctx.fs_ops.exists(&host_cache);
        let target_exists = ctx.fs_ops.exists(&local_cache);
        if !source_exists || target_exists {
            ctx.log.debug(&format!(
                "zinit cache not copied: source exists: {source_exists}, destination exists: {target_exists}"
            ));
            return Ok(());
        }

        if ctx.dry_run {
            ctx.log.dry_run(&format!(
                "would copy zinit cache '{}' to '{}'",
                host_cache.display(),
                local_cache.display()
            ));
            return Ok(());
        }
        ctx.log.info(&format!(
            "copying zinit cache '{}' to '{}'",
            host_cache.display(),
            local_cache.display()
        ));
        ctx.fs_ops
            .copy_tree(&host_cache, &local_cache)
            .with_context(|| format!("copying {}", host_cache.display()))?;
        Ok(())
    }

    fn run_script(ctx: &Context, script: &Path) -> Result<()> {
        if !ctx.fs_ops.is_file(script) {
            ctx.log.info(&format!(
                "no additional setup script found at '{}'",
                script.display()
            ));
            return Ok(());
        }
        if ctx.dry_run {
            ctx.log
                .dry_run(&format!("would run setup script '{}'", script.display()));
            return Ok(());
        }
        ctx.log
            .info(&format!("running setup script '{}'", script.display()));
        let result = ctx
            .executor
            .run(&script.to_string_lossy(), &[])
            .with_context(|| format!("setup script {} failed", script.display()))?;
        if !result.stdout.trim().is_empty() {
            ctx.log.debug(result.stdout.trim());
        }
        Ok(())
    }
}

impl Task for ContainerSetup {
    fn name(&self) -> &'static str {
        "Container setup"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.platform.in_container
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        self.seed_zinit_cache(ctx)?;
        for script in [
            ctx.root().join(SETUP_SCRIPT),
            ctx.home().join(SETUP_SCRIPT),
        ] {
            Self::run_script(ctx, &script)?;
        }
        if ctx.dry_run {
            return Ok(TaskResult::DryRun);
        }
        Ok(TaskResult::Ok)
    }
}
