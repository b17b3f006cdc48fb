//! Snapshot of existing home-directory targets before linking.
use anyhow::{Context as _, Result};

use super::{Context, Task, TaskResult};
use crate::resources::backup::BackupManager;

/// Copy pre-existing targets into the timestamped backup directory.
#[derive(Debug)]
pub struct BackupDotfiles;

impl Task for BackupDotfiles {
    fn name(&self) -> &'static str {
        "Back up existing dotfiles"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.backup
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let set = BackupManager::new(&*ctx.fs_ops, &*ctx.log, ctx.dry_run)
            .backup(&ctx.config.dotfiles, &ctx.paths)
            .with_context(|| {
                format!("backing up to {}", ctx.paths.backup_dir().display())
            })?;

        if ctx.dry_run {
            return Ok(TaskResult::DryRun);
        }
        if !set.did_backup() {
            return Ok(TaskResult::Skipped("nothing to back up".to_string()));
        }
        Ok(TaskResult::Ok)
    }
}
