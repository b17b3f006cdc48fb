//! Repository-local git settings.
use anyhow::Result;

use super::{Context, Task, TaskResult, TaskStats};
use crate::resources::git_config::GitConfigResource;
use crate::resources::{Applicable, Resource, ResourceState};

/// Write the configured local git settings into the dotfiles repository.
#[derive(Debug)]
pub struct ConfigureGit;

impl Task for ConfigureGit {
    fn name(&self) -> &'static str {
        "Configure git"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.setup.is_new_host()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if ctx.config.git.is_empty() {
            return Ok(TaskResult::Skipped("no git settings configured".to_string()));
        }

        let mut stats = TaskStats::new();
        for setting in &ctx.config.git {
            let resource = GitConfigResource::new(
                setting.key.clone(),
                setting.value.clone(),
                ctx.root().to_path_buf(),
            );
            match resource.current_state()? {
                ResourceState::Correct => {
                    ctx.log
                        .debug(&format!("ok: {} (already set)", resource.description()));
                    stats.already_ok += 1;
                }
                ResourceState::Invalid { reason } => {
                    ctx.log
                        .warn(&format!("skipping {}: {reason}", setting.key));
                    stats.skipped += 1;
                }
                ResourceState::Missing | ResourceState::Incorrect { .. } => {
                    if ctx.dry_run {
                        ctx.log
                            .dry_run(&format!("would set {}", resource.description()));
                    } else {
                        resource.apply()?;
                        ctx.log.info(&format!("set {}", resource.description()));
                    }
                    stats.changed += 1;
                }
            }
        }
        Ok(stats.finish(ctx))
    }
}
