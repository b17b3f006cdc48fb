//! Linking of every managed dotfile into the home directory.
use anyhow::Result;

use super::{Context, Task, TaskResult, TaskStats};
use crate::resources::link::{LinkKind, LinkPolicy, Reconciler, is_correct_link};
use crate::resources::tree::LinkSummary;

/// Reconcile every managed entry into the home directory.
#[derive(Debug)]
pub struct LinkDotfiles;

impl Task for LinkDotfiles {
    fn name(&self) -> &'static str {
        "Link dotfiles"
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let policy = LinkPolicy {
            dry_run: ctx.dry_run,
            ..ctx.link_policy
        };
        let reconciler = Reconciler::new(&*ctx.fs_ops, &*ctx.log, policy);
        let mut summary = LinkSummary::default();
        for entry in &ctx.config.dotfiles {
            summary.merge(reconciler.reconcile_entry(entry, &ctx.paths)?);
        }

        let verb = if ctx.dry_run { "would set up" } else { "set up" };
        ctx.log.info(&format!(
            "{verb} {} {}-links for dotfiles in '{}'",
            summary.created_count(),
            mode_label(&reconciler, &summary),
            ctx.home().display()
        ));
        let stats = TaskStats {
            changed: summary.created_count(),
            already_ok: summary.already_correct,
            skipped: summary.skipped,
        };
        Ok(stats.finish(ctx))
    }
}

fn mode_label(reconciler: &Reconciler<'_>, summary: &LinkSummary) -> &'static str {
    match reconciler.policy().kind() {
        LinkKind::Symlink => "sym",
        LinkKind::HardLink if summary.directory_fallback => "hard (directory entries as sym)",
        LinkKind::HardLink => "hard",
    }
}

/// Whether any managed target already is a correct symlink or hard link to
/// its source.
#[must_use]
pub fn has_previous_installation(ctx: &Context) -> bool {
    ctx.config.dotfiles.iter().any(|entry| {
        let target = ctx.paths.target_path(&entry.path);
        let source = ctx.paths.source_path(&entry.path);
        let found = [LinkKind::Symlink, LinkKind::HardLink]
            .into_iter()
            .find(|kind| is_correct_link(&*ctx.fs_ops, &target, &source, *kind));
        if let Some(kind) = found {
            ctx.log.debug(&format!(
                "found existing installation: '{}' is a {kind} to '{}'",
                target.display(),
                source.display()
            ));
        }
        found.is_some()
    })
}
