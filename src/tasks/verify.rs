//! Pre-flight check that every managed source exists.
use anyhow::Result;

use super::{Context, Task, TaskResult};
use crate::error::LinkError;

/// Check that every managed entry exists in the source repository before
/// anything in the home directory is touched.
#[derive(Debug)]
pub struct VerifySources;

impl Task for VerifySources {
    fn name(&self) -> &'static str {
        "Verify sources"
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let missing: Vec<String> = ctx
            .config
            .dotfiles
            .iter()
            .filter(|entry| {
                ctx.fs_ops
                    .canonicalize(&ctx.paths.source_path(&entry.path))
                    .is_err()
            })
            .map(|entry| entry.path.clone())
            .collect();

        if !missing.is_empty() {
            return Err(LinkError::MissingSources { entries: missing }.into());
        }
        ctx.log.info(&format!(
            "all {} required dotfiles are present",
            ctx.config.dotfiles.len()
        ));
        Ok(TaskResult::Ok)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tasks::test_helpers::{Scratch, WhichExecutor, config_with, make_context};
    use std::sync::Arc;

    #[test]
    fn passes_when_all_sources_exist() {
        let s = Scratch::new();
        s.source(".zshrc", "");
        s.source(".zsh/a.zsh", "");
        let (ctx, log) = make_context(
            &s,
            config_with(&s.root, &[".zshrc", ".zsh"]),
            Arc::new(WhichExecutor::default()),
        );

        assert!(matches!(VerifySources.run(&ctx).unwrap(), TaskResult::Ok));
        assert!(log.contains("info", "all 2 required dotfiles are present"));
    }

    #[test]
    fn lists_every_missing_source() {
        let s = Scratch::new();
        s.source(".zshrc", "");
        let (ctx, _log) = make_context(
            &s,
            config_with(&s.root, &[".bashrc", ".zshrc", ".profile"]),
            Arc::new(WhichExecutor::default()),
        );

        let err = VerifySources.run(&ctx).unwrap_err();

        assert_eq!(
            err.to_string(),
            "the following dotfiles are missing in the repository: .bashrc, .profile"
        );
    }

    #[test]
    fn dangling_source_symlink_is_missing() {
        let s = Scratch::new();
        s.source(".zshrc", "");
        std::os::unix::fs::symlink("nowhere", s.root.join(".profile")).unwrap();
        let (ctx, _log) = make_context(
            &s,
            config_with(&s.root, &[".zshrc", ".profile"]),
            Arc::new(WhichExecutor::default()),
        );

        let err = VerifySources.run(&ctx).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<LinkError>(),
            Some(LinkError::MissingSources { entries }) if entries == &[".profile".to_string()]
        ));
    }
}
