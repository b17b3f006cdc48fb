//! Font installation for new hosts.
use std::path::PathBuf;

use anyhow::{Context as _, Result};

use super::{Context, Task, TaskResult, TaskStats};
use crate::resources::font::{FontArchiveResource, FontFileResource, FontInventory};
use crate::resources::{Applicable, Resource, ResourceChange, ResourceState};

/// Font directory below the home directory.
const FONT_DIR: &str = ".local/share/fonts";

/// Download missing font archives and files, then rebuild the font cache.
#[derive(Debug)]
pub struct InstallFonts;

impl InstallFonts {
    fn font_dir(ctx: &Context) -> PathBuf {
        ctx.home().join(FONT_DIR)
    }

    fn install_archives(ctx: &Context, stats: &mut TaskStats) -> Result<()> {
        let mut inventory = if ctx.dry_run {
            FontInventory::default()
        } else {
            FontInventory::query(&*ctx.executor)
        };
        let archives = &ctx.config.fonts.archives;
        for (idx, archive) in archives.iter().enumerate() {
            let progress = format!("[{}/{}]", idx + 1, archives.len());
            if inventory.has_any(&archive.families) {
                ctx.log.info(&format!(
                    "{progress} skipping {} (already installed)",
                    archive.url
                ));
                stats.already_ok += 1;
                continue;
            }
            if ctx.dry_run {
                ctx.log
                    .dry_run(&format!("{progress} would install {}", archive.url));
                stats.changed += 1;
                continue;
            }

            ctx.log
                .info(&format!("{progress} downloading {}", archive.url));
            let resource = FontArchiveResource::new(
                archive,
                Self::font_dir(ctx),
                &*ctx.fetcher,
                &*ctx.executor,
            );
            if let ResourceChange::Skipped { reason } = resource.apply()? {
                ctx.log.warn(&format!("{}: {reason}", resource.description()));
                stats.skipped += 1;
            } else {
                stats.changed += 1;
            }
            inventory.add(archive.families.iter().map(String::as_str));
        }
        Ok(())
    }

    fn install_files(ctx: &Context, stats: &mut TaskStats) -> Result<()> {
        let font_dir = Self::font_dir(ctx);
        let files = &ctx.config.fonts.files;
        for (idx, file) in files.iter().enumerate() {
            let progress = format!("[{}/{}]", idx + 1, files.len());
            let resource = FontFileResource::new(file, &font_dir, &*ctx.fetcher);
            if resource.current_state()? == ResourceState::Correct {
                ctx.log.info(&format!(
                    "{progress} skipping {} (already installed)",
                    resource.description()
                ));
                stats.already_ok += 1;
                continue;
            }
            if ctx.dry_run {
                ctx.log.dry_run(&format!(
                    "{progress} would download {}",
                    resource.description()
                ));
            } else {
                ctx.log.info(&format!(
                    "{progress} downloading {}",
                    resource.description()
                ));
                resource.apply()?;
            }
            stats.changed += 1;
        }
        Ok(())
    }
}

impl Task for InstallFonts {
    fn name(&self) -> &'static str {
        "Install fonts"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.setup.installs_tools()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let mut stats = TaskStats::new();
        Self::install_archives(ctx, &mut stats)?;
        Self::install_files(ctx, &mut stats)?;

        if ctx.dry_run {
            ctx.log.dry_run("would run 'fc-cache -f'");
        } else {
            ctx.log.info("rebuilding font cache with 'fc-cache -f'");
            ctx.executor
                .run("fc-cache", &["-f"])
                .context("rebuilding font cache")?;
        }
        ctx.log.info(
            "remember to configure 'MesloLGS NF' as the default font \
             (see https://github.com/romkatv/powerlevel10k/blob/master/font.md)",
        );
        Ok(stats.finish(ctx))
    }
}
