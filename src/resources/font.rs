//! Font resources: downloaded archives and individual font files.
use std::collections::HashSet;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use walkdir::WalkDir;

use super::helpers::fs::move_file;
use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::config::fonts::{FontArchive, FontFile};
use crate::exec::Executor;
use crate::fetch::Fetcher;

/// File extensions installed from font archives.
const FONT_EXTENSIONS: &[&str] = &["ttf", "otf", "ttc"];

/// Lower-case a family name and drop everything but letters and digits, so
/// "Fira Code" and "firacode" compare equal.
#[must_use]
pub fn normalize_family(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Font families known to be installed, normalised with [`normalize_family`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FontInventory {
    families: HashSet<String>,
}

impl FontInventory {
    /// Query installed families with `fc-list : family`.
    ///
    /// An absent or failing `fc-list` yields an empty inventory.
    #[must_use]
    pub fn query(executor: &dyn Executor) -> Self {
        if !executor.which("fc-list") {
            return Self::default();
        }
        match executor.run_unchecked("fc-list", &[":", "family"]) {
            Ok(result) if result.success => Self::from_fc_list(&result.stdout),
            _ => Self::default(),
        }
    }

    /// Parse `fc-list : family` output: one comma-separated list per line.
    #[must_use]
    pub fn from_fc_list(output: &str) -> Self {
        let mut inventory = Self::default();
        inventory.add(output.lines().flat_map(|line| line.split(',')));
        inventory
    }

    /// Record families as installed.
    pub fn add<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        self.families.extend(
            names
                .into_iter()
                .map(normalize_family)
                .filter(|n| !n.is_empty()),
        );
    }

    /// Whether any of `hints` names an installed family.
    #[must_use]
    pub fn has_any(&self, hints: &[String]) -> bool {
        hints
            .iter()
            .map(|h| normalize_family(h))
            .any(|h| !h.is_empty() && self.families.contains(&h))
    }
}

/// A zip archive of fonts, extracted into the font directory.
///
/// Presence is decided from the bulk [`FontInventory`] query, so this only
/// implements [`Applicable`].
#[derive(Debug)]
pub struct FontArchiveResource<'a> {
    archive: &'a FontArchive,
    font_dir: PathBuf,
    fetcher: &'a dyn Fetcher,
    executor: &'a dyn Executor,
}

impl<'a> FontArchiveResource<'a> {
    /// Create a new font archive resource.
    #[must_use]
    pub const fn new(
        archive: &'a FontArchive,
        font_dir: PathBuf,
        fetcher: &'a dyn Fetcher,
        executor: &'a dyn Executor,
    ) -> Self {
        Self {
            archive,
            font_dir,
            fetcher,
            executor,
        }
    }
}

impl Applicable for FontArchiveResource<'_> {
    fn description(&self) -> String {
        self.archive.url.clone()
    }

    fn apply(&self) -> Result<ResourceChange> {
        if !self.executor.which("unzip") {
            return Ok(ResourceChange::Skipped {
                reason: "'unzip' not found".to_string(),
            });
        }
        let bytes = self.fetcher.fetch(&self.archive.url)?;
        let staging = tempfile::tempdir().context("creating font staging directory")?;
        let zip_path = staging.path().join("fonts.zip");
        std::fs::write(&zip_path, bytes)
            .with_context(|| format!("writing {}", zip_path.display()))?;
        let extract_dir = staging.path().join("extracted");
        std::fs::create_dir_all(&extract_dir)
            .with_context(|| format!("creating {}", extract_dir.display()))?;
        let zip_arg = zip_path.to_string_lossy();
        let out_arg = extract_dir.to_string_lossy();
        self.executor
            .run("unzip", &["-o", "-q", &zip_arg, "-d", &out_arg])
            .with_context(|| format!("extracting {}", self.archive.url))?;

        let moved = move_font_files(&extract_dir, &self.font_dir)?;
        if moved == 0 {
            return Ok(ResourceChange::Skipped {
                reason: "archive contains no font files".to_string(),
            });
        }
        Ok(ResourceChange::Applied)
    }
}

/// Move every font file below `from` into `font_dir`. Returns the count.
fn move_font_files(from: &Path, font_dir: &Path) -> Result<usize> {
    let mut moved = 0;
    for entry in WalkDir::new(from).min_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("reading {}", from.display()))?;
        if !entry.file_type().is_file() || !is_font_file(entry.path()) {
            continue;
        }
        move_file(entry.path(), &font_dir.join(entry.file_name()))?;
        moved += 1;
    }
    Ok(moved)
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| FONT_EXTENSIONS.iter().any(|f| f.eq_ignore_ascii_case(ext)))
}

/// A single font file placed directly in the font directory.
#[derive(Debug)]
pub struct FontFileResource<'a> {
    file: &'a FontFile,
    target: PathBuf,
    fetcher: &'a dyn Fetcher,
}

impl<'a> FontFileResource<'a> {
    /// Create a new font file resource targeting `font_dir`.
    #[must_use]
    pub fn new(file: &'a FontFile, font_dir: &Path, fetcher: &'a dyn Fetcher) -> Self {
        Self {
            target: font_dir.join(file.file_name()),
            file,
            fetcher,
        }
    }
}

impl Applicable for FontFileResource<'_> {
    fn description(&self) -> String {
        self.file.file_name()
    }

    fn apply(&self) -> Result<ResourceChange> {
        let bytes = self.fetcher.fetch(&self.file.url)?;
        let dir = self
            .target
            .parent()
            .context("font target has no parent directory")?;
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        let mut staged = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("staging font in {}", dir.display()))?;
        staged
            .write_all(&bytes)
            .with_context(|| format!("writing {}", self.target.display()))?;
        staged
            .persist(&self.target)
            .with_context(|| format!("installing {}", self.target.display()))?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for FontFileResource<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        if self.target.exists() {
            Ok(ResourceState::Correct)
        } else {
            Ok(ResourceState::Missing)
        }
    }
}
