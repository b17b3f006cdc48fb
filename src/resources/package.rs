//! Apt package resource.
use anyhow::Result;

use super::{Resource, ResourceState};
use crate::exec::Executor;

/// Reason recorded when a package is missing from every apt source.
pub const NOT_IN_SOURCES: &str = "not found in apt repositories";

/// Reason recorded when availability cannot be checked without `apt-cache`.
pub const UNVERIFIABLE: &str = "availability cannot be verified without apt-cache";

/// A Debian package that can be checked and installed with apt.
#[derive(Debug)]
pub struct AptPackage<'a> {
    /// Package name.
    pub name: String,
    /// Whether `apt-cache` is available for availability checks.
    can_verify: bool,
    /// Executor for running dpkg/apt commands.
    executor: &'a dyn Executor,
}

impl<'a> AptPackage<'a> {
    /// Create a new package resource.
    #[must_use]
    pub const fn new(name: String, can_verify: bool, executor: &'a dyn Executor) -> Self {
        Self {
            name,
            can_verify,
            executor,
        }
    }

    fn is_installed(&self) -> Result<bool> {
        Ok(self
            .executor
            .run_unchecked("dpkg", &["-s", &self.name])?
            .success)
    }

    fn is_available(&self) -> Result<bool> {
        let result = self
            .executor
            .run_unchecked("apt-cache", &["show", &self.name])?;
        Ok(result.success && !result.stdout.trim().is_empty())
    }
}

impl Resource for AptPackage<'_> {
    /// `Correct` when installed, `Missing` when installable, `Invalid` when
    /// the package is not available (or cannot be verified).
    fn current_state(&self) -> Result<ResourceState> {
        if self.is_installed()? {
            return Ok(ResourceState::Correct);
        }
        if !self.can_verify {
            return Ok(ResourceState::Invalid {
                reason: UNVERIFIABLE.to_string(),
            });
        }
        if self.is_available()? {
            Ok(ResourceState::Missing)
        } else {
            Ok(ResourceState::Invalid {
                reason: NOT_IN_SOURCES.to_string(),
            })
        }
    }
}

/// Packages split by their current state.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Classified {
    /// Not installed but installable.
    pub available: Vec<String>,
    /// Not installed and not installable (or not verifiable).
    pub unavailable: Vec<String>,
    /// Already installed.
    pub installed: Vec<String>,
}

/// Classify packages with one `dpkg -s` (and, if needed, one
/// `apt-cache show`) per package.
///
/// # Errors
///
/// Returns an error if a query command cannot be spawned.
pub fn classify(packages: &[AptPackage<'_>]) -> Result<Classified> {
    let mut out = Classified::default();
    for package in packages {
        let bucket = match package.current_state()? {
            ResourceState::Correct => &mut out.installed,
            ResourceState::Missing | ResourceState::Incorrect { .. } => &mut out.available,
            ResourceState::Invalid { .. } => &mut out.unavailable,
        };
        bucket.push(package.name.clone());
    }
    Ok(out)
}

/// Install a batch of packages in a single `sudo apt-get install -y` call.
///
/// # Errors
///
/// Returns an error if the install command fails.
pub fn batch_install_packages(executor: &dyn Executor, names: &[String]) -> Result<()> {
    if names.is_empty() {
        return Ok(());
    }
    let mut args = vec!["apt-get", "install", "-y"];
    args.extend(names.iter().map(String::as_str));
    executor.run("sudo", &args)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::MockExecutor;

    fn package<'a>(name: &str, executor: &'a MockExecutor) -> AptPackage<'a> {
        AptPackage::new(name.to_string(), true, executor)
    }

    // ------------------------------------------------------------------
    // current_state
    // ------------------------------------------------------------------

    #[test]
    fn installed_package_is_correct() {
        let executor = MockExecutor::ok("Status: install ok installed");
        assert_eq!(
            package("git", &executor).current_state().unwrap(),
            ResourceState::Correct
        );
        assert_eq!(executor.call_count(), 1, "apt-cache not consulted");
    }

    #[test]
    fn available_package_is_missing() {
        let executor = MockExecutor::with_responses(vec![
            (false, String::new()),
            (true, "Package: tmux\nVersion: 3.3".to_string()),
        ]);
        assert_eq!(
            package("tmux", &executor).current_state().unwrap(),
            ResourceState::Missing
        );
    }

    #[test]
    fn empty_apt_cache_output_means_unavailable() {
        let executor =
            MockExecutor::with_responses(vec![(false, String::new()), (true, "  \n".to_string())]);
        let state = package("nope", &executor).current_state().unwrap();
        assert_eq!(
            state,
            ResourceState::Invalid {
                reason: NOT_IN_SOURCES.to_string()
            }
        );
    }

    #[test]
    fn unverifiable_without_apt_cache() {
        let executor = MockExecutor::fail();
        let pkg = AptPackage::new("tmux".to_string(), false, &executor);
        assert_eq!(
            pkg.current_state().unwrap(),
            ResourceState::Invalid {
                reason: UNVERIFIABLE.to_string()
            }
        );
        assert_eq!(executor.call_count(), 1);
    }

    // ------------------------------------------------------------------
    // classify / install
    // ------------------------------------------------------------------

    #[test]
    fn classify_sorts_into_buckets() {
        let executor = MockExecutor::with_responses(vec![
            (true, "installed".to_string()),
            (false, String::new()),
            (true, "Package: b".to_string()),
            (false, String::new()),
            (false, String::new()),
        ]);
        let packages = vec![
            package("a", &executor),
            package("b", &executor),
            package("c", &executor),
        ];

        let classified = classify(&packages).unwrap();

        assert_eq!(
            classified,
            Classified {
                available: vec!["b".to_string()],
                unavailable: vec!["c".to_string()],
                installed: vec!["a".to_string()],
            }
        );
    }

    #[test]
    fn batch_install_runs_one_command() {
        let executor = MockExecutor::ok("");
        batch_install_packages(&executor, &["git".to_string(), "zsh".to_string()]).unwrap();
        assert_eq!(executor.call_count(), 1);
    }

    #[test]
    fn batch_install_of_nothing_runs_nothing() {
        let executor = MockExecutor::ok("");
        batch_install_packages(&executor, &[]).unwrap();
        assert_eq!(executor.call_count(), 0);
    }

    #[test]
    fn batch_install_failure_is_an_error() {
        let executor = MockExecutor::fail();
        assert!(batch_install_packages(&executor, &["git".to_string()]).is_err());
    }
}
