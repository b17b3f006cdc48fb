//! Host environment detection.
use std::path::Path;

use crate::exec::Executor;

/// Marker file present inside Docker containers.
pub const DOCKER_ENV_MARKER: &str = "/.dockerenv";

/// Display managers whose active unit implies a desktop session.
const DISPLAY_MANAGERS: &[&str] = &["gdm", "gdm3", "lightdm", "sddm"];

/// Facts about the host that change what a run does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Platform {
    /// Running inside a container; existing targets are left alone by default
    /// and the container bootstrap runs.
    pub in_container: bool,
    /// A graphical environment is available.
    pub has_ui: bool,
}

impl Platform {
    /// Detect the current host.
    #[must_use]
    pub fn detect(executor: &dyn Executor) -> Self {
        Self {
            in_container: Path::new(DOCKER_ENV_MARKER).is_file(),
            has_ui: detect_ui(executor, |key| std::env::var_os(key)),
        }
    }

    /// Create a platform with explicit values.
    #[must_use]
    pub const fn new(in_container: bool, has_ui: bool) -> Self {
        Self {
            in_container,
            has_ui,
        }
    }
}

/// Whether a graphical session is reachable from this host.
///
/// Checks `DISPLAY` and `WAYLAND_DISPLAY`, then `gnome-shell` on `PATH`, then
/// whether any known display manager unit is active.
fn detect_ui<F>(executor: &dyn Executor, env: F) -> bool
where
    F: Fn(&str) -> Option<std::ffi::OsString>,
{
    let set = |key: &str| env(key).is_some_and(|v| !v.is_empty());
    if set("DISPLAY") || set("WAYLAND_DISPLAY") {
        return true;
    }
    if executor.which("gnome-shell") {
        return true;
    }
    if !executor.which("systemctl") {
        return false;
    }
    DISPLAY_MANAGERS.iter().any(|dm| {
        executor
            .run_unchecked("systemctl", &["is-active", dm])
            .is_ok_and(|r| r.success)
    })
}
