//! Run configuration and the defaults derived from the running system.

use crate::error::{Error, Result};
use crate::materialize::PlaceMode;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Everything a run needs, with all defaults filled in.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Module source root.
    pub source: PathBuf,
    /// Module destination root.
    pub dest: PathBuf,
    pub fw_source: PathBuf,
    pub fw_dest: PathBuf,
    pub mode: PlaceMode,
    pub verbose: bool,
    pub dry_run: bool,
    /// Metadata query program.
    pub modinfo: String,
    /// Requested module names, sorted and deduplicated.
    pub modules: Vec<String>,
}

/// Release of the running kernel, e.g. `6.8.0-45-generic`.
pub fn kernel_release() -> Result<String> {
    if let Ok(release) = fs::read_to_string("/proc/sys/kernel/osrelease") {
        let release = release.trim();
        if !release.is_empty() {
            return Ok(release.to_string());
        }
    }

    let output = Command::new("uname")
        .arg("-r")
        .output()
        .map_err(Error::KernelRelease)?;
    let release = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if !output.status.success() || release.is_empty() {
        return Err(Error::KernelRelease(std::io::Error::other(
            "uname -r printed no release",
        )));
    }
    Ok(release)
}

/// `/lib/modules/<release>` for the running kernel.
pub fn default_source_dir() -> Result<PathBuf> {
    Ok(Path::new("/lib/modules").join(kernel_release()?))
}

/// Firmware directory two levels above a module directory:
/// `/lib/modules/6.8.0` gives `/lib/firmware`.
pub fn firmware_dir_for(module_dir: &Path) -> PathBuf {
    module_dir
        .parent()
        .and_then(Path::parent)
        .unwrap_or(Path::new(""))
        .join("firmware")
}

/// Sort and deduplicate requested module names.
pub fn normalize_module_list(mut modules: Vec<String>) -> Vec<String> {
    modules.sort();
    modules.dedup();
    modules
}
