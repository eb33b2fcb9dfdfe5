//! Placing resolved modules and firmware into the destination trees.
//!
//! Every file is handled independently: a failure is recorded as a
//! diagnostic and the next file is processed. Existing destination files are
//! left alone and count as already present.

use crate::config::Config;
use crate::diagnostics::Diagnostic;
use crate::resolver::Resolution;
use colored::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Suffixes tried, in order, when looking for a firmware file.
pub const FIRMWARE_SUFFIXES: &[&str] = &["", ".zst", ".xz"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaceMode {
    #[default]
    Copy,
    /// Try a hard link first, copy if that fails.
    HardLink,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Linked,
    Copied,
    AlreadyPresent,
}

/// Counters and diagnostics for one run.
#[derive(Debug, Default)]
pub struct PlacementReport {
    pub linked: usize,
    pub copied: usize,
    pub present: usize,
    pub failed: usize,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct Materializer {
    mode: PlaceMode,
    verbose: bool,
    link_failure_reported: bool,
    hard_link: fn(&Path, &Path) -> io::Result<()>,
    report: PlacementReport,
}

impl Materializer {
    pub fn new(mode: PlaceMode, verbose: bool) -> Self {
        Self {
            mode,
            verbose,
            link_failure_reported: false,
            hard_link: |src, dst| fs::hard_link(src, dst),
            report: PlacementReport::default(),
        }
    }

    #[cfg(test)]
    fn with_link_fn(mut self, hard_link: fn(&Path, &Path) -> io::Result<()>) -> Self {
        self.hard_link = hard_link;
        self
    }

    /// Place one file, creating the destination directories first.
    pub fn place(&mut self, src: &Path, dst: &Path) -> Option<Placement> {
        if self.verbose {
            println!("{} {} {}", src.display(), "=>".dimmed(), dst.display());
        }

        if let Some(dir) = dst.parent()
            && !dir.as_os_str().is_empty()
            && let Err(source) = fs::create_dir_all(dir)
        {
            self.fail(Diagnostic::CreateDir {
                dir: dir.to_path_buf(),
                source,
            });
            return None;
        }

        if self.mode == PlaceMode::HardLink {
            match (self.hard_link)(src, dst) {
                Ok(()) => return Some(self.record(Placement::Linked)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    return Some(self.record(Placement::AlreadyPresent));
                }
                // A missing source is reported by the copy below.
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(source) if !self.link_failure_reported => {
                    self.link_failure_reported = true;
                    self.report.diagnostics.push(Diagnostic::HardLinkFailed {
                        src: src.to_path_buf(),
                        source,
                    });
                }
                Err(e) => trace!("hard link {} failed: {}", src.display(), e),
            }
        }

        if fs::symlink_metadata(dst).is_ok() {
            return Some(self.record(Placement::AlreadyPresent));
        }

        match fs::copy(src, dst) {
            Ok(_) => Some(self.record(Placement::Copied)),
            Err(source) => {
                self.fail(Diagnostic::CopyFailed {
                    src: src.to_path_buf(),
                    dst: dst.to_path_buf(),
                    source,
                });
                None
            }
        }
    }

    /// Place every resolved module, then every firmware file.
    pub fn stage(&mut self, config: &Config, resolution: &Resolution<'_>) {
        for module in resolution.modules.values() {
            self.place(&config.source.join(module.path), &config.dest.join(module.path));
        }

        for name in &resolution.firmware {
            match locate_firmware(&config.fw_source, name) {
                Some(found) => {
                    let file = found.strip_prefix(&config.fw_source).unwrap_or(&found);
                    let dst = config.fw_dest.join(file);
                    self.place(&found, &dst);
                }
                None => self.fail(Diagnostic::FirmwareMissing {
                    name: name.clone(),
                    dir: config.fw_source.clone(),
                }),
            }
        }
    }

    pub fn finish(self) -> PlacementReport {
        self.report
    }

    fn record(&mut self, placement: Placement) -> Placement {
        match placement {
            Placement::Linked => self.report.linked += 1,
            Placement::Copied => self.report.copied += 1,
            Placement::AlreadyPresent => self.report.present += 1,
        }
        placement
    }

    fn fail(&mut self, diagnostic: Diagnostic) {
        self.report.failed += 1;
        self.report.diagnostics.push(diagnostic);
    }
}

/// Find `name` under `dir`, allowing for a compressed copy.
pub fn locate_firmware(dir: &Path, name: &str) -> Option<PathBuf> {
    FIRMWARE_SUFFIXES
        .iter()
        .map(|suffix| dir.join(format!("{name}{suffix}")))
        .find(|candidate| candidate.is_file())
}
