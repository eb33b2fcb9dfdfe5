//! Non-fatal problems collected while indexing, resolving and copying.
//!
//! Every phase hands its diagnostics back to the caller instead of printing
//! them, so the binary decides how they look and tests can assert on them.

use colored::*;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Diagnostic {
    /// Two module files share a name; the first one found is kept.
    #[error("there is more than one module with name {name}: keeping {}, ignoring {}", .kept.display(), .ignored.display())]
    DuplicateModule {
        name: String,
        kept: PathBuf,
        ignored: PathBuf,
    },

    /// A requested name or a declared dependency is not in the index.
    #[error("{name} not found{}", .wanted_by.as_ref().map(|m| format!(" (required by {m})")).unwrap_or_default())]
    NotFound {
        name: String,
        wanted_by: Option<String>,
    },

    /// The metadata tool ran but its output was unusable.
    #[error("bad module information for {module}: {reason}")]
    MalformedMetadata { module: String, reason: String },

    /// Attribution walk hit the depth bound.
    #[error("dependency tree is too deep (below {root}, at {module})")]
    TreeTooDeep { root: String, module: String },

    #[error("can't create directory {}: {source}", .dir.display())]
    CreateDir {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reported once per run; later files fall back to copying silently.
    #[error("can't make hard link for file {}: {source}; copying instead", .src.display())]
    HardLinkFailed {
        src: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("can't copy {} to {}: {source}", .src.display(), .dst.display())]
    CopyFailed {
        src: PathBuf,
        dst: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("firmware {name} not found in {}", .dir.display())]
    FirmwareMissing { name: String, dir: PathBuf },
}

impl Diagnostic {
    /// Failures that lose a file from the staged set, as opposed to warnings.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Diagnostic::CreateDir { .. }
                | Diagnostic::CopyFailed { .. }
                | Diagnostic::FirmwareMissing { .. }
        )
    }
}

/// Print diagnostics to stderr in the order given.
pub fn report(diagnostics: &[Diagnostic]) {
    for diag in diagnostics {
        if diag.is_failure() {
            eprintln!("{} {}", "x".red(), diag);
        } else {
            eprintln!("{} {}", "!".yellow(), diag);
        }
    }
}
