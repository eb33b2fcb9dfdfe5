//! Fatal error type.
//!
//! Anything in here stops the run. Problems that concern a single module or
//! file are [`Diagnostic`](crate::diagnostics::Diagnostic)s instead and never
//! end up as an `Error`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The module source root does not exist or is not a directory.
    #[error("module source directory {} is not a directory", .path.display())]
    SourceRootMissing { path: PathBuf },

    /// The running kernel release could not be determined, so there is no
    /// default module source directory.
    #[error("cannot determine the running kernel release")]
    KernelRelease(#[source] std::io::Error),

    /// The metadata query program could not be started at all.
    #[error("can't run {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
