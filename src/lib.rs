//! # copyko - Kernel Module Stager
//!
//! copyko copies a set of kernel modules, everything they depend on and the
//! firmware they reference into a destination tree. It is meant for building
//! small boot images and live systems without tracking module dependencies by
//! hand.
//!
//! ## Quick Start
//!
//! ```bash
//! # Stage ext4 and e1000e (plus dependencies) for the running kernel
//! copyko ext4 e1000e /tmp/initrd/lib/modules/$(uname -r)
//! ```
//!
//! ## Module Organization
//!
//! - [`index`] - Module file discovery under a source root
//! - [`modinfo`] - Module metadata (dependencies, firmware)
//! - [`resolver`] - Memoized dependency closure and firmware collection
//! - [`attribution`] - Which requested module pulls in which dependency
//! - [`materialize`] - Copying or hard-linking the result
//! - [`config`] - Run configuration and directory defaults

/// Which requested modules pull in which dependencies.
pub mod attribution;

/// Run configuration and default directories.
pub mod config;

/// Non-fatal diagnostics.
pub mod diagnostics;

/// Fatal errors.
pub mod error;

/// Module index built from a source tree.
pub mod index;

/// Copying and hard-linking into the destination.
pub mod materialize;

/// Module metadata provider and `modinfo` output parsing.
pub mod modinfo;

/// Dependency resolution.
pub mod resolver;

/// Terminal UI utilities (tables, spinner).
pub mod ui;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{Error, Result};
