//! Module metadata: declared dependencies and firmware of a module file.
//!
//! The resolver only sees the [`MetadataProvider`] trait. The real provider,
//! [`Modinfo`], runs `modinfo <path>` and reads its `key: value` output:
//!
//! ```text
//! filename:       /lib/modules/6.8.0/kernel/drivers/net/wireless/intel/iwlwifi/iwlwifi.ko
//! firmware:       iwlwifi-ty-a0-gf-a0-89.ucode
//! firmware:       iwlwifi-so-a0-gf-a0-89.ucode
//! depends:        cfg80211
//! ```
//!
//! `depends:` is always printed, even when empty. `firmware:` may repeat or be
//! absent. Names never contain commas or whitespace.

use crate::error::Error;
use std::path::Path;
use std::process::Command;
use thiserror::Error;
use tracing::debug;

/// What a module declares about itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleInfo {
    pub depends: Vec<String>,
    pub firmware: Vec<String>,
}

#[derive(Debug, Error)]
pub enum QueryError {
    /// The provider itself is unusable; stops the run.
    #[error(transparent)]
    Fatal(#[from] Error),

    /// Only this module's metadata is bad.
    #[error("{0}")]
    Malformed(String),
}

/// Source of module metadata. Called at most once per module per resolution.
pub trait MetadataProvider {
    fn query(&mut self, module: &Path) -> Result<ModuleInfo, QueryError>;
}

/// Split a comma separated list, dropping empty elements.
fn split_list(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse `modinfo` output. Only the first token after each key is read.
pub fn parse_modinfo(output: &str) -> Result<ModuleInfo, String> {
    let mut depends: Option<Vec<String>> = None;
    let mut firmware = Vec::new();

    for line in output.lines() {
        let mut tokens = line.split_whitespace();
        let (Some(key), value) = (tokens.next(), tokens.next().unwrap_or_default()) else {
            continue;
        };
        match key {
            "depends:" => depends.get_or_insert_with(Vec::new).extend(split_list(value)),
            "firmware:" => firmware.extend(split_list(value)),
            _ => {}
        }
    }

    let depends = depends.ok_or_else(|| "no \"depends:\" line in module information".to_string())?;
    Ok(ModuleInfo { depends, firmware })
}

/// Queries metadata by running an external program (normally `modinfo`).
#[derive(Debug, Clone)]
pub struct Modinfo {
    program: String,
}

impl Modinfo {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for Modinfo {
    fn default() -> Self {
        Self::new("modinfo")
    }
}

impl MetadataProvider for Modinfo {
    fn query(&mut self, module: &Path) -> Result<ModuleInfo, QueryError> {
        debug!("running {} {}", self.program, module.display());

        let output = Command::new(&self.program)
            .arg(module)
            .output()
            .map_err(|source| Error::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(QueryError::Malformed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        parse_modinfo(&String::from_utf8_lossy(&output.stdout)).map_err(QueryError::Malformed)
    }
}
