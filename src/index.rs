//! Module index: every module file under a source root, keyed by name.
//!
//! The module name is the file name with its module suffix removed, so
//! `kernel/net/ipv6/netfilter/ip6_tables.ko` is indexed as `ip6_tables`.
//! Names are not unique across a tree; the first file found wins and the
//! collision is reported.

use crate::diagnostics::Diagnostic;
use crate::error::{Error, Result};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};
use walkdir::WalkDir;

/// File name suffixes recognized as kernel modules, plain one first.
pub const MODULE_SUFFIXES: &[&str] = &[".ko", ".ko.xz", ".ko.zst", ".ko.gz"];

/// Module name for a file name, if the file is a module.
pub fn module_name(file_name: &str) -> Option<&str> {
    MODULE_SUFFIXES
        .iter()
        .find_map(|suffix| file_name.strip_suffix(suffix))
        .filter(|stem| !stem.is_empty())
}

/// The kernel treats `-` and `_` in module names as the same character.
pub fn normalize(name: &str) -> Cow<'_, str> {
    if name.contains('-') {
        Cow::Owned(name.replace('-', "_"))
    } else {
        Cow::Borrowed(name)
    }
}

#[derive(Debug, Default)]
pub struct ModuleIndex {
    root: PathBuf,
    modules: BTreeMap<String, PathBuf>,
    /// Normalized name -> indexed name, for lookups that differ only in `-`/`_`.
    aliases: BTreeMap<String, String>,
}

impl ModuleIndex {
    /// Walk `root` and index every module file below it.
    ///
    /// Entries that cannot be read are skipped; a partial index is fine since
    /// missing modules are reported one by one during resolution.
    pub fn scan(root: &Path) -> Result<(Self, Vec<Diagnostic>)> {
        if !root.is_dir() {
            return Err(Error::SourceRootMissing {
                path: root.to_path_buf(),
            });
        }

        let mut index = Self {
            root: root.to_path_buf(),
            ..Self::default()
        };
        let mut diagnostics = Vec::new();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    debug!("skipping unreadable entry: {}", e);
                    continue;
                }
            };

            let is_file = entry.file_type().is_file()
                || (entry.path_is_symlink() && entry.path().is_file());
            if !is_file {
                continue;
            }

            let Some(name) = entry.file_name().to_str().and_then(module_name) else {
                continue;
            };
            let Ok(rel) = entry.path().strip_prefix(root) else {
                continue;
            };

            trace!("indexed {} -> {}", name, rel.display());
            if let Some(diag) = index.insert(name.to_string(), rel.to_path_buf()) {
                diagnostics.push(diag);
            }
        }

        info!(
            "indexed {} modules under {}",
            index.modules.len(),
            root.display()
        );
        Ok((index, diagnostics))
    }

    /// Build an index from already known `(name, relative path)` pairs, in order.
    pub fn from_entries<I, N, P>(root: &Path, entries: I) -> (Self, Vec<Diagnostic>)
    where
        I: IntoIterator<Item = (N, P)>,
        N: Into<String>,
        P: Into<PathBuf>,
    {
        let mut index = Self {
            root: root.to_path_buf(),
            ..Self::default()
        };
        let diagnostics = entries
            .into_iter()
            .filter_map(|(name, path)| index.insert(name.into(), path.into()))
            .collect();
        (index, diagnostics)
    }

    fn insert(&mut self, name: String, path: PathBuf) -> Option<Diagnostic> {
        if let Some(kept) = self.modules.get(&name) {
            return Some(Diagnostic::DuplicateModule {
                name,
                kept: kept.clone(),
                ignored: path,
            });
        }
        self.aliases
            .entry(normalize(&name).into_owned())
            .or_insert_with(|| name.clone());
        self.modules.insert(name, path);
        None
    }

    /// Find a module by name, returning its indexed name and relative path.
    pub fn lookup(&self, name: &str) -> Option<(&str, &Path)> {
        if let Some((key, path)) = self.modules.get_key_value(name) {
            return Some((key.as_str(), path.as_path()));
        }
        let canonical = self.aliases.get(normalize(name).as_ref())?;
        self.modules
            .get_key_value(canonical)
            .map(|(key, path)| (key.as_str(), path.as_path()))
    }

    pub fn get(&self, name: &str) -> Option<&Path> {
        self.lookup(name).map(|(_, path)| path)
    }

    /// Source root the relative paths are based on.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// All modules in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.modules.iter().map(|(n, p)| (n.as_str(), p.as_path()))
    }
}
