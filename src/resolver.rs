//! Dependency resolution.
//!
//! Starting from the requested names, the resolver queries metadata for each
//! module, follows its declared dependencies and collects every firmware file
//! referenced along the way. The memo table (the resolved module map itself)
//! guarantees each module is queried at most once, which also makes cyclic
//! or diamond-shaped metadata terminate.

use crate::diagnostics::Diagnostic;
use crate::error::Result;
use crate::index::ModuleIndex;
use crate::modinfo::{MetadataProvider, ModuleInfo, QueryError};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info};

/// A module that is part of the result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModule<'a> {
    /// Path relative to the source root, borrowed from the index.
    pub path: &'a Path,
    /// Declared dependencies in declaration order. Names found in the index
    /// are stored as indexed; unknown ones as declared.
    pub dependencies: Vec<String>,
    /// Named on the command line.
    pub requested_directly: bool,
    /// Requested modules whose closure contains this one. Filled by
    /// [`attribute`](crate::attribution::attribute).
    pub required_by: BTreeSet<String>,
}

/// Outcome of one resolution run.
#[derive(Debug, Default)]
pub struct Resolution<'a> {
    pub modules: BTreeMap<String, ResolvedModule<'a>>,
    pub firmware: BTreeSet<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl<'a> Resolution<'a> {
    pub fn get(&self, name: &str) -> Option<&ResolvedModule<'a>> {
        self.modules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Resolved module names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Directly requested modules in sorted order.
    pub fn requested(&self) -> impl Iterator<Item = &str> {
        self.modules
            .iter()
            .filter(|(_, m)| m.requested_directly)
            .map(|(n, _)| n.as_str())
    }
}

pub struct Resolver<'a, 'p, P: MetadataProvider + ?Sized> {
    index: &'a ModuleIndex,
    provider: &'p mut P,
    resolution: Resolution<'a>,
}

impl<'a, 'p, P: MetadataProvider + ?Sized> Resolver<'a, 'p, P> {
    pub fn new(index: &'a ModuleIndex, provider: &'p mut P) -> Self {
        Self {
            index,
            provider,
            resolution: Resolution::default(),
        }
    }

    /// Resolve the closure of `requested`.
    ///
    /// Unknown names are reported and skipped. Only a provider that cannot
    /// run at all makes this fail.
    pub fn resolve<S: AsRef<str>>(mut self, requested: &[S]) -> Result<Resolution<'a>> {
        let index = self.index;
        for name in requested {
            let name = name.as_ref();
            let Some((canonical, _)) = index.lookup(name) else {
                self.resolution.diagnostics.push(Diagnostic::NotFound {
                    name: name.to_string(),
                    wanted_by: None,
                });
                continue;
            };

            self.visit(canonical)?;
            if let Some(module) = self.resolution.modules.get_mut(canonical) {
                module.requested_directly = true;
            }
        }

        info!(
            "resolved {} modules, {} firmware files",
            self.resolution.modules.len(),
            self.resolution.firmware.len()
        );
        Ok(self.resolution)
    }

    /// Depth-first walk from `root`, which must be an indexed name.
    fn visit(&mut self, root: &str) -> Result<()> {
        let index = self.index;
        let mut stack = vec![root.to_string()];

        while let Some(name) = stack.pop() {
            if self.resolution.modules.contains_key(&name) {
                continue;
            }
            let Some(path) = index.get(&name) else {
                continue;
            };

            let info = match self.provider.query(&index.root().join(path)) {
                Ok(info) => info,
                Err(QueryError::Malformed(reason)) => {
                    self.resolution
                        .diagnostics
                        .push(Diagnostic::MalformedMetadata {
                            module: name.clone(),
                            reason,
                        });
                    ModuleInfo::default()
                }
                Err(QueryError::Fatal(e)) => return Err(e),
            };
            debug!("{}: depends [{}]", name, info.depends.join(","));

            self.resolution.firmware.extend(info.firmware);

            let mut dependencies = Vec::with_capacity(info.depends.len());
            for dep in info.depends {
                match index.lookup(&dep) {
                    Some((canonical, _)) => dependencies.push(canonical.to_string()),
                    None => {
                        self.resolution.diagnostics.push(Diagnostic::NotFound {
                            name: dep.clone(),
                            wanted_by: Some(name.clone()),
                        });
                        dependencies.push(dep);
                    }
                }
            }

            // Reverse so dependencies are visited in declaration order.
            stack.extend(
                dependencies
                    .iter()
                    .rev()
                    .filter(|d| {
                        index.get(d).is_some() && !self.resolution.modules.contains_key(*d)
                    })
                    .cloned(),
            );

            self.resolution.modules.insert(
                name,
                ResolvedModule {
                    path,
                    dependencies,
                    requested_directly: false,
                    required_by: BTreeSet::new(),
                },
            );
        }
        Ok(())
    }
}

/// Shorthand for `Resolver::new(index, provider).resolve(requested)`.
pub fn resolve<'a, P, S>(
    index: &'a ModuleIndex,
    provider: &mut P,
    requested: &[S],
) -> Result<Resolution<'a>>
where
    P: MetadataProvider + ?Sized,
    S: AsRef<str>,
{
    Resolver::new(index, provider).resolve(requested)
}
