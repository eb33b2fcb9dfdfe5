//! In-memory metadata provider for unit tests.

use crate::index::{ModuleIndex, module_name};
use crate::modinfo::{MetadataProvider, ModuleInfo, QueryError};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Answers queries from a fixed table and counts them per module.
#[derive(Debug, Default)]
pub struct FakeProvider {
    modules: BTreeMap<String, Option<ModuleInfo>>,
    queries: HashMap<String, usize>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn module(mut self, name: &str, depends: &[&str], firmware: &[&str]) -> Self {
        let info = ModuleInfo {
            depends: depends.iter().map(|s| s.to_string()).collect(),
            firmware: firmware.iter().map(|s| s.to_string()).collect(),
        };
        self.modules.insert(name.to_string(), Some(info));
        self
    }

    /// A module whose metadata cannot be parsed.
    pub fn malformed(mut self, name: &str) -> Self {
        self.modules.insert(name.to_string(), None);
        self
    }

    /// Index with one `<name>.ko` per known module under `/modules`.
    pub fn index(&self) -> ModuleIndex {
        let (index, _) = ModuleIndex::from_entries(
            Path::new("/modules"),
            self.modules.keys().map(|n| (n.clone(), format!("{n}.ko"))),
        );
        index
    }

    pub fn queries(&self, name: &str) -> usize {
        self.queries.get(name).copied().unwrap_or(0)
    }
}

impl MetadataProvider for FakeProvider {
    fn query(&mut self, module: &Path) -> Result<ModuleInfo, QueryError> {
        let name = module
            .file_name()
            .and_then(|f| f.to_str())
            .and_then(module_name)
            .unwrap_or_default()
            .to_string();
        *self.queries.entry(name.clone()).or_default() += 1;

        match self.modules.get(&name) {
            Some(Some(info)) => Ok(info.clone()),
            Some(None) => Err(QueryError::Malformed("no \"depends:\" line".to_string())),
            None => Err(QueryError::Malformed(format!("unknown module {name}"))),
        }
    }
}
