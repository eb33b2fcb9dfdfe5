//! Attribution: which requested modules pull in which dependencies.
//!
//! Runs only for verbose reporting, over an already finished
//! [`Resolution`]; it never queries metadata. Each requested module's closure
//! is walked breadth-first with its own visited set, so cyclic metadata
//! terminates and every module is first reached at its shallowest depth. The
//! walk depth is bounded as well.

use crate::diagnostics::Diagnostic;
use crate::resolver::{Resolution, ResolvedModule};
use std::collections::{BTreeSet, VecDeque};

/// Depth bound for a single attribution walk.
pub const MAX_DEPTH: usize = 1024;

/// Fill `required_by` for every module reachable from a requested one.
pub fn attribute(resolution: &mut Resolution<'_>) -> Vec<Diagnostic> {
    attribute_with_limit(resolution, MAX_DEPTH)
}

pub fn attribute_with_limit(resolution: &mut Resolution<'_>, max_depth: usize) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for module in resolution.modules.values_mut() {
        module.required_by.clear();
    }
    let roots: Vec<String> = resolution.requested().map(str::to_string).collect();

    for root in &roots {
        let Some(start) = resolution.modules.get(root) else {
            continue;
        };
        // The root is pre-visited so a cycle never tags it with itself.
        let mut visited = BTreeSet::from([root.clone()]);
        let mut queue: VecDeque<(String, usize)> =
            start.dependencies.iter().map(|d| (d.clone(), 0)).collect();

        while let Some((name, depth)) = queue.pop_front() {
            if visited.contains(&name) {
                continue;
            }
            if depth > max_depth {
                // Later paths to this module are no shallower.
                visited.insert(name.clone());
                diagnostics.push(Diagnostic::TreeTooDeep {
                    root: root.clone(),
                    module: name,
                });
                continue;
            }
            // Dependencies that were not found have no entry.
            let Some(module) = resolution.modules.get_mut(&name) else {
                continue;
            };
            module.required_by.insert(root.clone());
            queue.extend(module.dependencies.iter().map(|d| (d.clone(), depth + 1)));
            visited.insert(name);
        }
    }

    diagnostics
}

impl<'a> Resolution<'a> {
    /// Modules present only because a requested module needs them.
    pub fn pulled_in(&self) -> impl Iterator<Item = (&str, &ResolvedModule<'a>)> {
        self.modules
            .iter()
            .filter(|(_, m)| !m.requested_directly && !m.required_by.is_empty())
            .map(|(n, m)| (n.as_str(), m))
    }

    /// Requested modules that another requested module already pulls in,
    /// so naming them on the command line is redundant.
    pub fn redundant_requests(&self) -> impl Iterator<Item = (&str, &ResolvedModule<'a>)> {
        self.modules
            .iter()
            .filter(|(_, m)| m.requested_directly && !m.required_by.is_empty())
            .map(|(n, m)| (n.as_str(), m))
    }
}
