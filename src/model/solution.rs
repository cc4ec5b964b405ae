//! The solution model.

use std::collections::HashSet;

use camino::Utf8PathBuf;
use indexmap::IndexMap;
use serde::Serialize;

use super::{ConfigurationName, Project, ProjectId};
use crate::diagnostics::Warning;

/// A parsed solution: its projects in declaration order plus whatever was
/// recorded while parsing leniently.
///
/// Solutions are immutable snapshots; concurrent readers need no locking.
#[derive(Clone, Debug, Serialize)]
pub struct Solution {
    /// Absolute path of the `.sln` file.
    pub path: Utf8PathBuf,
    /// Projects keyed by id.
    pub projects: IndexMap<ProjectId, Project>,
    /// Solution configurations such as `Debug|x64`.
    pub configurations: Vec<ConfigurationName>,
    /// Per project, the project configuration each solution configuration
    /// builds (`ActiveCfg`).
    pub project_configurations: IndexMap<ProjectId, IndexMap<ConfigurationName, ConfigurationName>>,
    /// Non-fatal findings.
    pub warnings: Vec<Warning>,
}

impl Solution {
    /// Look up a project by id.
    #[must_use]
    pub fn project(&self, id: &ProjectId) -> Option<&Project> {
        self.projects.get(id)
    }

    /// The configuration of `project` that `solution_configuration` builds,
    /// when the solution maps one.
    #[must_use]
    pub fn project_configuration(
        &self,
        project: &ProjectId,
        solution_configuration: &ConfigurationName,
    ) -> Option<&ConfigurationName> {
        self.project_configurations
            .get(project)
            .and_then(|mapping| mapping.get(solution_configuration))
    }

    /// Look up a project by display name, ignoring ASCII case.
    #[must_use]
    pub fn project_by_name(&self, name: &str) -> Option<&Project> {
        self.projects
            .values()
            .find(|project| project.name.eq_ignore_ascii_case(name))
    }

    /// Every project reachable from `id` through references, in depth-first
    /// pre-order, excluding `id` itself.
    #[must_use]
    pub fn transitive_references(&self, id: &ProjectId) -> Vec<ProjectId> {
        let mut seen = HashSet::from([*id]);
        let mut order = Vec::new();
        let mut stack: Vec<ProjectId> = self
            .project(id)
            .map(|project| project.references.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(next) = stack.pop() {
            if !seen.insert(next) {
                continue;
            }
            order.push(next);
            if let Some(project) = self.project(&next) {
                stack.extend(project.references.iter().rev().copied());
            }
        }
        order
    }
}
