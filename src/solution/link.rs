//! Reference linking and per-solution derived settings.

use std::collections::{HashMap, HashSet};

use camino::Utf8PathBuf;
use indexmap::IndexMap;

use super::{Builder, SolutionError};
use crate::diagnostics::Warning;
use crate::model::{ConfigurationName, Project, ProjectId};
use crate::paths::{CasePolicy, path_key};
use crate::project::ParsedProject;

/// Collects parsed projects until every reference can be checked.
pub(super) struct Linker {
    policy: CasePolicy,
    projects: IndexMap<ProjectId, Project>,
    path_references: Vec<(ProjectId, Vec<Utf8PathBuf>)>,
}

impl Linker {
    pub(super) fn new(policy: CasePolicy) -> Self {
        Self {
            policy,
            projects: IndexMap::new(),
            path_references: Vec::new(),
        }
    }

    pub(super) fn add(&mut self, parsed: ParsedProject) {
        let id = parsed.project.id;
        if !parsed.unresolved_reference_paths.is_empty() {
            self.path_references
                .push((id, parsed.unresolved_reference_paths));
        }
        self.projects.insert(id, parsed.project);
    }

    /// Resolve path-only references by descriptor path, then drop (or reject)
    /// references to projects that are not in the solution.
    pub(super) fn link(
        mut self,
        builder: &mut Builder<'_>,
    ) -> Result<IndexMap<ProjectId, Project>, SolutionError> {
        let by_path: HashMap<String, ProjectId> = self
            .projects
            .values()
            .map(|project| (path_key(&project.path, self.policy), project.id))
            .collect();

        for (id, paths) in std::mem::take(&mut self.path_references) {
            let Some(project) = self.projects.get_mut(&id) else {
                continue;
            };
            for path in paths {
                match by_path.get(&path_key(&path, self.policy)) {
                    Some(target) if !project.references.contains(target) => {
                        project.references.push(*target);
                    }
                    Some(_) => {}
                    None => dangling(builder, &project.name, path.to_string())?,
                }
            }
        }

        let known: HashSet<ProjectId> = self.projects.keys().copied().collect();
        for project in self.projects.values_mut() {
            let mut kept = Vec::with_capacity(project.references.len());
            for reference in std::mem::take(&mut project.references) {
                if known.contains(&reference) {
                    kept.push(reference);
                } else {
                    dangling(builder, &project.name, reference.to_string())?;
                }
            }
            project.references = kept;
        }
        Ok(self.projects)
    }
}

fn dangling(builder: &mut Builder<'_>, project: &str, reference: String) -> Result<(), SolutionError> {
    if builder.strict {
        return Err(SolutionError::UnknownReference {
            project: project.to_owned(),
            reference,
        });
    }
    builder.warn(Warning::UnresolvedReference {
        project: project.to_owned(),
        reference,
    });
    Ok(())
}

/// Keep `roots` and everything they reference transitively.
pub(super) fn retain_reachable(projects: &mut IndexMap<ProjectId, Project>, roots: &[ProjectId]) {
    let mut reachable = HashSet::new();
    let mut stack: Vec<ProjectId> = roots.to_vec();
    while let Some(id) = stack.pop() {
        if !reachable.insert(id) {
            continue;
        }
        if let Some(project) = projects.get(&id) {
            stack.extend(project.references.iter().copied());
        }
    }
    let before = projects.len();
    projects.retain(|id, _| reachable.contains(id));
    tracing::debug!(
        kept = projects.len(),
        dropped = before - projects.len(),
        "filtered solution to referenced projects"
    );
}

/// Fill each configuration's inherited include directories from the public
/// directories of its direct references.
///
/// A referenced project without the same configuration contributes the
/// public directories of its default configuration.
pub(super) fn inherit_public_includes(projects: &mut IndexMap<ProjectId, Project>) {
    let mut updates: Vec<(ProjectId, ConfigurationName, Vec<Utf8PathBuf>)> = Vec::new();
    for project in projects.values() {
        for name in project.configurations.keys() {
            let mut inherited: Vec<Utf8PathBuf> = Vec::new();
            let targets = project
                .references
                .iter()
                .filter_map(|reference| projects.get(reference));
            for target in targets {
                let settings = target.configurations.get(name).or_else(|| {
                    target
                        .default_configuration
                        .as_ref()
                        .and_then(|fallback| target.configurations.get(fallback))
                });
                for dir in settings.into_iter().flat_map(|found| found.public_include_dirs.iter()) {
                    if !inherited.contains(dir) {
                        inherited.push(dir.clone());
                    }
                }
            }
            if !inherited.is_empty() {
                updates.push((project.id, name.clone(), inherited));
            }
        }
    }
    for (id, name, inherited) in updates {
        if let Some(settings) = projects
            .get_mut(&id)
            .and_then(|project| project.configurations.get_mut(&name))
        {
            settings.inherited_include_dirs = inherited;
        }
    }
}
