//! Effective include search rules for a project configuration.

use std::collections::HashSet;

use camino::Utf8PathBuf;
use serde::Serialize;

use crate::diagnostics::{self, Warning};
use crate::model::{ConfigurationName, ConfigurationSettings, IncludeRules, Project};
use crate::paths::{CasePolicy, lexical_normalize, path_key};

/// Include rules together with the configuration they were derived from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedRules {
    /// The ordered search path and defines.
    pub rules: IncludeRules,
    /// Configuration actually used; `None` when nothing could be selected.
    pub configuration: Option<ConfigurationName>,
    /// Findings such as a configuration fallback.
    pub warnings: Vec<Warning>,
}

/// Compute the include search rules of `project` under `configuration`.
///
/// Directories come in search order: the project's own, then (unless the
/// configuration ignores standard paths) those inherited from references,
/// then the system directories. Later spellings of a directory already in
/// the list are dropped under `policy`.
///
/// An unknown configuration falls back to the project's default and records
/// [`Warning::ConfigurationNotFound`]; without a default the rules are empty.
#[must_use]
pub fn resolve_include_paths(
    project: &Project,
    configuration: &str,
    policy: CasePolicy,
) -> ResolvedRules {
    let mut warnings = Vec::new();
    let Some((name, settings)) = select(project, configuration, &mut warnings) else {
        return ResolvedRules {
            warnings,
            ..ResolvedRules::default()
        };
    };

    let rules = IncludeRules {
        directories: ordered_directories(settings, policy),
        defines: settings.defines.clone(),
        append_system_paths: settings.append_system_paths,
    };
    tracing::debug!(
        project = %project.name,
        configuration = %name,
        directories = rules.directories.len(),
        "resolved include rules"
    );
    ResolvedRules {
        rules,
        configuration: Some(name.clone()),
        warnings,
    }
}

fn select<'a>(
    project: &'a Project,
    requested: &str,
    warnings: &mut Vec<Warning>,
) -> Option<(&'a ConfigurationName, &'a ConfigurationSettings)> {
    let wanted = ConfigurationName::new(requested);
    if let Some(found) = project.configurations.get_key_value(&wanted) {
        return Some(found);
    }
    let fallback = project
        .default_configuration
        .as_ref()
        .and_then(|default| project.configurations.get_key_value(default));
    diagnostics::record(
        warnings,
        Warning::ConfigurationNotFound {
            project: project.name.clone(),
            requested: requested.to_owned(),
            fallback: fallback.map(|(name, _)| name.to_string()),
        },
        false,
    );
    fallback
}

fn ordered_directories(settings: &ConfigurationSettings, policy: CasePolicy) -> Vec<Utf8PathBuf> {
    let mut seen = HashSet::new();
    let mut ordered = Vec::new();
    let candidates = settings.include_dirs.iter().chain(
        settings
            .inherited_include_dirs
            .iter()
            .chain(&settings.system_include_dirs)
            .filter(|_| settings.append_system_paths),
    );
    for dir in candidates {
        let normalised = lexical_normalize(dir);
        if seen.insert(path_key(&normalised, policy)) {
            ordered.push(normalised);
        }
    }
    ordered
}

#[cfg(test)]
mod tests;
