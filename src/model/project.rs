//! The project model.

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use serde::Serialize;

use super::{ConfigurationName, ConfigurationSettings, ProjectId};
use crate::paths::{CasePolicy, absolutize, is_within, path_key};

/// One build project as declared by its descriptor.
#[derive(Clone, Debug, Serialize)]
pub struct Project {
    /// Identifier taken from the solution entry.
    pub id: ProjectId,
    /// Display name.
    pub name: String,
    /// Absolute path of the descriptor.
    pub path: Utf8PathBuf,
    /// Directory holding the descriptor; source paths are relative to it.
    pub root: Utf8PathBuf,
    /// Translation units (`ClCompile` items), relative to [`root`](Self::root).
    pub sources: Vec<Utf8PathBuf>,
    /// Headers listed in the project (`ClInclude` items).
    pub headers: Vec<Utf8PathBuf>,
    /// Per-configuration settings keyed case-insensitively.
    pub configurations: IndexMap<ConfigurationName, ConfigurationSettings>,
    /// Configuration used when a requested one does not exist.
    pub default_configuration: Option<ConfigurationName>,
    /// Direct project references; the closure is computed on demand.
    pub references: Vec<ProjectId>,
}

impl Project {
    /// Settings for `name`, ignoring case.
    #[must_use]
    pub fn configuration(&self, name: &str) -> Option<&ConfigurationSettings> {
        self.configurations.get(&ConfigurationName::new(name))
    }

    /// Absolute paths of the project's translation units.
    pub fn source_paths(&self) -> impl Iterator<Item = Utf8PathBuf> + '_ {
        self.sources
            .iter()
            .map(|source| absolutize(&self.root, source.as_str()))
    }

    /// Whether `file` is listed in the project, lives under its root, or lives
    /// under one of its declared include directories.
    #[must_use]
    pub fn owns_file(&self, file: &Utf8Path, policy: CasePolicy) -> bool {
        let wanted = path_key(file, policy);
        let listed = self
            .sources
            .iter()
            .chain(&self.headers)
            .any(|item| path_key(&absolutize(&self.root, item.as_str()), policy) == wanted);
        listed
            || is_within(file, &self.root, policy)
            || self.configurations.values().any(|settings| {
                settings
                    .include_dirs
                    .iter()
                    .chain(&settings.public_include_dirs)
                    .any(|dir| is_within(file, dir, policy))
            })
    }
}
