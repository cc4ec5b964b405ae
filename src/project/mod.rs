//! `.vcxproj` descriptor parsing.
//!
//! The descriptor is read with `roxmltree` and evaluated statically once per
//! declared `ProjectConfiguration`: property groups, item definition groups,
//! and items are visited in document order with `Condition` attributes
//! applied. Imports are not followed; toolchain property sheets belong to the
//! build engine.

mod evaluate;
mod items;

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::{IndexMap, IndexSet};
use miette::Diagnostic;
use thiserror::Error;

use crate::diagnostics::Warning;
use crate::model::{ConfigurationName, Project, ProjectId};

use evaluate::Evaluator;

/// Errors raised while reading a project descriptor.
#[derive(Debug, Error, Diagnostic)]
pub enum ProjectError {
    /// The descriptor does not exist.
    #[error("project file {path} not found")]
    #[diagnostic(code(vcxgraph::project::not_found))]
    NotFound {
        /// Path that was tried.
        path: Utf8PathBuf,
    },
    /// The descriptor exists but could not be read.
    #[error("failed to read {path}")]
    #[diagnostic(code(vcxgraph::project::io))]
    Io {
        /// Descriptor path.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The descriptor is not well-formed XML.
    #[error("{path} is not well-formed XML")]
    #[diagnostic(code(vcxgraph::project::xml))]
    Xml {
        /// Descriptor path.
        path: Utf8PathBuf,
        /// Parser error.
        #[source]
        source: roxmltree::Error,
    },
    /// The XML does not describe a project.
    #[error("{path}: {message}")]
    #[diagnostic(code(vcxgraph::project::invalid))]
    Invalid {
        /// Descriptor path.
        path: Utf8PathBuf,
        /// What is wrong.
        message: String,
    },
}

/// Inputs the descriptor itself does not carry.
#[derive(Clone, Debug, Default)]
pub struct ProjectOptions {
    /// Directory of the owning solution, exposed as `$(SolutionDir)`.
    pub solution_dir: Option<Utf8PathBuf>,
    /// Toolchain include directories appended after `IncludePath`.
    pub system_include_dirs: Vec<Utf8PathBuf>,
}

/// A project together with what the solution builder still has to resolve.
#[derive(Clone, Debug)]
pub struct ParsedProject {
    /// The project; [`Project::references`] holds the GUID-carrying references.
    pub project: Project,
    /// `ProjectGuid` declared inside the descriptor, if any.
    pub declared_id: Option<ProjectId>,
    /// Referenced descriptors that did not state a GUID.
    pub unresolved_reference_paths: Vec<Utf8PathBuf>,
    /// Conditions that could not be evaluated.
    pub warnings: Vec<Warning>,
}

/// Read and evaluate the descriptor at `path`.
///
/// # Errors
///
/// Returns [`ProjectError`] when the file is missing, unreadable, or not a
/// project descriptor.
pub fn parse_project(
    path: &Utf8Path,
    id: ProjectId,
    name: &str,
    options: &ProjectOptions,
) -> Result<ParsedProject, ProjectError> {
    if !path.is_file() {
        return Err(ProjectError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let source = std::fs::read_to_string(path).map_err(|source| ProjectError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_project_str(&source, path, id, name, options)
}

/// Evaluate descriptor text as if it had been read from `path`.
///
/// # Errors
///
/// Returns [`ProjectError`] when the text is not a project descriptor.
pub fn parse_project_str(
    source: &str,
    path: &Utf8Path,
    id: ProjectId,
    name: &str,
    options: &ProjectOptions,
) -> Result<ParsedProject, ProjectError> {
    let doc = roxmltree::Document::parse(source).map_err(|source| ProjectError::Xml {
        path: path.to_path_buf(),
        source,
    })?;
    let project_element = doc.root_element();
    if project_element.tag_name().name() != "Project" {
        return Err(ProjectError::Invalid {
            path: path.to_path_buf(),
            message: format!(
                "expected a <Project> root element, found <{}>",
                project_element.tag_name().name()
            ),
        });
    }

    let root = path
        .parent()
        .map_or_else(Utf8PathBuf::new, Utf8Path::to_path_buf);
    let mut warnings = Vec::new();
    let mut evaluator = Evaluator::new(project_element, path, &root, options, &mut warnings);

    let declared = evaluator.declared_configurations();
    let default_configuration = evaluator.default_configuration(&declared);
    let to_evaluate = if declared.is_empty() {
        vec![default_configuration.clone()]
    } else {
        declared.clone()
    };

    let mut configurations = IndexMap::new();
    let mut sources = IndexSet::new();
    let mut headers = IndexSet::new();
    let mut references = IndexSet::new();
    let mut reference_paths = IndexSet::new();
    for configuration in &to_evaluate {
        let evaluation = evaluator.evaluate(configuration);
        sources.extend(evaluation.items.sources);
        headers.extend(evaluation.items.headers);
        references.extend(evaluation.items.references);
        reference_paths.extend(evaluation.items.reference_paths);
        configurations.insert(configuration.clone(), evaluation.settings);
    }
    let declared_id = evaluator.declared_id();
    let fallback_name = evaluator.project_name();

    tracing::debug!(
        project = %path,
        configurations = configurations.len(),
        sources = sources.len(),
        "evaluated project descriptor"
    );

    let display_name = if name.trim().is_empty() {
        fallback_name.unwrap_or_else(|| path.file_stem().unwrap_or_default().to_owned())
    } else {
        name.to_owned()
    };

    Ok(ParsedProject {
        project: Project {
            id,
            name: display_name,
            path: path.to_path_buf(),
            root,
            sources: sources.into_iter().collect(),
            headers: headers.into_iter().collect(),
            configurations,
            default_configuration: Some(default_configuration),
            references: references.into_iter().collect(),
        },
        declared_id,
        unresolved_reference_paths: reference_paths.into_iter().collect(),
        warnings,
    })
}

/// The configuration MSBuild falls back to when a project declares none.
pub(crate) fn implicit_configuration() -> ConfigurationName {
    ConfigurationName::from_parts("Debug", "Win32")
}

#[cfg(test)]
mod tests;
