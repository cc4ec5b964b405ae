//! Error types for solution parsing.

// The thiserror/miette derives trip `unused_assignments` on some toolchains.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

use crate::model::ProjectId;
use crate::project::ProjectError;

/// Errors raised while building a [`Solution`](crate::model::Solution).
#[derive(Debug, Error, Diagnostic)]
pub enum SolutionError {
    /// The solution file does not exist.
    #[error("solution file {path} not found")]
    #[diagnostic(code(vcxgraph::solution::not_found))]
    NotFound {
        /// Path after joining with the base directory.
        path: Utf8PathBuf,
    },
    /// The solution file could not be read.
    #[error("failed to read solution {path}")]
    #[diagnostic(code(vcxgraph::solution::io))]
    Io {
        /// Solution path.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The solution text or one of its descriptors is malformed.
    #[error("{path}:{line}: {message}")]
    #[diagnostic(code(vcxgraph::solution::parse))]
    Parse {
        /// File in which the problem was found.
        path: Utf8PathBuf,
        /// One-based line, or zero when the problem is not tied to a line.
        line: usize,
        /// Description of the problem.
        message: String,
    },
    /// A project descriptor failed to parse in strict mode.
    #[error("project {name} could not be parsed")]
    #[diagnostic(code(vcxgraph::solution::project))]
    Project {
        /// Project name from the solution entry.
        name: String,
        /// Descriptor error.
        #[source]
        #[diagnostic_source]
        source: ProjectError,
    },
    /// Two entries share a project id.
    #[error("project id {id} is declared by both '{first}' and '{second}'")]
    #[diagnostic(
        code(vcxgraph::solution::duplicate_project),
        help("give every project in the solution a unique ProjectGuid")
    )]
    DuplicateProject {
        /// The shared id.
        id: ProjectId,
        /// First project declaring it.
        first: String,
        /// Second project declaring it.
        second: String,
    },
    /// A project references an id absent from the solution.
    #[error("project '{project}' references unknown project {reference}")]
    #[diagnostic(code(vcxgraph::solution::unknown_reference))]
    UnknownReference {
        /// Referencing project.
        project: String,
        /// The dangling reference, as an id or descriptor path.
        reference: String,
    },
    /// A requested root project is not in the solution.
    #[error("root project {root} is not in the solution")]
    #[diagnostic(
        code(vcxgraph::solution::unknown_root),
        help("run `vcxgraph projects` to list project GUIDs")
    )]
    UnknownRoot {
        /// The requested id.
        root: ProjectId,
    },
    /// No solution dialect exists for the requested tool version.
    #[error("unsupported tool version '{version}'")]
    #[diagnostic(
        code(vcxgraph::solution::unsupported_tool_version),
        help("use 9.0, 10.0, or 11.0 and later")
    )]
    UnsupportedToolVersion {
        /// Version as given.
        version: String,
    },
}
