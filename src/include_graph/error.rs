//! Error types for include graph resolution.

// The thiserror/miette derives trip `unused_assignments` on some toolchains.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

/// Failures on the requested source file. Problems with anything it
/// includes are recorded on the graph instead.
#[derive(Debug, Error, Diagnostic)]
pub enum IncludeGraphError {
    /// The source file does not exist.
    #[error("source file {path} not found")]
    #[diagnostic(code(vcxgraph::include_graph::not_found))]
    NotFound {
        /// Path after resolving against the project root.
        path: Utf8PathBuf,
    },
    /// The source file exists but could not be read.
    #[error("failed to read source file {path}")]
    #[diagnostic(code(vcxgraph::include_graph::unreadable))]
    Unreadable {
        /// Source path.
        path: Utf8PathBuf,
        /// Why the read failed.
        reason: String,
    },
    /// The source file is not part of the project.
    #[error("{path} does not belong to project '{project}'")]
    #[diagnostic(
        code(vcxgraph::include_graph::not_in_project),
        help("list the file in the project or place it under the project or one of its include directories")
    )]
    NotInProject {
        /// Source path.
        path: Utf8PathBuf,
        /// Project display name.
        project: String,
    },
}
