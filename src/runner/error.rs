//! Error types for the runner module.

// The thiserror/miette derives trip `unused_assignments` on some toolchains.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while dispatching a command.
#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    /// No project in the solution matches the requested name or GUID.
    #[error("no project '{project}' in {solution}")]
    #[diagnostic(
        code(vcxgraph::runner::project_not_found),
        help("run `vcxgraph projects` to list project names and GUIDs")
    )]
    ProjectNotFound {
        /// Name or GUID as given.
        project: String,
        /// Solution that was searched.
        solution: Utf8PathBuf,
    },
}
