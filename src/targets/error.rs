//! Error types for target tree construction.

// The thiserror/miette derives trip `unused_assignments` on some toolchains.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while loading build scripts or selecting the root target.
#[derive(Debug, Error, Diagnostic)]
pub enum TargetError {
    /// The entry script does not exist.
    #[error("build script {path} not found")]
    #[diagnostic(code(vcxgraph::targets::not_found))]
    NotFound {
        /// Path that was tried.
        path: Utf8PathBuf,
    },
    /// A script exists but could not be read.
    #[error("failed to read {path}")]
    #[diagnostic(code(vcxgraph::targets::io))]
    Io {
        /// Script path.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// A script is not a well-formed MSBuild project.
    #[error("{path}: {message}")]
    #[diagnostic(code(vcxgraph::targets::parse))]
    Parse {
        /// Script path.
        path: Utf8PathBuf,
        /// Parser message.
        message: String,
    },
    /// An `<Import>` matched no file and imports are strict.
    #[error("{script}: cannot resolve import '{import}'")]
    #[diagnostic(
        code(vcxgraph::targets::unresolved_import),
        help("add the directory holding the import with --search-path")
    )]
    UnresolvedImport {
        /// Importing script.
        script: Utf8PathBuf,
        /// Import path after property expansion.
        import: String,
    },
    /// The requested root target is not declared anywhere.
    #[error("target '{target}' is not declared in {script} or its imports")]
    #[diagnostic(code(vcxgraph::targets::target_not_found))]
    TargetNotFound {
        /// Requested name.
        target: String,
        /// Entry script.
        script: Utf8PathBuf,
    },
    /// No root target was requested and the scripts declare none.
    #[error("{script} and its imports declare no targets")]
    #[diagnostic(code(vcxgraph::targets::no_targets))]
    NoTargets {
        /// Entry script.
        script: Utf8PathBuf,
    },
    /// A property override is not of the form `Name=Value`.
    #[error("invalid property override '{entry}'")]
    #[diagnostic(
        code(vcxgraph::targets::invalid_override),
        help("overrides are written as Name=Value pairs separated by ';'")
    )]
    InvalidOverride {
        /// The offending entry.
        entry: String,
    },
}
