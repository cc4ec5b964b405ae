//! Non-fatal findings accumulated while parsing and resolving.
//!
//! Errors on a root input abort the call through each module's own error
//! type. Anything discovered transitively (a broken header, a malformed
//! project in lenient mode, a missing import) becomes a [`Warning`] attached
//! to the returned model instead, so one bad file never fails a whole
//! analysis.

// The thiserror/miette derives trip `unused_assignments` on some toolchains.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use camino::Utf8PathBuf;
use itertools::Itertools;
use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

/// A recorded, non-fatal diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// A descriptor or entry was malformed and skipped.
    #[error("{path}: {message}")]
    #[diagnostic(code(vcxgraph::warning::parse), severity(Warning))]
    Parse {
        /// File that failed to parse.
        path: Utf8PathBuf,
        /// Description of the problem.
        message: String,
    },
    /// The requested configuration does not exist in a project.
    #[error("configuration '{requested}' not found in project '{project}'")]
    #[diagnostic(
        code(vcxgraph::warning::configuration_not_found),
        severity(Warning),
        help("declared configurations are listed by the `projects` command")
    )]
    ConfigurationNotFound {
        /// Project display name.
        project: String,
        /// Configuration that was asked for.
        requested: String,
        /// Configuration used instead, if any.
        fallback: Option<String>,
    },
    /// An include directive could not be matched to a file.
    #[error("{file}:{line}: cannot resolve include '{name}' ({reason})")]
    #[diagnostic(code(vcxgraph::warning::unresolved_include), severity(Warning))]
    UnresolvedInclude {
        /// File containing the directive.
        file: Utf8PathBuf,
        /// One-based line of the directive.
        line: usize,
        /// Name as written in the directive.
        name: String,
        /// Why resolution failed.
        reason: String,
    },
    /// A file includes itself transitively; the repeat became a back-reference.
    #[error("include cycle: {}", .chain.iter().join(" -> "))]
    #[diagnostic(code(vcxgraph::info::cyclic_include), severity(Advice))]
    CyclicInclude {
        /// Files on the cycle, starting and ending with the repeated file.
        chain: Vec<Utf8PathBuf>,
    },
    /// A project reference names an id absent from the solution.
    #[error("project '{project}' references unknown project {reference}")]
    #[diagnostic(code(vcxgraph::warning::unresolved_reference), severity(Warning))]
    UnresolvedReference {
        /// Referencing project.
        project: String,
        /// The dangling id.
        reference: String,
    },
    /// A requested root project is not in the solution and was ignored.
    #[error("root project {root} is not in the solution")]
    #[diagnostic(code(vcxgraph::warning::unknown_root), severity(Warning))]
    UnknownRoot {
        /// The requested id.
        root: String,
    },
    /// An `<Import>` did not resolve to a script.
    #[error("{script}: cannot resolve import '{import}'")]
    #[diagnostic(code(vcxgraph::warning::unresolved_import), severity(Warning))]
    UnresolvedImport {
        /// Importing script.
        script: Utf8PathBuf,
        /// Import path after property expansion.
        import: String,
    },
    /// A target names a prerequisite that is never declared.
    #[error("target '{target}' depends on undeclared target '{prerequisite}'")]
    #[diagnostic(code(vcxgraph::warning::missing_target), severity(Warning))]
    MissingTarget {
        /// Declaring target.
        target: String,
        /// Missing prerequisite.
        prerequisite: String,
    },
    /// Targets depend on each other in a loop.
    #[error("target dependency cycle: {}", .cycle.iter().join(" -> "))]
    #[diagnostic(code(vcxgraph::warning::target_cycle), severity(Warning))]
    TargetCycle {
        /// Canonicalised cycle; the first name is repeated at the end.
        cycle: Vec<String>,
    },
    /// A `Condition` attribute could not be evaluated and was treated as false.
    #[error("{path}: cannot evaluate condition \"{condition}\": {message}")]
    #[diagnostic(code(vcxgraph::warning::condition), severity(Warning))]
    Condition {
        /// File holding the condition.
        path: Utf8PathBuf,
        /// Condition text.
        condition: String,
        /// Parser or evaluator message.
        message: String,
    },
}

impl Warning {
    /// Whether the finding is informational rather than a problem.
    #[must_use]
    pub const fn is_informational(&self) -> bool {
        matches!(self, Self::CyclicInclude { .. })
    }
}

/// Log `warning` and append it to `sink`.
///
/// `quiet` demotes the log line to `debug`; the warning is recorded either
/// way.
pub(crate) fn record(sink: &mut Vec<Warning>, warning: Warning, quiet: bool) {
    if quiet || warning.is_informational() {
        tracing::debug!(%warning, "recorded diagnostic");
    } else {
        tracing::warn!(%warning, "recorded diagnostic");
    }
    sink.push(warning);
}
