//! Per-source-file include dependency graphs.
//!
//! Resolution runs in two phases. Discovery walks the include closure
//! breadth-first, scanning and resolving every reachable file exactly once
//! (frontiers are scanned in parallel when [`ResolveOptions::parallel`] is
//! set). Construction then walks the scanned table depth-first, sharing a
//! node for every file reached more than once and cutting cycles with
//! [`NodeKind::BackReference`] leaves.
//!
//! Preprocessing is deliberately shallow: only literal `#if 0`/`#if 1` style
//! conditions are honoured and macros are never expanded.

mod cache;
mod directive;
mod discovery;
mod error;
mod graph;
mod resolver;

use camino::Utf8Path;

use crate::model::Project;

pub use cache::DirectiveCache;
pub use directive::{Directive, IncludeStyle, scan_directives};
pub use error::IncludeGraphError;
pub use graph::{IncludeGraph, IncludeNode, NodeId, NodeKind};
pub use resolver::{IncludeResolver, ResolveOptions};

/// Resolve the include graph of `source` with default options.
///
/// # Errors
///
/// See [`IncludeResolver::resolve`].
pub fn get_include_graph(
    source: &Utf8Path,
    project: &Project,
    configuration: &str,
) -> Result<IncludeGraph, IncludeGraphError> {
    IncludeResolver::new(ResolveOptions::default()).resolve(source, project, configuration)
}
