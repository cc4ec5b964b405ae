//! Graph construction over the discovered files.

use std::collections::HashMap;

use camino::{Utf8Path, Utf8PathBuf};

use super::IncludeGraphError;
use super::cache::DirectiveCache;
use super::directive::Directive;
use super::discovery::{Discovery, Resolution, ScanTable};
use super::graph::{IncludeGraph, IncludeNode, NodeId, NodeKind};
use crate::diagnostics::{self, Warning};
use crate::model::Project;
use crate::paths::{CasePolicy, absolutize};
use crate::rules::resolve_include_paths;

/// Tuning for an [`IncludeResolver`].
#[derive(Clone, Debug)]
pub struct ResolveOptions {
    /// How include names are matched against files on disk.
    pub case_policy: CasePolicy,
    /// Scan each discovery frontier on the rayon pool.
    pub parallel: bool,
    /// Directories whose headers become [`NodeKind::Excluded`] leaves.
    /// Relative entries are taken from the project root.
    pub excluded_dirs: Vec<Utf8PathBuf>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            case_policy: CasePolicy::default(),
            parallel: true,
            excluded_dirs: Vec::new(),
        }
    }
}

/// Builds [`IncludeGraph`]s for source files of a project.
///
/// A resolver holds no state between calls apart from an optional
/// caller-owned [`DirectiveCache`].
#[derive(Clone, Debug, Default)]
pub struct IncludeResolver<'c> {
    options: ResolveOptions,
    cache: Option<&'c DirectiveCache>,
}

impl IncludeResolver<'static> {
    /// Create a resolver without a cache.
    #[must_use]
    pub const fn new(options: ResolveOptions) -> Self {
        Self {
            options,
            cache: None,
        }
    }
}

impl<'c> IncludeResolver<'c> {
    /// Reuse directives scanned by earlier calls sharing `cache`.
    #[must_use]
    pub fn with_cache<'n>(self, cache: &'n DirectiveCache) -> IncludeResolver<'n> {
        IncludeResolver {
            options: self.options,
            cache: Some(cache),
        }
    }

    /// The options in effect.
    #[must_use]
    pub const fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Resolve the transitive includes of `source` within `project`.
    ///
    /// A relative `source` is taken from the project root. `configuration`
    /// selects the include rules; an unknown name falls back to the
    /// project's default configuration with a warning on the graph.
    ///
    /// # Errors
    ///
    /// Returns [`IncludeGraphError`] when `source` is missing, unreadable,
    /// or not part of `project`.
    pub fn resolve(
        &self,
        source: &Utf8Path,
        project: &Project,
        configuration: &str,
    ) -> Result<IncludeGraph, IncludeGraphError> {
        let policy = self.options.case_policy;
        let path = absolutize(&project.root, source.as_str());
        if !path.is_file() {
            return Err(IncludeGraphError::NotFound { path });
        }
        if !project.owns_file(&path, policy) {
            return Err(IncludeGraphError::NotInProject {
                path,
                project: project.name.clone(),
            });
        }

        let resolved = resolve_include_paths(project, configuration, policy);
        let excluded_dirs: Vec<Utf8PathBuf> = self
            .options
            .excluded_dirs
            .iter()
            .map(|dir| absolutize(&project.root, dir.as_str()))
            .collect();
        let discovery = Discovery {
            rules: &resolved.rules,
            excluded_dirs: &excluded_dirs,
            policy,
            parallel: self.options.parallel,
            cache: self.cache,
            configuration: resolved.configuration.as_ref(),
        };
        let table = discovery.run(&path);
        if let Some(Err(reason)) = table.get(&discovery.key(&path)).map(|scanned| &scanned.includes) {
            return Err(IncludeGraphError::Unreadable {
                path,
                reason: reason.clone(),
            });
        }

        let mut builder = GraphBuilder {
            table: &table,
            discovery: &discovery,
            graph: IncludeGraph::new(resolved.configuration.clone(), resolved.warnings),
            stack: Vec::new(),
            memo: HashMap::new(),
        };
        let root = builder.expand(&path, NodeKind::Source, None);
        let mut graph = builder.graph;
        graph.root = root;
        tracing::debug!(
            source = %path,
            project = %project.name,
            nodes = graph.len(),
            warnings = graph.warnings.len(),
            "built include graph"
        );
        Ok(graph)
    }
}

/// Depth-first construction with a per-path stack for cycle detection and a
/// memo that shares nodes for files reached more than once.
///
/// The memo is keyed by resolved path only: every node of one graph is
/// built under the same configuration.
struct GraphBuilder<'t> {
    table: &'t ScanTable,
    discovery: &'t Discovery<'t>,
    graph: IncludeGraph,
    stack: Vec<(String, NodeId, Utf8PathBuf)>,
    memo: HashMap<String, NodeId>,
}

impl GraphBuilder<'_> {
    fn expand(&mut self, path: &Utf8Path, kind: NodeKind, directive: Option<Directive>) -> NodeId {
        let key = self.discovery.key(path);
        if let Some(id) = self.memo.get(&key).copied() {
            self.warn_unreadable(&key, directive.as_ref());
            return id;
        }
        if let Some(position) = self.stack.iter().position(|(open, _, _)| *open == key) {
            return self.back_reference(position, path, directive);
        }

        let table = self.table;
        let includes = match table.get(&key).map(|scanned| &scanned.includes) {
            Some(Ok(includes)) => includes.as_slice(),
            Some(Err(reason)) => {
                self.warn_unreadable(&key, directive.as_ref());
                let leaf = self.unresolved(path.as_str(), reason, directive);
                self.memo.insert(key, leaf);
                return leaf;
            }
            None => &[],
        };

        let id = self.graph.push(IncludeNode::new(path.to_path_buf(), kind, directive));
        self.stack.push((key.clone(), id, path.to_path_buf()));
        let mut children = Vec::with_capacity(includes.len());
        for include in includes {
            let child = match &include.resolution {
                Resolution::Found(found) => {
                    Some(self.expand(found, NodeKind::Resolved, Some(include.directive.clone())))
                }
                Resolution::Excluded(found) => Some(self.graph.push(IncludeNode::new(
                    found.clone(),
                    NodeKind::Excluded,
                    Some(include.directive.clone()),
                ))),
                Resolution::Missing(reason) => {
                    self.warn_unresolved(path, &include.directive, reason);
                    Some(self.unresolved(
                        &include.directive.name,
                        reason,
                        Some(include.directive.clone()),
                    ))
                }
                Resolution::Computed => {
                    self.warn_unresolved(path, &include.directive, "computed include");
                    None
                }
            };
            children.extend(child);
        }
        self.stack.pop();
        self.graph.set_children(id, children);
        self.memo.insert(key, id);
        id
    }

    fn back_reference(&mut self, position: usize, path: &Utf8Path, directive: Option<Directive>) -> NodeId {
        let open = self.stack.get(position..).unwrap_or_default();
        let target = open.first().map_or(self.graph.root, |(_, id, _)| *id);
        let mut chain: Vec<Utf8PathBuf> = open.iter().map(|(_, _, file)| file.clone()).collect();
        chain.push(path.to_path_buf());
        diagnostics::record(&mut self.graph.warnings, Warning::CyclicInclude { chain }, false);
        self.graph.push(IncludeNode::new(
            path.to_path_buf(),
            NodeKind::BackReference { target },
            directive,
        ))
    }

    fn unresolved(&mut self, name: &str, reason: &str, directive: Option<Directive>) -> NodeId {
        self.graph.push(IncludeNode::new(
            Utf8PathBuf::from(name),
            NodeKind::Unresolved {
                reason: reason.to_owned(),
            },
            directive,
        ))
    }

    /// Warn on behalf of the current includer when the file behind `key`
    /// could not be read. Each includer gets its own warning.
    fn warn_unreadable(&mut self, key: &str, directive: Option<&Directive>) {
        let table = self.table;
        let Some(Err(reason)) = table.get(key).map(|scanned| &scanned.includes) else {
            return;
        };
        let includer = self.stack.last().map(|(_, _, file)| file.clone());
        if let (Some(file), Some(written)) = (includer, directive) {
            self.warn_unresolved(&file, written, reason);
        }
    }

    fn warn_unresolved(&mut self, file: &Utf8Path, directive: &Directive, reason: &str) {
        diagnostics::record(
            &mut self.graph.warnings,
            Warning::UnresolvedInclude {
                file: file.to_path_buf(),
                line: directive.line,
                name: directive.name.clone(),
                reason: reason.to_owned(),
            },
            false,
        );
    }
}
