//! The include graph arena.

use std::collections::HashSet;
use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;

use super::directive::Directive;
use crate::diagnostics::Warning;
use crate::model::ConfigurationName;

/// Index of a node inside an [`IncludeGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in [`IncludeGraph::nodes`].
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// What a node stands for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    /// The file the graph was requested for.
    Source,
    /// A file found on disk.
    Resolved,
    /// A directive that could not be matched to a readable file.
    Unresolved {
        /// Why resolution failed.
        reason: String,
    },
    /// A file already being expanded on the current path.
    BackReference {
        /// The ancestor node for the same file.
        target: NodeId,
    },
    /// A file inside an excluded directory; not expanded.
    Excluded,
}

/// One node of an [`IncludeGraph`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IncludeNode {
    /// Resolved absolute path, or the name as written when unresolved.
    pub path: Utf8PathBuf,
    /// Node classification.
    #[serde(flatten)]
    pub kind: NodeKind,
    /// Directive that first introduced the node; `None` for the root.
    pub directive: Option<Directive>,
    /// Direct includes, in directive order.
    pub children: Vec<NodeId>,
}

impl IncludeNode {
    pub(super) const fn new(path: Utf8PathBuf, kind: NodeKind, directive: Option<Directive>) -> Self {
        Self {
            path,
            kind,
            directive,
            children: Vec::new(),
        }
    }
}

/// The transitive includes of one source file.
///
/// Nodes live in an arena addressed by [`NodeId`]. A file reached along
/// several paths is a single shared node; a file that includes one of its
/// own ancestors ends in a [`NodeKind::BackReference`] leaf, so walking
/// children always terminates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IncludeGraph {
    pub(super) nodes: Vec<IncludeNode>,
    pub(super) root: NodeId,
    pub(super) configuration: Option<ConfigurationName>,
    pub(super) warnings: Vec<Warning>,
}

impl IncludeGraph {
    pub(super) const fn new(configuration: Option<ConfigurationName>, warnings: Vec<Warning>) -> Self {
        Self {
            nodes: Vec::new(),
            root: NodeId(0),
            configuration,
            warnings,
        }
    }

    pub(super) fn push(&mut self, node: IncludeNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub(super) fn set_children(&mut self, id: NodeId, children: Vec<NodeId>) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.children = children;
        }
    }

    /// The source file's node.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Look up a node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&IncludeNode> {
        self.nodes.get(id.0)
    }

    /// All nodes in creation order.
    #[must_use]
    pub fn nodes(&self) -> &[IncludeNode] {
        &self.nodes
    }

    /// Direct children of `id`.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &IncludeNode)> {
        self.node(id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|child| self.node(*child).map(|node| (*child, node)))
    }

    /// Configuration whose rules were used.
    #[must_use]
    pub const fn configuration(&self) -> Option<&ConfigurationName> {
        self.configuration.as_ref()
    }

    /// Findings recorded while building the graph.
    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes. Never true for a built graph.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The node for a resolved file, if the file is part of the graph.
    #[must_use]
    pub fn find(&self, path: &Utf8Path) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| {
                node.path == path && matches!(node.kind, NodeKind::Source | NodeKind::Resolved)
            })
            .map(NodeId)
    }

    /// Every file resolved on disk, the source included, in creation order.
    pub fn files(&self) -> impl Iterator<Item = &Utf8Path> {
        self.nodes
            .iter()
            .filter(|node| matches!(node.kind, NodeKind::Source | NodeKind::Resolved))
            .map(|node| node.path.as_path())
    }

    /// Every `(parent, child)` edge, parents in creation order.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.nodes.iter().enumerate().flat_map(|(index, node)| {
            node.children.iter().map(move |child| (NodeId(index), *child))
        })
    }
}

/// Indented tree rendering. Shared nodes are expanded once; later
/// occurrences are marked `(shown above)`.
impl fmt::Display for IncludeGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut shown = HashSet::new();
        self.write_node(f, self.root, 0, &mut shown)
    }
}

impl IncludeGraph {
    fn write_node(
        &self,
        f: &mut fmt::Formatter<'_>,
        id: NodeId,
        depth: usize,
        shown: &mut HashSet<NodeId>,
    ) -> fmt::Result {
        let Some(node) = self.node(id) else {
            return Ok(());
        };
        write!(f, "{:indent$}{}", "", node.path, indent = depth * 2)?;
        match &node.kind {
            NodeKind::Source | NodeKind::Resolved => {}
            NodeKind::Unresolved { reason } => write!(f, " [unresolved: {reason}]")?,
            NodeKind::BackReference { .. } => f.write_str(" [cycle]")?,
            NodeKind::Excluded => f.write_str(" [excluded]")?,
        }
        if !shown.insert(id) && !node.children.is_empty() {
            return writeln!(f, " (shown above)");
        }
        writeln!(f)?;
        for child in &node.children {
            self.write_node(f, *child, depth + 1, shown)?;
        }
        Ok(())
    }
}
