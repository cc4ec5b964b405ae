//! The target tree model and its assembly from loaded scripts.

use std::collections::{HashMap, HashSet};
use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Serialize, Serializer};

use super::cycle;
use super::loader::{DeclaredTarget, Loaded};
use super::{TargetError, TargetTreeOptions};
use crate::diagnostics::{self, Warning};
use crate::msbuild::{PropertyBag, condition, split_list};

/// One declared target after property expansion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TargetNode {
    /// Name as declared.
    pub name: String,
    /// `DependsOnTargets` followed by `CallTarget` targets, without
    /// duplicates.
    pub prerequisites: Vec<String>,
    /// Targets this one runs before.
    pub before_targets: Vec<String>,
    /// Targets this one runs after.
    pub after_targets: Vec<String>,
    /// Script holding the declaration that won.
    pub script: Utf8PathBuf,
    /// `Condition` attribute as written.
    pub condition: Option<String>,
    /// Whether the condition held. Prerequisites of a disabled target are
    /// not followed.
    pub enabled: bool,
}

/// The static target graph of a build script and its imports.
#[derive(Clone, Debug, Serialize)]
pub struct TargetTree {
    entry_script: Utf8PathBuf,
    root: String,
    #[serde(serialize_with = "declared_targets")]
    targets: IndexMap<String, TargetNode>,
    reachable: Vec<String>,
    scripts: Vec<Utf8PathBuf>,
    warnings: Vec<Warning>,
}

fn declared_targets<S: Serializer>(
    targets: &IndexMap<String, TargetNode>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(targets.values())
}

fn key(name: &str) -> String {
    name.to_ascii_lowercase()
}

impl TargetTree {
    /// The script the tree was built from.
    #[must_use]
    pub fn entry_script(&self) -> &Utf8Path {
        &self.entry_script
    }

    /// Name of the root target as declared.
    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Look up a declared target, ignoring case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TargetNode> {
        self.targets.get(&key(name))
    }

    /// Every declared target in first-declaration order.
    pub fn targets(&self) -> impl Iterator<Item = &TargetNode> {
        self.targets.values()
    }

    /// Targets reachable from the root, in the order a build would run them.
    pub fn reachable(&self) -> impl Iterator<Item = &TargetNode> {
        self.reachable.iter().filter_map(|name| self.get(name))
    }

    /// Whether `name` runs when the root target is built.
    #[must_use]
    pub fn is_reachable(&self, name: &str) -> bool {
        self.reachable
            .iter()
            .any(|reached| reached.eq_ignore_ascii_case(name))
    }

    /// Scripts that were loaded, entry first, in load order.
    #[must_use]
    pub fn scripts(&self) -> &[Utf8PathBuf] {
        &self.scripts
    }

    /// Findings recorded while loading and walking.
    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}

/// Reachable targets in run order, one per line, with their prerequisites.
impl fmt::Display for TargetTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in self.reachable() {
            f.write_str(&node.name)?;
            if !node.prerequisites.is_empty() {
                write!(f, " <- {}", node.prerequisites.iter().join(", "))?;
            }
            if !node.enabled {
                f.write_str(" [condition false]")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

pub(super) fn assemble(
    loaded: Loaded,
    options: &TargetTreeOptions,
    entry: Utf8PathBuf,
) -> Result<TargetTree, TargetError> {
    let Loaded {
        properties,
        targets: declared,
        default_targets,
        scripts,
        mut warnings,
    } = loaded;
    let project_dir = entry.parent().map_or_else(Utf8PathBuf::new, Utf8Path::to_path_buf);

    let mut targets: IndexMap<String, TargetNode> = IndexMap::new();
    for target in declared {
        let node = evaluate_target(target, &properties, &project_dir, &mut warnings, options.quiet);
        targets.insert(key(&node.name), node);
    }

    let root_name = select_root(options, default_targets.as_deref(), &properties, &targets)
        .ok_or_else(|| TargetError::NoTargets {
            script: entry.clone(),
        })?;
    let Some(root) = targets.get(&key(&root_name)).map(|node| node.name.clone()) else {
        return Err(TargetError::TargetNotFound {
            target: root_name,
            script: entry,
        });
    };

    let mut walk = Walk::new(&targets);
    walk.visit(&key(&root));
    let reachable = walk.order;

    let report = cycle::analyse(&targets, &reachable);
    for (target, prerequisite) in report.missing_dependencies {
        let warning = Warning::MissingTarget { target, prerequisite };
        if !warnings.contains(&warning) {
            diagnostics::record(&mut warnings, warning, options.quiet);
        }
    }
    if let Some(cycle) = report.cycle {
        let names = cycle
            .iter()
            .map(|member| targets.get(member).map_or_else(|| member.clone(), |node| node.name.clone()))
            .collect();
        diagnostics::record(&mut warnings, Warning::TargetCycle { cycle: names }, options.quiet);
    }

    tracing::debug!(
        entry = %entry,
        root = %root,
        declared = targets.len(),
        reachable = reachable.len(),
        "built target tree"
    );
    Ok(TargetTree {
        entry_script: entry,
        root,
        reachable: reachable
            .iter()
            .filter_map(|member| targets.get(member).map(|node| node.name.clone()))
            .collect(),
        targets,
        scripts,
        warnings,
    })
}

/// The requested target, else the first `DefaultTargets` entry, else the
/// first declared target.
fn select_root(
    options: &TargetTreeOptions,
    default_targets: Option<&str>,
    properties: &PropertyBag,
    targets: &IndexMap<String, TargetNode>,
) -> Option<String> {
    let requested = options.root_target.trim();
    if !requested.is_empty() {
        return Some(requested.to_owned());
    }
    default_targets
        .map(|raw| properties.expand(raw))
        .and_then(|expanded| split_list(&expanded).next().map(str::to_owned))
        .or_else(|| targets.values().next().map(|node| node.name.clone()))
}

fn evaluate_target(
    target: DeclaredTarget,
    properties: &PropertyBag,
    project_dir: &Utf8Path,
    warnings: &mut Vec<Warning>,
    quiet: bool,
) -> TargetNode {
    let names = |raw: &str| -> Vec<String> {
        split_list(&properties.expand(raw))
            .map(str::to_owned)
            .collect()
    };
    let mut prerequisites: Vec<String> = Vec::new();
    for name in names(&target.depends_on)
        .into_iter()
        .chain(target.calls.iter().flat_map(|call| names(call)))
    {
        if !prerequisites
            .iter()
            .any(|seen| seen.eq_ignore_ascii_case(&name))
        {
            prerequisites.push(name);
        }
    }

    let enabled = match target.condition.as_deref() {
        None => true,
        Some(text) => condition::evaluate(text, properties, project_dir).unwrap_or_else(|err| {
            diagnostics::record(
                warnings,
                Warning::Condition {
                    path: target.script.clone(),
                    condition: text.to_owned(),
                    message: err.to_string(),
                },
                quiet,
            );
            false
        }),
    };

    TargetNode {
        before_targets: names(&target.before),
        after_targets: names(&target.after),
        name: target.name,
        prerequisites,
        script: target.script,
        condition: target.condition,
        enabled,
    }
}

/// Execution-order walk: prerequisites, then `BeforeTargets` hooks, then
/// the target, then `AfterTargets` hooks.
struct Walk<'t> {
    targets: &'t IndexMap<String, TargetNode>,
    before: HashMap<String, Vec<String>>,
    after: HashMap<String, Vec<String>>,
    seen: HashSet<String>,
    order: Vec<String>,
}

impl<'t> Walk<'t> {
    fn new(targets: &'t IndexMap<String, TargetNode>) -> Self {
        let mut before: HashMap<String, Vec<String>> = HashMap::new();
        let mut after: HashMap<String, Vec<String>> = HashMap::new();
        for (hook, node) in targets {
            for anchor in &node.before_targets {
                before.entry(key(anchor)).or_default().push(hook.clone());
            }
            for anchor in &node.after_targets {
                after.entry(key(anchor)).or_default().push(hook.clone());
            }
        }
        Self {
            targets,
            before,
            after,
            seen: HashSet::new(),
            order: Vec::new(),
        }
    }

    fn visit(&mut self, target: &str) {
        let targets = self.targets;
        let Some(node) = targets.get(target) else {
            return;
        };
        if !self.seen.insert(target.to_owned()) {
            return;
        }
        if node.enabled {
            for prerequisite in &node.prerequisites {
                self.visit(&key(prerequisite));
            }
        }
        for hook in self.before.get(target).cloned().unwrap_or_default() {
            self.visit(&hook);
        }
        self.order.push(target.to_owned());
        for hook in self.after.get(target).cloned().unwrap_or_default() {
            self.visit(&hook);
        }
    }
}
