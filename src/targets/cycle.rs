//! Cycle detection over target prerequisites.

use std::collections::HashMap;

use indexmap::IndexMap;

use super::TargetNode;

/// Tracks the visitation state of a target during cycle detection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum VisitState {
    Visiting,
    Visited,
}

pub(super) struct CycleDetectionReport {
    /// First cycle found, as lookup keys, canonicalised.
    pub(super) cycle: Option<Vec<String>>,
    /// `(declaring target, prerequisite as written)` for undeclared names.
    pub(super) missing_dependencies: Vec<(String, String)>,
}

/// Walk prerequisites from every key in `roots`. Disabled targets contribute
/// no edges.
pub(super) fn analyse(targets: &IndexMap<String, TargetNode>, roots: &[String]) -> CycleDetectionReport {
    let mut detector = CycleDetector::new(targets);
    for root in roots {
        detector.visit(root);
    }
    CycleDetectionReport {
        cycle: detector.cycle,
        missing_dependencies: detector.missing_dependencies,
    }
}

struct CycleDetector<'a> {
    targets: &'a IndexMap<String, TargetNode>,
    stack: Vec<String>,
    states: HashMap<String, VisitState>,
    cycle: Option<Vec<String>>,
    missing_dependencies: Vec<(String, String)>,
}

impl<'a> CycleDetector<'a> {
    fn new(targets: &'a IndexMap<String, TargetNode>) -> Self {
        Self {
            targets,
            stack: Vec::new(),
            states: HashMap::new(),
            cycle: None,
            missing_dependencies: Vec::new(),
        }
    }

    fn visit(&mut self, key: &str) {
        match self.states.get(key) {
            Some(VisitState::Visited) => return,
            Some(VisitState::Visiting) => {
                if self.cycle.is_none()
                    && let Some(idx) = self.stack.iter().position(|open| open == key)
                {
                    let mut cycle: Vec<String> = self.stack.iter().skip(idx).cloned().collect();
                    cycle.push(key.to_owned());
                    self.cycle = Some(canonicalize_cycle(cycle));
                }
                return;
            }
            None => {
                self.states.insert(key.to_owned(), VisitState::Visiting);
            }
        }

        self.stack.push(key.to_owned());
        let targets = self.targets;
        if let Some(node) = targets.get(key).filter(|node| node.enabled) {
            for prerequisite in &node.prerequisites {
                let dep = prerequisite.to_ascii_lowercase();
                if !targets.contains_key(&dep) {
                    tracing::debug!(
                        missing = %prerequisite,
                        dependent = %node.name,
                        "skipping undeclared prerequisite during cycle detection",
                    );
                    self.missing_dependencies
                        .push((node.name.clone(), prerequisite.clone()));
                    continue;
                }
                self.visit(&dep);
            }
        }
        self.stack.pop();
        self.states.insert(key.to_owned(), VisitState::Visited);
    }
}

/// Rotate a closed cycle so it starts at its smallest member.
fn canonicalize_cycle<T: Ord + Clone>(mut cycle: Vec<T>) -> Vec<T> {
    if cycle.len() < 2 {
        return cycle;
    }
    let len = cycle.len() - 1;
    let start = cycle
        .iter()
        .take(len)
        .enumerate()
        .min_by(|(_, a), (_, b)| a.cmp(b))
        .map_or(0, |(idx, _)| idx);
    let (prefix, suffix) = cycle.split_at_mut(len);
    prefix.rotate_left(start);
    if let (Some(first), Some(slot)) = (prefix.first().cloned(), suffix.first_mut()) {
        slot.clone_from(&first);
    }
    cycle
}
