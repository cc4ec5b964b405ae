//! Breadth-first discovery of every file reachable from a source.
//!
//! Each frontier is scanned (in parallel when enabled) and every directive
//! is resolved against the search rules. A file is claimed exactly once
//! through an insert-once set, so no file is read twice in one call no
//! matter how many frontier workers reach it.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use camino::{Utf8Path, Utf8PathBuf};
use rayon::prelude::*;

use super::cache::DirectiveCache;
use super::directive::{Directive, IncludeStyle, scan_directives};
use crate::model::{ConfigurationName, IncludeRules};
use crate::paths::{CasePolicy, find_file, is_within, path_key};

/// Where one directive led.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum Resolution {
    Found(Utf8PathBuf),
    Excluded(Utf8PathBuf),
    Missing(String),
    Computed,
}

#[derive(Clone, Debug)]
pub(super) struct Include {
    pub(super) directive: Directive,
    pub(super) resolution: Resolution,
}

/// The includes of one file, or why it could not be read.
#[derive(Clone, Debug)]
pub(super) struct ScannedFile {
    pub(super) includes: Result<Vec<Include>, String>,
}

/// Files scanned during one call, keyed by [`path_key`].
pub(super) type ScanTable = HashMap<String, ScannedFile>;

pub(super) struct Discovery<'a> {
    pub(super) rules: &'a IncludeRules,
    pub(super) excluded_dirs: &'a [Utf8PathBuf],
    pub(super) policy: CasePolicy,
    pub(super) parallel: bool,
    pub(super) cache: Option<&'a DirectiveCache>,
    pub(super) configuration: Option<&'a ConfigurationName>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl Discovery<'_> {
    pub(super) fn run(&self, root: &Utf8Path) -> ScanTable {
        let table: Mutex<ScanTable> = Mutex::new(HashMap::new());
        let claimed: Mutex<HashSet<String>> = Mutex::new(HashSet::from([self.key(root)]));

        let visit = |path: &Utf8PathBuf| -> Vec<Utf8PathBuf> {
            let scanned = self.scan(path);
            let mut next = Vec::new();
            if let Ok(includes) = &scanned.includes {
                for include in includes {
                    if let Resolution::Found(child) = &include.resolution
                        && lock(&claimed).insert(self.key(child))
                    {
                        next.push(child.clone());
                    }
                }
            }
            lock(&table).entry(self.key(path)).or_insert(scanned);
            next
        };

        let mut frontier = vec![root.to_path_buf()];
        let mut depth = 0usize;
        while !frontier.is_empty() {
            tracing::debug!(depth, files = frontier.len(), "scanning include frontier");
            frontier = if self.parallel {
                frontier.par_iter().flat_map_iter(&visit).collect()
            } else {
                frontier.iter().flat_map(&visit).collect()
            };
            depth += 1;
        }
        match table.into_inner() {
            Ok(table) => table,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub(super) fn key(&self, path: &Utf8Path) -> String {
        path_key(path, self.policy)
    }

    fn scan(&self, path: &Utf8Path) -> ScannedFile {
        let directives = match self.directives(path) {
            Ok(directives) => directives,
            Err(err) => {
                tracing::debug!(file = %path, %err, "cannot read included file");
                return ScannedFile {
                    includes: Err(format!("cannot read file: {err}")),
                };
            }
        };
        let includes = directives
            .iter()
            .map(|directive| Include {
                resolution: self.resolve(path, directive),
                directive: directive.clone(),
            })
            .collect();
        ScannedFile { includes: Ok(includes) }
    }

    fn directives(&self, path: &Utf8Path) -> std::io::Result<Arc<[Directive]>> {
        if let Some(cached) = self
            .cache
            .and_then(|cache| cache.get(path, self.configuration))
        {
            return Ok(cached);
        }
        let bytes = std::fs::read(path)?;
        let directives: Arc<[Directive]> = scan_directives(&String::from_utf8_lossy(&bytes)).into();
        if let Some(cache) = self.cache {
            cache.insert(path, self.configuration, Arc::clone(&directives));
        }
        Ok(directives)
    }

    fn resolve(&self, including: &Utf8Path, directive: &Directive) -> Resolution {
        let local = match directive.style {
            IncludeStyle::Computed => return Resolution::Computed,
            IncludeStyle::Quoted => including.parent(),
            IncludeStyle::Angled => None,
        };
        let found = local
            .into_iter()
            .chain(self.rules.directories.iter().map(Utf8PathBuf::as_path))
            .find_map(|dir| find_file(dir, &directive.name, self.policy));
        match found {
            Some(path) if self.is_excluded(&path) => Resolution::Excluded(path),
            Some(path) => Resolution::Found(path),
            None => {
                let searched = self.rules.directories.len() + usize::from(local.is_some());
                Resolution::Missing(format!("not found in {searched} searched directories"))
            }
        }
    }

    fn is_excluded(&self, path: &Utf8Path) -> bool {
        self.excluded_dirs
            .iter()
            .any(|dir| is_within(path, dir, self.policy))
    }
}
