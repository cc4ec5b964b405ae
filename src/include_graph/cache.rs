//! Caller-owned LRU cache of scanned directives.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};

use camino::{Utf8Path, Utf8PathBuf};
use lru::LruCache;

use super::directive::Directive;
use crate::model::ConfigurationName;

const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(4096) {
    Some(capacity) => capacity,
    None => NonZeroUsize::MIN,
};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    path: Utf8PathBuf,
    configuration: Option<ConfigurationName>,
}

/// Directives of previously scanned files, shared across resolver calls.
///
/// Entries are never invalidated: a cache is meant to live for one analysis
/// of an unchanging tree. The cache is internally synchronised and may be
/// shared between threads.
#[derive(Debug)]
pub struct DirectiveCache {
    entries: Mutex<LruCache<CacheKey, Arc<[Directive]>>>,
}

impl Default for DirectiveCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl DirectiveCache {
    /// Create a cache holding at most `capacity` files.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub(super) fn get(
        &self,
        path: &Utf8Path,
        configuration: Option<&ConfigurationName>,
    ) -> Option<Arc<[Directive]>> {
        let key = CacheKey {
            path: path.to_path_buf(),
            configuration: configuration.cloned(),
        };
        self.lock().get(&key).cloned()
    }

    pub(super) fn insert(
        &self,
        path: &Utf8Path,
        configuration: Option<&ConfigurationName>,
        directives: Arc<[Directive]>,
    ) {
        let key = CacheKey {
            path: path.to_path_buf(),
            configuration: configuration.cloned(),
        };
        self.lock().put(key, directives);
    }

    /// Number of cached files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<CacheKey, Arc<[Directive]>>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::include_graph::directive::IncludeStyle;
    use rstest::rstest;

    fn directive(name: &str) -> Directive {
        Directive {
            line: 1,
            name: name.to_owned(),
            style: IncludeStyle::Quoted,
        }
    }

    #[rstest]
    fn keys_include_the_configuration() {
        let cache = DirectiveCache::default();
        let debug = ConfigurationName::new("Debug|x64");
        let path = Utf8Path::new("/src/a.h");
        cache.insert(path, Some(&debug), Arc::from(vec![directive("b.h")]));

        assert!(cache.get(path, Some(&ConfigurationName::new("debug|X64"))).is_some());
        assert!(cache.get(path, Some(&ConfigurationName::new("Release|x64"))).is_none());
        assert!(cache.get(path, None).is_none());
    }

    #[rstest]
    fn evicts_least_recently_used_files() {
        let cache = DirectiveCache::new(NonZeroUsize::MIN.saturating_add(1));
        for name in ["/a.h", "/b.h", "/c.h"] {
            cache.insert(Utf8Path::new(name), None, Arc::from(Vec::new()));
        }
        assert_eq!(cache.len(), 2);
        assert!(cache.get(Utf8Path::new("/a.h"), None).is_none());
    }
}
