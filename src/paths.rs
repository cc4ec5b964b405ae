//! Path helpers shared by the descriptor parsers and the include resolver.
//!
//! Descriptors authored on Windows use `\` separators and frequently disagree
//! in case with the files on disk. Everything here is lexical except
//! [`find_file`], which consults the filesystem.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use serde::Serialize;

/// How path spellings are compared when deduplicating and looking up files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CasePolicy {
    /// Paths match only when byte-for-byte equal.
    #[default]
    Sensitive,
    /// Paths match ignoring ASCII case, as on Windows hosts.
    Insensitive,
}

/// Convert separators in a descriptor path to the host convention.
#[must_use]
pub fn normalize_separators(raw: &str) -> String {
    #[cfg(unix)]
    {
        raw.replace('\\', "/")
    }
    #[cfg(not(unix))]
    {
        raw.replace('/', "\\")
    }
}

/// Fold `.` and `..` components without touching the filesystem.
///
/// A `..` that would climb above the root is dropped; on a relative path it
/// is kept so that `../x` survives.
#[must_use]
pub fn lexical_normalize(path: &Utf8Path) -> Utf8PathBuf {
    let mut parts: Vec<Utf8Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => match parts.last() {
                Some(Utf8Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Utf8Component::RootDir | Utf8Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    parts.iter().map(Utf8Component::as_str).collect()
}

/// Resolve `raw` against `base` and normalise the result.
#[must_use]
pub fn absolutize(base: &Utf8Path, raw: &str) -> Utf8PathBuf {
    let native = Utf8PathBuf::from(normalize_separators(raw.trim()));
    if native.is_absolute() {
        lexical_normalize(&native)
    } else {
        lexical_normalize(&base.join(native))
    }
}

/// `dir` as text ending in a separator, the form MSBuild directory
/// properties take.
#[must_use]
pub fn with_trailing_separator(dir: &Utf8Path) -> String {
    let text = dir.as_str();
    if text.ends_with(std::path::MAIN_SEPARATOR) {
        text.to_owned()
    } else {
        format!("{text}{}", std::path::MAIN_SEPARATOR)
    }
}

/// Comparison key for `path` under `policy`.
#[must_use]
pub fn path_key(path: &Utf8Path, policy: CasePolicy) -> String {
    match policy {
        CasePolicy::Sensitive => path.as_str().to_owned(),
        CasePolicy::Insensitive => path.as_str().to_lowercase(),
    }
}

/// Whether `path` lies inside `dir` (or is `dir` itself).
#[must_use]
pub fn is_within(path: &Utf8Path, dir: &Utf8Path, policy: CasePolicy) -> bool {
    match policy {
        CasePolicy::Sensitive => path.starts_with(dir),
        CasePolicy::Insensitive => {
            Utf8Path::new(&path_key(path, policy)).starts_with(path_key(dir, policy))
        }
    }
}

/// Locate `name` below `dir`, returning the normalised path of an existing
/// regular file.
///
/// Under [`CasePolicy::Insensitive`] each component that does not exist as
/// spelled is matched against the directory listing ignoring ASCII case.
#[must_use]
pub fn find_file(dir: &Utf8Path, name: &str, policy: CasePolicy) -> Option<Utf8PathBuf> {
    let candidate = absolutize(dir, name);
    if candidate.is_file() {
        return Some(candidate);
    }
    match policy {
        CasePolicy::Sensitive => None,
        CasePolicy::Insensitive => find_ignoring_case(&candidate),
    }
}

fn find_ignoring_case(candidate: &Utf8Path) -> Option<Utf8PathBuf> {
    let mut resolved = Utf8PathBuf::new();
    for component in candidate.components() {
        let Utf8Component::Normal(part) = component else {
            resolved.push(component.as_str());
            continue;
        };
        let exact = resolved.join(part);
        if exact.exists() {
            resolved = exact;
            continue;
        }
        let found = resolved
            .read_dir_utf8()
            .ok()?
            .filter_map(Result::ok)
            .find(|entry| entry.file_name().eq_ignore_ascii_case(part))?;
        resolved.push(found.file_name());
    }
    resolved.is_file().then_some(resolved)
}
