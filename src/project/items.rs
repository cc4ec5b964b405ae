//! Item lists collected while evaluating a project.

use camino::{Utf8Path, Utf8PathBuf};

use crate::model::ProjectId;
use crate::msbuild::{is_wildcard, split_list};
use crate::paths::absolutize;

#[derive(Debug, Default)]
pub(super) struct Items {
    pub(super) sources: Vec<Utf8PathBuf>,
    pub(super) headers: Vec<Utf8PathBuf>,
    pub(super) references: Vec<ProjectId>,
    pub(super) reference_paths: Vec<Utf8PathBuf>,
}

/// Expand an item `Include` list, honouring wildcards and `Exclude`.
///
/// Paths inside `root` come back relative to it; anything else stays
/// absolute.
pub(super) fn expand_items(root: &Utf8Path, include: &str, exclude: &str) -> Vec<Utf8PathBuf> {
    let excluded: Vec<glob::Pattern> = split_list(exclude)
        .filter_map(|raw| glob::Pattern::new(absolutize(root, raw).as_str()).ok())
        .collect();

    let mut expanded = Vec::new();
    for entry in split_list(include) {
        let path = absolutize(root, entry);
        if !is_wildcard(entry) {
            expanded.push(path);
            continue;
        }
        match glob::glob(path.as_str()) {
            Ok(matches) => expanded.extend(
                matches
                    .filter_map(Result::ok)
                    .filter_map(|found| Utf8PathBuf::from_path_buf(found).ok())
                    .filter(|found| found.is_file()),
            ),
            Err(err) => tracing::debug!(pattern = %path, %err, "ignoring invalid item wildcard"),
        }
    }

    expanded
        .into_iter()
        .filter(|path| !excluded.iter().any(|pattern| pattern.matches(path.as_str())))
        .map(|path| {
            let relative = path.strip_prefix(root).ok().map(Utf8Path::to_path_buf);
            relative.unwrap_or(path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn expands_wildcards_and_excludes() {
        let temp = tempfile::tempdir().expect("temp dir");
        let root = Utf8Path::from_path(temp.path()).expect("utf8");
        std::fs::create_dir_all(root.join("src")).expect("mkdir");
        for name in ["a.cpp", "b.cpp", "skip.cpp", "notes.txt"] {
            std::fs::write(root.join("src").join(name), "").expect("write");
        }

        let mut items = expand_items(root, "src/*.cpp;main.cpp", "src/skip.cpp");
        items.sort();
        let expected: Vec<Utf8PathBuf> = ["main.cpp", "src/a.cpp", "src/b.cpp"]
            .into_iter()
            .map(Utf8PathBuf::from)
            .collect();
        assert_eq!(items, expected);
    }
}
