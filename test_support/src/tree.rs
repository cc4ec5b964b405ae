//! Temporary directory trees for filesystem-backed tests.

use std::fs;

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

use crate::descriptor::{ProjectSpec, SolutionSpec};

/// A temporary directory that is removed when dropped.
#[derive(Debug)]
pub struct Tree {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Tree {
    /// Create an empty tree.
    ///
    /// # Errors
    ///
    /// Fails when the temporary directory cannot be created or its path is
    /// not UTF-8.
    pub fn new() -> Result<Self> {
        let dir = TempDir::new().context("create temp dir")?;
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .map_err(|path| anyhow::anyhow!("non UTF-8 temp dir {}", path.display()))?;
        Ok(Self { _dir: dir, root })
    }

    /// Root directory of the tree.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Absolute path of `relative` inside the tree.
    pub fn path(&self, relative: &str) -> Utf8PathBuf {
        self.root.join(relative)
    }

    /// Write `contents` to `relative`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Fails when the file or its parents cannot be written.
    pub fn write(&self, relative: &str, contents: &str) -> Result<Utf8PathBuf> {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {parent}"))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {path}"))?;
        Ok(path)
    }

    /// Write each `(path, contents)` pair.
    ///
    /// # Errors
    ///
    /// Fails on the first file that cannot be written.
    pub fn write_all(&self, files: &[(&str, &str)]) -> Result<()> {
        for (relative, contents) in files {
            self.write(relative, contents)?;
        }
        Ok(())
    }

    /// Render and write a project descriptor at its [`ProjectSpec::path`].
    ///
    /// # Errors
    ///
    /// Fails when the descriptor cannot be written.
    pub fn write_project(&self, project: &ProjectSpec) -> Result<Utf8PathBuf> {
        self.write(&project.path, &project.render())
    }

    /// Render and write a solution file named `relative`.
    ///
    /// # Errors
    ///
    /// Fails when the solution cannot be written.
    pub fn write_solution(&self, relative: &str, solution: &SolutionSpec) -> Result<Utf8PathBuf> {
        self.write(relative, &solution.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn write_creates_parent_directories() -> Result<()> {
        let tree = Tree::new()?;
        let path = tree.write("a/b/c.h", "#pragma once\n")?;
        assert_eq!(fs::read_to_string(&path)?, "#pragma once\n");
        assert!(path.starts_with(tree.root()));
        Ok(())
    }
}
