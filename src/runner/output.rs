//! Output helpers: text rendering and writers that tolerate closed pipes.

use std::fmt;
use std::fs;
use std::io::{self, Write};

use anyhow::{Context, Result};
use camino::Utf8Path;
use itertools::Itertools;
use tracing::info;

use crate::diagnostics::Warning;
use crate::model::Solution;

/// Return `true` when `path` is the CLI sentinel indicating "write to stdout".
#[must_use]
pub fn is_stdout_path(path: &Utf8Path) -> bool {
    path.as_str() == "-"
}

fn is_broken_pipe(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::BrokenPipe
}

fn write_all_ignoring_broken_pipe(writer: &mut dyn Write, buf: &[u8]) -> io::Result<()> {
    match writer.write_all(buf) {
        Ok(()) => Ok(()),
        Err(err) if is_broken_pipe(&err) => Ok(()),
        Err(err) => Err(err),
    }
}

fn flush_ignoring_broken_pipe(writer: &mut dyn Write) -> io::Result<()> {
    match writer.flush() {
        Ok(()) => Ok(()),
        Err(err) if is_broken_pipe(&err) => Ok(()),
        Err(err) => Err(err),
    }
}

/// Write `content` to `out`. A reader that went away early is not an error.
pub(super) fn emit(out: &mut dyn Write, content: &str) -> Result<()> {
    write_all_ignoring_broken_pipe(out, content.as_bytes()).context("write to standard output")?;
    flush_ignoring_broken_pipe(out).context("flush standard output")?;
    Ok(())
}

/// Write `content` to `path`, creating parent directories.
pub(super) fn write_file(path: &Utf8Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create directory {parent}"))?;
    }
    fs::write(path, content).with_context(|| format!("write {path}"))?;
    info!("Wrote {path}");
    Ok(())
}

/// A rendered result followed by its warnings, if any.
pub(super) struct WithWarnings<'a, T> {
    pub body: T,
    pub warnings: &'a [Warning],
}

impl<T: fmt::Display> fmt::Display for WithWarnings<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.body)?;
        if self.warnings.is_empty() {
            return Ok(());
        }
        writeln!(f, "\nwarnings:")?;
        for warning in self.warnings {
            writeln!(f, "  {warning}")?;
        }
        Ok(())
    }
}

/// One block per project: name and id, descriptor, configurations, and
/// direct references by name.
pub(super) struct ProjectList<'s>(pub &'s Solution);

impl fmt::Display for ProjectList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let solution = self.0;
        for project in solution.projects.values() {
            writeln!(f, "{} {}", project.name, project.id)?;
            writeln!(f, "  path: {}", project.path)?;
            writeln!(
                f,
                "  configurations: {}",
                project.configurations.keys().join(", ")
            )?;
            if !project.references.is_empty() {
                let names = project.references.iter().map(|id| {
                    solution
                        .project(id)
                        .map_or_else(|| id.to_string(), |referenced| referenced.name.clone())
                });
                writeln!(f, "  references: {}", names.format(", "))?;
            }
        }
        Ok(())
    }
}
