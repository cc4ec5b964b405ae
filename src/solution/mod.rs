//! `.sln` parsing and solution model construction.
//!
//! [`parse_solution`] reads the solution text, parses every C++ project
//! descriptor it lists, links project references, and returns an immutable
//! [`Solution`]. In strict mode the first malformed entry, descriptor, or
//! dangling reference aborts the parse; otherwise each is skipped and
//! recorded on [`Solution::warnings`].

mod dialect;
mod error;
mod link;
mod sln;

use std::collections::HashMap;

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;

use crate::diagnostics::{self, Warning};
use crate::model::{ConfigurationName, Project, ProjectId, Solution};
use crate::paths::{CasePolicy, absolutize, lexical_normalize};
use crate::project::{ProjectOptions, parse_project};

pub use dialect::SolutionDialect;
pub use error::SolutionError;

use link::Linker;
use sln::{SlnFile, parse_sln};

/// Tool version assumed when none is configured.
pub const DEFAULT_TOOL_VERSION: &str = "14.0";

/// Inputs to [`parse_solution`].
#[derive(Clone, Debug)]
pub struct SolutionOptions {
    /// Directory relative solution paths are joined to; the working
    /// directory when empty.
    pub base_path: Utf8PathBuf,
    /// The `.sln` file.
    pub solution_path: Utf8PathBuf,
    /// Keep only projects reachable from the root set.
    pub include_referenced_only: bool,
    /// Abort on the first malformed entry instead of recording a warning.
    pub strict: bool,
    /// MSBuild tool version selecting the solution dialect.
    pub tool_version: String,
    /// Explicit root projects for [`include_referenced_only`](Self::include_referenced_only).
    pub roots: Vec<ProjectId>,
    /// How descriptor paths are compared when linking path references.
    pub case_policy: CasePolicy,
    /// Toolchain include directories appended to every configuration.
    pub system_include_dirs: Vec<Utf8PathBuf>,
}

impl Default for SolutionOptions {
    fn default() -> Self {
        Self {
            base_path: Utf8PathBuf::new(),
            solution_path: Utf8PathBuf::new(),
            include_referenced_only: false,
            strict: false,
            tool_version: DEFAULT_TOOL_VERSION.to_owned(),
            roots: Vec::new(),
            case_policy: CasePolicy::default(),
            system_include_dirs: Vec::new(),
        }
    }
}

impl SolutionOptions {
    /// Options for `solution_path` with everything else defaulted.
    #[must_use]
    pub fn new(solution_path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            solution_path: solution_path.into(),
            ..Self::default()
        }
    }
}

/// Parse a solution and every C++ project it lists.
///
/// # Errors
///
/// Returns [`SolutionError::NotFound`] or [`SolutionError::Io`] when the
/// solution cannot be read, [`SolutionError::UnsupportedToolVersion`] for an
/// unknown tool version, and [`SolutionError::DuplicateProject`] when two
/// entries share an id. In strict mode malformed entries, descriptors, and
/// dangling references are errors as well.
pub fn parse_solution(options: &SolutionOptions) -> Result<Solution, SolutionError> {
    let dialect = SolutionDialect::for_tool_version(&options.tool_version).ok_or_else(|| {
        SolutionError::UnsupportedToolVersion {
            version: options.tool_version.clone(),
        }
    })?;
    let path = solution_file(options)?;
    if !path.is_file() {
        return Err(SolutionError::NotFound { path });
    }
    let text = std::fs::read_to_string(&path).map_err(|source| SolutionError::Io {
        path: path.clone(),
        source,
    })?;
    let file = parse_sln(&text);
    tracing::debug!(
        solution = %path,
        %dialect,
        entries = file.entries.len(),
        "read solution file"
    );

    let mut builder = Builder {
        path: &path,
        strict: options.strict,
        warnings: Vec::new(),
    };
    builder.check_header(&file, dialect)?;
    for problem in &file.problems {
        builder.problem(problem.line, &problem.message)?;
    }
    check_duplicates(&file)?;

    let solution_dir = path
        .parent()
        .map_or_else(Utf8PathBuf::new, Utf8Path::to_path_buf);
    let project_options = ProjectOptions {
        solution_dir: Some(solution_dir.clone()),
        system_include_dirs: options.system_include_dirs.clone(),
    };

    let mut linker = Linker::new(options.case_policy);
    for entry in &file.entries {
        if entry.is_folder() {
            continue;
        }
        let descriptor = absolutize(&solution_dir, &entry.path);
        let is_cpp = descriptor
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("vcxproj"));
        if !is_cpp {
            builder.warn(Warning::Parse {
                path: descriptor,
                message: format!("skipping '{}': not a C++ project", entry.name),
            });
            continue;
        }
        match parse_project(&descriptor, entry.id, &entry.name, &project_options) {
            Ok(mut parsed) => {
                if let Some(declared) = parsed.declared_id.filter(|found| *found != entry.id) {
                    tracing::debug!(
                        project = %entry.name,
                        %declared,
                        listed = %entry.id,
                        "descriptor id differs from solution entry; using the solution's"
                    );
                }
                for dependency in &entry.dependencies {
                    if !parsed.project.references.contains(dependency) {
                        parsed.project.references.push(*dependency);
                    }
                }
                builder.warnings.append(&mut parsed.warnings);
                linker.add(parsed);
            }
            Err(source) if options.strict => {
                return Err(SolutionError::Project {
                    name: entry.name.clone(),
                    source,
                });
            }
            Err(err) => builder.warn(Warning::Parse {
                path: descriptor,
                message: err.to_string(),
            }),
        }
    }

    let mut projects = linker.link(&mut builder)?;
    if options.include_referenced_only {
        let roots = root_set(&mut builder, &options.roots, &file, &projects)?;
        link::retain_reachable(&mut projects, &roots);
    }
    link::inherit_public_includes(&mut projects);
    let project_configurations = configuration_mappings(&file, &projects);

    tracing::debug!(
        solution = %path,
        projects = projects.len(),
        warnings = builder.warnings.len(),
        "parsed solution"
    );
    Ok(Solution {
        configurations: file.configurations,
        project_configurations,
        projects,
        warnings: builder.warnings,
        path,
    })
}

fn solution_file(options: &SolutionOptions) -> Result<Utf8PathBuf, SolutionError> {
    if options.solution_path.is_absolute() {
        return Ok(lexical_normalize(&options.solution_path));
    }
    let base = if options.base_path.as_str().is_empty() {
        let cwd = std::env::current_dir().map_err(|source| SolutionError::Io {
            path: options.solution_path.clone(),
            source,
        })?;
        Utf8PathBuf::from_path_buf(cwd).map_err(|raw| SolutionError::Io {
            path: options.solution_path.clone(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("working directory {} is not valid UTF-8", raw.display()),
            ),
        })?
    } else {
        options.base_path.clone()
    };
    Ok(absolutize(&base, options.solution_path.as_str()))
}

fn check_duplicates(file: &SlnFile) -> Result<(), SolutionError> {
    let mut seen: HashMap<ProjectId, &str> = HashMap::new();
    for entry in &file.entries {
        if let Some(first) = seen.insert(entry.id, &entry.name) {
            return Err(SolutionError::DuplicateProject {
                id: entry.id,
                first: first.to_owned(),
                second: entry.name.clone(),
            });
        }
    }
    Ok(())
}

/// Explicit roots, else projects built in some solution configuration, else
/// everything. An explicit root missing from the solution is an error when
/// strict and a warning otherwise.
fn root_set(
    builder: &mut Builder<'_>,
    roots: &[ProjectId],
    file: &SlnFile,
    projects: &IndexMap<ProjectId, Project>,
) -> Result<Vec<ProjectId>, SolutionError> {
    if !roots.is_empty() {
        let mut kept = Vec::with_capacity(roots.len());
        for root in roots {
            if projects.contains_key(root) {
                kept.push(*root);
            } else if builder.strict {
                return Err(SolutionError::UnknownRoot { root: *root });
            } else {
                builder.warn(Warning::UnknownRoot { root: root.to_string() });
            }
        }
        return Ok(kept);
    }
    let built: Vec<ProjectId> = projects
        .keys()
        .filter(|id| file.built.contains(*id))
        .copied()
        .collect();
    Ok(if built.is_empty() {
        projects.keys().copied().collect()
    } else {
        built
    })
}

/// `ActiveCfg` entries grouped by the projects that survived parsing.
fn configuration_mappings(
    file: &SlnFile,
    projects: &IndexMap<ProjectId, Project>,
) -> IndexMap<ProjectId, IndexMap<ConfigurationName, ConfigurationName>> {
    let mut mappings: IndexMap<ProjectId, IndexMap<ConfigurationName, ConfigurationName>> =
        IndexMap::new();
    for (id, solution_configuration, project_configuration) in &file.active {
        if projects.contains_key(id) {
            mappings
                .entry(*id)
                .or_default()
                .insert(solution_configuration.clone(), project_configuration.clone());
        }
    }
    mappings
}

/// Accumulates warnings and applies the strictness policy.
struct Builder<'a> {
    path: &'a Utf8Path,
    strict: bool,
    warnings: Vec<Warning>,
}

impl Builder<'_> {
    fn warn(&mut self, warning: Warning) {
        diagnostics::record(&mut self.warnings, warning, false);
    }

    /// A recoverable problem: an error when strict, a warning otherwise.
    fn problem(&mut self, line: usize, message: &str) -> Result<(), SolutionError> {
        if self.strict {
            return Err(SolutionError::Parse {
                path: self.path.to_path_buf(),
                line,
                message: message.to_owned(),
            });
        }
        self.warn(Warning::Parse {
            path: self.path.to_path_buf(),
            message: format!("line {line}: {message}"),
        });
        Ok(())
    }

    fn check_header(&mut self, file: &SlnFile, dialect: SolutionDialect) -> Result<(), SolutionError> {
        match file.format_version.as_deref() {
            None => self.problem(1, "missing solution file header")?,
            Some(found) if found != dialect.format_version() => self.problem(
                1,
                &format!(
                    "format version {found} does not match the {dialect} dialect of the requested tool version"
                ),
            )?,
            Some(_) => {}
        }
        if let Some(line) = file.visual_studio_version_line
            && !dialect.has_visual_studio_version()
        {
            self.warn(Warning::Parse {
                path: self.path.to_path_buf(),
                message: format!("line {line}: VisualStudioVersion is not part of the {dialect} dialect"),
            });
        }
        Ok(())
    }
}
