//! Static MSBuild target trees.
//!
//! [`build_target_tree`] loads an entry script and its imports, evaluates
//! properties and conditions without running any task, and reports which
//! targets a build of the root target would run and in what order. The
//! result is a model for inspection; nothing is executed.
//!
//! ```no_run
//! use vcxgraph::targets::{TargetTreeOptions, build_target_tree};
//!
//! let options = TargetTreeOptions {
//!     root_target: "Build".to_owned(),
//!     ..TargetTreeOptions::new("build/App.proj")
//! };
//! let tree = build_target_tree(&options)?;
//! for target in tree.reachable() {
//!     println!("{}", target.name);
//! }
//! # Ok::<(), vcxgraph::targets::TargetError>(())
//! ```

mod cycle;
mod error;
mod loader;
mod tree;

use camino::Utf8PathBuf;
use indexmap::IndexMap;

use crate::msbuild::split_list;
use crate::paths::{absolutize, lexical_normalize};
use crate::solution::DEFAULT_TOOL_VERSION;

pub use error::TargetError;
pub use tree::{TargetNode, TargetTree};

/// Inputs to [`build_target_tree`].
#[derive(Clone, Debug)]
pub struct TargetTreeOptions {
    /// Script to start from. Relative paths are taken from the working
    /// directory.
    pub entry_script: Utf8PathBuf,
    /// Target to build; empty selects the script's default.
    pub root_target: String,
    /// Directories tried, in order, for imports not found next to the
    /// importing script. Relative entries are taken from the entry script's
    /// directory.
    pub extra_search_paths: Vec<Utf8PathBuf>,
    /// Global properties that scripts cannot reassign.
    pub property_overrides: IndexMap<String, String>,
    /// Log recorded warnings at `debug` instead of `warn`.
    pub quiet: bool,
    /// Seeds `$(Platform)` when set.
    pub platform: Option<String>,
    /// Seeds `$(Configuration)` when set.
    pub configuration: Option<String>,
    /// Fail on imports that cannot be resolved, read, or parsed.
    pub strict_imports: bool,
    /// Seeds `$(MSBuildToolsVersion)` and `$(VisualStudioVersion)`.
    pub tool_version: String,
}

impl Default for TargetTreeOptions {
    fn default() -> Self {
        Self {
            entry_script: Utf8PathBuf::new(),
            root_target: String::new(),
            extra_search_paths: Vec::new(),
            property_overrides: IndexMap::new(),
            quiet: false,
            platform: None,
            configuration: None,
            strict_imports: false,
            tool_version: DEFAULT_TOOL_VERSION.to_owned(),
        }
    }
}

impl TargetTreeOptions {
    /// Default options for `entry_script`.
    #[must_use]
    pub fn new(entry_script: impl Into<Utf8PathBuf>) -> Self {
        Self {
            entry_script: entry_script.into(),
            ..Self::default()
        }
    }
}

/// Load `options.entry_script` and build its target tree.
///
/// # Errors
///
/// Returns [`TargetError`] when the entry script is missing, unreadable, or
/// malformed, when the root target is not declared, or (under
/// [`TargetTreeOptions::strict_imports`]) when an import fails.
pub fn build_target_tree(options: &TargetTreeOptions) -> Result<TargetTree, TargetError> {
    let entry = entry_path(options)?;
    if !entry.is_file() {
        return Err(TargetError::NotFound { path: entry });
    }
    let loaded = loader::load(options, &entry)?;
    tree::assemble(loaded, options, entry)
}

fn entry_path(options: &TargetTreeOptions) -> Result<Utf8PathBuf, TargetError> {
    if options.entry_script.is_absolute() {
        return Ok(lexical_normalize(&options.entry_script));
    }
    let io_error = |source| TargetError::Io {
        path: options.entry_script.clone(),
        source,
    };
    let cwd = std::env::current_dir().map_err(io_error)?;
    let base = Utf8PathBuf::from_path_buf(cwd).map_err(|raw| {
        io_error(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("working directory {} is not valid UTF-8", raw.display()),
        ))
    })?;
    Ok(absolutize(&base, options.entry_script.as_str()))
}

/// Parse `Name=Value` pairs separated by `;`, as given to `/p:`.
///
/// Later entries replace earlier ones with the same name, ignoring case.
///
/// # Errors
///
/// Returns [`TargetError::InvalidOverride`] for an entry without `=` or
/// with an empty name.
pub fn parse_property_overrides(text: &str) -> Result<IndexMap<String, String>, TargetError> {
    let mut overrides: IndexMap<String, String> = IndexMap::new();
    for entry in split_list(text) {
        let Some((name, value)) = entry
            .split_once('=')
            .map(|(name, value)| (name.trim(), value.trim()))
            .filter(|(name, _)| !name.is_empty())
        else {
            return Err(TargetError::InvalidOverride {
                entry: entry.to_owned(),
            });
        };
        overrides.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
        overrides.insert(name.to_owned(), value.to_owned());
    }
    Ok(overrides)
}

#[cfg(test)]
mod tests;
