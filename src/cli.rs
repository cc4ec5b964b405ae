//! Command line interface definition using clap.
//!
//! This module defines the [`Cli`] structure and its subcommands. Options
//! shared by every analysis are global so they may follow the subcommand.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::model::ProjectId;
use crate::paths::CasePolicy;
use crate::solution::DEFAULT_TOOL_VERSION;

/// Inspect MSBuild C/C++ solutions: projects, include graphs, and targets.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose diagnostic logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Fail on malformed solution entries instead of skipping them.
    #[arg(long, global = true)]
    pub strict: bool,

    /// MSBuild tool version, selecting the solution dialect.
    #[arg(long, global = true, value_name = "VERSION", default_value = DEFAULT_TOOL_VERSION)]
    pub tool_version: String,

    /// Match include names and paths ignoring ASCII case.
    #[arg(long, global = true)]
    pub case_insensitive: bool,

    /// Treat headers under this directory as leaves. May be repeated.
    #[arg(long = "exclude-dir", global = true, value_name = "DIR")]
    pub exclude_dirs: Vec<Utf8PathBuf>,

    /// Toolchain include directory searched after project directories.
    /// May be repeated.
    #[arg(long = "system-include", global = true, value_name = "DIR")]
    pub system_includes: Vec<Utf8PathBuf>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    /// Analysis to run.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Case policy selected by `--case-insensitive`.
    #[must_use]
    pub const fn case_policy(&self) -> CasePolicy {
        if self.case_insensitive {
            CasePolicy::Insensitive
        } else {
            CasePolicy::Sensitive
        }
    }
}

/// How results are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Available top-level commands.
#[derive(Debug, Subcommand, PartialEq, Eq, Clone)]
pub enum Commands {
    /// List the projects of a solution with their configurations and
    /// references.
    Projects(ProjectsArgs),

    /// Print the include graph of one source file.
    Includes(IncludesArgs),

    /// Print the targets a build script would run.
    Targets(TargetsArgs),

    /// Write a DGML graph of project references, or of one file's includes.
    Graph(GraphArgs),
}

/// Arguments accepted by the `projects` command.
#[derive(Debug, Args, PartialEq, Eq, Clone)]
pub struct ProjectsArgs {
    /// The `.sln` file.
    #[arg(value_name = "SOLUTION")]
    pub solution: Utf8PathBuf,

    /// Keep only projects reachable from the root projects.
    #[arg(long)]
    pub referenced_only: bool,

    /// Root project GUID for `--referenced-only`. May be repeated.
    #[arg(long = "root", value_name = "GUID", requires = "referenced_only")]
    pub roots: Vec<ProjectId>,
}

/// Arguments accepted by the `includes` command.
#[derive(Debug, Args, PartialEq, Eq, Clone)]
pub struct IncludesArgs {
    /// The `.sln` file.
    #[arg(value_name = "SOLUTION")]
    pub solution: Utf8PathBuf,

    /// Project name or GUID.
    #[arg(short, long)]
    pub project: String,

    /// Source file, relative to the project directory or absolute.
    #[arg(value_name = "SOURCE")]
    pub source: Utf8PathBuf,

    /// Configuration such as `Debug|x64`; defaults to the project's.
    #[arg(short, long)]
    pub configuration: Option<String>,

    /// Scan files on the calling thread only.
    #[arg(long)]
    pub sequential: bool,
}

/// Arguments accepted by the `targets` command.
#[derive(Debug, Args, PartialEq, Eq, Clone)]
pub struct TargetsArgs {
    /// Entry build script.
    #[arg(value_name = "SCRIPT")]
    pub script: Utf8PathBuf,

    /// Root target; defaults to the script's `DefaultTargets`.
    #[arg(short, long)]
    pub target: Option<String>,

    /// Directory searched for imports not found next to their importer.
    /// May be repeated.
    #[arg(long = "search-path", value_name = "DIR")]
    pub search_paths: Vec<Utf8PathBuf>,

    /// Global properties as `Name=Value;Name=Value`. May be repeated.
    #[arg(short = 'p', long = "property", value_name = "PROPERTIES")]
    pub properties: Vec<String>,

    /// Seeds `$(Configuration)`.
    #[arg(short, long)]
    pub configuration: Option<String>,

    /// Seeds `$(Platform)`.
    #[arg(long)]
    pub platform: Option<String>,
}

/// Arguments accepted by the `graph` command.
#[derive(Debug, Args, PartialEq, Eq, Clone)]
pub struct GraphArgs {
    /// The `.sln` file.
    #[arg(value_name = "SOLUTION")]
    pub solution: Utf8PathBuf,

    /// Graph this source file's includes instead of project references.
    #[arg(long, value_name = "SOURCE", requires = "project")]
    pub source: Option<Utf8PathBuf>,

    /// Project owning `--source`, by name or GUID.
    #[arg(short, long)]
    pub project: Option<String>,

    /// Configuration for `--source`; defaults to the project's.
    #[arg(short, long)]
    pub configuration: Option<String>,

    /// Output file; `-` writes to standard output.
    #[arg(short, long, value_name = "FILE", default_value = "-")]
    pub output: Utf8PathBuf,
}
