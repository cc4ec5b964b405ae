//! CLI execution and command dispatch logic.
//!
//! This module keeps `main` minimal by providing a single entry point that
//! runs the selected analysis and writes its result. Library errors pass
//! through unchanged so [`render_error`] can report their diagnostic codes.

mod error;
mod output;

pub use error::RunnerError;
pub use output::is_stdout_path;

use std::io::Write;

use anyhow::{Context, Result};
use camino::Utf8Path;
use miette::Diagnostic;
use serde::Serialize;
use tracing::debug;

use crate::cli::{Cli, Commands, Format, GraphArgs, IncludesArgs, ProjectsArgs, TargetsArgs};
use crate::dgml;
use crate::include_graph::{IncludeGraphError, IncludeResolver, ResolveOptions};
use crate::model::{ConfigurationName, Project, ProjectId, Solution};
use crate::project::ProjectError;
use crate::solution::{SolutionError, SolutionOptions, parse_solution};
use crate::targets::{TargetError, TargetTreeOptions, build_target_tree, parse_property_overrides};

use output::{ProjectList, WithWarnings, emit, write_file};

/// Execute the parsed [`Cli`] command, writing results to `out`.
///
/// # Errors
///
/// Returns an error if an input cannot be loaded, a named project does not
/// exist, or the result cannot be written.
pub fn run(cli: &Cli, out: &mut dyn Write) -> Result<()> {
    match &cli.command {
        Commands::Projects(args) => handle_projects(cli, args, out),
        Commands::Includes(args) => handle_includes(cli, args, out),
        Commands::Targets(args) => handle_targets(cli, args, out),
        Commands::Graph(args) => handle_graph(cli, args, out),
    }
}

fn handle_projects(cli: &Cli, args: &ProjectsArgs, out: &mut dyn Write) -> Result<()> {
    let options = SolutionOptions {
        include_referenced_only: args.referenced_only,
        roots: args.roots.clone(),
        ..solution_options(cli, &args.solution)
    };
    let solution = parse_solution(&options)?;
    debug!(projects = solution.projects.len(), "parsed solution");
    match cli.format {
        Format::Text => emit(
            out,
            &WithWarnings {
                body: ProjectList(&solution),
                warnings: &solution.warnings,
            }
            .to_string(),
        ),
        Format::Json => emit_json(out, &solution),
    }
}

fn handle_includes(cli: &Cli, args: &IncludesArgs, out: &mut dyn Write) -> Result<()> {
    let solution = parse_solution(&solution_options(cli, &args.solution))?;
    let project = select_project(&solution, &args.project)?;
    let configuration = project_configuration(&solution, project, args.configuration.as_deref());
    let resolver = IncludeResolver::new(ResolveOptions {
        case_policy: cli.case_policy(),
        parallel: !args.sequential,
        excluded_dirs: cli.exclude_dirs.clone(),
    });
    let graph = resolver.resolve(&args.source, project, &configuration)?;
    match cli.format {
        Format::Text => emit(
            out,
            &WithWarnings {
                body: &graph,
                warnings: graph.warnings(),
            }
            .to_string(),
        ),
        Format::Json => emit_json(out, &graph),
    }
}

fn handle_targets(cli: &Cli, args: &TargetsArgs, out: &mut dyn Write) -> Result<()> {
    let options = TargetTreeOptions {
        root_target: args.target.clone().unwrap_or_default(),
        extra_search_paths: args.search_paths.clone(),
        property_overrides: parse_property_overrides(&args.properties.join(";"))?,
        platform: args.platform.clone(),
        configuration: args.configuration.clone(),
        strict_imports: cli.strict,
        tool_version: cli.tool_version.clone(),
        ..TargetTreeOptions::new(args.script.clone())
    };
    let tree = build_target_tree(&options)?;
    match cli.format {
        Format::Text => emit(
            out,
            &WithWarnings {
                body: &tree,
                warnings: tree.warnings(),
            }
            .to_string(),
        ),
        Format::Json => emit_json(out, &tree),
    }
}

fn handle_graph(cli: &Cli, args: &GraphArgs, out: &mut dyn Write) -> Result<()> {
    let solution = parse_solution(&solution_options(cli, &args.solution))?;
    let document = match (&args.source, &args.project) {
        (Some(source), Some(name)) => {
            let project = select_project(&solution, name)?;
            let configuration =
                project_configuration(&solution, project, args.configuration.as_deref());
            let resolver = IncludeResolver::new(ResolveOptions {
                case_policy: cli.case_policy(),
                excluded_dirs: cli.exclude_dirs.clone(),
                ..ResolveOptions::default()
            });
            dgml::include_graph(&resolver.resolve(source, project, &configuration)?)
        }
        _ => dgml::project_dependencies(&solution),
    };
    if is_stdout_path(&args.output) {
        emit(out, &document)
    } else {
        write_file(&args.output, &document)
    }
}

fn solution_options(cli: &Cli, path: &Utf8Path) -> SolutionOptions {
    SolutionOptions {
        strict: cli.strict,
        tool_version: cli.tool_version.clone(),
        case_policy: cli.case_policy(),
        system_include_dirs: cli.system_includes.clone(),
        ..SolutionOptions::new(path)
    }
}

/// Find a project by GUID, falling back to its display name.
fn select_project<'s>(solution: &'s Solution, wanted: &str) -> Result<&'s Project, RunnerError> {
    wanted
        .parse::<ProjectId>()
        .ok()
        .and_then(|id| solution.project(&id))
        .or_else(|| solution.project_by_name(wanted))
        .ok_or_else(|| RunnerError::ProjectNotFound {
            project: wanted.to_owned(),
            solution: solution.path.clone(),
        })
}

/// The project configuration to analyse: a requested solution configuration
/// is translated through the solution's `ActiveCfg` mapping, any other
/// request is used as given, and no request selects the project default.
fn project_configuration(solution: &Solution, project: &Project, requested: Option<&str>) -> String {
    let Some(name) = requested else {
        return project
            .default_configuration
            .as_ref()
            .map(|default| default.as_str().to_owned())
            .unwrap_or_default();
    };
    solution
        .project_configuration(&project.id, &ConfigurationName::new(name))
        .map_or_else(|| name.to_owned(), |mapped| mapped.as_str().to_owned())
}

fn emit_json<T: Serialize>(out: &mut dyn Write, value: &T) -> Result<()> {
    let mut text = serde_json::to_string_pretty(value).context("serialise result as JSON")?;
    text.push('\n');
    emit(out, &text)
}

/// Render `err` for the terminal, prefixed with the diagnostic code and
/// followed by any help text when a library error is in its chain.
#[must_use]
pub fn render_error(err: &anyhow::Error) -> String {
    let message = format!("{err:#}");
    let Some(diagnostic) = find_diagnostic(err) else {
        return message;
    };
    let mut rendered = diagnostic
        .code()
        .map_or_else(|| message.clone(), |code| format!("{code}: {message}"));
    if let Some(help) = diagnostic.help() {
        rendered.push_str("\n  help: ");
        rendered.push_str(&help.to_string());
    }
    rendered
}

fn find_diagnostic(err: &anyhow::Error) -> Option<&dyn Diagnostic> {
    err.chain().find_map(|cause| {
        cause
            .downcast_ref::<SolutionError>()
            .map(|found| found as &dyn Diagnostic)
            .or_else(|| cause.downcast_ref::<ProjectError>().map(|found| found as &dyn Diagnostic))
            .or_else(|| {
                cause
                    .downcast_ref::<IncludeGraphError>()
                    .map(|found| found as &dyn Diagnostic)
            })
            .or_else(|| cause.downcast_ref::<TargetError>().map(|found| found as &dyn Diagnostic))
            .or_else(|| cause.downcast_ref::<RunnerError>().map(|found| found as &dyn Diagnostic))
    })
}
