//! End-to-end tests over the ConsoleApp solution under `tests/data`.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use rstest::{fixture, rstest};
use test_support::CONSOLE_APP_ID;
use vcxgraph::include_graph::{IncludeResolver, NodeKind, ResolveOptions, get_include_graph};
use vcxgraph::model::{ConfigurationName, ProjectId, Solution};
use vcxgraph::paths::CasePolicy;
use vcxgraph::rules::resolve_include_paths;
use vcxgraph::solution::{SolutionOptions, parse_solution};

fn data_dir() -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data")
}

#[fixture]
fn console_app() -> Solution {
    let options = SolutionOptions::new(data_dir().join("ConsoleApp/ConsoleApp.sln"));
    parse_solution(&options).expect("ConsoleApp solution parses")
}

fn console_app_id() -> ProjectId {
    CONSOLE_APP_ID.parse().expect("fixture guid")
}

#[rstest]
fn console_app_solution_has_one_project(console_app: Solution) -> Result<()> {
    assert!(console_app.warnings.is_empty(), "{:?}", console_app.warnings);
    assert_eq!(console_app.projects.len(), 1);
    let project = console_app
        .project(&console_app_id())
        .context("ConsoleApp project")?;
    assert_eq!(project.name, "ConsoleApp");
    assert_eq!(project.root, data_dir().join("ConsoleApp/ConsoleApp"));
    assert_eq!(project.sources, vec![Utf8PathBuf::from("ConsoleApp.cpp")]);
    assert_eq!(project.configurations.len(), 4);
    assert!(project.configuration("debug|X64").is_some());
    assert!(project.references.is_empty());
    let names: Vec<String> = console_app
        .configurations
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(names, ["Debug|x64", "Debug|x86", "Release|x64", "Release|x86"]);
    Ok(())
}

#[rstest]
fn console_app_source_has_exactly_one_include(console_app: Solution) -> Result<()> {
    let project = console_app
        .project(&console_app_id())
        .context("ConsoleApp project")?;
    let graph = get_include_graph(Utf8Path::new("ConsoleApp.cpp"), project, "Debug|x64")?;
    let root = graph.root();
    let children: Vec<_> = graph.children(root).collect();
    assert_eq!(children.len(), 1);
    let (_, header) = children.first().context("one child")?;
    assert_eq!(header.path, project.root.join("ConsoleApp.h"));
    assert_eq!(header.kind, NodeKind::Resolved);
    assert!(graph.warnings().is_empty(), "{:?}", graph.warnings());
    Ok(())
}

#[rstest]
fn console_app_rules_carry_configuration_defines(console_app: Solution) -> Result<()> {
    let project = console_app
        .project(&console_app_id())
        .context("ConsoleApp project")?;
    let debug = resolve_include_paths(project, "Debug|x64", CasePolicy::Sensitive);
    let release = resolve_include_paths(project, "Release|x64", CasePolicy::Sensitive);
    assert!(debug.rules.defines.contains_key("_DEBUG"));
    assert!(!debug.rules.defines.contains_key("NDEBUG"));
    assert!(release.rules.defines.contains_key("NDEBUG"));
    assert!(debug.rules.directories.is_empty());
    assert!(debug.warnings.is_empty());
    Ok(())
}

#[rstest]
fn console_app_graph_is_identical_sequentially(console_app: Solution) -> Result<()> {
    let project = console_app
        .project(&console_app_id())
        .context("ConsoleApp project")?;
    let source = Utf8Path::new("ConsoleApp.cpp");
    let parallel = IncludeResolver::new(ResolveOptions::default()).resolve(source, project, "Debug|x64")?;
    let sequential = IncludeResolver::new(ResolveOptions {
        parallel: false,
        ..ResolveOptions::default()
    })
    .resolve(source, project, "Debug|x64")?;
    assert_eq!(parallel, sequential);
    Ok(())
}

#[rstest]
#[case("Release|x86", "Release|Win32")]
#[case("debug|X86", "Debug|Win32")]
#[case("Release|x64", "Release|x64")]
fn console_app_solution_configurations_map_to_project_configurations(
    console_app: Solution,
    #[case] solution_configuration: &str,
    #[case] project_configuration: &str,
) -> Result<()> {
    let id = console_app_id();
    let mapped = console_app
        .project_configuration(&id, &ConfigurationName::new(solution_configuration))
        .context("mapped configuration")?;
    assert_eq!(mapped.as_str(), project_configuration);

    let project = console_app.project(&id).context("ConsoleApp project")?;
    let resolved = resolve_include_paths(project, mapped.as_str(), CasePolicy::Sensitive);
    assert_eq!(resolved.configuration.as_ref(), Some(mapped));
    assert!(resolved.warnings.is_empty(), "{:?}", resolved.warnings);
    Ok(())
}

#[rstest]
fn unmapped_solution_configuration_has_no_project_configuration(console_app: Solution) {
    assert!(
        console_app
            .project_configuration(&console_app_id(), &ConfigurationName::new("Profile|x64"))
            .is_none()
    );
}
