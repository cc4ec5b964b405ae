//! Tests for include rule resolution.

use super::*;
use indexmap::IndexMap;
use rstest::{fixture, rstest};

fn dirs(items: &[&str]) -> Vec<Utf8PathBuf> {
    items.iter().map(Utf8PathBuf::from).collect()
}

#[fixture]
fn project() -> Project {
    let debug = ConfigurationSettings {
        include_dirs: dirs(&["/p/src", "/p/include", "/p/src/"]),
        public_include_dirs: dirs(&["/p/include"]),
        inherited_include_dirs: dirs(&["/lib/include", "/P/Include"]),
        system_include_dirs: dirs(&["/sdk/include", "/lib/include"]),
        defines: crate::model::parse_defines("_DEBUG;LEVEL=2"),
        append_system_paths: true,
    };
    let release = ConfigurationSettings {
        include_dirs: dirs(&["/p/src"]),
        inherited_include_dirs: dirs(&["/lib/include"]),
        system_include_dirs: dirs(&["/sdk/include"]),
        append_system_paths: false,
        ..ConfigurationSettings::default()
    };
    let mut configurations = IndexMap::new();
    configurations.insert(ConfigurationName::new("Debug|x64"), debug);
    configurations.insert(ConfigurationName::new("Release|x64"), release);
    Project {
        id: "C864A049-0A9E-4139-8217-DA58D9A3B73D".parse().expect("guid"),
        name: "App".to_owned(),
        path: Utf8PathBuf::from("/p/App.vcxproj"),
        root: Utf8PathBuf::from("/p"),
        sources: Vec::new(),
        headers: Vec::new(),
        configurations,
        default_configuration: Some(ConfigurationName::new("Debug|x64")),
        references: Vec::new(),
    }
}

#[rstest]
fn orders_local_then_inherited_then_system(project: Project) {
    let resolved = resolve_include_paths(&project, "Debug|x64", CasePolicy::Sensitive);
    assert!(resolved.warnings.is_empty());
    assert_eq!(
        resolved.rules.directories,
        dirs(&["/p/src", "/p/include", "/lib/include", "/P/Include", "/sdk/include"])
    );
    assert_eq!(resolved.rules.defines.len(), 2);
    assert_eq!(resolved.configuration, Some(ConfigurationName::new("Debug|x64")));
}

#[rstest]
fn case_insensitive_policy_folds_spellings(project: Project) {
    let resolved = resolve_include_paths(&project, "debug|X64", CasePolicy::Insensitive);
    assert_eq!(
        resolved.rules.directories,
        dirs(&["/p/src", "/p/include", "/lib/include", "/sdk/include"])
    );
}

#[rstest]
fn ignoring_standard_paths_keeps_only_local_directories(project: Project) {
    let resolved = resolve_include_paths(&project, "Release|x64", CasePolicy::Sensitive);
    assert_eq!(resolved.rules.directories, dirs(&["/p/src"]));
    assert!(!resolved.rules.append_system_paths);
}

#[rstest]
fn unknown_configuration_falls_back_to_default(project: Project) {
    let resolved = resolve_include_paths(&project, "Profile|ARM", CasePolicy::Sensitive);
    assert_eq!(resolved.configuration, Some(ConfigurationName::new("Debug|x64")));
    assert_eq!(resolved.rules.directories.first(), Some(&Utf8PathBuf::from("/p/src")));
    assert!(matches!(
        resolved.warnings.as_slice(),
        [Warning::ConfigurationNotFound { fallback: Some(name), .. }] if name == "Debug|x64"
    ));
}

#[rstest]
fn without_default_the_rules_are_empty(mut project: Project) {
    project.default_configuration = None;
    let resolved = resolve_include_paths(&project, "Profile|ARM", CasePolicy::Sensitive);
    assert_eq!(resolved.rules, IncludeRules::default());
    assert_eq!(resolved.configuration, None);
    assert!(matches!(
        resolved.warnings.as_slice(),
        [Warning::ConfigurationNotFound { fallback: None, .. }]
    ));
}

#[rstest]
fn resolution_is_deterministic(project: Project) {
    let first = resolve_include_paths(&project, "Debug|x64", CasePolicy::Insensitive);
    let second = resolve_include_paths(&project, "Debug|x64", CasePolicy::Insensitive);
    assert_eq!(first, second);
}
