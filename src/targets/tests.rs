//! Tests for target tree construction.

use super::*;
use crate::diagnostics::Warning;
use anyhow::Result;
use rstest::rstest;
use test_support::Tree;

fn script(attributes: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<Project {attributes} xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
{body}
</Project>
"#
    )
}

fn reachable(tree: &TargetTree) -> Vec<&str> {
    tree.reachable().map(|node| node.name.as_str()).collect()
}

fn options(tree: &Tree, entry: &str) -> TargetTreeOptions {
    TargetTreeOptions::new(tree.path(entry))
}

#[rstest]
fn default_target_closure_runs_prerequisites_first() -> Result<()> {
    let tree = Tree::new()?;
    tree.write(
        "build.proj",
        &script(
            r#"DefaultTargets="Build""#,
            r#"
  <Target Name="Unused" />
  <Target Name="Build" DependsOnTargets="Compile;Link" />
  <Target Name="Compile" />
  <Target Name="Link" DependsOnTargets="Compile" />
"#,
        ),
    )?;

    let built = build_target_tree(&options(&tree, "build.proj"))?;
    assert_eq!(built.root(), "Build");
    assert_eq!(reachable(&built), ["Compile", "Link", "Build"]);
    assert!(!built.is_reachable("unused"));
    assert_eq!(built.targets().count(), 4);
    assert!(built.warnings().is_empty());
    assert_eq!(built.to_string(), "Compile\nLink <- Compile\nBuild <- Compile, Link\n");
    Ok(())
}

#[rstest]
fn first_declared_target_is_the_fallback_root() -> Result<()> {
    let tree = Tree::new()?;
    tree.write(
        "build.proj",
        &script("", r#"<Target Name="Pack" /><Target Name="Build" />"#),
    )?;

    let built = build_target_tree(&options(&tree, "build.proj"))?;
    assert_eq!(built.root(), "Pack");
    assert_eq!(reachable(&built), ["Pack"]);
    Ok(())
}

#[rstest]
fn imports_contribute_properties_and_targets_in_document_order() -> Result<()> {
    let tree = Tree::new()?;
    tree.write_all(&[
        (
            "build.proj",
            &script(
                r#"DefaultTargets="Build""#,
                r#"
  <PropertyGroup><BuildDependsOn>Compile</BuildDependsOn></PropertyGroup>
  <Import Project="common.targets" />
  <Import Project="$(MSBuildThisFileDirectory)extensions\*.targets" />
  <Target Name="Build" DependsOnTargets="$(BuildDependsOn)" />
"#,
            ),
        ),
        (
            "common.targets",
            &script(
                "",
                r#"
  <PropertyGroup><BuildDependsOn>Prepare;$(BuildDependsOn)</BuildDependsOn></PropertyGroup>
  <Target Name="Prepare" />
  <Target Name="Compile" />
"#,
            ),
        ),
        (
            "extensions/b.targets",
            &script("", r#"<Target Name="Stamp" AfterTargets="Build" />"#),
        ),
        (
            "extensions/a.targets",
            &script("", r#"<Target Name="Lint" BeforeTargets="Compile" />"#),
        ),
    ])?;

    let built = build_target_tree(&options(&tree, "build.proj"))?;
    assert_eq!(
        built.scripts(),
        [
            tree.path("build.proj"),
            tree.path("common.targets"),
            tree.path("extensions/a.targets"),
            tree.path("extensions/b.targets"),
        ]
    );
    assert_eq!(
        built.get("build").map(|node| node.prerequisites.clone()),
        Some(vec!["Prepare".to_owned(), "Compile".to_owned()])
    );
    assert_eq!(reachable(&built), ["Prepare", "Lint", "Compile", "Build", "Stamp"]);
    Ok(())
}

#[rstest]
fn imports_fall_back_to_search_paths() -> Result<()> {
    let tree = Tree::new()?;
    tree.write_all(&[
        (
            "app/build.proj",
            &script("", r#"<Import Project="shared.targets" />"#),
        ),
        (
            "sdk/shared.targets",
            &script("", r#"<Target Name="Shared" />"#),
        ),
    ])?;
    let mut opts = options(&tree, "app/build.proj");
    opts.extra_search_paths = vec!["../sdk".into()];

    let built = build_target_tree(&opts)?;
    assert_eq!(built.root(), "Shared");
    assert_eq!(built.get("shared").map(|node| node.script.clone()), Some(tree.path("sdk/shared.targets")));
    Ok(())
}

#[rstest]
#[case(false)]
#[case(true)]
fn unresolved_imports_follow_strictness(#[case] strict_imports: bool) -> Result<()> {
    let tree = Tree::new()?;
    tree.write(
        "build.proj",
        &script("", r#"<Import Project="missing.targets" /><Target Name="Build" />"#),
    )?;
    let opts = TargetTreeOptions {
        strict_imports,
        ..options(&tree, "build.proj")
    };

    let result = build_target_tree(&opts);
    if strict_imports {
        assert!(matches!(
            result,
            Err(TargetError::UnresolvedImport { import, .. }) if import == "missing.targets"
        ));
    } else {
        let built = result?;
        assert!(matches!(
            built.warnings(),
            [Warning::UnresolvedImport { import, .. }] if import == "missing.targets"
        ));
    }
    Ok(())
}

#[rstest]
fn unmatched_wildcard_imports_are_silent() -> Result<()> {
    let tree = Tree::new()?;
    tree.write(
        "build.proj",
        &script("", r#"<Import Project="none\*.props" /><Target Name="Build" />"#),
    )?;

    let built = build_target_tree(&TargetTreeOptions {
        strict_imports: true,
        ..options(&tree, "build.proj")
    })?;
    assert!(built.warnings().is_empty());
    Ok(())
}

#[rstest]
fn import_cycles_load_each_script_once() -> Result<()> {
    let tree = Tree::new()?;
    tree.write_all(&[
        (
            "a.proj",
            &script(
                r#"DefaultTargets="A""#,
                r#"<Import Project="b.targets" /><Target Name="A" DependsOnTargets="B" />"#,
            ),
        ),
        (
            "b.targets",
            &script("", r#"<Import Project="a.proj" /><Import Project="./b.targets" /><Target Name="B" />"#),
        ),
    ])?;

    let built = build_target_tree(&options(&tree, "a.proj"))?;
    assert_eq!(built.scripts(), [tree.path("a.proj"), tree.path("b.targets")]);
    assert_eq!(reachable(&built), ["B", "A"]);
    Ok(())
}

#[rstest]
#[case(false)]
#[case(true)]
fn malformed_imports_follow_strictness(#[case] strict_imports: bool) -> Result<()> {
    let tree = Tree::new()?;
    tree.write_all(&[
        (
            "build.proj",
            &script("", r#"<Import Project="broken.targets" /><Target Name="Build" />"#),
        ),
        ("broken.targets", "<Project><Target Name=\"X\"></Project>"),
    ])?;

    let result = build_target_tree(&TargetTreeOptions {
        strict_imports,
        ..options(&tree, "build.proj")
    });
    if strict_imports {
        assert!(matches!(result, Err(TargetError::Parse { .. })));
    } else {
        let built = result?;
        assert!(matches!(
            built.warnings(),
            [Warning::Parse { path, .. }] if *path == tree.path("broken.targets")
        ));
        assert!(built.get("X").is_none());
    }
    Ok(())
}

#[rstest]
fn overrides_and_seeded_globals_cannot_be_reassigned() -> Result<()> {
    let tree = Tree::new()?;
    tree.write(
        "build.proj",
        &script(
            "",
            r#"
  <PropertyGroup>
    <Configuration>Debug</Configuration>
    <Flavor>plain</Flavor>
  </PropertyGroup>
  <Target Name="Build" DependsOnTargets="Package_$(Configuration);Tools_$(MSBuildToolsVersion);$(Flavor)" />
"#,
        ),
    )?;
    let opts = TargetTreeOptions {
        property_overrides: parse_property_overrides("Configuration=Release;flavor = fancy")?,
        tool_version: "12.0".to_owned(),
        ..options(&tree, "build.proj")
    };

    let built = build_target_tree(&opts)?;
    assert_eq!(
        built.get("Build").map(|node| node.prerequisites.clone()),
        Some(vec![
            "Package_Release".to_owned(),
            "Tools_12.0".to_owned(),
            "fancy".to_owned()
        ])
    );
    Ok(())
}

#[rstest]
fn conditions_select_branches_and_disable_targets() -> Result<()> {
    let tree = Tree::new()?;
    tree.write(
        "build.proj",
        &script(
            r#"DefaultTargets="Build""#,
            r#"
  <Choose>
    <When Condition="'$(Platform)' == 'x64'">
      <PropertyGroup><Arch>64</Arch></PropertyGroup>
    </When>
    <Otherwise>
      <PropertyGroup><Arch>32</Arch></PropertyGroup>
    </Otherwise>
  </Choose>
  <Target Name="Build" DependsOnTargets="Sign;Link$(Arch)" />
  <Target Name="Sign" Condition="'$(Configuration)' == 'Release'" DependsOnTargets="Certificate" />
  <Target Name="Link64" />
  <Target Name="Link32" />
"#,
        ),
    )?;
    let opts = TargetTreeOptions {
        platform: Some("x64".to_owned()),
        configuration: Some("Debug".to_owned()),
        ..options(&tree, "build.proj")
    };

    let built = build_target_tree(&opts)?;
    assert_eq!(reachable(&built), ["Sign", "Link64", "Build"]);
    assert_eq!(built.get("sign").map(|node| node.enabled), Some(false));
    assert!(built.warnings().is_empty(), "disabled targets are not walked");
    Ok(())
}

#[rstest]
fn unparseable_conditions_are_false_with_a_warning() -> Result<()> {
    let tree = Tree::new()?;
    tree.write(
        "build.proj",
        &script(
            "",
            r#"
  <PropertyGroup Condition="'$(A)' = 'b'"><Step>Extra</Step></PropertyGroup>
  <Target Name="Build" DependsOnTargets="$(Step)" />
"#,
        ),
    )?;

    let built = build_target_tree(&TargetTreeOptions {
        quiet: true,
        ..options(&tree, "build.proj")
    })?;
    assert_eq!(built.get("Build").map(|node| node.prerequisites.len()), Some(0));
    assert!(matches!(built.warnings(), [Warning::Condition { .. }]));
    Ok(())
}

#[rstest]
fn call_target_tasks_are_prerequisites() -> Result<()> {
    let tree = Tree::new()?;
    tree.write(
        "build.proj",
        &script(
            "",
            r#"
  <Target Name="Build" DependsOnTargets="Compile">
    <Message Text="building" />
    <CallTarget Targets="Pack;compile" />
  </Target>
  <Target Name="Compile" />
  <Target Name="Pack" />
"#,
        ),
    )?;

    let built = build_target_tree(&options(&tree, "build.proj"))?;
    assert_eq!(
        built.get("build").map(|node| node.prerequisites.clone()),
        Some(vec!["Compile".to_owned(), "Pack".to_owned()])
    );
    assert_eq!(reachable(&built), ["Compile", "Pack", "Build"]);
    Ok(())
}

#[rstest]
fn later_declarations_win_and_lookup_ignores_case() -> Result<()> {
    let tree = Tree::new()?;
    tree.write_all(&[
        (
            "build.proj",
            &script(
                "",
                r#"<Target Name="Build" DependsOnTargets="Old" /><Import Project="override.targets" /><Target Name="Old" /><Target Name="New" />"#,
            ),
        ),
        (
            "override.targets",
            &script("", r#"<Target Name="BUILD" DependsOnTargets="New" />"#),
        ),
    ])?;

    let built = build_target_tree(&TargetTreeOptions {
        root_target: "build".to_owned(),
        ..options(&tree, "build.proj")
    })?;
    let build = built.get("Build").expect("build target");
    assert_eq!(build.name, "BUILD");
    assert_eq!(build.script, tree.path("override.targets"));
    assert_eq!(reachable(&built), ["New", "BUILD"]);
    Ok(())
}

#[rstest]
fn missing_prerequisites_and_cycles_are_warnings() -> Result<()> {
    let tree = Tree::new()?;
    tree.write(
        "build.proj",
        &script(
            "",
            r#"
  <Target Name="Build" DependsOnTargets="Compile;Ghost" />
  <Target Name="Compile" DependsOnTargets="Generate" />
  <Target Name="Generate" DependsOnTargets="Compile" />
"#,
        ),
    )?;

    let built = build_target_tree(&options(&tree, "build.proj"))?;
    assert_eq!(reachable(&built), ["Generate", "Compile", "Build"]);
    assert_eq!(
        built.warnings(),
        [
            Warning::MissingTarget {
                target: "Build".to_owned(),
                prerequisite: "Ghost".to_owned(),
            },
            Warning::TargetCycle {
                cycle: vec!["Compile".to_owned(), "Generate".to_owned(), "Compile".to_owned()],
            },
        ]
    );
    Ok(())
}

#[rstest]
fn root_selection_failures() -> Result<()> {
    let tree = Tree::new()?;
    tree.write_all(&[
        ("empty.proj", &script("", "<PropertyGroup />")),
        ("one.proj", &script("", r#"<Target Name="Build" />"#)),
        ("bad.proj", "<Project><Target></Project>"),
        ("other.xml", "<Package />"),
    ])?;

    assert!(matches!(
        build_target_tree(&options(&tree, "empty.proj")),
        Err(TargetError::NoTargets { .. })
    ));
    assert!(matches!(
        build_target_tree(&TargetTreeOptions {
            root_target: "Deploy".to_owned(),
            ..options(&tree, "one.proj")
        }),
        Err(TargetError::TargetNotFound { target, .. }) if target == "Deploy"
    ));
    assert!(matches!(
        build_target_tree(&options(&tree, "bad.proj")),
        Err(TargetError::Parse { .. })
    ));
    assert!(matches!(
        build_target_tree(&options(&tree, "other.xml")),
        Err(TargetError::Parse { message, .. }) if message.contains("<Package>")
    ));
    assert!(matches!(
        build_target_tree(&options(&tree, "absent.proj")),
        Err(TargetError::NotFound { .. })
    ));
    Ok(())
}

#[rstest]
#[case("", &[])]
#[case("A=1", &[("A", "1")])]
#[case(" A = 1 ; B=x=y;", &[("A", "1"), ("B", "x=y")])]
#[case("A=1;a=2", &[("a", "2")])]
#[case("Empty=", &[("Empty", "")])]
fn parses_property_overrides(#[case] text: &str, #[case] expected: &[(&str, &str)]) -> Result<()> {
    let parsed = parse_property_overrides(text)?;
    let pairs: Vec<(&str, &str)> = parsed
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect();
    assert_eq!(pairs, expected);
    Ok(())
}

#[rstest]
#[case("Flag")]
#[case("=1")]
#[case("A=1;B")]
fn rejects_malformed_overrides(#[case] text: &str) {
    assert!(matches!(
        parse_property_overrides(text),
        Err(TargetError::InvalidOverride { .. })
    ));
}
