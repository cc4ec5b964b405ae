//! Tests for descriptor evaluation.

use super::*;
use rstest::{fixture, rstest};

const APP: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Project DefaultTargets="Build" ToolsVersion="14.0" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <ItemGroup Label="ProjectConfigurations">
    <ProjectConfiguration Include="Debug|x64">
      <Configuration>Debug</Configuration>
      <Platform>x64</Platform>
    </ProjectConfiguration>
    <ProjectConfiguration Include="Release|x64">
      <Configuration>Release</Configuration>
      <Platform>x64</Platform>
    </ProjectConfiguration>
  </ItemGroup>
  <PropertyGroup Label="Globals">
    <ProjectGuid>{C864A049-0A9E-4139-8217-DA58D9A3B73D}</ProjectGuid>
    <RootNamespace>ConsoleApp</RootNamespace>
  </PropertyGroup>
  <Import Project="$(VCTargetsPath)\Microsoft.Cpp.Default.props" />
  <PropertyGroup Condition="'$(Configuration)|$(Platform)'=='Debug|x64'">
    <IncludePath>$(ProjectDir)sdk;$(IncludePath)</IncludePath>
  </PropertyGroup>
  <ItemDefinitionGroup>
    <ClCompile>
      <AdditionalIncludeDirectories>include;..\Shared</AdditionalIncludeDirectories>
      <PreprocessorDefinitions>WIN32;%(PreprocessorDefinitions)</PreprocessorDefinitions>
    </ClCompile>
  </ItemDefinitionGroup>
  <ItemDefinitionGroup Condition="'$(Configuration)|$(Platform)'=='Debug|x64'">
    <ClCompile>
      <AdditionalIncludeDirectories>debug;%(AdditionalIncludeDirectories)</AdditionalIncludeDirectories>
      <PreprocessorDefinitions>_DEBUG;LEVEL=3;%(PreprocessorDefinitions)</PreprocessorDefinitions>
    </ClCompile>
  </ItemDefinitionGroup>
  <ItemDefinitionGroup Condition="'$(Configuration)|$(Platform)'=='Release|x64'">
    <ClCompile>
      <IgnoreStandardIncludePath>true</IgnoreStandardIncludePath>
    </ClCompile>
  </ItemDefinitionGroup>
  <ItemGroup>
    <ClCompile Include="ConsoleApp.cpp" />
    <ClCompile Include="debug_only.cpp" Condition="'$(Configuration)'=='Debug'" />
    <ClInclude Include="ConsoleApp.h" />
  </ItemGroup>
  <ItemGroup>
    <ProjectReference Include="..\Lib\Lib.vcxproj">
      <Project>{5A0A7E83-3E2C-4C8B-9F0E-1D2B3C4D5E6F}</Project>
    </ProjectReference>
    <ProjectReference Include="..\Other\Other.vcxproj" />
  </ItemGroup>
</Project>
"#;

#[fixture]
fn id() -> ProjectId {
    "C864A049-0A9E-4139-8217-DA58D9A3B73D".parse().expect("guid")
}

#[fixture]
fn parsed(id: ProjectId) -> ParsedProject {
    let options = ProjectOptions {
        solution_dir: Some(Utf8PathBuf::from("/work")),
        system_include_dirs: vec![Utf8PathBuf::from("/toolchain/include")],
    };
    parse_project_str(APP, Utf8Path::new("/work/App/App.vcxproj"), id, "App", &options)
        .expect("parse project")
}

fn paths(items: &[&str]) -> Vec<Utf8PathBuf> {
    items.iter().map(Utf8PathBuf::from).collect()
}

#[rstest]
fn reads_identity_and_items(parsed: ParsedProject, id: ProjectId) {
    let project = &parsed.project;
    assert_eq!(project.id, id);
    assert_eq!(project.name, "App");
    assert_eq!(project.root, Utf8PathBuf::from("/work/App"));
    assert_eq!(parsed.declared_id, Some(id));
    assert_eq!(project.sources, paths(&["ConsoleApp.cpp", "debug_only.cpp"]));
    assert_eq!(project.headers, paths(&["ConsoleApp.h"]));
}

#[rstest]
fn evaluates_configuration_specific_settings(parsed: ParsedProject) {
    let project = &parsed.project;
    let debug = project.configuration("debug|X64").expect("debug configuration");
    assert_eq!(
        debug.include_dirs,
        paths(&["/work/App/debug", "/work/App/include", "/work/Shared"])
    );
    assert_eq!(
        debug.system_include_dirs,
        paths(&["/work/App/sdk", "/toolchain/include"])
    );
    assert!(debug.append_system_paths);
    assert_eq!(debug.defines.get("LEVEL"), Some(&Some("3".to_owned())));
    assert!(debug.defines.contains_key("WIN32"));

    let release = project.configuration("Release|x64").expect("release configuration");
    assert_eq!(release.include_dirs, paths(&["/work/App/include", "/work/Shared"]));
    assert!(!release.append_system_paths);
    assert!(!release.defines.contains_key("_DEBUG"));
}

#[rstest]
fn first_declared_configuration_is_the_default(parsed: ParsedProject) {
    assert_eq!(
        parsed.project.default_configuration,
        Some(ConfigurationName::new("Debug|x64"))
    );
}

#[rstest]
fn splits_references_by_guid_presence(parsed: ParsedProject) {
    let lib: ProjectId = "5A0A7E83-3E2C-4C8B-9F0E-1D2B3C4D5E6F".parse().expect("guid");
    assert_eq!(parsed.project.references, vec![lib]);
    assert_eq!(
        parsed.unresolved_reference_paths,
        paths(&["/work/Other/Other.vcxproj"])
    );
}

#[rstest]
fn explicit_defaults_select_the_default_configuration(id: ProjectId) {
    let source = r#"<Project>
  <ItemGroup>
    <ProjectConfiguration Include="Debug|Win32" />
    <ProjectConfiguration Include="Release|Win32" />
  </ItemGroup>
  <PropertyGroup>
    <Configuration Condition=" '$(Configuration)' == '' ">Release</Configuration>
    <Platform Condition=" '$(Platform)' == '' ">Win32</Platform>
  </PropertyGroup>
</Project>"#;
    let parsed = parse_project_str(
        source,
        Utf8Path::new("/p/P.vcxproj"),
        id,
        "",
        &ProjectOptions::default(),
    )
    .expect("parse");
    assert_eq!(
        parsed.project.default_configuration,
        Some(ConfigurationName::new("Release|Win32"))
    );
    assert_eq!(parsed.project.name, "P");
}

#[rstest]
#[case(
    "<PropertyGroup><Configuration>Release</Configuration><Platform>x64</Platform></PropertyGroup>",
    "Release|x64"
)]
#[case("", "Debug|Win32")]
fn undeclared_configurations_use_property_defaults(
    id: ProjectId,
    #[case] properties: &str,
    #[case] expected: &str,
) {
    let source = format!(
        r#"<Project>
  {properties}
  <ItemGroup><ClCompile Include="main.cpp" /></ItemGroup>
</Project>"#
    );
    let parsed = parse_project_str(
        &source,
        Utf8Path::new("/p/P.vcxproj"),
        id,
        "P",
        &ProjectOptions::default(),
    )
    .expect("parse");
    let name = ConfigurationName::new(expected);
    assert_eq!(parsed.project.default_configuration.as_ref(), Some(&name));
    assert_eq!(
        parsed.project.configurations.keys().collect::<Vec<_>>(),
        vec![&name]
    );
    assert_eq!(parsed.project.sources, paths(&["main.cpp"]));
}

#[rstest]
fn public_include_directories_are_exposed(id: ProjectId) {
    let source = r#"<Project>
  <ItemGroup><ProjectConfiguration Include="Debug|x64" /></ItemGroup>
  <PropertyGroup>
    <PublicIncludeDirectories>api</PublicIncludeDirectories>
    <AllProjectIncludesArePublic>true</AllProjectIncludesArePublic>
  </PropertyGroup>
  <ItemDefinitionGroup>
    <ClCompile><AdditionalIncludeDirectories>internal</AdditionalIncludeDirectories></ClCompile>
  </ItemDefinitionGroup>
</Project>"#;
    let parsed = parse_project_str(
        source,
        Utf8Path::new("/lib/Lib.vcxproj"),
        id,
        "Lib",
        &ProjectOptions::default(),
    )
    .expect("parse");
    let settings = parsed.project.configuration("Debug|x64").expect("configuration");
    assert_eq!(
        settings.public_include_dirs,
        paths(&["/lib/internal", "/lib/api"])
    );
}

#[rstest]
fn unparseable_conditions_become_warnings(id: ProjectId) {
    let source = r#"<Project>
  <ItemGroup><ProjectConfiguration Include="Debug|x64" /></ItemGroup>
  <PropertyGroup Condition="'$(Configuration)' === 'Debug'">
    <IncludePath>never</IncludePath>
  </PropertyGroup>
</Project>"#;
    let parsed = parse_project_str(
        source,
        Utf8Path::new("/p/P.vcxproj"),
        id,
        "P",
        &ProjectOptions::default(),
    )
    .expect("parse");
    assert_eq!(parsed.warnings.len(), 1);
    assert!(matches!(parsed.warnings.first(), Some(Warning::Condition { .. })));
    let settings = parsed.project.configuration("Debug|x64").expect("configuration");
    assert!(settings.system_include_dirs.is_empty());
}

#[rstest]
#[case("<Project><ItemGroup></Project>", "not well-formed")]
#[case("<Solution />", "expected a <Project> root element")]
fn rejects_invalid_descriptors(id: ProjectId, #[case] source: &str, #[case] message: &str) {
    let err = parse_project_str(
        source,
        Utf8Path::new("/p/P.vcxproj"),
        id,
        "P",
        &ProjectOptions::default(),
    )
    .expect_err("invalid");
    assert!(err.to_string().contains(message), "{err}");
}

#[rstest]
fn missing_descriptor_is_not_found(id: ProjectId) {
    let err = parse_project(
        Utf8Path::new("/definitely/missing/P.vcxproj"),
        id,
        "P",
        &ProjectOptions::default(),
    )
    .expect_err("missing");
    assert!(matches!(err, ProjectError::NotFound { .. }));
}
