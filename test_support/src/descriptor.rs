//! Text builders for `.sln` and `.vcxproj` fixtures.

use std::fmt::Write as _;

use crate::CPP_PROJECT_TYPE;

const SOLUTION_FOLDER_TYPE: &str = "2150E333-8FDC-42A3-9474-1A3956D46DE8";

/// A `.vcxproj` descriptor to render.
#[derive(Clone, Debug)]
pub struct ProjectSpec {
    /// Display name.
    pub name: String,
    /// Path of the descriptor relative to the tree root.
    pub path: String,
    /// Bare GUID.
    pub guid: String,
    /// Declared `Configuration|Platform` pairs.
    pub configurations: Vec<String>,
    /// `AdditionalIncludeDirectories` entries.
    pub include_dirs: Vec<String>,
    /// `PublicIncludeDirectories` entries.
    pub public_include_dirs: Vec<String>,
    /// `ClCompile` items.
    pub sources: Vec<String>,
    /// `ClInclude` items.
    pub headers: Vec<String>,
    /// `ProjectReference` items: descriptor path relative to this project and
    /// optional GUID.
    pub references: Vec<(String, Option<String>)>,
    /// Emit `IgnoreStandardIncludePath`.
    pub ignore_standard_include_path: bool,
    /// Raw XML appended inside `<Project>`.
    pub extra: String,
}

impl ProjectSpec {
    /// A project at `<name>/<name>.vcxproj` with `Debug|x64` and `Release|x64`.
    pub fn new(name: &str, guid: &str) -> Self {
        Self {
            name: name.to_owned(),
            path: format!("{name}/{name}.vcxproj"),
            guid: guid.to_owned(),
            configurations: vec!["Debug|x64".to_owned(), "Release|x64".to_owned()],
            include_dirs: Vec::new(),
            public_include_dirs: Vec::new(),
            sources: Vec::new(),
            headers: Vec::new(),
            references: Vec::new(),
            ignore_standard_include_path: false,
            extra: String::new(),
        }
    }

    /// Place the descriptor at `path`.
    #[must_use]
    pub fn at(mut self, path: &str) -> Self {
        path.clone_into(&mut self.path);
        self
    }

    /// Replace the declared configurations.
    #[must_use]
    pub fn configurations(mut self, names: &[&str]) -> Self {
        self.configurations = names.iter().map(|&name| name.to_owned()).collect();
        self
    }

    /// Add an include directory.
    #[must_use]
    pub fn include_dir(mut self, dir: &str) -> Self {
        self.include_dirs.push(dir.to_owned());
        self
    }

    /// Add a public include directory.
    #[must_use]
    pub fn public_include_dir(mut self, dir: &str) -> Self {
        self.public_include_dirs.push(dir.to_owned());
        self
    }

    /// Add a translation unit.
    #[must_use]
    pub fn source(mut self, path: &str) -> Self {
        self.sources.push(path.to_owned());
        self
    }

    /// Add a header item.
    #[must_use]
    pub fn header(mut self, path: &str) -> Self {
        self.headers.push(path.to_owned());
        self
    }

    /// Reference `other`, stating its GUID.
    #[must_use]
    pub fn reference(mut self, other: &Self) -> Self {
        let path = relative_to(&self.path, &other.path);
        self.references.push((path, Some(other.guid.clone())));
        self
    }

    /// Reference `other` by descriptor path only.
    #[must_use]
    pub fn reference_by_path(mut self, other: &Self) -> Self {
        let path = relative_to(&self.path, &other.path);
        self.references.push((path, None));
        self
    }

    /// Reference a GUID that need not exist.
    #[must_use]
    pub fn reference_guid(mut self, path: &str, guid: &str) -> Self {
        self.references.push((path.to_owned(), Some(guid.to_owned())));
        self
    }

    /// Set `IgnoreStandardIncludePath`.
    #[must_use]
    pub const fn ignore_standard_include_path(mut self) -> Self {
        self.ignore_standard_include_path = true;
        self
    }

    /// Append raw XML.
    #[must_use]
    pub fn raw(mut self, xml: &str) -> Self {
        self.extra.push_str(xml);
        self
    }

    /// Render the descriptor.
    pub fn render(&self) -> String {
        let mut out = String::from(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<Project DefaultTargets=\"Build\" ToolsVersion=\"14.0\" xmlns=\"http://schemas.microsoft.com/developer/msbuild/2003\">\n",
        );
        out.push_str("  <ItemGroup Label=\"ProjectConfigurations\">\n");
        for configuration in &self.configurations {
            let _ = writeln!(out, "    <ProjectConfiguration Include=\"{configuration}\" />");
        }
        out.push_str("  </ItemGroup>\n");
        let _ = writeln!(
            out,
            "  <PropertyGroup Label=\"Globals\">\n    <ProjectGuid>{{{}}}</ProjectGuid>\n    <RootNamespace>{}</RootNamespace>\n  </PropertyGroup>",
            self.guid, self.name
        );
        if !self.public_include_dirs.is_empty() {
            let _ = writeln!(
                out,
                "  <PropertyGroup>\n    <PublicIncludeDirectories>{}</PublicIncludeDirectories>\n  </PropertyGroup>",
                self.public_include_dirs.join(";")
            );
        }
        out.push_str("  <ItemDefinitionGroup>\n    <ClCompile>\n");
        if !self.include_dirs.is_empty() {
            let _ = writeln!(
                out,
                "      <AdditionalIncludeDirectories>{};%(AdditionalIncludeDirectories)</AdditionalIncludeDirectories>",
                self.include_dirs.join(";")
            );
        }
        if self.ignore_standard_include_path {
            out.push_str("      <IgnoreStandardIncludePath>true</IgnoreStandardIncludePath>\n");
        }
        out.push_str("    </ClCompile>\n  </ItemDefinitionGroup>\n");
        out.push_str("  <ItemGroup>\n");
        for source in &self.sources {
            let _ = writeln!(out, "    <ClCompile Include=\"{source}\" />");
        }
        for header in &self.headers {
            let _ = writeln!(out, "    <ClInclude Include=\"{header}\" />");
        }
        out.push_str("  </ItemGroup>\n  <ItemGroup>\n");
        for (path, guid) in &self.references {
            match guid {
                Some(guid) => {
                    let _ = writeln!(
                        out,
                        "    <ProjectReference Include=\"{path}\">\n      <Project>{{{guid}}}</Project>\n    </ProjectReference>"
                    );
                }
                None => {
                    let _ = writeln!(out, "    <ProjectReference Include=\"{path}\" />");
                }
            }
        }
        out.push_str("  </ItemGroup>\n");
        out.push_str(&self.extra);
        out.push_str("</Project>\n");
        out
    }
}

/// Path of `target` relative to the directory holding `from`, both given
/// relative to the same root, written with backslashes.
fn relative_to(from: &str, target: &str) -> String {
    let depth = from.matches('/').count();
    let mut path = "..\\".repeat(depth);
    path.push_str(&target.replace('/', "\\"));
    path
}

#[derive(Clone, Debug)]
struct SolutionEntry {
    kind: String,
    name: String,
    path: String,
    guid: String,
    dependencies: Vec<String>,
    built: bool,
}

/// A `.sln` file to render.
#[derive(Clone, Debug)]
pub struct SolutionSpec {
    /// `Format Version` written in the header.
    pub format_version: String,
    /// `VisualStudioVersion` line, if any.
    pub visual_studio_version: Option<String>,
    /// Solution configurations.
    pub configurations: Vec<String>,
    entries: Vec<SolutionEntry>,
}

impl Default for SolutionSpec {
    fn default() -> Self {
        Self::new()
    }
}

impl SolutionSpec {
    /// A format 12.00 solution with `Debug|x64` and `Release|x64`.
    pub fn new() -> Self {
        Self {
            format_version: "12.00".to_owned(),
            visual_studio_version: Some("14.0.25420.1".to_owned()),
            configurations: vec!["Debug|x64".to_owned(), "Release|x64".to_owned()],
            entries: Vec::new(),
        }
    }

    /// Set the header format version.
    #[must_use]
    pub fn format(mut self, version: &str) -> Self {
        version.clone_into(&mut self.format_version);
        self
    }

    /// Drop the `VisualStudioVersion` line.
    #[must_use]
    pub fn without_visual_studio_version(mut self) -> Self {
        self.visual_studio_version = None;
        self
    }

    /// Add a C++ project built in every solution configuration.
    #[must_use]
    pub fn project(self, project: &ProjectSpec) -> Self {
        self.entry(CPP_PROJECT_TYPE, &project.name, &project.path, &project.guid, true)
    }

    /// Add a C++ project that no solution configuration builds.
    #[must_use]
    pub fn project_not_built(self, project: &ProjectSpec) -> Self {
        self.entry(CPP_PROJECT_TYPE, &project.name, &project.path, &project.guid, false)
    }

    /// Add a solution folder.
    #[must_use]
    pub fn folder(self, name: &str, guid: &str) -> Self {
        self.entry(SOLUTION_FOLDER_TYPE, name, name, guid, false)
    }

    /// Add an arbitrary entry.
    #[must_use]
    pub fn entry(mut self, kind: &str, name: &str, path: &str, guid: &str, built: bool) -> Self {
        self.entries.push(SolutionEntry {
            kind: kind.to_owned(),
            name: name.to_owned(),
            path: path.replace('/', "\\"),
            guid: guid.to_owned(),
            dependencies: Vec::new(),
            built,
        });
        self
    }

    /// Record a `ProjectDependencies` entry on the project with GUID `from`.
    #[must_use]
    pub fn depends(mut self, from: &str, on: &str) -> Self {
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.guid == from) {
            entry.dependencies.push(on.to_owned());
        }
        self
    }

    /// Render the solution text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "\nMicrosoft Visual Studio Solution File, Format Version {}\n# Visual Studio 14",
            self.format_version
        );
        if let Some(version) = &self.visual_studio_version {
            let _ = writeln!(out, "VisualStudioVersion = {version}");
            out.push_str("MinimumVisualStudioVersion = 10.0.40219.1\n");
        }
        for entry in &self.entries {
            let _ = writeln!(
                out,
                "Project(\"{{{}}}\") = \"{}\", \"{}\", \"{{{}}}\"",
                entry.kind, entry.name, entry.path, entry.guid
            );
            if !entry.dependencies.is_empty() {
                out.push_str("\tProjectSection(ProjectDependencies) = postProject\n");
                for dependency in &entry.dependencies {
                    let _ = writeln!(out, "\t\t{{{dependency}}} = {{{dependency}}}");
                }
                out.push_str("\tEndProjectSection\n");
            }
            out.push_str("EndProject\n");
        }
        out.push_str("Global\n\tGlobalSection(SolutionConfigurationPlatforms) = preSolution\n");
        for configuration in &self.configurations {
            let _ = writeln!(out, "\t\t{configuration} = {configuration}");
        }
        out.push_str("\tEndGlobalSection\n\tGlobalSection(ProjectConfigurationPlatforms) = postSolution\n");
        for entry in self.entries.iter().filter(|entry| entry.built) {
            for configuration in &self.configurations {
                let _ = writeln!(
                    out,
                    "\t\t{{{guid}}}.{configuration}.ActiveCfg = {configuration}\n\t\t{{{guid}}}.{configuration}.Build.0 = {configuration}",
                    guid = entry.guid
                );
            }
        }
        out.push_str("\tEndGlobalSection\nEndGlobal\n");
        out
    }
}
