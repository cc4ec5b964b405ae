//! Per-configuration static evaluation of a project descriptor.

use camino::{Utf8Path, Utf8PathBuf};
use roxmltree::Node;

use super::items::{Items, expand_items};
use super::{ProjectOptions, implicit_configuration};
use crate::diagnostics::{self, Warning};
use crate::model::{ConfigurationName, ConfigurationSettings, ProjectId, parse_defines};
use crate::msbuild::{PropertyBag, condition, parse_bool, split_list};
use crate::paths::{absolutize, with_trailing_separator};

/// `ClCompile` item-definition metadata relevant to include resolution, as
/// expanded text.
#[derive(Debug, Default)]
struct CompileMetadata {
    include_dirs: String,
    defines: String,
    ignore_standard_include_path: Option<bool>,
}

pub(super) struct Evaluation {
    pub(super) settings: ConfigurationSettings,
    pub(super) items: Items,
}

pub(super) struct Evaluator<'a, 'input> {
    element: Node<'a, 'input>,
    path: &'a Utf8Path,
    root: &'a Utf8Path,
    options: &'a ProjectOptions,
    warnings: &'a mut Vec<Warning>,
}

impl<'a, 'input> Evaluator<'a, 'input> {
    pub(super) fn new(
        element: Node<'a, 'input>,
        path: &'a Utf8Path,
        root: &'a Utf8Path,
        options: &'a ProjectOptions,
        warnings: &'a mut Vec<Warning>,
    ) -> Self {
        Self {
            element,
            path,
            root,
            options,
            warnings,
        }
    }

    fn elements(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
        node.children().filter(Node::is_element)
    }

    fn groups(&self, tag: &'static str) -> impl Iterator<Item = Node<'a, 'input>> + use<'a, 'input> {
        Self::elements(self.element).filter(move |node| node.tag_name().name() == tag)
    }

    /// `ProjectConfiguration` items in declaration order.
    pub(super) fn declared_configurations(&self) -> Vec<ConfigurationName> {
        let mut declared: Vec<ConfigurationName> = Vec::new();
        let items = self
            .groups("ItemGroup")
            .flat_map(Self::elements)
            .filter(|item| item.tag_name().name() == "ProjectConfiguration");
        for item in items {
            let Some(include) = item.attribute("Include") else {
                continue;
            };
            let name = ConfigurationName::new(include);
            if !declared.contains(&name) {
                declared.push(name);
            }
        }
        declared
    }

    /// The configuration selected when none is given: the descriptor's
    /// unconditional `Configuration`/`Platform` defaults when they name a
    /// declared configuration, else the first declared one.
    pub(super) fn default_configuration(&mut self, declared: &[ConfigurationName]) -> ConfigurationName {
        let mut bag = self.base_properties(None);
        for group in self.groups("PropertyGroup").collect::<Vec<_>>() {
            if self.condition_holds(group, &bag) {
                self.apply_properties(group, &mut bag);
            }
        }
        let candidate = bag
            .get("Configuration")
            .zip(bag.get("Platform"))
            .map(|(configuration, platform)| ConfigurationName::from_parts(configuration, platform));
        match (candidate, declared.first()) {
            (Some(candidate), None) => candidate,
            (Some(candidate), Some(_)) if declared.contains(&candidate) => candidate,
            (_, Some(first)) => first.clone(),
            (None, None) => implicit_configuration(),
        }
    }

    /// `ProjectGuid` from the unconditional property groups.
    pub(super) fn declared_id(&self) -> Option<ProjectId> {
        self.unconditional_property("ProjectGuid")
            .and_then(|text| text.parse().ok())
    }

    /// `ProjectName`, falling back to `RootNamespace`.
    pub(super) fn project_name(&self) -> Option<String> {
        self.unconditional_property("ProjectName")
            .or_else(|| self.unconditional_property("RootNamespace"))
    }

    fn unconditional_property(&self, name: &str) -> Option<String> {
        self.groups("PropertyGroup")
            .filter(|group| group.attribute("Condition").is_none())
            .flat_map(Self::elements)
            .find(|node| node.tag_name().name() == name)
            .and_then(|node| node.text())
            .map(|text| text.trim().to_owned())
            .filter(|text| !text.is_empty())
    }

    pub(super) fn evaluate(&mut self, configuration: &ConfigurationName) -> Evaluation {
        let mut bag = self.base_properties(Some(configuration));
        let mut compile = CompileMetadata::default();
        let mut items = Items::default();
        for child in Self::elements(self.element).collect::<Vec<_>>() {
            if !self.condition_holds(child, &bag) {
                continue;
            }
            match child.tag_name().name() {
                "PropertyGroup" => self.apply_properties(child, &mut bag),
                "ItemDefinitionGroup" => self.apply_item_definitions(child, &bag, &mut compile),
                "ItemGroup" => self.collect_items(child, &bag, &mut items),
                _ => {}
            }
        }
        Evaluation {
            settings: self.settings(&bag, &compile),
            items,
        }
    }

    fn base_properties(&self, configuration: Option<&ConfigurationName>) -> PropertyBag {
        let mut bag = PropertyBag::new();
        if let Some(configuration) = configuration {
            bag.set_global("Configuration", configuration.configuration());
            if let Some(platform) = configuration.platform() {
                bag.set_global("Platform", platform);
            }
        }
        let stem = self.path.file_stem().unwrap_or_default();
        let file_name = self.path.file_name().unwrap_or_default();
        bag.set_global("ProjectDir", with_trailing_separator(self.root));
        bag.set_global("ProjectPath", self.path.as_str());
        bag.set_global("ProjectFileName", file_name);
        bag.set_global("MSBuildProjectDirectory", self.root.as_str());
        bag.set_global("MSBuildProjectFile", file_name);
        bag.set_global("MSBuildProjectName", stem);
        bag.set_global("MSBuildThisFileDirectory", with_trailing_separator(self.root));
        bag.set("ProjectName", stem);
        if let Some(solution_dir) = &self.options.solution_dir {
            bag.set_global("SolutionDir", with_trailing_separator(solution_dir));
        }
        bag
    }

    fn condition_holds(&mut self, node: Node<'a, 'input>, bag: &PropertyBag) -> bool {
        let Some(text) = node.attribute("Condition") else {
            return true;
        };
        match condition::evaluate(text, bag, self.root) {
            Ok(result) => result,
            Err(err) => {
                let warning = Warning::Condition {
                    path: self.path.to_path_buf(),
                    condition: text.to_owned(),
                    message: err.to_string(),
                };
                if !self.warnings.contains(&warning) {
                    diagnostics::record(self.warnings, warning, false);
                }
                false
            }
        }
    }

    fn apply_properties(&mut self, group: Node<'a, 'input>, bag: &mut PropertyBag) {
        for property in Self::elements(group) {
            if !self.condition_holds(property, bag) {
                continue;
            }
            let value = bag.expand(property.text().unwrap_or_default());
            bag.set(property.tag_name().name(), value.trim());
        }
    }

    fn apply_item_definitions(
        &mut self,
        group: Node<'a, 'input>,
        bag: &PropertyBag,
        compile: &mut CompileMetadata,
    ) {
        let definitions = Self::elements(group).filter(|node| node.tag_name().name() == "ClCompile");
        for definition in definitions.collect::<Vec<_>>() {
            if !self.condition_holds(definition, bag) {
                continue;
            }
            for metadata in Self::elements(definition) {
                if !self.condition_holds(metadata, bag) {
                    continue;
                }
                let raw = metadata.text().unwrap_or_default();
                match metadata.tag_name().name() {
                    "AdditionalIncludeDirectories" => {
                        let merged = substitute_metadata(raw, "AdditionalIncludeDirectories", &compile.include_dirs);
                        compile.include_dirs = bag.expand(&merged);
                    }
                    "PreprocessorDefinitions" => {
                        let merged = substitute_metadata(raw, "PreprocessorDefinitions", &compile.defines);
                        compile.defines = bag.expand(&merged);
                    }
                    "IgnoreStandardIncludePath" => {
                        compile.ignore_standard_include_path = parse_bool(&bag.expand(raw));
                    }
                    _ => {}
                }
            }
        }
    }

    fn collect_items(&mut self, group: Node<'a, 'input>, bag: &PropertyBag, items: &mut Items) {
        for item in Self::elements(group).collect::<Vec<_>>() {
            if !self.condition_holds(item, bag) {
                continue;
            }
            let include = bag.expand(item.attribute("Include").unwrap_or_default());
            let exclude = bag.expand(item.attribute("Exclude").unwrap_or_default());
            match item.tag_name().name() {
                "ClCompile" => items.sources.extend(expand_items(self.root, &include, &exclude)),
                "ClInclude" => items.headers.extend(expand_items(self.root, &include, &exclude)),
                "ProjectReference" => {
                    let guid = Self::elements(item)
                        .find(|node| node.tag_name().name() == "Project")
                        .and_then(|node| node.text())
                        .and_then(|text| text.parse::<ProjectId>().ok());
                    match guid {
                        Some(id) => items.references.push(id),
                        None => items
                            .reference_paths
                            .extend(split_list(&include).map(|raw| absolutize(self.root, raw))),
                    }
                }
                _ => {}
            }
        }
    }

    fn settings(&self, bag: &PropertyBag, compile: &CompileMetadata) -> ConfigurationSettings {
        let include_dirs = self.directories(&compile.include_dirs);
        let mut public_include_dirs = Vec::new();
        if bag.get("AllProjectIncludesArePublic").and_then(parse_bool) == Some(true) {
            public_include_dirs.extend(include_dirs.iter().cloned());
        }
        public_include_dirs.extend(self.directories(bag.get("PublicIncludeDirectories").unwrap_or_default()));
        let mut system_include_dirs = self.directories(bag.get("IncludePath").unwrap_or_default());
        system_include_dirs.extend(self.options.system_include_dirs.iter().cloned());
        ConfigurationSettings {
            include_dirs,
            public_include_dirs,
            inherited_include_dirs: Vec::new(),
            system_include_dirs,
            defines: parse_defines(&compile.defines),
            append_system_paths: compile.ignore_standard_include_path != Some(true),
        }
    }

    fn directories(&self, raw: &str) -> Vec<Utf8PathBuf> {
        split_list(raw).map(|dir| absolutize(self.root, dir)).collect()
    }
}

/// Replace `%(name)` (ignoring case) with the previously accumulated value.
fn substitute_metadata(raw: &str, name: &str, previous: &str) -> String {
    let needle = format!("%({name})").to_ascii_lowercase();
    let lowered = raw.to_ascii_lowercase();
    let mut out = String::with_capacity(raw.len() + previous.len());
    let mut last = 0;
    for (idx, _) in lowered.match_indices(&needle) {
        out.push_str(raw.get(last..idx).unwrap_or_default());
        out.push_str(previous);
        last = idx + needle.len();
    }
    out.push_str(raw.get(last..).unwrap_or_default());
    out
}

#[cfg(test)]
mod tests {
    use super::substitute_metadata;
    use rstest::rstest;

    #[rstest]
    #[case("inc;%(AdditionalIncludeDirectories)", "a;b", "inc;a;b")]
    #[case("%(additionalincludedirectories);x", "", ";x")]
    #[case("plain", "ignored", "plain")]
    fn substitutes_previous_metadata(#[case] raw: &str, #[case] previous: &str, #[case] expected: &str) {
        assert_eq!(
            substitute_metadata(raw, "AdditionalIncludeDirectories", previous),
            expected
        );
    }
}
