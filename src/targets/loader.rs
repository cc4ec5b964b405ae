//! Loading of the entry script and everything it imports.
//!
//! Scripts are visited in document order. Properties are evaluated as they
//! are met, so an import sees every property assigned before it. Target
//! attributes are kept as written and expanded once loading is complete,
//! against the final property values.

use std::collections::HashSet;

use camino::{Utf8Path, Utf8PathBuf};
use roxmltree::{Document, Node};

use super::{TargetError, TargetTreeOptions};
use crate::diagnostics::{self, Warning};
use crate::msbuild::{PropertyBag, condition, is_wildcard};
use crate::paths::{absolutize, with_trailing_separator};

/// A `<Target>` element with its attributes unexpanded.
#[derive(Clone, Debug)]
pub(super) struct DeclaredTarget {
    pub(super) name: String,
    pub(super) depends_on: String,
    pub(super) before: String,
    pub(super) after: String,
    /// `Targets` attributes of nested `<CallTarget>` tasks.
    pub(super) calls: Vec<String>,
    pub(super) condition: Option<String>,
    pub(super) script: Utf8PathBuf,
}

/// Everything gathered from the entry script and its imports.
#[derive(Debug)]
pub(super) struct Loaded {
    pub(super) properties: PropertyBag,
    pub(super) targets: Vec<DeclaredTarget>,
    pub(super) default_targets: Option<String>,
    pub(super) scripts: Vec<Utf8PathBuf>,
    pub(super) warnings: Vec<Warning>,
}

/// Read the entry script at `entry` (absolute, known to exist) and follow
/// its imports.
pub(super) fn load(options: &TargetTreeOptions, entry: &Utf8Path) -> Result<Loaded, TargetError> {
    let project_dir = entry.parent().map_or_else(Utf8PathBuf::new, Utf8Path::to_path_buf);
    let mut loader = Loader {
        options,
        search_paths: options
            .extra_search_paths
            .iter()
            .map(|dir| absolutize(&project_dir, dir.as_str()))
            .collect(),
        properties: seed_properties(options, entry),
        project_dir,
        visited: HashSet::from([entry.to_path_buf()]),
        scripts: Vec::new(),
        targets: Vec::new(),
        default_targets: None,
        warnings: Vec::new(),
    };

    let text = read_script(entry)?;
    let doc = parse_script(entry, &text)?;
    loader.default_targets = doc
        .root_element()
        .attribute("DefaultTargets")
        .map(str::to_owned);
    loader.visit(entry, doc.root_element())?;

    tracing::debug!(
        entry = %entry,
        scripts = loader.scripts.len(),
        targets = loader.targets.len(),
        "loaded build scripts"
    );
    Ok(Loaded {
        properties: loader.properties,
        targets: loader.targets,
        default_targets: loader.default_targets,
        scripts: loader.scripts,
        warnings: loader.warnings,
    })
}

/// Global properties: reserved project values, then the tool version, then
/// the requested configuration and platform, then explicit overrides.
fn seed_properties(options: &TargetTreeOptions, entry: &Utf8Path) -> PropertyBag {
    let mut bag = PropertyBag::new();
    bag.set_global(
        "MSBuildProjectDirectory",
        entry.parent().map_or("", Utf8Path::as_str),
    );
    bag.set_global("MSBuildProjectFile", entry.file_name().unwrap_or_default());
    bag.set_global("MSBuildProjectName", entry.file_stem().unwrap_or_default());
    bag.set_global("MSBuildProjectFullPath", entry.as_str());
    bag.set_global("MSBuildProjectExtension", dotted_extension(entry));
    bag.set_global("MSBuildToolsVersion", options.tool_version.as_str());
    bag.set_global("VisualStudioVersion", options.tool_version.as_str());
    if let Some(configuration) = &options.configuration {
        bag.set_global("Configuration", configuration.as_str());
    }
    if let Some(platform) = &options.platform {
        bag.set_global("Platform", platform.as_str());
    }
    for (name, value) in &options.property_overrides {
        bag.set_global(name, value.as_str());
    }
    bag
}

fn dotted_extension(path: &Utf8Path) -> String {
    path.extension()
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}

fn read_script(path: &Utf8Path) -> Result<String, TargetError> {
    std::fs::read_to_string(path).map_err(|source| TargetError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_script<'t>(path: &Utf8Path, text: &'t str) -> Result<Document<'t>, TargetError> {
    let doc = Document::parse(text.strip_prefix('\u{feff}').unwrap_or(text)).map_err(|err| {
        TargetError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    })?;
    let root = doc.root_element().tag_name().name();
    if root != "Project" {
        return Err(TargetError::Parse {
            path: path.to_path_buf(),
            message: format!("expected a <Project> root element, found <{root}>"),
        });
    }
    Ok(doc)
}

struct Loader<'o> {
    options: &'o TargetTreeOptions,
    search_paths: Vec<Utf8PathBuf>,
    properties: PropertyBag,
    project_dir: Utf8PathBuf,
    visited: HashSet<Utf8PathBuf>,
    scripts: Vec<Utf8PathBuf>,
    targets: Vec<DeclaredTarget>,
    default_targets: Option<String>,
    warnings: Vec<Warning>,
}

impl Loader<'_> {
    fn visit(&mut self, script: &Utf8Path, project: Node<'_, '_>) -> Result<(), TargetError> {
        self.scripts.push(script.to_path_buf());
        self.enter(script);
        for child in project.children().filter(Node::is_element) {
            self.visit_element(script, child)?;
        }
        Ok(())
    }

    fn visit_element(&mut self, script: &Utf8Path, node: Node<'_, '_>) -> Result<(), TargetError> {
        match node.tag_name().name() {
            "PropertyGroup" if self.condition_holds(script, node) => {
                self.apply_properties(script, node);
            }
            "Import" if self.condition_holds(script, node) => self.import(script, node)?,
            "ImportGroup" if self.condition_holds(script, node) => {
                for import in node
                    .children()
                    .filter(|child| child.has_tag_name("Import"))
                {
                    if self.condition_holds(script, import) {
                        self.import(script, import)?;
                    }
                }
            }
            "Choose" => self.choose(script, node)?,
            "Target" => self.declare_target(script, node),
            _ => {}
        }
        Ok(())
    }

    /// The first `<When>` whose condition holds, else `<Otherwise>`.
    fn choose(&mut self, script: &Utf8Path, node: Node<'_, '_>) -> Result<(), TargetError> {
        let mut branch = None;
        for child in node.children().filter(Node::is_element) {
            if child.has_tag_name("When") && self.condition_holds(script, child) {
                branch = Some(child);
                break;
            }
            if child.has_tag_name("Otherwise") {
                branch = Some(child);
            }
        }
        if let Some(selected) = branch {
            for child in selected.children().filter(Node::is_element) {
                self.visit_element(script, child)?;
            }
        }
        Ok(())
    }

    /// Point the `MSBuildThisFile*` properties at `script`.
    fn enter(&mut self, script: &Utf8Path) {
        let dir = script.parent().unwrap_or(Utf8Path::new(""));
        self.properties
            .set_global("MSBuildThisFile", script.file_name().unwrap_or_default());
        self.properties
            .set_global("MSBuildThisFileDirectory", with_trailing_separator(dir));
        self.properties
            .set_global("MSBuildThisFileFullPath", script.as_str());
        self.properties
            .set_global("MSBuildThisFileName", script.file_stem().unwrap_or_default());
        self.properties
            .set_global("MSBuildThisFileExtension", dotted_extension(script));
    }

    fn condition_holds(&mut self, script: &Utf8Path, node: Node<'_, '_>) -> bool {
        let Some(text) = node.attribute("Condition") else {
            return true;
        };
        match condition::evaluate(text, &self.properties, &self.project_dir) {
            Ok(result) => result,
            Err(err) => {
                let warning = Warning::Condition {
                    path: script.to_path_buf(),
                    condition: text.to_owned(),
                    message: err.to_string(),
                };
                if !self.warnings.contains(&warning) {
                    diagnostics::record(&mut self.warnings, warning, self.options.quiet);
                }
                false
            }
        }
    }

    fn apply_properties(&mut self, script: &Utf8Path, group: Node<'_, '_>) {
        for property in group.children().filter(Node::is_element) {
            if !self.condition_holds(script, property) {
                continue;
            }
            let name = property.tag_name().name();
            let value = self.properties.expand(property.text().unwrap_or_default());
            if !self.properties.set(name, value.trim()) {
                tracing::debug!(property = name, script = %script, "global property not reassigned");
            }
        }
    }

    fn declare_target(&mut self, script: &Utf8Path, node: Node<'_, '_>) {
        let Some(name) = node
            .attribute("Name")
            .map(str::trim)
            .filter(|name| !name.is_empty())
        else {
            diagnostics::record(
                &mut self.warnings,
                Warning::Parse {
                    path: script.to_path_buf(),
                    message: format!(
                        "line {}: <Target> without a Name",
                        node.document().text_pos_at(node.range().start).row
                    ),
                },
                self.options.quiet,
            );
            return;
        };
        let attribute = |key: &str| node.attribute(key).unwrap_or_default().to_owned();
        self.targets.push(DeclaredTarget {
            name: name.to_owned(),
            depends_on: attribute("DependsOnTargets"),
            before: attribute("BeforeTargets"),
            after: attribute("AfterTargets"),
            calls: node
                .descendants()
                .filter(|task| task.has_tag_name("CallTarget"))
                .filter_map(|task| task.attribute("Targets"))
                .map(str::to_owned)
                .collect(),
            condition: node.attribute("Condition").map(str::to_owned),
            script: script.to_path_buf(),
        });
    }

    fn import(&mut self, script: &Utf8Path, node: Node<'_, '_>) -> Result<(), TargetError> {
        let import = self
            .properties
            .expand(node.attribute("Project").unwrap_or_default())
            .trim()
            .to_owned();
        match self.resolve_import(script, &import) {
            Some(paths) => {
                if paths.is_empty() {
                    tracing::debug!(import, script = %script, "wildcard import matched nothing");
                }
                for path in paths {
                    self.load_import(script, &path)?;
                }
                Ok(())
            }
            None if self.options.strict_imports => Err(TargetError::UnresolvedImport {
                script: script.to_path_buf(),
                import,
            }),
            None => {
                diagnostics::record(
                    &mut self.warnings,
                    Warning::UnresolvedImport {
                        script: script.to_path_buf(),
                        import,
                    },
                    self.options.quiet,
                );
                Ok(())
            }
        }
    }

    /// Files an import names. Relative imports are tried against the
    /// importing script's directory, then each search path. A wildcard
    /// import that matches nothing resolves to an empty list.
    fn resolve_import(&self, script: &Utf8Path, import: &str) -> Option<Vec<Utf8PathBuf>> {
        if import.is_empty() {
            return None;
        }
        let script_dir = script.parent().unwrap_or(Utf8Path::new(""));
        let wildcard = is_wildcard(import);
        for base in std::iter::once(script_dir).chain(self.search_paths.iter().map(Utf8PathBuf::as_path)) {
            let candidate = absolutize(base, import);
            if wildcard {
                let matches = expand_wildcard(&candidate);
                if !matches.is_empty() {
                    return Some(matches);
                }
            } else if candidate.is_file() {
                return Some(vec![candidate]);
            }
        }
        wildcard.then(Vec::new)
    }

    fn load_import(&mut self, importer: &Utf8Path, path: &Utf8Path) -> Result<(), TargetError> {
        if !self.visited.insert(path.to_path_buf()) {
            tracing::debug!(import = %path, importer = %importer, "skipping script already imported");
            return Ok(());
        }
        let text = match read_script(path) {
            Ok(text) => text,
            Err(err) => return self.broken_import(err),
        };
        let doc = match parse_script(path, &text) {
            Ok(doc) => doc,
            Err(err) => return self.broken_import(err),
        };
        self.visit(path, doc.root_element())?;
        self.enter(importer);
        Ok(())
    }

    /// An imported script that cannot be read is fatal only under strict
    /// imports.
    fn broken_import(&mut self, err: TargetError) -> Result<(), TargetError> {
        if self.options.strict_imports {
            return Err(err);
        }
        let (path, message) = match &err {
            TargetError::Io { path, source } => (path.clone(), source.to_string()),
            TargetError::Parse { path, message } => (path.clone(), message.clone()),
            _ => return Err(err),
        };
        diagnostics::record(
            &mut self.warnings,
            Warning::Parse { path, message },
            self.options.quiet,
        );
        Ok(())
    }
}

fn expand_wildcard(pattern: &Utf8Path) -> Vec<Utf8PathBuf> {
    match glob::glob(pattern.as_str()) {
        Ok(matches) => {
            let mut found: Vec<Utf8PathBuf> = matches
                .filter_map(Result::ok)
                .filter_map(|path| Utf8PathBuf::from_path_buf(path).ok())
                .filter(|path| path.is_file())
                .collect();
            found.sort();
            found
        }
        Err(err) => {
            tracing::debug!(pattern = %pattern, %err, "ignoring invalid import wildcard");
            Vec::new()
        }
    }
}
