//! Line-oriented reader for the `.sln` text format.
//!
//! Only the parts the model needs are interpreted: the header, project
//! entries with their dependency sections, and the two configuration
//! sections under `Global`. Everything else is skipped. Malformed lines are
//! collected as [`SlnProblem`]s so the caller can decide between failing and
//! warning.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::{ConfigurationName, ProjectId};

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Microsoft Visual Studio Solution File, Format Version (?P<version>\d+\.\d+)")
        .unwrap_or_else(|err| panic!("header pattern: {err}"))
});

static PROJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^Project\("(?P<kind>[^"]*)"\)\s*=\s*"(?P<name>[^"]*)"\s*,\s*"(?P<path>[^"]*)"\s*,\s*"(?P<id>[^"]*)"\s*$"#,
    )
    .unwrap_or_else(|err| panic!("project pattern: {err}"))
});

static SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:Project|Global)Section\((?P<name>[^)]*)\)")
        .unwrap_or_else(|err| panic!("section pattern: {err}"))
});

/// Type id Visual Studio uses for solution folders.
pub(super) const SOLUTION_FOLDER: &str = "2150E333-8FDC-42A3-9474-1A3956D46DE8";

/// One `Project(...) = ...` entry.
#[derive(Clone, Debug)]
pub(super) struct SlnEntry {
    pub(super) line: usize,
    pub(super) kind: String,
    pub(super) name: String,
    pub(super) path: String,
    pub(super) id: ProjectId,
    pub(super) dependencies: Vec<ProjectId>,
}

impl SlnEntry {
    pub(super) fn is_folder(&self) -> bool {
        self.kind
            .trim_matches(['{', '}'])
            .eq_ignore_ascii_case(SOLUTION_FOLDER)
    }
}

/// A line the reader could not interpret.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct SlnProblem {
    pub(super) line: usize,
    pub(super) message: String,
}

#[derive(Debug, Default)]
pub(super) struct SlnFile {
    pub(super) format_version: Option<String>,
    /// Line number of a `VisualStudioVersion` header entry, if present.
    pub(super) visual_studio_version_line: Option<usize>,
    pub(super) entries: Vec<SlnEntry>,
    pub(super) configurations: Vec<ConfigurationName>,
    /// Projects with a `Build.0` mapping in any solution configuration.
    pub(super) built: HashSet<ProjectId>,
    /// `ActiveCfg` entries: project, solution configuration, project
    /// configuration.
    pub(super) active: Vec<(ProjectId, ConfigurationName, ConfigurationName)>,
    pub(super) problems: Vec<SlnProblem>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Section {
    Dependencies,
    SolutionConfigurations,
    ProjectConfigurations,
    Other,
}

impl Section {
    fn from_name(name: &str) -> Self {
        match name.trim() {
            "ProjectDependencies" => Self::Dependencies,
            "SolutionConfigurationPlatforms" => Self::SolutionConfigurations,
            "ProjectConfigurationPlatforms" => Self::ProjectConfigurations,
            _ => Self::Other,
        }
    }
}

#[derive(Debug)]
enum State {
    Top,
    /// Inside `Project ... EndProject`; `None` when the entry was malformed.
    Project(Option<SlnEntry>),
    ProjectSection(Option<SlnEntry>, Section),
    Global,
    GlobalSection(Section),
}

/// Parse solution text.
pub(super) fn parse_sln(source: &str) -> SlnFile {
    let mut file = SlnFile::default();
    let mut state = State::Top;
    for (index, raw) in source.trim_start_matches('\u{feff}').lines().enumerate() {
        let line = index + 1;
        let text = raw.trim();
        if text.is_empty() || (text.starts_with('#') && matches!(state, State::Top)) {
            continue;
        }
        state = match state {
            State::Top => top_level(&mut file, line, text),
            State::Project(entry) => in_project(&mut file, entry, text),
            State::ProjectSection(entry, section) => {
                in_project_section(&mut file, line, entry, section, text)
            }
            State::Global => in_global(text),
            State::GlobalSection(section) => in_global_section(&mut file, line, section, text),
        };
    }
    if !matches!(state, State::Top) {
        file.problems.push(SlnProblem {
            line: source.lines().count(),
            message: "unexpected end of file inside a block".to_owned(),
        });
    }
    file
}

fn top_level(file: &mut SlnFile, line: usize, text: &str) -> State {
    if let Some(caps) = HEADER.captures(text) {
        file.format_version = caps.name("version").map(|m| m.as_str().to_owned());
        return State::Top;
    }
    if text.starts_with("VisualStudioVersion") {
        file.visual_studio_version_line = Some(line);
        return State::Top;
    }
    if text == "Global" {
        return State::Global;
    }
    if text.starts_with("Project(") {
        return State::Project(project_entry(file, line, text));
    }
    if !text.starts_with("MinimumVisualStudioVersion") {
        tracing::debug!(line, text, "ignoring unrecognised solution line");
    }
    State::Top
}

fn project_entry(file: &mut SlnFile, line: usize, text: &str) -> Option<SlnEntry> {
    let Some(caps) = PROJECT.captures(text) else {
        file.problems.push(SlnProblem {
            line,
            message: "malformed project entry".to_owned(),
        });
        return None;
    };
    let field = |name: &str| caps.name(name).map_or("", |m| m.as_str()).to_owned();
    let raw_id = field("id");
    match raw_id.parse::<ProjectId>() {
        Ok(id) => Some(SlnEntry {
            line,
            kind: field("kind"),
            name: field("name"),
            path: field("path"),
            id,
            dependencies: Vec::new(),
        }),
        Err(err) => {
            file.problems.push(SlnProblem {
                line,
                message: format!("invalid project id '{raw_id}': {err}"),
            });
            None
        }
    }
}

fn in_project(file: &mut SlnFile, entry: Option<SlnEntry>, text: &str) -> State {
    if text == "EndProject" {
        file.entries.extend(entry);
        return State::Top;
    }
    match SECTION.captures(text) {
        Some(caps) => {
            let section = Section::from_name(caps.name("name").map_or("", |m| m.as_str()));
            State::ProjectSection(entry, section)
        }
        None => State::Project(entry),
    }
}

fn in_project_section(
    file: &mut SlnFile,
    line: usize,
    mut entry: Option<SlnEntry>,
    section: Section,
    text: &str,
) -> State {
    if text == "EndProjectSection" {
        return State::Project(entry);
    }
    if section == Section::Dependencies
        && let Some(current) = entry.as_mut()
    {
        let key = text.split_once('=').map_or(text, |(lhs, _)| lhs);
        match key.parse::<ProjectId>() {
            Ok(id) if !current.dependencies.contains(&id) => current.dependencies.push(id),
            Ok(_) => {}
            Err(_) => file.problems.push(SlnProblem {
                line,
                message: format!("invalid project dependency '{}'", key.trim()),
            }),
        }
    }
    State::ProjectSection(entry, section)
}

fn in_global(text: &str) -> State {
    if text == "EndGlobal" {
        return State::Top;
    }
    match SECTION.captures(text) {
        Some(caps) => State::GlobalSection(Section::from_name(
            caps.name("name").map_or("", |m| m.as_str()),
        )),
        None => State::Global,
    }
}

fn in_global_section(file: &mut SlnFile, line: usize, section: Section, text: &str) -> State {
    if text == "EndGlobalSection" {
        return State::Global;
    }
    let Some((raw_key, raw_value)) = text.split_once('=') else {
        file.problems.push(SlnProblem {
            line,
            message: format!("malformed section entry '{text}'"),
        });
        return State::GlobalSection(section);
    };
    let key = raw_key.trim();
    match section {
        Section::SolutionConfigurations => {
            let name = ConfigurationName::new(key);
            if !file.configurations.contains(&name) {
                file.configurations.push(name);
            }
        }
        Section::ProjectConfigurations => {
            if key.ends_with(".Build.0")
                && let Some((raw_id, _)) = key.split_once('.')
                && let Ok(id) = raw_id.parse::<ProjectId>()
            {
                file.built.insert(id);
            } else if let Some((raw_id, solution_configuration)) = key
                .strip_suffix(".ActiveCfg")
                .and_then(|entry| entry.split_once('.'))
                && let Ok(id) = raw_id.parse::<ProjectId>()
            {
                file.active.push((
                    id,
                    ConfigurationName::new(solution_configuration),
                    ConfigurationName::new(raw_value),
                ));
            }
        }
        Section::Dependencies | Section::Other => {}
    }
    State::GlobalSection(section)
}
