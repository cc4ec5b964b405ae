//! Build configurations and the include-rule model derived from them.

use std::fmt;
use std::hash::{Hash, Hasher};

use camino::Utf8PathBuf;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};

/// Preprocessor defines: name to optional value, in declaration order.
pub type Defines = IndexMap<String, Option<String>>;

/// A named build variant such as `Debug|x64`.
///
/// Names compare and hash ignoring ASCII case; the original spelling is kept
/// for display.
#[derive(Clone, Debug)]
pub struct ConfigurationName {
    display: String,
    key: String,
}

impl ConfigurationName {
    /// Create a configuration name from its textual form.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let display: String = name.into().trim().to_owned();
        let key = display.to_ascii_lowercase();
        Self { display, key }
    }

    /// Combine a configuration and a platform into `Configuration|Platform`.
    #[must_use]
    pub fn from_parts(configuration: &str, platform: &str) -> Self {
        Self::new(format!("{configuration}|{platform}"))
    }

    /// The name as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.display
    }

    /// The part before `|`.
    #[must_use]
    pub fn configuration(&self) -> &str {
        self.display
            .split_once('|')
            .map_or(self.display.as_str(), |(configuration, _)| configuration)
    }

    /// The part after `|`, when present.
    #[must_use]
    pub fn platform(&self) -> Option<&str> {
        self.display.split_once('|').map(|(_, platform)| platform)
    }
}

impl PartialEq for ConfigurationName {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for ConfigurationName {}

impl Hash for ConfigurationName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for ConfigurationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

impl From<&str> for ConfigurationName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Serialize for ConfigurationName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.display)
    }
}

/// Settings of one project configuration, evaluated once when the project is
/// parsed. All directories are absolute and normalised.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ConfigurationSettings {
    /// `AdditionalIncludeDirectories` of the project itself.
    pub include_dirs: Vec<Utf8PathBuf>,
    /// Directories this project exposes to projects that reference it.
    pub public_include_dirs: Vec<Utf8PathBuf>,
    /// Public directories inherited from referenced projects.
    pub inherited_include_dirs: Vec<Utf8PathBuf>,
    /// `IncludePath` followed by toolchain defaults.
    pub system_include_dirs: Vec<Utf8PathBuf>,
    /// `PreprocessorDefinitions`.
    pub defines: Defines,
    /// Whether inherited and system directories follow the local ones.
    pub append_system_paths: bool,
}

/// The ordered search path and defines used to resolve `#include`
/// directives for one project configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IncludeRules {
    /// Search order; the first directory containing a match wins.
    pub directories: Vec<Utf8PathBuf>,
    /// Active preprocessor defines.
    pub defines: Defines,
    /// Whether inherited and system directories were appended.
    pub append_system_paths: bool,
}

/// Parse a `PreprocessorDefinitions` value such as `WIN32;LEVEL=2;%(...)`.
#[must_use]
pub fn parse_defines(raw: &str) -> Defines {
    crate::msbuild::split_list(raw)
        .map(|item| match item.split_once('=') {
            Some((name, value)) => (name.trim().to_owned(), Some(value.trim().to_owned())),
            None => (item.to_owned(), None),
        })
        .collect()
}
