//! Solution file dialects selected by tool version.

use std::fmt;

/// The `.sln` header layout a given toolset writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolutionDialect {
    /// Visual Studio 2008 (`Format Version 10.00`).
    V10,
    /// Visual Studio 2010 (`Format Version 11.00`).
    V11,
    /// Visual Studio 2012 and later (`Format Version 12.00`).
    V12,
}

impl SolutionDialect {
    /// Select the dialect for an MSBuild tool version such as `14.0`.
    ///
    /// Returns `None` for versions that predate solution support or do not
    /// parse.
    #[must_use]
    pub fn for_tool_version(version: &str) -> Option<Self> {
        let major: u32 = version.trim().split('.').next()?.parse().ok()?;
        match major {
            9 => Some(Self::V10),
            10 => Some(Self::V11),
            11.. => Some(Self::V12),
            _ => None,
        }
    }

    /// The `Format Version` this dialect writes in the header.
    #[must_use]
    pub const fn format_version(self) -> &'static str {
        match self {
            Self::V10 => "10.00",
            Self::V11 => "11.00",
            Self::V12 => "12.00",
        }
    }

    /// Whether the header carries a `VisualStudioVersion` line.
    #[must_use]
    pub const fn has_visual_studio_version(self) -> bool {
        matches!(self, Self::V12)
    }
}

impl fmt::Display for SolutionDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "format {}", self.format_version())
    }
}
