//! Project identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use uuid::Uuid;

/// The GUID that identifies a project within a solution.
///
/// Parsing accepts the braced form used by `.sln` and `.vcxproj` files as
/// well as a bare GUID. Display uses the braced upper-case form.
///
/// ```
/// use vcxgraph::model::ProjectId;
///
/// let id: ProjectId = "{c864a049-0a9e-4139-8217-da58d9a3b73d}".parse().expect("guid");
/// assert_eq!(id.to_string(), "{C864A049-0A9E-4139-8217-DA58D9A3B73D}");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectId(Uuid);

impl ProjectId {
    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl FromStr for ProjectId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let bare = trimmed
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
            .unwrap_or(trimmed);
        Uuid::parse_str(bare).map(Self)
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Uuid::encode_buffer();
        write!(f, "{{{}}}", self.0.hyphenated().encode_upper(&mut buf))
    }
}

impl Serialize for ProjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("{C864A049-0A9E-4139-8217-DA58D9A3B73D}")]
    #[case("c864a049-0a9e-4139-8217-da58d9a3b73d")]
    #[case("  {c864a049-0a9e-4139-8217-da58d9a3b73d} ")]
    fn parses_braced_and_bare_forms(#[case] text: &str) {
        let id: ProjectId = text.parse().expect("parse");
        assert_eq!(id.to_string(), "{C864A049-0A9E-4139-8217-DA58D9A3B73D}");
    }

    #[rstest]
    fn rejects_garbage() {
        assert!("{not-a-guid}".parse::<ProjectId>().is_err());
    }
}
