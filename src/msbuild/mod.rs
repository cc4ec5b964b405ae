//! Static evaluation of the MSBuild property language.
//!
//! Both descriptor parsers share this layer: a case-insensitive property
//! bag, `$(Name)` expansion, `;`-separated list splitting, and the
//! [`condition`] language used by `Condition` attributes. Nothing here runs
//! tasks or evaluates property functions; those expand to nothing.

pub mod condition;

use std::collections::{HashMap, HashSet};

pub use condition::{Condition, ConditionError};

/// Case-insensitive property storage with support for global properties that
/// scripts cannot reassign.
#[derive(Clone, Debug, Default)]
pub struct PropertyBag {
    values: HashMap<String, String>,
    globals: HashSet<String>,
}

impl PropertyBag {
    /// Create an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a property, returning `false` when a global property blocks the
    /// assignment.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> bool {
        let key = name.to_ascii_lowercase();
        if self.globals.contains(&key) {
            return false;
        }
        self.values.insert(key, value.into());
        true
    }

    /// Assign a property that later [`set`](Self::set) calls cannot change.
    pub fn set_global(&mut self, name: &str, value: impl Into<String>) {
        let key = name.to_ascii_lowercase();
        self.values.insert(key.clone(), value.into());
        self.globals.insert(key);
    }

    /// Look up a property value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Expand `$(Name)` references in `raw`.
    ///
    /// Unknown properties, property functions, `%(Metadata)` and `@(Item)`
    /// references expand to the empty string.
    #[must_use]
    pub fn expand(&self, raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        let mut chars = raw.chars().peekable();
        while let Some(c) = chars.next() {
            if matches!(c, '$' | '%' | '@') && chars.peek() == Some(&'(') {
                chars.next();
                let body = take_balanced(&mut chars);
                if c == '$'
                    && let Some(value) = self.lookup_reference(&body)
                {
                    out.push_str(value);
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    fn lookup_reference(&self, body: &str) -> Option<&str> {
        let name = body.trim();
        let is_plain = !name.is_empty()
            && name
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
        if is_plain { self.get(name) } else { None }
    }
}

fn take_balanced(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut depth = 1usize;
    let mut body = String::new();
    for ch in chars.by_ref() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            _ => {}
        }
        body.push(ch);
    }
    body
}

/// Split an MSBuild list value on `;`, trimming entries and dropping blanks.
pub fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(';').map(str::trim).filter(|item| !item.is_empty())
}

/// Whether an item or import path contains glob wildcards.
#[must_use]
pub fn is_wildcard(entry: &str) -> bool {
    entry.contains(['*', '?'])
}

/// Parse a boolean property value the way MSBuild does (`true`/`false`,
/// ignoring case and surrounding whitespace).
#[must_use]
pub fn parse_bool(raw: &str) -> Option<bool> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Some(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn bag() -> PropertyBag {
        let mut bag = PropertyBag::new();
        bag.set("Configuration", "Debug");
        bag.set("Platform", "x64");
        bag
    }

    #[rstest]
    #[case("$(Configuration)|$(Platform)", "Debug|x64")]
    #[case("$(configuration)", "Debug")]
    #[case("$(Missing)inc", "inc")]
    #[case("%(AdditionalIncludeDirectories);a", ";a")]
    #[case("$([System.IO.Path]::Combine('a', 'b'))x", "x")]
    #[case("$(Platform.ToLower())", "")]
    fn expand_substitutes_properties(bag: PropertyBag, #[case] raw: &str, #[case] expected: &str) {
        assert_eq!(bag.expand(raw), expected);
    }

    #[rstest]
    fn globals_cannot_be_reassigned(mut bag: PropertyBag) {
        bag.set_global("Configuration", "Release");
        assert!(!bag.set("configuration", "Debug"));
        assert_eq!(bag.get("CONFIGURATION"), Some("Release"));
    }

    #[rstest]
    fn split_list_drops_blank_entries() {
        let items: Vec<_> = split_list(" a ; ;b;").collect();
        assert_eq!(items, ["a", "b"]);
    }
}
