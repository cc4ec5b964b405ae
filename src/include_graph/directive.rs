//! `#include` directive scanning.
//!
//! The scanner is line oriented. Comments are stripped first (block comments
//! may span lines) and backslash continuations are joined, so each logical
//! line is examined once. Conditional compilation is tracked only as far as
//! literal `#if 0` / `#if 1` style conditions go; every other conditional
//! keeps all of its branches active.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*#\s*(?P<keyword>[A-Za-z_]+)\s*(?P<rest>.*)$")
        .unwrap_or_else(|err| panic!("directive pattern: {err}"))
});

static OPERAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?:"(?P<quoted>[^"]+)"|<(?P<angled>[^>]+)>)"#)
        .unwrap_or_else(|err| panic!("include operand pattern: {err}"))
});

/// How an include names its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IncludeStyle {
    /// `#include "name"`: the including file's directory is searched first.
    Quoted,
    /// `#include <name>`: only the search path is consulted.
    Angled,
    /// `#include MACRO`: not resolvable without a preprocessor.
    Computed,
}

/// One active `#include` directive.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Directive {
    /// One-based line of the directive in the including file.
    pub line: usize,
    /// Name as written, without delimiters.
    pub name: String,
    /// Delimiter style.
    pub style: IncludeStyle,
}

/// Extract the active include directives from C/C++ source text.
#[must_use]
pub fn scan_directives(source: &str) -> Vec<Directive> {
    let mut conditions = ConditionStack::default();
    let mut directives = Vec::new();
    for (line, text) in logical_lines(source) {
        let Some(caps) = DIRECTIVE.captures(&text) else {
            continue;
        };
        let keyword = caps.name("keyword").map_or("", |m| m.as_str());
        let rest = caps.name("rest").map_or("", |m| m.as_str().trim());
        match keyword {
            "if" => conditions.push(literal_condition(rest)),
            "ifdef" | "ifndef" => conditions.push(None),
            "elif" => conditions.elif(literal_condition(rest)),
            "elifdef" | "elifndef" => conditions.elif(None),
            "else" => conditions.otherwise(),
            "endif" => conditions.pop(),
            "include" if conditions.is_active() => directives.push(parse_include(line, rest)),
            _ => {}
        }
    }
    directives
}

fn parse_include(line: usize, operand: &str) -> Directive {
    let caps = OPERAND.captures(operand);
    let quoted = caps.as_ref().and_then(|c| c.name("quoted"));
    let angled = caps.as_ref().and_then(|c| c.name("angled"));
    let (name, style) = match (quoted, angled) {
        (Some(found), _) => (found.as_str(), IncludeStyle::Quoted),
        (None, Some(found)) => (found.as_str(), IncludeStyle::Angled),
        (None, None) => (operand, IncludeStyle::Computed),
    };
    Directive {
        line,
        name: name.trim().to_owned(),
        style,
    }
}

/// `Some(value)` for conditions that are a literal truth value.
fn literal_condition(expr: &str) -> Option<bool> {
    let trimmed = expr.trim().trim_start_matches('(').trim_end_matches(')').trim();
    match trimmed {
        "0" | "false" => Some(false),
        "1" | "true" => Some(true),
        _ => None,
    }
}

#[derive(Debug)]
struct Frame {
    parent_active: bool,
    branch_active: bool,
    /// A branch known to be true has already been seen.
    taken: bool,
    /// The chain contains a condition the scanner cannot evaluate, so every
    /// later branch stays active.
    unknown: bool,
}

#[derive(Debug, Default)]
struct ConditionStack {
    frames: Vec<Frame>,
}

impl ConditionStack {
    fn is_active(&self) -> bool {
        self.frames
            .last()
            .is_none_or(|frame| frame.parent_active && frame.branch_active)
    }

    fn push(&mut self, literal: Option<bool>) {
        let parent_active = self.is_active();
        self.frames.push(Frame {
            parent_active,
            branch_active: literal.unwrap_or(true),
            taken: literal == Some(true),
            unknown: literal.is_none(),
        });
    }

    fn elif(&mut self, literal: Option<bool>) {
        let Some(frame) = self.frames.last_mut() else {
            return;
        };
        if frame.unknown {
            frame.branch_active = true;
        } else if frame.taken {
            frame.branch_active = false;
        } else {
            frame.branch_active = literal.unwrap_or(true);
            frame.taken = literal == Some(true);
            frame.unknown = literal.is_none();
        }
    }

    fn otherwise(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            frame.branch_active = frame.unknown || !frame.taken;
        }
    }

    fn pop(&mut self) {
        self.frames.pop();
    }
}

/// Comment-free logical lines paired with the one-based line they start on.
fn logical_lines(source: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut start = 1;
    let mut in_block = false;
    for (index, physical) in source.lines().enumerate() {
        if current.is_empty() {
            start = index + 1;
        }
        let (stripped, still_in_block) = strip_comments(physical, in_block);
        in_block = still_in_block;
        match stripped.strip_suffix('\\') {
            Some(joined) if !in_block => {
                current.push_str(joined);
                current.push(' ');
            }
            _ => {
                current.push_str(&stripped);
                if !in_block {
                    lines.push((start, std::mem::take(&mut current)));
                }
            }
        }
    }
    if !current.is_empty() {
        lines.push((start, current));
    }
    lines
}

/// Remove `//` and `/* */` comments from one physical line, skipping string
/// and character literals. Returns the remaining text and whether a block
/// comment is still open at the end of the line.
fn strip_comments(line: &str, mut in_block: bool) -> (String, bool) {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    let mut quote: Option<char> = None;
    while let Some(ch) = chars.next() {
        if in_block {
            if ch == '*' && chars.peek() == Some(&'/') {
                chars.next();
                in_block = false;
                out.push(' ');
            }
            continue;
        }
        if let Some(delimiter) = quote {
            out.push(ch);
            if ch == '\\' {
                out.extend(chars.next());
            } else if ch == delimiter {
                quote = None;
            }
            continue;
        }
        match (ch, chars.peek()) {
            ('/', Some('/')) => break,
            ('/', Some('*')) => {
                chars.next();
                in_block = true;
            }
            ('"' | '\'', _) => {
                quote = Some(ch);
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    (out.trim_end().to_owned(), in_block)
}
