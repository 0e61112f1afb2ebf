/*!
# Rewrite Rules

Textual rewrite rules and the primitive substitution they perform on a line.
Rules are loaded from a line-oriented rule file by [`load_rules`].
*/

use serde::{Deserialize, Serialize};

pub mod loader;

pub use loader::{load_rules, parse_rule_line, parse_rules, LoadedRules, RuleDiagnostic};

/// How many occurrences of a pattern a rule rewrites per line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplyMode {
    /// Only the first occurrence
    First,
    /// Every non-overlapping occurrence, left to right
    All,
}

impl ApplyMode {
    pub fn from_multiple(multiple: bool) -> Self {
        if multiple {
            ApplyMode::All
        } else {
            ApplyMode::First
        }
    }
}

/// A single pattern/replacement rule
///
/// Order among rules is significant: each rule sees the output of the rules
/// before it on the same line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteRule {
    pub pattern: String,
    pub replacement: String,
    pub mode: ApplyMode,
}

impl RewriteRule {
    pub fn new(
        pattern: impl Into<String>,
        replacement: impl Into<String>,
        mode: ApplyMode,
    ) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
            mode,
        }
    }

    /// Apply this rule to `line` by plain substring matching.
    ///
    /// Returns the rewritten line and the number of replacements made.
    pub fn apply(&self, line: &str) -> (String, usize) {
        replace_occurrences(line, &self.pattern, &self.replacement, self.mode, false)
    }

    /// Apply this rule to `line`, only replacing occurrences that stand on
    /// identifier boundaries.
    pub fn apply_identifier(&self, line: &str) -> (String, usize) {
        replace_occurrences(line, &self.pattern, &self.replacement, self.mode, true)
    }

    /// Whether the pattern is a bare identifier.
    ///
    /// Same definition as `IDENTIFIER`: an underscore or alphabetic start,
    /// then underscores, alphabetic or numeric characters.
    pub fn pattern_is_identifier(&self) -> bool {
        let mut chars = self.pattern.chars();
        match chars.next() {
            Some(first) if is_identifier_start(first) => chars.all(is_identifier_char),
            _ => false,
        }
    }
}

/// Regex form of an identifier, kept in step with `is_identifier_start`
/// and `is_identifier_char` (`char::is_alphabetic` is `\p{Alphabetic}`,
/// `char::is_numeric` is `\p{N}`).
pub(crate) const IDENTIFIER: &str = r"[_\p{Alphabetic}][_\p{Alphabetic}\p{N}]*";

pub(crate) fn is_identifier_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

pub(crate) fn is_identifier_char(c: char) -> bool {
    c == '_' || c.is_alphabetic() || c.is_numeric()
}

fn on_identifier_boundary(line: &str, start: usize, end: usize) -> bool {
    let before = line[..start].chars().next_back();
    let after = line[end..].chars().next();
    !before.is_some_and(is_identifier_char) && !after.is_some_and(is_identifier_char)
}

fn replace_occurrences(
    line: &str,
    pattern: &str,
    replacement: &str,
    mode: ApplyMode,
    identifier_boundaries: bool,
) -> (String, usize) {
    if pattern.is_empty() {
        return (line.to_string(), 0);
    }

    let mut out = String::with_capacity(line.len());
    let mut copied_to = 0;
    let mut search_from = 0;
    let mut count = 0;

    while let Some(offset) = line[search_from..].find(pattern) {
        let start = search_from + offset;
        let end = start + pattern.len();

        if identifier_boundaries && !on_identifier_boundary(line, start, end) {
            let step = line[start..].chars().next().map_or(1, char::len_utf8);
            search_from = start + step;
            continue;
        }

        out.push_str(&line[copied_to..start]);
        out.push_str(replacement);
        copied_to = end;
        search_from = end;
        count += 1;

        if mode == ApplyMode::First {
            break;
        }
    }

    out.push_str(&line[copied_to..]);
    (out, count)
}
