//! Line-level declaration scanner used during indexing.

use std::sync::OnceLock;

use regex::Regex;

use super::DeclarationKind;
use crate::rules::IDENTIFIER;

const MODIFIERS: &str = concat!(
    "public|private|internal|protected|open|abstract|sealed|data|enum|annotation|inner|",
    "override|final|inline|const|lateinit|suspend|operator|infix|external|tailrec|expect|actual",
);

const KEYWORDS: &str = "class|interface|object|fun|val|var|typealias";

/// Annotations, modifiers, keyword, optional generics and receiver, then the name.
fn declaration_source() -> String {
    format!(
        concat!(
            r"^\s*(?:@{id}(?:\.{id})*(?:\([^)]*\))?\s+)*",
            r"((?:(?:{modifiers})\s+)*)",
            r"({keywords})\s+",
            r"(?:<[^>]*>\s*)?",
            r"(?:{id}(?:<[^>]*>)?\??\.)?",
            r"`?({id})`?",
        ),
        id = IDENTIFIER,
        modifiers = MODIFIERS,
        keywords = KEYWORDS,
    )
}

fn declaration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(&declaration_source()).expect("declaration regex is valid")
    })
}

/// Finds the name a line declares, if any
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclarationScanner;

impl DeclarationScanner {
    pub fn new() -> Self {
        Self
    }

    /// Return the declared name and its kind for `line`.
    pub fn scan<'a>(&self, line: &'a str) -> Option<(&'a str, DeclarationKind)> {
        let captures = declaration_pattern().captures(line)?;
        let modifiers = captures.get(1).map_or("", |m| m.as_str());
        let keyword = captures.get(2)?.as_str();
        let name = captures.get(3)?.as_str();

        let has_modifier = |wanted: &str| modifiers.split_whitespace().any(|m| m == wanted);
        let kind = match keyword {
            "class" if has_modifier("data") => DeclarationKind::DataClass,
            "class" if has_modifier("enum") => DeclarationKind::EnumClass,
            "class" => DeclarationKind::Class,
            "interface" => DeclarationKind::Interface,
            "object" => DeclarationKind::Object,
            "fun" => DeclarationKind::Function,
            "val" | "var" => DeclarationKind::Property,
            "typealias" => DeclarationKind::TypeAlias,
            _ => return None,
        };
        Some((name, kind))
    }
}
