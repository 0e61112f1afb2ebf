/*!
# Rule Loader

Parses line-oriented rule files. Each line holds at most one rule:

```text
{"from": "<escaped-pattern>", "to": "<escaped-replacement>", "multiple": true|false}
```

Lines that do not fit the schema are skipped and reported as
[`RuleDiagnostic`]s rather than aborting the load.
*/

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{ApplyMode, RewriteRule};
use crate::{read_lines, Result};

const RULE_SCHEMA: &str = concat!(
    r#"^\s*\{\s*"from":\s*"(.*)",\s*"to":\s*"(.*)","#,
    r#"\s*"multiple":\s*"?(true|false)"?\s*\},?\s*$"#,
);

fn rule_schema() -> &'static Regex {
    static SCHEMA: OnceLock<Regex> = OnceLock::new();
    SCHEMA.get_or_init(|| Regex::new(RULE_SCHEMA).expect("rule schema regex is valid"))
}

/// A rule file line that was not accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleDiagnostic {
    /// 1-based line number in the rule file
    pub line_number: usize,
    pub text: String,
    pub reason: String,
}

/// Outcome of loading a rule file
#[derive(Debug, Clone, Default)]
pub struct LoadedRules {
    pub rules: Vec<RewriteRule>,
    pub diagnostics: Vec<RuleDiagnostic>,
}

impl LoadedRules {
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Load and parse a rule file.
pub fn load_rules(path: &Path) -> Result<LoadedRules> {
    let lines = read_lines(path)?;
    let loaded = parse_rules(&lines);

    for diagnostic in &loaded.diagnostics {
        warn!(
            "{}:{}: skipping rule line ({}): {}",
            path.display(),
            diagnostic.line_number,
            diagnostic.reason,
            diagnostic.text
        );
    }
    debug!("Loaded {} rules from {}", loaded.rules.len(), path.display());
    for rule in &loaded.rules {
        debug!("  {:?} -> {:?} ({:?})", rule.pattern, rule.replacement, rule.mode);
    }

    Ok(loaded)
}

/// Parse rule lines, keeping their order.
pub fn parse_rules<S: AsRef<str>>(lines: &[S]) -> LoadedRules {
    let mut loaded = LoadedRules::default();
    for (idx, line) in lines.iter().enumerate() {
        let line = line.as_ref();
        match parse_rule_line(line) {
            Ok(Some(rule)) => loaded.rules.push(rule),
            Ok(None) => {}
            Err(reason) => loaded.diagnostics.push(RuleDiagnostic {
                line_number: idx + 1,
                text: line.to_string(),
                reason,
            }),
        }
    }
    loaded
}

/// Parse a single rule line.
///
/// `Ok(None)` is returned for structural lines (blank, `[`, `]`) that carry
/// no rule; `Err` carries the reason a candidate line was rejected.
pub fn parse_rule_line(line: &str) -> std::result::Result<Option<RewriteRule>, String> {
    let trimmed = line.trim();
    if matches!(trimmed, "" | "[" | "]" | "],") {
        return Ok(None);
    }

    let Some(captures) = rule_schema().captures(line) else {
        return Err(explain_rejection(trimmed));
    };

    // `from` unescapes quotes and backslashes, `to` only backslashes
    let pattern = captures[1].replace("\\\"", "\"").replace("\\\\", "\\");
    let replacement = captures[2].replace("\\\\", "\\");
    let multiple = &captures[3] == "true";

    if pattern.is_empty() {
        return Err("empty \"from\" pattern".to_string());
    }

    Ok(Some(RewriteRule {
        pattern,
        replacement,
        mode: ApplyMode::from_multiple(multiple),
    }))
}

fn explain_rejection(trimmed: &str) -> String {
    let candidate = trimmed.strip_suffix(',').unwrap_or(trimmed);
    let value = match serde_json::from_str::<Value>(candidate) {
        Ok(value) => value,
        Err(e) => return format!("not a single-line JSON object: {e}"),
    };

    let Value::Object(map) = value else {
        return "expected a rule object".to_string();
    };

    let missing: Vec<&str> = ["from", "to", "multiple"]
        .into_iter()
        .filter(|key| !map.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        return format!("missing key(s): {}", missing.join(", "));
    }

    let extra: Vec<&str> = map
        .keys()
        .map(String::as_str)
        .filter(|key| !matches!(*key, "from" | "to" | "multiple"))
        .collect();
    if !extra.is_empty() {
        return format!("unexpected key(s): {}", extra.join(", "));
    }

    if !map["from"].is_string() || !map["to"].is_string() {
        return "\"from\" and \"to\" must be strings".to_string();
    }
    match &map["multiple"] {
        Value::Bool(_) => {}
        Value::String(s) if s == "true" || s == "false" => {}
        _ => return "\"multiple\" must be true or false".to_string(),
    }

    "keys must appear in the order from, to, multiple".to_string()
}
