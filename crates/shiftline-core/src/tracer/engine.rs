/*!
# Transform Engine

Indexing and rewriting halves of the engine. See the module docs of
[`crate::tracer`] for how the two phases fit together.
*/

use std::path::Path;

use serde::Serialize;
use tracing::{debug, trace};

use super::{Declaration, DeclarationIndex, DeclarationKind, DeclarationScanner, EngineError};
use crate::rules::RewriteRule;

/// First phase: accumulates corpus-wide declarations
#[derive(Debug, Default)]
pub struct Indexer {
    index: DeclarationIndex,
    scanner: DeclarationScanner,
    files_indexed: usize,
}

impl Indexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one file's lines into the index. Produces no output.
    pub fn index_file(&mut self, path: &Path, lines: &[String]) {
        let before = self.index.len();
        for (idx, line) in lines.iter().enumerate() {
            if let Some((name, kind)) = self.scanner.scan(line) {
                self.index.insert(Declaration {
                    name: name.to_string(),
                    kind,
                    file: path.to_path_buf(),
                    line: idx + 1,
                });
            }
        }
        self.files_indexed += 1;
        trace!(
            "Indexed {} ({} new declarations)",
            path.display(),
            self.index.len() - before
        );
    }

    pub fn files_indexed(&self) -> usize {
        self.files_indexed
    }

    /// End the indexing phase and plan the rules against the finished index.
    ///
    /// With `declaration_aware` set, a rule whose pattern is a bare identifier
    /// naming an indexed declaration only matches whole identifiers.
    pub fn finish(self, rules: Vec<RewriteRule>, declaration_aware: bool) -> Rewriter {
        debug!(
            "Indexed {} files, {} declarations ({} redeclared)",
            self.files_indexed,
            self.index.len(),
            self.index.redeclarations()
        );

        let planned: Vec<PlannedRule> = rules
            .into_iter()
            .map(|rule| {
                let strategy = if declaration_aware
                    && rule.pattern_is_identifier()
                    && self.index.contains(&rule.pattern)
                {
                    MatchStrategy::Identifier
                } else {
                    MatchStrategy::Literal
                };
                PlannedRule { rule, strategy }
            })
            .collect();

        let stats = planned
            .iter()
            .map(|p| RuleStats::new(p.rule.pattern.clone(), p.strategy))
            .collect();

        Rewriter {
            index: self.index,
            rules: planned,
            stats,
        }
    }
}

/// How a rule finds its pattern in a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchStrategy {
    /// Plain substring matching
    Literal,
    /// Whole-identifier matching for a name declared in the corpus
    Identifier,
}

#[derive(Debug, Clone)]
struct PlannedRule {
    rule: RewriteRule,
    strategy: MatchStrategy,
}

/// Second phase: rewrites lines with the planned rules
///
/// Holds the frozen [`DeclarationIndex`]; nothing here mutates it.
#[derive(Debug)]
pub struct Rewriter {
    index: DeclarationIndex,
    rules: Vec<PlannedRule>,
    stats: Vec<RuleStats>,
}

impl Rewriter {
    pub fn index(&self) -> &DeclarationIndex {
        &self.index
    }

    /// Strategy chosen for each rule, in rule order
    pub fn strategies(&self) -> Vec<MatchStrategy> {
        self.rules.iter().map(|p| p.strategy).collect()
    }

    /// Rewrite every line of a file. Line count is preserved.
    pub fn rewrite(&mut self, lines: &[String]) -> Result<Vec<String>, EngineError> {
        lines.iter().map(|line| self.rewrite_line(line)).collect()
    }

    /// Apply every rule, in order, each to the output of the previous one.
    pub fn rewrite_line(&mut self, line: &str) -> Result<String, EngineError> {
        let mut current = line.to_string();

        for (position, planned) in self.rules.iter().enumerate() {
            let (next, replaced) = match planned.strategy {
                MatchStrategy::Literal => planned.rule.apply(&current),
                MatchStrategy::Identifier => {
                    let declaration = self.index.get(&planned.rule.pattern).ok_or_else(|| {
                        EngineError::MissingDeclaration {
                            name: planned.rule.pattern.clone(),
                            rule: position + 1,
                        }
                    })?;
                    let (next, replaced) = planned.rule.apply_identifier(&current);
                    if replaced > 0 {
                        trace!(
                            "Renamed {} {:?} declared at {}:{}",
                            replaced,
                            declaration.name,
                            declaration.file.display(),
                            declaration.line
                        );
                        self.stats[position].declaration = Some(declaration.kind);
                    }
                    (next, replaced)
                }
            };

            if replaced > 0 {
                let stats = &mut self.stats[position];
                stats.applications += 1;
                stats.replacements += replaced as u64;
                current = next;
            }
        }

        Ok(current)
    }

    /// Per-rule statistics, in rule order
    pub fn stats(&self) -> &[RuleStats] {
        &self.stats
    }

    /// Log per-rule statistics at debug level.
    pub fn log_stats(&self) {
        for (idx, stats) in self.stats.iter().enumerate() {
            debug!(
                "rule #{} {:?} [{:?}]: {} lines, {} replacements",
                idx + 1,
                stats.pattern,
                stats.strategy,
                stats.applications,
                stats.replacements
            );
        }
    }
}

/// Rule execution statistics
#[derive(Debug, Clone, Serialize)]
pub struct RuleStats {
    pub pattern: String,
    pub strategy: MatchStrategy,
    /// Lines the rule changed
    pub applications: u64,
    /// Occurrences replaced across all lines
    pub replacements: u64,
    /// Kind of the declaration an identifier rule renamed
    pub declaration: Option<DeclarationKind>,
}

impl RuleStats {
    pub fn new(pattern: String, strategy: MatchStrategy) -> Self {
        Self {
            pattern,
            strategy,
            applications: 0,
            replacements: 0,
            declaration: None,
        }
    }

    pub fn is_unused(&self) -> bool {
        self.applications == 0
    }
}
