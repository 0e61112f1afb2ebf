//! # Shiftline Core
//!
//! Core implementation of the shiftline source tree transpiler, including:
//! - Manifest resolution (which source files take part, in what order)
//! - Rewrite rule loading from line-oriented rule files
//! - The two-phase (index, then rewrite) transform engine
//! - The orchestrator that maps source paths to destination paths
//! - The validator that compares produced files against a reference tree
//!
//! The crate is UI-agnostic; the `shiftline` binary in `shiftline-cli` is a
//! thin front end over [`Orchestrator`] and [`Validator`].

#![warn(clippy::all)]

use std::path::PathBuf;

pub mod manifest;
pub mod pipeline;
pub mod rules;
pub mod tracer;
pub mod validator;

// Re-export commonly used types
pub use manifest::{resolve, Manifest, SourceFile};
pub use pipeline::{Orchestrator, RunSummary};
pub use rules::{load_rules, ApplyMode, LoadedRules, RewriteRule, RuleDiagnostic};
pub use tracer::{Declaration, DeclarationIndex, DeclarationKind, EngineError, Indexer, Rewriter};
pub use validator::{Mismatch, MismatchKind, ValidationResult, Validator};

/// Shiftline version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for shiftline components.
///
/// Logs go to stderr so that stdout only carries progress and reports.
pub fn init_tracing(debug: bool) {
    let default_directive = if debug {
        "shiftline_core=debug"
    } else {
        "shiftline_core=info"
    };
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = default_directive.parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Run configuration
#[derive(Debug, Clone)]
pub struct ShiftlineConfig {
    /// Root of the source tree; destination paths mirror paths below it
    pub source_root: PathBuf,
    /// Manifest file or directory the file list is resolved from
    pub manifest_path: PathBuf,
    /// Root of the generated tree
    pub dest_root: PathBuf,
    /// Line-oriented rewrite rule file
    pub rule_path: PathBuf,
    /// Hand-maintained reference tree to validate against
    pub reference_root: Option<PathBuf>,
    /// Extension of files that take part, e.g. `.kt`
    pub source_extension: String,
    /// Extension written in place of the source extension, e.g. `.swift`
    pub target_extension: String,
    /// Match rules naming a corpus declaration on identifier boundaries only.
    /// Off by default: every rule matches as a plain substring.
    pub declaration_aware: bool,
}

impl Default for ShiftlineConfig {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from("."),
            manifest_path: PathBuf::from("."),
            dest_root: PathBuf::from("./out"),
            rule_path: PathBuf::from("./rules.json"),
            reference_root: None,
            source_extension: ".kt".to_string(),
            target_extension: ".swift".to_string(),
            declaration_aware: false,
        }
    }
}

impl ShiftlineConfig {
    /// Check that every configured path exists with the right shape.
    ///
    /// Runs before any file is read or written.
    pub fn validate_paths(&self) -> Result<()> {
        if !self.source_root.is_dir() {
            return Err(ShiftlineError::Config(format!(
                "Bad source dir: {}",
                self.source_root.display()
            )));
        }
        if !self.manifest_path.exists() {
            return Err(ShiftlineError::Config(format!(
                "Bad source files list: {}",
                self.manifest_path.display()
            )));
        }
        if !self.dest_root.is_dir() {
            return Err(ShiftlineError::Config(format!(
                "Bad destination dir: {}",
                self.dest_root.display()
            )));
        }
        if !self.rule_path.is_file() {
            return Err(ShiftlineError::Config(format!(
                "Bad rule file: {}",
                self.rule_path.display()
            )));
        }
        if let Some(reference) = &self.reference_root {
            if !reference.is_dir() {
                return Err(ShiftlineError::Config(format!(
                    "Bad reference dir: {}",
                    reference.display()
                )));
            }
        }
        Ok(())
    }
}

/// Error types for shiftline operations
#[derive(thiserror::Error, Debug)]
pub enum ShiftlineError {
    /// Misconfigured run: bad paths, empty rule set, stray source files
    #[error("Configuration error: {0}")]
    Config(String),

    /// Read or write failure on a specific path
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Internal engine inconsistency
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}

impl ShiftlineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for shiftline operations
pub type Result<T> = std::result::Result<T, ShiftlineError>;

/// Read a text file as a sequence of lines (`\n` or `\r\n` terminated).
pub fn read_lines(path: &std::path::Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| ShiftlineError::io(path, e))?;
    Ok(content.lines().map(|s| s.to_string()).collect())
}

/// Write lines to a file, each terminated by `\n`, replacing any existing file.
pub fn write_lines(path: &std::path::Path, lines: &[String]) -> Result<()> {
    let mut content = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
    for line in lines {
        content.push_str(line);
        content.push('\n');
    }
    std::fs::write(path, content).map_err(|e| ShiftlineError::io(path, e))
}
