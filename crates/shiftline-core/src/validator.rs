/*!
# Validator

Compares produced files against a hand-maintained reference tree that mirrors
the destination tree. Mismatches are collected, never raised.
*/

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::{read_lines, Result, ShiftlineError};

/// What disagreed between a produced file and its reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MismatchKind {
    /// No reference file at the expected path
    MissingReference { reference: PathBuf },
    /// Line counts differ; lines were not compared
    LineCount { produced: usize, reference: usize },
    /// A single differing line (1-based)
    Line {
        line: usize,
        produced: String,
        reference: String,
    },
}

/// One mismatch for one produced file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub file: PathBuf,
    #[serde(flatten)]
    pub kind: MismatchKind,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.file.display())?;
        match &self.kind {
            MismatchKind::MissingReference { reference } => {
                write!(f, "reference file not found: {}", reference.display())
            }
            MismatchKind::LineCount { produced, reference } => {
                write!(f, "Invalid line count: dest={produced} test={reference}")
            }
            MismatchKind::Line {
                line,
                produced,
                reference,
            } => write!(f, "line {line}\n  \"{produced}\"\n  \"{reference}\""),
        }
    }
}

/// Accumulated mismatches of one validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub files_checked: usize,
    pub mismatches: Vec<Mismatch>,
}

impl ValidationResult {
    pub fn error_count(&self) -> usize {
        self.mismatches.len()
    }

    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty()
    }

    /// Final status line, e.g. `finished - 3 ERRORS`
    pub fn status_line(&self) -> String {
        if self.is_clean() {
            "finished - everything OK".to_string()
        } else {
            format!("finished - {} ERRORS", self.error_count())
        }
    }
}

/// Compares a destination tree with a reference tree
#[derive(Debug, Clone)]
pub struct Validator {
    dest_root: PathBuf,
    reference_root: PathBuf,
}

impl Validator {
    pub fn new(dest_root: impl Into<PathBuf>, reference_root: impl Into<PathBuf>) -> Self {
        Self {
            dest_root: dest_root.into(),
            reference_root: reference_root.into(),
        }
    }

    /// Expected reference path for a produced file.
    pub fn reference_path_for(&self, produced: &Path) -> Result<PathBuf> {
        let relative = produced.strip_prefix(&self.dest_root).map_err(|_| {
            ShiftlineError::Config(format!(
                "Produced file {} is outside the destination root {}",
                produced.display(),
                self.dest_root.display()
            ))
        })?;
        Ok(self.reference_root.join(relative))
    }

    /// Validate every produced file, in order.
    pub fn validate(&self, produced: &[PathBuf]) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();

        for file in produced {
            result.files_checked += 1;
            let reference = self.reference_path_for(file)?;
            if !reference.is_file() {
                result.mismatches.push(Mismatch {
                    file: file.clone(),
                    kind: MismatchKind::MissingReference { reference },
                });
                continue;
            }

            let produced_lines = read_lines(file)?;
            let reference_lines = read_lines(&reference)?;

            if produced_lines.len() != reference_lines.len() {
                result.mismatches.push(Mismatch {
                    file: file.clone(),
                    kind: MismatchKind::LineCount {
                        produced: produced_lines.len(),
                        reference: reference_lines.len(),
                    },
                });
                continue;
            }

            for (idx, (ours, theirs)) in produced_lines.iter().zip(&reference_lines).enumerate() {
                if ours != theirs {
                    result.mismatches.push(Mismatch {
                        file: file.clone(),
                        kind: MismatchKind::Line {
                            line: idx + 1,
                            produced: ours.clone(),
                            reference: theirs.clone(),
                        },
                    });
                }
            }
        }

        debug!(
            "Validated {} files against {}: {} mismatches",
            result.files_checked,
            self.reference_root.display(),
            result.error_count()
        );
        Ok(result)
    }
}
