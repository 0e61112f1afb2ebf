/*!
# Orchestrator

Wires manifest resolution, rule loading and the transform engine together,
maps every source file to its mirrored destination path and writes the
results.
*/

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::manifest::{normalize_extension, resolve, Manifest, SourceFile};
use crate::rules::{load_rules, RewriteRule};
use crate::tracer::{Indexer, RuleStats};
use crate::{read_lines, write_lines, Result, ShiftlineConfig, ShiftlineError};

/// A prepared run: resolved manifest plus loaded rules
#[derive(Debug)]
pub struct Orchestrator {
    config: ShiftlineConfig,
    source_root: PathBuf,
    manifest: Manifest,
    rules: Vec<RewriteRule>,
    rules_rejected: usize,
}

impl Orchestrator {
    /// Validate paths, resolve the manifest and load the rules.
    ///
    /// Fails with a configuration error when a path is bad or no rule line
    /// was accepted.
    pub fn prepare(config: ShiftlineConfig) -> Result<Self> {
        config.validate_paths()?;

        let source_root = canonical(&config.source_root)?;
        let manifest = resolve(&config.manifest_path, &config.source_extension)?;

        let loaded = load_rules(&config.rule_path)?;
        if loaded.is_empty() {
            let shown = canonical(&config.rule_path).unwrap_or_else(|_| config.rule_path.clone());
            return Err(ShiftlineError::Config(format!(
                "Rule file has no valid rules: {}",
                shown.display()
            )));
        }

        info!(
            "Prepared {} source files and {} rules ({} rule lines rejected)",
            manifest.len(),
            loaded.rules.len(),
            loaded.diagnostics.len()
        );
        for file in &manifest {
            debug!("  source: {}", file.path.display());
        }

        Ok(Self {
            config,
            source_root,
            manifest,
            rules: loaded.rules,
            rules_rejected: loaded.diagnostics.len(),
        })
    }

    pub fn config(&self) -> &ShiftlineConfig {
        &self.config
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    /// Map a source file to its destination path.
    ///
    /// The path relative to the source root is kept and a trailing source
    /// extension is swapped for the target extension.
    pub fn destination_for(&self, source: &SourceFile) -> Result<PathBuf> {
        let absolute = canonical(&source.path)?;
        let relative = absolute.strip_prefix(&self.source_root).map_err(|_| {
            ShiftlineError::Config(format!(
                "Source file {} is outside the source root {}",
                absolute.display(),
                self.source_root.display()
            ))
        })?;

        let mut dest = self.config.dest_root.join(relative);
        if let Some(name) = relative.file_name().map(|n| n.to_string_lossy().into_owned()) {
            let target = normalize_extension(&self.config.target_extension);
            if let Some(stem) = name.strip_suffix(source.extension.as_str()) {
                dest.set_file_name(format!("{stem}{target}"));
            }
        }
        Ok(dest)
    }

    /// Index phase: feed every file, in manifest order, to a fresh indexer.
    pub fn index(&self) -> Result<Indexer> {
        let mut indexer = Indexer::new();
        for file in &self.manifest {
            let lines = read_lines(&file.path)?;
            indexer.index_file(&file.path, &lines);
        }
        Ok(indexer)
    }

    /// Rewrite phase: rewrite every file and write it to its destination,
    /// replacing whatever is there.
    pub fn transpile(&self, indexer: Indexer) -> Result<RunSummary> {
        let files_processed = indexer.files_indexed();
        let mut rewriter = indexer.finish(self.rules.clone(), self.config.declaration_aware);
        let mut produced = Vec::with_capacity(self.manifest.len());

        for file in &self.manifest {
            let lines = read_lines(&file.path)?;
            let out = rewriter.rewrite(&lines)?;

            let dest = self.destination_for(file)?;
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|e| ShiftlineError::io(parent, e))?;
            }
            write_lines(&dest, &out)?;
            debug!("Wrote {} -> {}", file.path.display(), dest.display());
            produced.push(dest);
        }

        rewriter.log_stats();

        Ok(RunSummary {
            files_processed,
            rules_loaded: self.rules.len(),
            rules_rejected: self.rules_rejected,
            declarations: rewriter.index().len(),
            produced,
            rule_stats: rewriter.stats().to_vec(),
        })
    }

    /// Both phases back to back.
    pub fn run(&self) -> Result<RunSummary> {
        let indexer = self.index()?;
        self.transpile(indexer)
    }
}

fn canonical(path: &Path) -> Result<PathBuf> {
    path.canonicalize().map_err(|e| ShiftlineError::io(path, e))
}

/// Summary of a completed run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub files_processed: usize,
    pub rules_loaded: usize,
    pub rules_rejected: usize,
    pub declarations: usize,
    /// Destination paths, in manifest order
    pub produced: Vec<PathBuf>,
    pub rule_stats: Vec<RuleStats>,
}

impl RunSummary {
    /// Rules that never changed a line
    pub fn unused_rules(&self) -> impl Iterator<Item = &RuleStats> {
        self.rule_stats.iter().filter(|s| s.is_unused())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Layout {
        _dir: TempDir,
        config: ShiftlineConfig,
    }

    fn layout(rules: &str) -> Layout {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        let dest = dir.path().join("dest");
        fs::create_dir_all(src.join("pkg")).unwrap();
        fs::create_dir_all(&dest).unwrap();
        fs::write(src.join("Main.kt"), "fun main() {}\n").unwrap();
        fs::write(src.join("pkg/Util.kt"), "val a = 1\n").unwrap();
        let rule_path = dir.path().join("rules.json");
        fs::write(&rule_path, rules).unwrap();

        let config = ShiftlineConfig {
            source_root: src.clone(),
            manifest_path: src,
            dest_root: dest,
            rule_path,
            ..Default::default()
        };
        Layout { _dir: dir, config }
    }

    #[test]
    fn test_destination_mirrors_tree_and_swaps_extension() {
        let layout = layout(r#"{"from": "fun", "to": "func", "multiple": true}"#);
        let orchestrator = Orchestrator::prepare(layout.config.clone()).unwrap();

        let dests: Vec<PathBuf> = orchestrator
            .manifest()
            .iter()
            .map(|f| orchestrator.destination_for(f).unwrap())
            .collect();
        assert_eq!(
            dests,
            vec![
                layout.config.dest_root.join("Main.swift"),
                layout.config.dest_root.join("pkg").join("Util.swift"),
            ]
        );
    }

    #[test]
    fn test_empty_rule_file_is_config_error() {
        let layout = layout("[\nnot a rule\n]\n");
        let err = Orchestrator::prepare(layout.config).unwrap_err();
        assert!(matches!(err, ShiftlineError::Config(ref msg) if msg.contains("no valid rules")));
    }

    #[test]
    fn test_run_writes_outputs_and_creates_subdirectories() {
        let layout = layout(r#"{"from": "val", "to": "let", "multiple": false}"#);
        let orchestrator = Orchestrator::prepare(layout.config.clone()).unwrap();
        let summary = orchestrator.run().unwrap();

        assert_eq!(summary.files_processed, 2);
        assert_eq!(summary.produced.len(), 2);
        let util = fs::read_to_string(layout.config.dest_root.join("pkg/Util.swift")).unwrap();
        assert_eq!(util, "let a = 1\n");
        assert_eq!(summary.rule_stats[0].replacements, 1);
    }

    #[test]
    fn test_existing_output_is_overwritten() {
        let layout = layout(r#"{"from": "val", "to": "let", "multiple": true}"#);
        let stale = layout.config.dest_root.join("Main.swift");
        fs::write(&stale, "stale\nstale\nstale\n").unwrap();

        Orchestrator::prepare(layout.config.clone()).unwrap().run().unwrap();
        assert_eq!(fs::read_to_string(&stale).unwrap(), "fun main() {}\n");
    }

    #[test]
    fn test_file_outside_source_root_is_rejected() {
        let layout = layout(r#"{"from": "val", "to": "let", "multiple": true}"#);
        let outside = layout.config.dest_root.join("Stray.kt");
        fs::write(&outside, "val x = 0\n").unwrap();
        let listing = layout.config.dest_root.join("sources.txt");
        fs::write(&listing, format!("{}\n", outside.display())).unwrap();

        let config = ShiftlineConfig {
            manifest_path: listing,
            ..layout.config.clone()
        };
        let err = Orchestrator::prepare(config).unwrap().run().unwrap_err();
        assert!(matches!(
            err,
            ShiftlineError::Config(ref msg) if msg.contains("outside the source root")
        ));
    }
}
