use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use shiftline_core::{Orchestrator, ShiftlineConfig, ValidationResult, Validator};
use tracing::warn;

/// Options that only affect how the run is reported
#[derive(Debug, Clone, Copy, Default)]
pub struct CliOptions {
    /// Treat validation mismatches as a failed run
    pub deny_mismatches: bool,
    pub json: bool,
    pub debug: bool,
}

/// What a finished run reports back to `main`
#[derive(Debug)]
pub struct Outcome {
    pub produced: Vec<PathBuf>,
    pub validation: Option<ValidationResult>,
}

impl Outcome {
    /// Mismatch count, zero when no validation ran
    pub fn mismatches(&self) -> usize {
        self.validation.as_ref().map_or(0, ValidationResult::error_count)
    }
}

pub fn build_command() -> Command {
    Command::new("shiftline")
        .version(shiftline_core::VERSION)
        .about("Rewrite a source tree into another language with line-oriented rewrite rules")
        .arg(
            Arg::new("source_root")
                .value_name("SOURCE_ROOT")
                .help("Root directory of the source tree")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("manifest")
                .value_name("MANIFEST_OR_DIR")
                .help("File listing source paths line by line, or a directory to walk")
                .required(true)
                .index(2),
        )
        .arg(
            Arg::new("dest_root")
                .value_name("DEST_ROOT")
                .help("Existing directory the generated tree is written to")
                .required(true)
                .index(3),
        )
        .arg(
            Arg::new("rules")
                .value_name("RULE_FILE")
                .help("Rule file, one {\"from\", \"to\", \"multiple\"} object per line")
                .required(true)
                .index(4),
        )
        .arg(
            Arg::new("reference_root")
                .value_name("REFERENCE_ROOT")
                .help("Hand-maintained tree to validate the generated files against")
                .index(5),
        )
        .arg(
            Arg::new("source_ext")
                .long("source-ext")
                .value_name("EXT")
                .help("Extension of source files")
                .default_value(".kt"),
        )
        .arg(
            Arg::new("target_ext")
                .long("target-ext")
                .value_name("EXT")
                .help("Extension of generated files")
                .default_value(".swift"),
        )
        .arg(
            Arg::new("declaration_aware")
                .long("declaration-aware")
                .help("Match rules that name a declared identifier on identifier boundaries only")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("deny_mismatches")
                .long("deny-mismatches")
                .help("Exit with an error when validation finds mismatches")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the validation report as JSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue),
        )
}

pub fn config_from_matches(matches: &ArgMatches) -> (ShiftlineConfig, CliOptions) {
    let path = |id: &str| matches.get_one::<String>(id).map(PathBuf::from);
    let text = |id: &str| matches.get_one::<String>(id).cloned().unwrap_or_default();
    let defaults = ShiftlineConfig::default();

    let config = ShiftlineConfig {
        source_root: path("source_root").unwrap_or(defaults.source_root),
        manifest_path: path("manifest").unwrap_or(defaults.manifest_path),
        dest_root: path("dest_root").unwrap_or(defaults.dest_root),
        rule_path: path("rules").unwrap_or(defaults.rule_path),
        reference_root: path("reference_root"),
        source_extension: text("source_ext"),
        target_extension: text("target_ext"),
        declaration_aware: matches.get_flag("declaration_aware"),
    };
    let options = CliOptions {
        deny_mismatches: matches.get_flag("deny_mismatches"),
        json: matches.get_flag("json"),
        debug: matches.get_flag("debug"),
    };
    (config, options)
}

/// Run the whole pipeline, printing progress to stdout.
pub fn execute(config: ShiftlineConfig, options: CliOptions) -> Result<Outcome> {
    let orchestrator = Orchestrator::prepare(config)?;

    progress("Parsing...     ")?;
    let indexer = orchestrator.index().context("index phase failed")?;
    println!("finished");

    progress("Transpiling... ")?;
    let summary = orchestrator.transpile(indexer).context("rewrite phase failed")?;
    println!("finished");

    for unused in summary.unused_rules() {
        warn!("rule {:?} never matched", unused.pattern);
    }

    let config = orchestrator.config();
    let validation = match &config.reference_root {
        Some(reference_root) => {
            progress("Validating...  ")?;
            let validator = Validator::new(&config.dest_root, reference_root);
            let result = validator
                .validate(&summary.produced)
                .context("validation failed")?;

            if options.json {
                println!("{}", result.status_line());
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                for mismatch in &result.mismatches {
                    println!("{mismatch}");
                }
                println!("{}", result.status_line());
            }
            Some(result)
        }
        None => None,
    };

    Ok(Outcome {
        produced: summary.produced,
        validation,
    })
}

fn progress(label: &str) -> Result<()> {
    print!("{label}");
    io::stdout().flush()?;
    Ok(())
}
