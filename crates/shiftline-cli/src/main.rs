use anyhow::{bail, Result};
use shiftline_cli::{build_command, config_from_matches, execute};
use shiftline_core::init_tracing;

fn main() -> Result<()> {
    let matches = build_command().get_matches();
    let (config, options) = config_from_matches(&matches);

    // Initialize logging
    init_tracing(options.debug);

    let outcome = execute(config, options)?;

    if options.deny_mismatches && outcome.mismatches() > 0 {
        bail!("validation found {} mismatches", outcome.mismatches());
    }
    Ok(())
}
