use miette::{IntoDiagnostic, Result};
use motif_core::config::{self, MotifConfig};
use owo_colors::OwoColorize;
use std::path::Path;

use crate::output::Output;

/// Show current configuration
pub async fn show(config: &MotifConfig, output: &Output) -> Result<()> {
    output.section("Current Configuration");

    let toml_str = toml::to_string_pretty(config).into_diagnostic()?;
    for line in toml_str.lines() {
        output.print(line);
    }

    Ok(())
}

/// Write the current configuration to a file, refusing to clobber one
pub async fn init(config: &MotifConfig, path: &Path, output: &Output) -> Result<()> {
    if path.exists() {
        return Err(miette::miette!(
            help = "Edit the existing file or pass a different path",
            "Config file already exists: {}",
            path.display()
        ));
    }

    output.info("💾", &format!("Saving configuration to: {}", path.display()));
    config::save_config(config, path).await?;

    output.success("Configuration saved successfully!");
    output.status(&format!(
        "Patterns will be stored in {}",
        config.store.root.display().bright_cyan()
    ));

    Ok(())
}
