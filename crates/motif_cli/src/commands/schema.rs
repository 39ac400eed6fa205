use miette::{IntoDiagnostic, Result};
use motif_core::PatternRecord;

use crate::output::Output;

/// Print the JSON Schema describing a pattern document
pub fn print(output: &Output) -> Result<()> {
    let schema = schemars::schema_for!(PatternRecord);
    output.print(&serde_json::to_string_pretty(&schema).into_diagnostic()?);
    Ok(())
}
