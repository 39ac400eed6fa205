//! Quality grading and schema audit commands

use miette::{IntoDiagnostic, Result};
use motif_core::{PatternId, PatternLibrary, QualityLevel, QualityReport, Severity, validate_quality};
use owo_colors::OwoColorize;
use serde_json::json;

use crate::output::Output;

fn level_label(level: QualityLevel) -> String {
    match level {
        QualityLevel::Passed => level.to_string().bright_green().to_string(),
        QualityLevel::Warning => level.to_string().yellow().to_string(),
        QualityLevel::Failed => level.to_string().bright_red().to_string(),
    }
}

fn print_report(id: &PatternId, report: &QualityReport, output: &Output) {
    output.section(id.as_str());
    output.kv("Score", &format!("{}/100", report.score));
    output.kv("Level", &level_label(report.level));
    output.kv("Summary", &report.summary);
    for issue in &report.issues {
        let severity = match issue.severity {
            Severity::Error => issue.severity.to_string().bright_red().to_string(),
            Severity::Warning => issue.severity.to_string().yellow().to_string(),
            Severity::Info => issue.severity.to_string().bright_blue().to_string(),
        };
        output.list_item(&format!("[{severity}] {}: {}", issue.field, issue.message));
        output.status(&format!("      {}", issue.suggestion));
    }
}

pub async fn one(library: &PatternLibrary, id: &str, output: &Output) -> Result<()> {
    let id = PatternId::from(id);
    let report = library.quality(&id).await?;

    if output.is_quiet() {
        output.print(&serde_json::to_string_pretty(&report).into_diagnostic()?);
    } else {
        print_report(&id, &report, output);
    }
    Ok(())
}

/// Grade every valid stored pattern; invalid documents are reported by `validate`
pub async fn all(library: &PatternLibrary, output: &Output) -> Result<()> {
    let audit = library.audit().await?;

    let mut reports = Vec::with_capacity(audit.valid.len());
    for id in &audit.valid {
        let record = library.load(id).await?;
        reports.push((id.clone(), validate_quality(&record)));
    }

    if output.is_quiet() {
        let entries: Vec<_> = reports
            .iter()
            .map(|(id, report)| json!({ "id": id, "report": report }))
            .collect();
        output.print(&serde_json::to_string_pretty(&entries).into_diagnostic()?);
        return Ok(());
    }

    output.section("Quality");
    let mut table = output.table(&["Id", "Score", "Level", "Summary"]);
    for (id, report) in &reports {
        table.add_row(vec![
            id.to_string(),
            report.score.to_string(),
            report.level.to_string(),
            report.summary.clone(),
        ]);
    }
    output.print_table(&table);

    let failed = reports
        .iter()
        .filter(|(_, r)| r.level == QualityLevel::Failed)
        .count();
    output.status(&format!("{} graded, {} failed", reports.len(), failed));
    if !audit.invalid.is_empty() {
        output.warning(&format!(
            "{} document(s) skipped as invalid; run `motif validate` for details",
            audit.invalid.len()
        ));
    }
    Ok(())
}

/// Schema audit of the whole store. Fails when any document is invalid.
pub async fn validate(library: &PatternLibrary, output: &Output) -> Result<()> {
    let audit = library.audit().await?;

    if output.is_quiet() {
        let invalid: Vec<_> = audit
            .invalid
            .iter()
            .map(|(id, err)| {
                let violations: Vec<_> = err.violations().iter().map(ToString::to_string).collect();
                json!({ "id": id, "error": err.to_string(), "violations": violations })
            })
            .collect();
        output.print(
            &serde_json::to_string_pretty(&json!({ "valid": audit.valid, "invalid": invalid }))
                .into_diagnostic()?,
        );
    } else {
        output.section("Schema audit");
        for (id, err) in &audit.invalid {
            output.error(id.as_str());
            if err.violations().is_empty() {
                output.list_item(&err.to_string());
            }
            for violation in err.violations() {
                output.list_item(&violation.to_string());
            }
        }
        output.status(&format!(
            "{} valid, {} invalid",
            audit.valid.len(),
            audit.invalid.len()
        ));
    }

    if audit.is_clean() {
        output.success("All patterns are valid");
        Ok(())
    } else {
        Err(miette::miette!(
            "{} of {} pattern document(s) failed validation",
            audit.invalid.len(),
            audit.total()
        ))
    }
}
