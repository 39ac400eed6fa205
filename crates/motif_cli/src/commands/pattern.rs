//! Store-level commands: list, show, add and delete

use std::path::PathBuf;

use miette::{IntoDiagnostic, Result};
use motif_core::{Category, CoreError, PatternId, PatternLibrary, parse_pattern_documents};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::output::Output;

pub async fn list(library: &PatternLibrary, category: Option<Category>, output: &Output) -> Result<()> {
    let ids = library.list(category).await?;

    if output.is_quiet() {
        output.print(&serde_json::to_string_pretty(&ids).into_diagnostic()?);
        return Ok(());
    }

    match category {
        Some(category) => output.section(&format!("Patterns in {category}")),
        None => output.section("Patterns"),
    }
    if ids.is_empty() {
        output.status(&format!(
            "No patterns stored under {}",
            library.store().location()
        ));
        return Ok(());
    }
    for id in &ids {
        output.list_item(id.as_str());
    }
    output.status(&format!("{} pattern(s)", ids.len()));
    Ok(())
}

pub async fn show(library: &PatternLibrary, id: &str, output: &Output) -> Result<()> {
    let record = library.load(&PatternId::from(id)).await?;

    if output.is_quiet() {
        output.print(&serde_json::to_string_pretty(&record).into_diagnostic()?);
    } else {
        output.section(&record.name);
        output.print(record.to_yaml().into_diagnostic()?.trim_end());
    }
    Ok(())
}

/// What happened to one document during an import
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ImportOutcome {
    Saved { source: String, name: String, id: PatternId },
    Rejected { source: String, violations: Vec<String> },
}

/// Save every valid record found in `files`, collecting one outcome per document
pub async fn import_files(library: &PatternLibrary, files: &[PathBuf]) -> Result<Vec<ImportOutcome>> {
    let mut outcomes = Vec::new();

    for file in files {
        let content = tokio::fs::read_to_string(file)
            .await
            .map_err(|e| miette::miette!("Failed to read {}: {}", file.display(), e))?;
        let documents = parse_pattern_documents(&content)
            .map_err(|e| miette::miette!("Failed to parse {}: {}", file.display(), e))?;

        for (position, document) in documents.into_iter().enumerate() {
            let source = format!("{}#{}", file.display(), position + 1);
            let record = match document {
                Ok(record) => record,
                Err(violations) => {
                    outcomes.push(ImportOutcome::Rejected {
                        source,
                        violations: violations.iter().map(ToString::to_string).collect(),
                    });
                    continue;
                }
            };

            match library.save(&record).await {
                Ok(id) => outcomes.push(ImportOutcome::Saved {
                    source,
                    name: record.name,
                    id,
                }),
                Err(CoreError::Validation { violations, .. }) => {
                    outcomes.push(ImportOutcome::Rejected {
                        source,
                        violations: violations.iter().map(ToString::to_string).collect(),
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
    Ok(outcomes)
}

/// Import every record found in `files`.
///
/// Valid records are saved even when others fail; the command errors at the
/// end if anything was rejected.
pub async fn add(library: &PatternLibrary, files: &[PathBuf], output: &Output) -> Result<()> {
    let outcomes = import_files(library, files).await?;
    let rejected = outcomes
        .iter()
        .filter(|o| matches!(o, ImportOutcome::Rejected { .. }))
        .count();

    if output.is_quiet() {
        output.print(&serde_json::to_string_pretty(&outcomes).into_diagnostic()?);
    } else {
        for outcome in &outcomes {
            match outcome {
                ImportOutcome::Saved { name, id, .. } => {
                    output.success(&format!("{} → {}", name, id.as_str().bright_cyan()));
                }
                ImportOutcome::Rejected { source, violations } => {
                    output.error(&format!("{source} rejected"));
                    for violation in violations {
                        output.list_item(violation);
                    }
                }
            }
        }
        output.status(&format!(
            "{} saved, {} rejected",
            outcomes.len() - rejected,
            rejected
        ));
    }

    if rejected > 0 {
        return Err(miette::miette!("{rejected} document(s) failed validation"));
    }
    Ok(())
}

pub async fn delete(library: &PatternLibrary, id: &str, output: &Output) -> Result<()> {
    library.delete(&PatternId::from(id)).await?;
    output.success(&format!("Deleted {}", id.bright_cyan()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use motif_core::{Framework, FsPatternStore, PatternRecord};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[tokio::test]
    async fn import_saves_valid_documents_and_reports_the_rest() {
        let dir = TempDir::new().unwrap();
        let library = PatternLibrary::new(Arc::new(FsPatternStore::new(dir.path().join("store"))), 4);

        let good = dir.path().join("good.yaml");
        let record = PatternRecord::new(
            "Card Grid",
            Category::Layout,
            ["grid", "card"],
            [Framework::React],
            ["Equal gutters"],
        );
        std::fs::write(&good, record.to_yaml().unwrap()).unwrap();
        let bad = dir.path().join("bad.yaml");
        std::fs::write(&bad, "name: Orphan\n").unwrap();

        let outcomes = import_files(&library, &[good, bad.clone()]).await.unwrap();
        assert_eq!(outcomes.len(), 2);
        match &outcomes[0] {
            ImportOutcome::Saved { name, id, .. } => {
                assert_eq!(name, "Card Grid");
                assert_eq!(id.as_str(), "layout/card-grid.yaml");
            }
            other => panic!("expected a saved outcome, got {other:?}"),
        }
        match &outcomes[1] {
            ImportOutcome::Rejected { source, violations } => {
                assert_eq!(source, &format!("{}#1", bad.display()));
                assert!(!violations.is_empty());
            }
            other => panic!("expected a rejected outcome, got {other:?}"),
        }

        let json = serde_json::to_value(&outcomes).unwrap();
        assert_eq!(json[0]["status"], "saved");
        assert_eq!(json[1]["status"], "rejected");
        assert_eq!(library.list(None).await.unwrap().len(), 1);
    }
}
