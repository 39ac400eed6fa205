use miette::{IntoDiagnostic, Result};
use motif_core::{PatternId, PatternLibrary, SearchOptions, SuggestOptions};
use owo_colors::OwoColorize;

use crate::output::Output;

pub async fn search(
    library: &PatternLibrary,
    options: &SearchOptions,
    linear: bool,
    output: &Output,
) -> Result<()> {
    let ids: Vec<PatternId> = if linear {
        let mut ids: Vec<_> = library
            .search(options)
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect();
        ids.sort();
        ids
    } else {
        library.search_fast(options).await?
    };

    if output.is_quiet() {
        output.print(&serde_json::to_string_pretty(&ids).into_diagnostic()?);
        return Ok(());
    }

    output.section("Search results");
    if ids.is_empty() {
        output.status("No patterns matched");
        return Ok(());
    }

    let mut table = output.table(&["Id", "Name", "Tags", "Frameworks"]);
    for id in &ids {
        let record = library.load(id).await?;
        let frameworks: Vec<_> = record.frameworks.iter().map(|f| f.as_str()).collect();
        table.add_row(vec![
            id.to_string(),
            record.name,
            record.tags.join(", "),
            frameworks.join(", "),
        ]);
    }
    output.print_table(&table);
    output.status(&format!("{} match(es)", ids.len()));
    Ok(())
}

pub async fn suggest(library: &PatternLibrary, options: &SuggestOptions, output: &Output) -> Result<()> {
    let suggestions = library.suggest(options).await?;

    if output.is_quiet() {
        output.print(&serde_json::to_string_pretty(&suggestions).into_diagnostic()?);
        return Ok(());
    }

    output.section("Suggestions");
    if suggestions.is_empty() {
        output.status("Nothing relevant found. Try naming a component, e.g. \"login form\" or \"card grid\"");
        return Ok(());
    }

    for (rank, suggestion) in suggestions.iter().enumerate() {
        output.print(&format!(
            "{}. {} {}",
            rank + 1,
            suggestion.pattern.name.bold(),
            format!("({:.0}%)", suggestion.relevance * 100.0).bright_green()
        ));
        output.kv("   id", suggestion.id.as_str());
        output.kv("   why", &suggestion.reason);
    }
    Ok(())
}
