use std::time::{Duration, Instant};

use miette::{IntoDiagnostic, Result};
use motif_core::{Category, Framework, PatternId, PatternLibrary, SearchOptions};
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::json;

use crate::output::Output;

fn millis(duration: Duration) -> String {
    format!("{:.2} ms", as_ms(duration))
}

/// Rebuild the index and print what went into it
pub async fn stats(library: &PatternLibrary, output: &Output) -> Result<()> {
    let stats = library.reindex().await?;

    if output.is_quiet() {
        let report = json!({
            "store": library.store().location(),
            "patterns": stats.patterns,
            "tags": stats.tags,
            "categories": stats.categories,
            "frameworks": stats.frameworks,
            "skipped": stats.skipped,
            "build_ms": as_ms(stats.build_time),
        });
        output.print(&serde_json::to_string_pretty(&report).into_diagnostic()?);
        return Ok(());
    }

    output.section("Index");
    output.kv("Store", &library.store().location());
    output.kv("Patterns", &stats.patterns.to_string());
    output.kv("Tags", &stats.tags.to_string());
    output.kv("Categories", &stats.categories.to_string());
    output.kv("Frameworks", &stats.frameworks.to_string());
    output.kv("Build time", &millis(stats.build_time));
    if stats.skipped > 0 {
        output.warning(&format!(
            "{} document(s) skipped; run `motif validate` for details",
            stats.skipped
        ));
    }
    Ok(())
}

fn bench_queries() -> Vec<(&'static str, SearchOptions)> {
    vec![
        ("all", SearchOptions::new()),
        ("tag grid", SearchOptions::new().tag("grid")),
        ("category layout", SearchOptions::new().category(Category::Layout)),
        ("framework react", SearchOptions::new().framework(Framework::React)),
        (
            "tags form+validation",
            SearchOptions::new().tags(["form", "validation"]),
        ),
        (
            "tag responsive, layout, vue",
            SearchOptions::new()
                .tag("responsive")
                .category(Category::Layout)
                .framework(Framework::Vue),
        ),
    ]
}

/// Timings for one benchmark query; `linear_ms` is `None` when linear search errored
#[derive(Debug, Clone, Serialize)]
pub struct BenchRow {
    pub query: &'static str,
    pub linear_ms: Option<f64>,
    pub indexed_ms: f64,
    pub results: usize,
    pub agree: bool,
}

fn as_ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Run every benchmark query `iterations` times through both search paths
pub async fn run_bench(library: &PatternLibrary, iterations: u32) -> Result<Vec<BenchRow>> {
    let iterations = iterations.max(1);
    let mut rows = Vec::new();

    for (query, options) in bench_queries() {
        let mut linear_total = Duration::ZERO;
        let mut linear_ids: Result<Vec<PatternId>> = Ok(Vec::new());
        for _ in 0..iterations {
            let started = Instant::now();
            linear_ids = library
                .search(&options)
                .await
                .map(|found| {
                    let mut ids: Vec<_> = found.into_iter().map(|p| p.id).collect();
                    ids.sort();
                    ids
                })
                .map_err(Into::into);
            linear_total += started.elapsed();
        }

        let mut fast_total = Duration::ZERO;
        let mut fast_ids = Vec::new();
        for _ in 0..iterations {
            let started = Instant::now();
            fast_ids = library.search_fast(&options).await?;
            fast_total += started.elapsed();
        }

        let (linear_ms, agree) = match &linear_ids {
            Ok(ids) => (Some(as_ms(linear_total / iterations)), *ids == fast_ids),
            // Linear search stops at the first unreadable document
            Err(_) => (None, false),
        };
        rows.push(BenchRow {
            query,
            linear_ms,
            indexed_ms: as_ms(fast_total / iterations),
            results: fast_ids.len(),
            agree,
        });
    }
    Ok(rows)
}

/// Time linear against indexed search over a fixed set of queries
pub async fn bench(library: &PatternLibrary, iterations: u32, output: &Output) -> Result<()> {
    let iterations = iterations.max(1);
    let stats = library.reindex().await?;
    let rows = run_bench(library, iterations).await?;
    let disagreements = rows.iter().filter(|row| !row.agree).count();

    if output.is_quiet() {
        let report = json!({
            "patterns": stats.patterns,
            "index_build_ms": as_ms(stats.build_time),
            "iterations": iterations,
            "queries": rows,
        });
        output.print(&serde_json::to_string_pretty(&report).into_diagnostic()?);
        return Ok(());
    }

    output.section("Benchmark");
    output.kv("Patterns", &stats.patterns.to_string());
    output.kv("Index build", &millis(stats.build_time));
    output.kv("Iterations", &iterations.to_string());

    let mut table = output.table(&["Query", "Linear", "Indexed", "Results", "Agree"]);
    for row in &rows {
        table.add_row(vec![
            row.query.to_string(),
            row.linear_ms
                .map_or_else(|| "error".to_string(), |ms| format!("{ms:.2} ms")),
            format!("{:.2} ms", row.indexed_ms),
            row.results.to_string(),
            if row.agree { "yes".to_string() } else { "no".to_string() },
        ]);
    }
    output.print_table(&table);

    if disagreements == 0 {
        output.success("Indexed search agrees with linear search on every query");
    } else {
        output.warning(&format!(
            "{} quer{} disagreed; {} has invalid documents if linear search errored",
            disagreements,
            if disagreements == 1 { "y" } else { "ies" },
            library.store().location().bright_cyan()
        ));
    }
    Ok(())
}
