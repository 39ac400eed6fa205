//! Ranking stored patterns against a task description

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use crate::context::analyze_task_context;
use crate::error::Result;
use crate::index::PatternIndexCache;
use crate::pattern::{Category, Framework, PatternRecord};
use crate::store::PatternId;

pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;
pub const DEFAULT_MIN_RELEVANCE: f64 = 0.3;

const CATEGORY_WEIGHT: f64 = 0.5;
const TAG_WEIGHT: f64 = 0.15;
const FRAMEWORK_WEIGHT: f64 = 0.1;

/// What to suggest patterns for
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestOptions {
    /// Free-form description of the task
    pub context: String,
    pub framework: Option<Framework>,
    /// When non-empty, replaces the categories derived from `context`
    pub categories: Vec<Category>,
    pub limit: usize,
    pub min_relevance: f64,
}

impl Default for SuggestOptions {
    fn default() -> Self {
        Self {
            context: String::new(),
            framework: None,
            categories: Vec::new(),
            limit: DEFAULT_SUGGESTION_LIMIT,
            min_relevance: DEFAULT_MIN_RELEVANCE,
        }
    }
}

impl SuggestOptions {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            ..Self::default()
        }
    }

    pub fn framework(mut self, framework: Framework) -> Self {
        self.framework = Some(framework);
        self
    }

    pub fn categories(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
        self.categories = categories.into_iter().collect();
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn min_relevance(mut self, min_relevance: f64) -> Self {
        self.min_relevance = min_relevance;
        self
    }
}

/// A scored pattern with the reasons behind its score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternSuggestion {
    pub id: PatternId,
    pub pattern: PatternRecord,
    /// Score in `[0, 1]`
    pub relevance: f64,
    pub reason: String,
    /// Task keywords that matched one of the pattern's tags
    pub matched_keywords: Vec<String>,
}

/// Suggests patterns using the shared index
#[derive(Debug, Clone)]
pub struct SuggestionEngine {
    cache: Arc<PatternIndexCache>,
}

impl SuggestionEngine {
    pub fn new(cache: Arc<PatternIndexCache>) -> Self {
        Self { cache }
    }

    /// Best matching patterns for `options`, highest relevance first.
    ///
    /// Returns nothing when no category can be resolved. Errors loading a
    /// candidate record are returned rather than skipped.
    pub async fn suggest(&self, options: &SuggestOptions) -> Result<Vec<PatternSuggestion>> {
        let mut context = analyze_task_context(&options.context, options.framework);
        if !options.categories.is_empty() {
            context.categories = options.categories.clone();
        }
        if context.categories.is_empty() {
            tracing::debug!("No categories resolved from task context");
            return Ok(Vec::new());
        }

        let index = self.cache.get().await?;

        let candidates: BTreeSet<&PatternId> = context
            .categories
            .iter()
            .filter_map(|category| index.by_category.get(category))
            .flatten()
            .collect();

        let store = self.cache.store();
        let mut suggestions = Vec::new();
        for id in candidates {
            if let (Some(framework), Some(meta)) = (context.framework, index.get(id)) {
                if !meta.supports(framework) {
                    continue;
                }
            }

            let pattern = store.load(id).await?;
            let scored = score(&pattern, &context.categories, &context.keywords, context.framework);
            if scored.relevance >= options.min_relevance {
                suggestions.push(PatternSuggestion {
                    id: id.clone(),
                    pattern,
                    relevance: scored.relevance,
                    reason: scored.reason,
                    matched_keywords: scored.matched_keywords,
                });
            }
        }

        suggestions.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.pattern.name.cmp(&b.pattern.name))
                .then_with(|| a.id.cmp(&b.id))
        });
        suggestions.truncate(options.limit);

        tracing::debug!(
            count = suggestions.len(),
            categories = ?context.categories,
            "Suggested patterns"
        );
        Ok(suggestions)
    }
}

struct Score {
    relevance: f64,
    reason: String,
    matched_keywords: Vec<String>,
}

fn score(
    pattern: &PatternRecord,
    categories: &[Category],
    keywords: &[String],
    framework: Option<Framework>,
) -> Score {
    let mut relevance = 0.0;
    let mut reasons = Vec::new();

    if categories.contains(&pattern.category) {
        relevance += CATEGORY_WEIGHT;
        reasons.push(format!("matches {} category", pattern.category));
    }

    let matched_keywords: Vec<String> = keywords
        .iter()
        .filter(|keyword| pattern.has_tag(keyword))
        .cloned()
        .collect();
    if !matched_keywords.is_empty() {
        relevance += TAG_WEIGHT * matched_keywords.len() as f64;
        reasons.push(format!("tags match: {}", matched_keywords.join(", ")));
    }

    if let Some(framework) = framework.filter(|f| pattern.supports(*f)) {
        relevance += FRAMEWORK_WEIGHT;
        reasons.push(format!("supports framework {framework}"));
    }

    let reason = if reasons.is_empty() {
        "general match".to_string()
    } else {
        reasons.join("; ")
    };

    Score {
        relevance: f64::min(relevance, 1.0),
        reason,
        matched_keywords,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(tags: &[&str]) -> PatternRecord {
        PatternRecord::new(
            "Card Grid",
            Category::Layout,
            tags.iter().copied(),
            [Framework::React],
            ["Align"],
        )
    }

    #[test]
    fn score_adds_each_signal() {
        let keywords = vec!["responsive".to_string(), "grid".to_string()];
        let scored = score(
            &record(&["Grid", "responsive"]),
            &[Category::Layout],
            &keywords,
            Some(Framework::React),
        );
        assert!((scored.relevance - 0.9).abs() < 1e-9);
        assert_eq!(
            scored.reason,
            "matches layout category; tags match: responsive, grid; supports framework react"
        );
        assert_eq!(scored.matched_keywords, keywords);
    }

    #[test]
    fn score_is_clamped() {
        let keywords: Vec<String> = ["grid", "flex", "row", "column", "section"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let scored = score(
            &record(&["grid", "flex", "row", "column", "section"]),
            &[Category::Layout],
            &keywords,
            Some(Framework::React),
        );
        assert_eq!(scored.relevance, 1.0);
    }

    #[test]
    fn nothing_matching_is_a_general_match() {
        let scored = score(&record(&["grid"]), &[Category::Forms], &[], Some(Framework::Vue));
        assert_eq!(scored.relevance, 0.0);
        assert_eq!(scored.reason, "general match");
        assert!(scored.matched_keywords.is_empty());
    }
}
