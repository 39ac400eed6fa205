//! Completeness and coherence scoring for patterns
//!
//! Schema validation decides whether a record may exist at all. The checks
//! here only grade a valid record and never reject it.

use std::fmt::{self, Display};

use serde::Serialize;

use crate::pattern::{Category, Framework, PatternRecord};

const MIN_PRINCIPLES: usize = 3;
const MIN_TAGS: usize = 2;
const MIN_DESCRIPTION_CHARS: usize = 50;
const MIN_CODE_EXAMPLE_CHARS: usize = 100;

const PASSED_SCORE: u32 = 80;
const WARNING_SCORE: u32 = 60;

/// Tag fragments expected for each category
pub fn category_tag_keywords(category: Category) -> &'static [&'static str] {
    match category {
        Category::Layout => &["grid", "flex", "layout", "responsive", "container", "spacing"],
        Category::Forms => &["form", "input", "validation", "field", "submit", "textarea"],
        Category::Navigation => &["nav", "menu", "breadcrumb", "tabs", "sidebar", "link"],
        Category::MicroInteractions => &["hover", "animation", "transition", "click", "state"],
        Category::DataDisplay => &["table", "list", "card", "data", "grid", "display"],
        Category::Feedback => &["alert", "toast", "loading", "error", "success", "notification"],
        Category::Authentication => &["login", "auth", "password", "signup", "social", "oauth"],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    fn penalty(self) -> u32 {
        match self {
            Severity::Error => 30,
            Severity::Warning => 10,
            Severity::Info => 5,
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualityIssue {
    pub field: String,
    pub severity: Severity,
    pub message: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    Passed,
    Warning,
    Failed,
}

impl Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QualityLevel::Passed => "passed",
            QualityLevel::Warning => "warning",
            QualityLevel::Failed => "failed",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualityReport {
    pub level: QualityLevel,
    /// 0 to 100
    pub score: u32,
    pub issues: Vec<QualityIssue>,
    pub summary: String,
}

impl QualityReport {
    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }
}

struct Issues(Vec<QualityIssue>);

impl Issues {
    fn push(
        &mut self,
        field: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) {
        self.0.push(QualityIssue {
            field: field.into(),
            severity,
            message: message.into(),
            suggestion: suggestion.into(),
        });
    }
}

/// Grade a record for completeness and coherence.
pub fn validate_quality(pattern: &PatternRecord) -> QualityReport {
    let mut issues = Issues(Vec::new());

    if pattern.principles.len() < MIN_PRINCIPLES {
        issues.push(
            "principles",
            Severity::Warning,
            format!(
                "Only {} principles (recommend {MIN_PRINCIPLES}+)",
                pattern.principles.len()
            ),
            "Add more design principles for better pattern documentation",
        );
    }

    if pattern.tags.len() < MIN_TAGS {
        issues.push(
            "tags",
            Severity::Warning,
            format!("Only {} tag(s) (recommend {MIN_TAGS}+)", pattern.tags.len()),
            "Add more tags for better searchability",
        );
    }

    if let Some(docs) = &pattern.documentation {
        let chars = docs.description.chars().count();
        if chars < MIN_DESCRIPTION_CHARS {
            issues.push(
                "documentation.description",
                Severity::Warning,
                format!("Description is only {chars} chars (recommend {MIN_DESCRIPTION_CHARS}+)"),
                "Provide a more detailed description",
            );
        }
    }

    check_code_examples(pattern, &mut issues);
    check_coherence(pattern, &mut issues);

    report(issues.0)
}

fn check_code_examples(pattern: &PatternRecord, issues: &mut Issues) {
    if pattern.code_examples.is_empty() {
        issues.push(
            "code_examples",
            Severity::Warning,
            "No code examples provided despite framework support",
            "Add code examples for at least one framework",
        );
        return;
    }

    for (framework, code) in &pattern.code_examples {
        let chars = code.chars().count();
        if !code.is_empty() && chars < MIN_CODE_EXAMPLE_CHARS {
            issues.push(
                format!("code_examples.{framework}"),
                Severity::Warning,
                format!("{framework} example is only {chars} chars (may be a stub)"),
                "Provide a more complete code example",
            );
        }
    }

    if let Some(code) = non_empty_example(pattern, Framework::React) {
        if !code.contains('<') && !code.contains('>') {
            issues.push(
                "code_examples.react",
                Severity::Warning,
                "React example appears to lack JSX markup",
                "Include JSX in React code examples",
            );
        }
    }

    if let Some(code) = non_empty_example(pattern, Framework::Vue) {
        if !code.contains("template") && !code.contains("setup") {
            issues.push(
                "code_examples.vue",
                Severity::Warning,
                "Vue example appears to lack template or setup section",
                "Include template or Composition API setup in Vue examples",
            );
        }
    }
}

fn non_empty_example(pattern: &PatternRecord, framework: Framework) -> Option<&str> {
    pattern
        .code_examples
        .get(&framework)
        .map(String::as_str)
        .filter(|code| !code.is_empty())
}

fn check_coherence(pattern: &PatternRecord, issues: &mut Issues) {
    let keywords = category_tag_keywords(pattern.category);
    let tags: Vec<String> = pattern.tags.iter().map(|t| t.to_lowercase()).collect();
    let relevant = keywords
        .iter()
        .any(|keyword| tags.iter().any(|tag| tag.contains(keyword)));
    if !relevant {
        issues.push(
            "tags",
            Severity::Info,
            format!("No tags relate to the \"{}\" category", pattern.category),
            format!("Consider adding tags like: {}", keywords[..3].join(", ")),
        );
    }

    for (framework, code) in &pattern.code_examples {
        if !code.is_empty() && !pattern.supports(*framework) {
            issues.push(
                "frameworks",
                Severity::Info,
                format!("Code example exists for \"{framework}\" but it's not in frameworks"),
                format!("Add \"{framework}\" to frameworks"),
            );
        }
    }
}

fn report(issues: Vec<QualityIssue>) -> QualityReport {
    let penalty: u32 = issues.iter().map(|i| i.severity.penalty()).sum();
    let score = 100u32.saturating_sub(penalty);

    let level = if score >= PASSED_SCORE {
        QualityLevel::Passed
    } else if score >= WARNING_SCORE {
        QualityLevel::Warning
    } else {
        QualityLevel::Failed
    };

    QualityReport {
        level,
        score,
        summary: summarize(&issues),
        issues,
    }
}

fn summarize(issues: &[QualityIssue]) -> String {
    if issues.is_empty() {
        return "Pattern passes all quality checks".to_string();
    }

    let count = |severity| issues.iter().filter(|i| i.severity == severity).count();
    let plural = |n: usize| if n > 1 { "s" } else { "" };
    let (errors, warnings, infos) = (
        count(Severity::Error),
        count(Severity::Warning),
        count(Severity::Info),
    );

    let mut parts = Vec::new();
    if errors > 0 {
        parts.push(format!("{errors} error{}", plural(errors)));
    }
    if warnings > 0 {
        parts.push(format!("{warnings} warning{}", plural(warnings)));
    }
    if infos > 0 {
        parts.push(format!("{infos} info"));
    }
    format!(
        "Pattern has {} issue{} ({})",
        issues.len(),
        plural(issues.len()),
        parts.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Documentation;
    use pretty_assertions::assert_eq;

    const REACT_GRID: &str = r#"export function CardGrid({ items }) {
  return (
    <div className="grid grid-cols-3 gap-4">
      {items.map((item) => <Card key={item.id} {...item} />)}
    </div>
  );
}"#;

    fn complete(principles: usize) -> PatternRecord {
        PatternRecord::new(
            "Card Grid",
            Category::Layout,
            ["grid", "responsive"],
            [Framework::React],
            (0..principles).map(|i| format!("Principle {i}")),
        )
        .with_code_example(Framework::React, REACT_GRID)
    }

    #[test]
    fn complete_pattern_passes_cleanly() {
        let report = validate_quality(&complete(3));
        assert_eq!(report.issues, vec![]);
        assert_eq!(report.score, 100);
        assert_eq!(report.level, QualityLevel::Passed);
        assert_eq!(report.summary, "Pattern passes all quality checks");
    }

    #[test]
    fn principle_boundary() {
        assert!(validate_quality(&complete(3))
            .issues
            .iter()
            .all(|i| i.field != "principles"));

        let report = validate_quality(&complete(2));
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].field, "principles");
        assert_eq!(report.issues[0].severity, Severity::Warning);
        assert_eq!(report.issues[0].message, "Only 2 principles (recommend 3+)");
        assert_eq!(report.score, 90);
        assert_eq!(report.summary, "Pattern has 1 issue (1 warning)");
    }

    #[test]
    fn stubs_and_missing_markup_warn() {
        let pattern = complete(3)
            .with_code_example(Framework::React, "export const Grid = function () { return null; }")
            .with_code_example(Framework::Vue, "export default { name: 'Grid' }");
        let report = validate_quality(&pattern);
        let fields: Vec<_> = report.issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "code_examples.react",
                "code_examples.vue",
                "code_examples.react",
                "code_examples.vue",
                "frameworks",
            ]
        );
        assert_eq!(report.score, 55);
        assert_eq!(report.level, QualityLevel::Failed);
        assert_eq!(report.summary, "Pattern has 5 issues (4 warnings, 1 info)");
    }

    #[test]
    fn sparse_pattern_scores_low() {
        let pattern = PatternRecord::new(
            "Login Box",
            Category::Layout,
            ["auth"],
            [Framework::Vanilla],
            ["Keep it short"],
        )
        .with_documentation(Documentation {
            description: "A login box".into(),
            usage: None,
            parameters: vec![],
            best_practices: vec![],
            related: vec![],
        });
        let report = validate_quality(&pattern);
        assert_eq!(report.count(Severity::Warning), 4);
        assert_eq!(report.count(Severity::Info), 1);
        assert_eq!(report.score, 55);
        assert_eq!(report.level, QualityLevel::Failed);
        let info = report
            .issues
            .iter()
            .find(|i| i.severity == Severity::Info)
            .unwrap();
        assert_eq!(info.suggestion, "Consider adding tags like: grid, flex, layout");
    }

    #[test]
    fn tag_keywords_match_as_substrings() {
        let pattern = PatternRecord::new(
            "Nav Strip",
            Category::Navigation,
            ["Navigation", "top-menu-bar"],
            [Framework::React],
            ["a", "b", "c"],
        )
        .with_code_example(Framework::React, REACT_GRID);
        assert!(validate_quality(&pattern).issues.is_empty());
    }
}
