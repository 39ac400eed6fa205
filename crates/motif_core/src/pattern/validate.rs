//! Structural validation of pattern documents

use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use url::Url;

use super::{
    Accessibility, Category, Documentation, Framework, Parameter, PatternRecord, Source, WcagLevel,
    slugify,
};

pub const NAME_MIN_CHARS: usize = 3;
pub const NAME_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MIN_CHARS: usize = 10;
pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// A single failed schema constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Dotted path of the field, e.g. `documentation.description` or `frameworks[1]`
    pub field: String,
    pub reason: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AccessibilityDraft {
    pub notes: Option<String>,
    pub wcag_level: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SourceDraft {
    pub url: Option<String>,
    pub extracted: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DocumentationDraft {
    pub description: Option<String>,
    pub usage: Option<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub best_practices: Vec<String>,
    #[serde(default)]
    pub related: Vec<String>,
}

/// A pattern document as read from disk, before any constraint is checked
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PatternDraft {
    pub name: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub frameworks: Option<Vec<String>>,
    pub principles: Option<Vec<String>>,
    pub accessibility: Option<AccessibilityDraft>,
    pub code_examples: Option<BTreeMap<String, String>>,
    pub source: Option<SourceDraft>,
    pub documentation: Option<DocumentationDraft>,
}

impl PatternDraft {
    /// Parse a single YAML document into a draft.
    ///
    /// Syntax errors and wrongly shaped values are reported as a violation on
    /// the whole document.
    pub fn from_yaml(content: &str) -> Result<Self, Vec<Violation>> {
        serde_yaml::from_str(content).map_err(|e| vec![Violation::new("<document>", e.to_string())])
    }

    /// Check every constraint, returning the typed record or all violations found
    pub fn validate(self) -> Result<PatternRecord, Vec<Violation>> {
        let mut check = Checker::default();

        let name = check.required("name", self.name);
        if let Some(name) = &name {
            check.char_range("name", name, NAME_MIN_CHARS, NAME_MAX_CHARS);
            if slugify(name).is_empty() {
                check.push("name", "must contain at least one ASCII letter or digit");
            }
        }

        let category = check
            .required("category", self.category)
            .and_then(|raw| check.parse::<Category>("category", &raw));

        let tags = check.required("tags", self.tags);
        if let Some(tags) = &tags {
            check.non_empty_items("tags", tags, "tag");
        }

        let raw_frameworks = check.required("frameworks", self.frameworks);
        if raw_frameworks.as_ref().is_some_and(Vec::is_empty) {
            check.push("frameworks", "must contain at least one framework");
        }
        let frameworks: Vec<Framework> = raw_frameworks
            .unwrap_or_default()
            .iter()
            .enumerate()
            .filter_map(|(i, raw)| check.parse(&format!("frameworks[{i}]"), raw))
            .collect();

        let principles = check.required("principles", self.principles);
        if let Some(principles) = &principles {
            check.non_empty_items("principles", principles, "principle");
        }

        let accessibility = self.accessibility.and_then(|a| check.accessibility(a));

        let code_examples: BTreeMap<Framework, String> = self
            .code_examples
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(key, code)| {
                check
                    .parse::<Framework>(&format!("code_examples.{key}"), &key)
                    .map(|fw| (fw, code))
            })
            .collect();

        let source = self.source.map(|s| check.source(s));
        let documentation = self.documentation.and_then(|d| check.documentation(d));

        match (name, category, tags, principles) {
            (Some(name), Some(category), Some(tags), Some(principles)) if check.is_clean() => {
                Ok(PatternRecord {
                    name,
                    category,
                    tags,
                    frameworks,
                    accessibility,
                    principles,
                    code_examples,
                    source,
                    documentation,
                })
            }
            _ => Err(check.into_violations()),
        }
    }
}

impl From<&PatternRecord> for PatternDraft {
    fn from(record: &PatternRecord) -> Self {
        Self {
            name: Some(record.name.clone()),
            category: Some(record.category.to_string()),
            tags: Some(record.tags.clone()),
            frameworks: Some(record.frameworks.iter().map(ToString::to_string).collect()),
            principles: Some(record.principles.clone()),
            accessibility: record.accessibility.as_ref().map(|a| AccessibilityDraft {
                notes: Some(a.notes.clone()),
                wcag_level: a.wcag_level.map(|l| l.to_string()),
            }),
            code_examples: (!record.code_examples.is_empty()).then(|| {
                record
                    .code_examples
                    .iter()
                    .map(|(fw, code)| (fw.to_string(), code.clone()))
                    .collect()
            }),
            source: record.source.as_ref().map(|s| SourceDraft {
                url: s.url.as_ref().map(ToString::to_string),
                extracted: s.extracted.map(|t| t.to_rfc3339()),
            }),
            documentation: record.documentation.as_ref().map(|d| DocumentationDraft {
                description: Some(d.description.clone()),
                usage: d.usage.clone(),
                parameters: d.parameters.clone(),
                best_practices: d.best_practices.clone(),
                related: d.related.clone(),
            }),
        }
    }
}

/// Parse YAML holding either one pattern or a sequence of patterns.
///
/// Each entry is validated on its own so one bad entry does not hide the rest.
pub fn parse_pattern_documents(
    content: &str,
) -> Result<Vec<Result<PatternRecord, Vec<Violation>>>, serde_yaml::Error> {
    let value: serde_yaml::Value = serde_yaml::from_str(content)?;
    let entries = match value {
        serde_yaml::Value::Sequence(items) => items,
        other => vec![other],
    };
    Ok(entries
        .into_iter()
        .map(|entry| {
            serde_yaml::from_value::<PatternDraft>(entry)
                .map_err(|e| vec![Violation::new("<document>", e.to_string())])
                .and_then(PatternDraft::validate)
        })
        .collect())
}

/// Accumulates violations while a draft is checked
#[derive(Debug, Default)]
struct Checker {
    violations: Vec<Violation>,
}

impl Checker {
    fn push(&mut self, field: impl Into<String>, reason: impl Into<String>) {
        self.violations.push(Violation::new(field, reason));
    }

    fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    fn into_violations(self) -> Vec<Violation> {
        self.violations
    }

    fn required<T>(&mut self, field: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.push(field, "is required");
        }
        value
    }

    fn parse<T: FromStr<Err = String>>(&mut self, field: &str, raw: &str) -> Option<T> {
        match raw.parse::<T>() {
            Ok(value) => Some(value),
            Err(reason) => {
                self.push(field, reason);
                None
            }
        }
    }

    fn char_range(&mut self, field: &str, value: &str, min: usize, max: usize) {
        let len = value.chars().count();
        if len < min {
            self.push(field, format!("must be at least {min} characters (got {len})"));
        } else if len > max {
            self.push(field, format!("must be at most {max} characters (got {len})"));
        }
    }

    fn non_empty_items(&mut self, field: &str, items: &[String], noun: &str) {
        if items.is_empty() {
            self.push(field, format!("must contain at least one {noun}"));
        }
        for (i, item) in items.iter().enumerate() {
            if item.trim().is_empty() {
                self.push(format!("{field}[{i}]"), "must not be empty");
            }
        }
    }

    fn accessibility(&mut self, draft: AccessibilityDraft) -> Option<Accessibility> {
        let notes = self.required("accessibility.notes", draft.notes);
        let wcag_level = draft
            .wcag_level
            .and_then(|raw| self.parse::<WcagLevel>("accessibility.wcag_level", &raw));
        notes.map(|notes| Accessibility { notes, wcag_level })
    }

    fn source(&mut self, draft: SourceDraft) -> Source {
        let url = draft.url.and_then(|raw| match Url::parse(&raw) {
            Ok(url) => Some(url),
            Err(e) => {
                self.push("source.url", format!("is not a valid URL: {e}"));
                None
            }
        });
        let extracted = draft.extracted.and_then(|raw| match parse_timestamp(&raw) {
            Some(t) => Some(t),
            None => {
                self.push(
                    "source.extracted",
                    format!("'{raw}' is not an RFC 3339 timestamp or YYYY-MM-DD date"),
                );
                None
            }
        });
        Source { url, extracted }
    }

    fn documentation(&mut self, draft: DocumentationDraft) -> Option<Documentation> {
        let description = self.required("documentation.description", draft.description);
        if let Some(description) = &description {
            self.char_range(
                "documentation.description",
                description,
                DESCRIPTION_MIN_CHARS,
                DESCRIPTION_MAX_CHARS,
            );
        }
        for (i, param) in draft.parameters.iter().enumerate() {
            if param.name.trim().is_empty() {
                self.push(
                    format!("documentation.parameters[{i}].name"),
                    "must not be empty",
                );
            }
        }
        description.map(|description| Documentation {
            description,
            usage: draft.usage,
            parameters: draft.parameters,
            best_practices: draft.best_practices,
            related: draft.related,
        })
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw.trim()) {
        return Some(t.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const GRID_YAML: &str = r#"
name: CSS Grid System
category: layout
tags: [grid, responsive, layout]
frameworks: [react, vanilla]
principles:
  - Use CSS Grid for two-dimensional layouts
accessibility:
  notes: Keep a logical reading order
  wcag_level: AA
code_examples:
  vanilla: ".grid { display: grid; }"
source:
  url: https://example.com/grid
  extracted: 2024-05-01
"#;

    fn fields(violations: &[Violation]) -> Vec<&str> {
        violations.iter().map(|v| v.field.as_str()).collect()
    }

    #[test]
    fn valid_document_becomes_record() {
        let record = PatternDraft::from_yaml(GRID_YAML)
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(record.category, Category::Layout);
        assert_eq!(record.frameworks, vec![Framework::React, Framework::Vanilla]);
        assert_eq!(
            record.accessibility.as_ref().unwrap().wcag_level,
            Some(WcagLevel::AA)
        );
        assert!(record.code_examples.contains_key(&Framework::Vanilla));
        let source = record.source.unwrap();
        assert_eq!(source.url.unwrap().host_str(), Some("example.com"));
        assert_eq!(
            source.extracted.unwrap().to_rfc3339(),
            "2024-05-01T00:00:00+00:00"
        );
    }

    #[test]
    fn every_violation_is_reported() {
        let draft = PatternDraft {
            name: Some("x".into()),
            category: Some("widgets".into()),
            tags: Some(vec![]),
            frameworks: Some(vec!["react".into(), "angular".into()]),
            principles: None,
            ..Default::default()
        };
        let violations = draft.validate().unwrap_err();
        assert_eq!(
            fields(&violations),
            vec!["name", "category", "tags", "frameworks[1]", "principles"]
        );
        assert!(violations[0].reason.contains("at least 3"));
    }

    #[test]
    fn nested_blocks_are_checked() {
        let yaml = r#"
name: Login Form
category: authentication
tags: [login]
frameworks: [vue]
principles: [Label every input]
accessibility:
  wcag_level: AAAA
code_examples:
  angular: "<form></form>"
source:
  url: not a url
documentation:
  description: short
  parameters:
    - name: ""
      type: string
"#;
        let violations = PatternDraft::from_yaml(yaml).unwrap().validate().unwrap_err();
        assert_eq!(
            fields(&violations),
            vec![
                "accessibility.notes",
                "accessibility.wcag_level",
                "code_examples.angular",
                "source.url",
                "documentation.description",
                "documentation.parameters[0].name",
            ]
        );
    }

    #[test]
    fn name_needs_a_slug() {
        let record = PatternRecord::new("???", Category::Forms, ["form"], [Framework::Vue], ["x"]);
        let violations = record.validate().unwrap_err();
        assert_eq!(fields(&violations), vec!["name"]);
        assert!(violations[0].reason.contains("letter or digit"));
    }

    #[test]
    fn malformed_yaml_is_a_document_violation() {
        let violations = PatternDraft::from_yaml("name: [unterminated").unwrap_err();
        assert_eq!(fields(&violations), vec!["<document>"]);
    }

    #[test]
    fn record_validation_checks_lengths() {
        let record = PatternRecord::new(
            "ab",
            Category::Forms,
            ["form"],
            [Framework::Svelte],
            ["Validate inline"],
        );
        let violations = record.validate().unwrap_err();
        assert_eq!(fields(&violations), vec!["name"]);

        let long = PatternRecord {
            name: "n".repeat(101),
            ..record
        };
        assert!(long.validate().unwrap_err()[0].reason.contains("at most 100"));
    }

    #[test]
    fn sequence_documents_validate_independently() {
        let yaml = r#"
- name: Toast Stack
  category: feedback
  tags: [toast]
  frameworks: [react]
  principles: [Auto-dismiss after a delay]
- name: Broken
  category: feedback
"#;
        let results = parse_pattern_documents(yaml).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        let violations = results[1].as_ref().unwrap_err();
        assert_eq!(fields(violations), vec!["tags", "frameworks", "principles"]);
    }
}
