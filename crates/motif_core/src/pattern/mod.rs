//! Pattern records: the validated unit of the library
//!
//! A [`PatternRecord`] only exists after passing validation. Raw documents are
//! read into a loosely typed [`PatternDraft`] first and turned into a record
//! through [`PatternDraft::validate`], which reports every field-level problem
//! at once instead of stopping at the first one.

mod validate;

use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

pub use validate::*;

/// Pattern categories
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, JsonSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Layout,
    Forms,
    Navigation,
    MicroInteractions,
    DataDisplay,
    Feedback,
    Authentication,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Layout,
        Category::Forms,
        Category::Navigation,
        Category::MicroInteractions,
        Category::DataDisplay,
        Category::Feedback,
        Category::Authentication,
    ];

    /// Name used on disk and in queries
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Layout => "layout",
            Category::Forms => "forms",
            Category::Navigation => "navigation",
            Category::MicroInteractions => "micro-interactions",
            Category::DataDisplay => "data-display",
            Category::Feedback => "feedback",
            Category::Authentication => "authentication",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "unknown category '{}', expected one of: {}",
                    s,
                    join_names(Category::ALL.iter().map(Category::as_str))
                )
            })
    }
}

/// Frameworks a pattern can target
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    React,
    Vue,
    Svelte,
    Vanilla,
}

impl Framework {
    pub const ALL: [Framework; 4] = [
        Framework::React,
        Framework::Vue,
        Framework::Svelte,
        Framework::Vanilla,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Framework::React => "react",
            Framework::Vue => "vue",
            Framework::Svelte => "svelte",
            Framework::Vanilla => "vanilla",
        }
    }
}

impl Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Framework {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Framework::ALL
            .into_iter()
            .find(|f| f.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "unknown framework '{}', expected one of: {}",
                    s,
                    join_names(Framework::ALL.iter().map(Framework::as_str))
                )
            })
    }
}

/// WCAG conformance levels
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, JsonSchema,
)]
pub enum WcagLevel {
    A,
    AA,
    AAA,
}

impl WcagLevel {
    pub const ALL: [WcagLevel; 3] = [WcagLevel::A, WcagLevel::AA, WcagLevel::AAA];

    pub fn as_str(&self) -> &'static str {
        match self {
            WcagLevel::A => "A",
            WcagLevel::AA => "AA",
            WcagLevel::AAA => "AAA",
        }
    }
}

impl Display for WcagLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WcagLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();
        WcagLevel::ALL
            .into_iter()
            .find(|l| l.as_str() == normalized)
            .ok_or_else(|| format!("unknown WCAG level '{}', expected one of: A, AA, AAA", s))
    }
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}

/// Accessibility notes for a pattern
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Accessibility {
    pub notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wcag_level: Option<WcagLevel>,
}

/// Where a pattern was extracted from
#[derive(Debug, Clone, PartialEq, Default, Serialize, JsonSchema)]
pub struct Source {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted: Option<DateTime<Utc>>,
}

/// A configurable parameter of a documented pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// Long-form documentation attached to a pattern
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Documentation {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub best_practices: Vec<String>,
    /// Names or ids of related patterns
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<String>,
}

/// A validated design pattern
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct PatternRecord {
    pub name: String,
    pub category: Category,
    pub tags: Vec<String>,
    pub frameworks: Vec<Framework>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessibility: Option<Accessibility>,
    pub principles: Vec<String>,
    /// Framework-specific code; an empty map means no examples
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub code_examples: BTreeMap<Framework, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<Documentation>,
}

impl PatternRecord {
    /// Start a record with the required fields. Call [`PatternRecord::validate`]
    /// (or save it through a store) before trusting it.
    pub fn new(
        name: impl Into<String>,
        category: Category,
        tags: impl IntoIterator<Item = impl Into<String>>,
        frameworks: impl IntoIterator<Item = Framework>,
        principles: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            tags: tags.into_iter().map(Into::into).collect(),
            frameworks: frameworks.into_iter().collect(),
            accessibility: None,
            principles: principles.into_iter().map(Into::into).collect(),
            code_examples: BTreeMap::new(),
            source: None,
            documentation: None,
        }
    }

    pub fn with_code_example(mut self, framework: Framework, code: impl Into<String>) -> Self {
        self.code_examples.insert(framework, code.into());
        self
    }

    pub fn with_accessibility(mut self, notes: impl Into<String>, level: Option<WcagLevel>) -> Self {
        self.accessibility = Some(Accessibility {
            notes: notes.into(),
            wcag_level: level,
        });
        self
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_documentation(mut self, documentation: Documentation) -> Self {
        self.documentation = Some(documentation);
        self
    }

    /// Run the schema checks against this record
    pub fn validate(&self) -> Result<(), Vec<Violation>> {
        PatternDraft::from(self).validate().map(|_| ())
    }

    /// Filesystem-safe identifier derived from the name
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }

    /// Case-insensitive exact tag match
    pub fn has_tag(&self, tag: &str) -> bool {
        let tag = tag.to_lowercase();
        self.tags.iter().any(|t| t.to_lowercase() == tag)
    }

    pub fn supports(&self, framework: Framework) -> bool {
        self.frameworks.contains(&framework)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// Lowercase the name, collapse every run of characters outside `[a-z0-9]`
/// into one hyphen, and trim hyphens from both ends.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;
    for c in name.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }
    slug
}
