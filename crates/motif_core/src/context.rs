//! Turning free-form task descriptions into categories and keywords

use crate::pattern::{Category, Framework};

/// Tokens no longer than this are ignored
const MIN_TOKEN_CHARS: usize = 3;

/// Categories a known keyword points at
fn keyword_categories(token: &str) -> &'static [Category] {
    use Category::*;
    match token {
        "form" | "input" | "select" | "checkbox" | "radio" | "textarea" | "validation"
        | "submit" | "field" | "label" => &[Forms],
        "nav" | "navbar" | "menu" | "breadcrumb" | "sidebar" | "header" | "footer" | "tabs"
        | "link" | "pagination" => &[Navigation],
        "grid" | "flex" | "container" | "section" | "hero" | "column" | "row" | "responsive"
        | "layout" | "spacing" => &[Layout],
        "table" | "list" | "stat" | "chart" | "badge" | "avatar" | "data" => &[DataDisplay],
        "card" => &[DataDisplay, Layout],
        "loading" | "spinner" | "skeleton" | "toast" | "alert" | "notification" | "progress"
        | "error" | "success" | "message" => &[Feedback],
        "hover" | "transition" | "animation" | "click" | "ripple" | "effect" | "animate"
        | "motion" => &[MicroInteractions],
        "login" | "signup" | "register" | "password" => &[Authentication, Forms],
        "auth" | "signin" | "oauth" => &[Authentication],
        _ => &[],
    }
}

/// What a task description is asking for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskContext {
    /// Categories in the order their first keyword appeared
    pub categories: Vec<Category>,
    /// Tokens that hit the keyword table, in text order with repeats
    pub keywords: Vec<String>,
    pub framework: Option<Framework>,
}

impl TaskContext {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Lowercase `text` and split it into word tokens longer than two characters
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
        .map(str::to_owned)
        .collect()
}

/// Categories mentioned by `text`, de-duplicated in first-seen order
pub fn extract_categories(text: &str) -> Vec<Category> {
    analyze_task_context(text, None).categories
}

/// Build a [`TaskContext`] from a description.
///
/// The framework is never guessed from the text; it only comes from the
/// caller.
pub fn analyze_task_context(text: &str, framework: Option<Framework>) -> TaskContext {
    let mut context = TaskContext {
        framework,
        ..TaskContext::default()
    };

    for token in tokenize(text) {
        let categories = keyword_categories(&token);
        if categories.is_empty() {
            continue;
        }
        for category in categories {
            if !context.categories.contains(category) {
                context.categories.push(*category);
            }
        }
        // Repeats count once per occurrence when scoring
        context.keywords.push(token);
    }

    tracing::debug!(
        categories = ?context.categories,
        keywords = ?context.keywords,
        "Analyzed task context"
    );
    context
}
