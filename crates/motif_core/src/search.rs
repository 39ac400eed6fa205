//! Unindexed search over a pattern store
//!
//! Every query lists and loads records directly. This is slow but simple, and
//! it defines what the indexed search in [`crate::index`] must return.

use futures::{StreamExt, TryStreamExt, stream};

use crate::error::{CoreError, Result};
use crate::pattern::{Category, Framework};
use crate::store::{PatternId, PatternStore, StoredPattern};

/// How many documents a linear query reads at once
const LINEAR_LOAD_CONCURRENCY: usize = 16;

/// Filters for a pattern search. All given filters must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Every tag must be present on the record (case-insensitive)
    pub tags: Vec<String>,
    pub category: Option<Category>,
    pub framework: Option<Framework>,
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a tag
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Require all of these tags
    pub fn tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn framework(mut self, framework: Framework) -> Self {
        self.framework = Some(framework);
        self
    }

    pub fn is_unfiltered(&self) -> bool {
        self.tags.is_empty() && self.category.is_none() && self.framework.is_none()
    }
}

async fn load_all(store: &dyn PatternStore, ids: Vec<PatternId>) -> Result<Vec<StoredPattern>> {
    stream::iter(ids)
        .map(|id| async move {
            let record = store.load(&id).await?;
            Ok::<_, CoreError>(StoredPattern { id, record })
        })
        .buffered(LINEAR_LOAD_CONCURRENCY)
        .try_collect()
        .await
}

fn has_all_tags(pattern: &StoredPattern, tags: &[String]) -> bool {
    tags.iter().all(|tag| pattern.record.has_tag(tag))
}

/// Patterns carrying every one of `tags`
pub async fn search_by_tags(store: &dyn PatternStore, tags: &[String]) -> Result<Vec<StoredPattern>> {
    let patterns = load_all(store, store.list(None).await?).await?;
    Ok(patterns
        .into_iter()
        .filter(|p| has_all_tags(p, tags))
        .collect())
}

/// Patterns stored under, and declaring, `category`
pub async fn filter_by_category(
    store: &dyn PatternStore,
    category: Category,
) -> Result<Vec<StoredPattern>> {
    let patterns = load_all(store, store.list(Some(category)).await?).await?;
    Ok(patterns
        .into_iter()
        .filter(|p| p.record.category == category)
        .collect())
}

/// Patterns that support `framework`
pub async fn filter_by_framework(
    store: &dyn PatternStore,
    framework: Framework,
) -> Result<Vec<StoredPattern>> {
    let patterns = load_all(store, store.list(None).await?).await?;
    Ok(patterns
        .into_iter()
        .filter(|p| p.record.supports(framework))
        .collect())
}

/// Combined search; records must satisfy every filter in `options`
pub async fn search_patterns(
    store: &dyn PatternStore,
    options: &SearchOptions,
) -> Result<Vec<StoredPattern>> {
    // Listing a single category first keeps unrelated documents unread
    let ids = store.list(options.category).await?;
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let patterns = load_all(store, ids).await?;
    Ok(patterns
        .into_iter()
        .filter(|p| options.category.map_or(true, |c| p.record.category == c))
        .filter(|p| has_all_tags(p, &options.tags))
        .filter(|p| options.framework.map_or(true, |f| p.record.supports(f)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::PatternRecord;
    use crate::store::FsPatternStore;
    use tempfile::TempDir;

    async fn seeded() -> (TempDir, FsPatternStore) {
        let dir = TempDir::new().unwrap();
        let store = FsPatternStore::new(dir.path());
        let records = [
            PatternRecord::new(
                "Card Grid",
                Category::Layout,
                ["Grid", "responsive"],
                [Framework::React, Framework::Vue],
                ["Equal gutters"],
            ),
            PatternRecord::new(
                "Sidebar Layout",
                Category::Layout,
                ["grid"],
                [Framework::Svelte],
                ["Collapse on mobile"],
            ),
            PatternRecord::new(
                "Hover Lift",
                Category::MicroInteractions,
                ["hover", "animation"],
                [Framework::Vanilla],
                ["Keep motion subtle"],
            ),
        ];
        for record in &records {
            store.save(record).await.unwrap();
        }
        (dir, store)
    }

    fn names(patterns: &[StoredPattern]) -> Vec<&str> {
        let mut names: Vec<_> = patterns.iter().map(|p| p.record.name.as_str()).collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn tags_use_and_semantics() {
        let (_dir, store) = seeded().await;
        let both = search_by_tags(&store, &["grid".into(), "responsive".into()])
            .await
            .unwrap();
        assert_eq!(names(&both), vec!["Card Grid"]);

        let one = search_by_tags(&store, &["GRID".into()]).await.unwrap();
        assert_eq!(names(&one), vec!["Card Grid", "Sidebar Layout"]);

        let none = search_by_tags(&store, &["gri".into()]).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn category_and_framework_filters() {
        let (_dir, store) = seeded().await;
        let layout = filter_by_category(&store, Category::Layout).await.unwrap();
        assert_eq!(names(&layout), vec!["Card Grid", "Sidebar Layout"]);

        let vue = filter_by_framework(&store, Framework::Vue).await.unwrap();
        assert_eq!(names(&vue), vec!["Card Grid"]);
    }

    #[tokio::test]
    async fn combined_search_intersects_filters() {
        let (_dir, store) = seeded().await;
        let options = SearchOptions::new()
            .tag("grid")
            .category(Category::Layout)
            .framework(Framework::Svelte);
        let found = search_patterns(&store, &options).await.unwrap();
        assert_eq!(names(&found), vec!["Sidebar Layout"]);

        let empty_category = SearchOptions::new().category(Category::Authentication);
        assert!(search_patterns(&store, &empty_category).await.unwrap().is_empty());

        let everything = search_patterns(&store, &SearchOptions::new()).await.unwrap();
        assert_eq!(everything.len(), 3);
    }
}
