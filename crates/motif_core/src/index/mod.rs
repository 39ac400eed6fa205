//! Multi-key in-memory index over a pattern store
//!
//! A [`PatternIndex`] is built in one pass from the store and never changes
//! afterwards. [`PatternIndexCache`] owns the current index and makes sure
//! only one build runs at a time.

mod cache;

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use futures::{StreamExt, stream};

pub use cache::{DEFAULT_LOAD_CONCURRENCY, PatternIndexCache};

use crate::error::IndexBuildError;
use crate::pattern::{Category, Framework, PatternRecord};
use crate::search::SearchOptions;
use crate::store::{PatternId, PatternStore};

/// The slice of a record the index keeps in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMetadata {
    pub id: PatternId,
    pub name: String,
    pub category: Category,
    pub tags: Vec<String>,
    pub frameworks: Vec<Framework>,
}

impl PatternMetadata {
    pub fn from_record(id: PatternId, record: &PatternRecord) -> Self {
        Self {
            id,
            name: record.name.clone(),
            category: record.category,
            tags: record.tags.clone(),
            frameworks: record.frameworks.clone(),
        }
    }

    pub fn supports(&self, framework: Framework) -> bool {
        self.frameworks.contains(&framework)
    }
}

/// Lookup tables built from every valid record in a store
#[derive(Debug, Clone, Default)]
pub struct PatternIndex {
    pub by_id: HashMap<PatternId, PatternMetadata>,
    /// Keyed by lowercased tag
    pub by_tag: HashMap<String, HashSet<PatternId>>,
    pub by_category: HashMap<Category, HashSet<PatternId>>,
    pub by_framework: HashMap<Framework, HashSet<PatternId>>,
    /// Wall-clock time the build took
    pub build_time: Duration,
    /// Documents that failed to load or validate and were left out
    pub skipped: usize,
}

/// Counts describing an index, for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStats {
    pub patterns: usize,
    pub tags: usize,
    pub categories: usize,
    pub frameworks: usize,
    pub skipped: usize,
    pub build_time: Duration,
}

impl PatternIndex {
    /// Build an index from every document in `store`.
    ///
    /// Documents are loaded concurrently, at most `load_concurrency` at a time.
    /// A document that fails to load or validate is logged and skipped; only
    /// failing to enumerate the store fails the build.
    pub async fn build(
        store: &dyn PatternStore,
        load_concurrency: usize,
    ) -> Result<Self, IndexBuildError> {
        let started = Instant::now();

        let ids = store
            .list(None)
            .await
            .map_err(|e| IndexBuildError::Enumerate {
                root: store.location(),
                cause: e.to_string(),
            })?;

        let mut loads = stream::iter(ids)
            .map(|id| async move {
                let result = store.load(&id).await;
                (id, result)
            })
            .buffer_unordered(load_concurrency.max(1));

        let mut index = PatternIndex::default();
        while let Some((id, result)) = loads.next().await {
            match result {
                Ok(record) => index.insert(id, &record),
                Err(e) => {
                    tracing::warn!(id = %id, error = %e, "Skipping pattern that failed to index");
                    index.skipped += 1;
                }
            }
        }

        index.build_time = started.elapsed();
        tracing::info!(
            patterns = index.by_id.len(),
            skipped = index.skipped,
            build_ms = index.build_time.as_secs_f64() * 1000.0,
            "Built pattern index from {}",
            store.location()
        );
        Ok(index)
    }

    fn insert(&mut self, id: PatternId, record: &PatternRecord) {
        for tag in &record.tags {
            self.by_tag
                .entry(tag.to_lowercase())
                .or_default()
                .insert(id.clone());
        }
        // Category lookups only see documents a category listing would find
        if id.is_filed_under(record.category) {
            self.by_category
                .entry(record.category)
                .or_default()
                .insert(id.clone());
        }
        for framework in &record.frameworks {
            self.by_framework
                .entry(*framework)
                .or_default()
                .insert(id.clone());
        }
        self.by_id
            .insert(id.clone(), PatternMetadata::from_record(id, record));
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn get(&self, id: &PatternId) -> Option<&PatternMetadata> {
        self.by_id.get(id)
    }

    /// Ids matching every filter in `options`, sorted.
    ///
    /// Returns the same ids as [`crate::search::search_patterns`] would for a
    /// store holding the same valid records.
    pub fn search(&self, options: &SearchOptions) -> Vec<PatternId> {
        let mut narrowed: Option<HashSet<&PatternId>> = None;

        for tag in &options.tags {
            if !narrow(&mut narrowed, self.by_tag.get(&tag.to_lowercase())) {
                return Vec::new();
            }
        }
        if let Some(category) = options.category {
            if !narrow(&mut narrowed, self.by_category.get(&category)) {
                return Vec::new();
            }
        }
        if let Some(framework) = options.framework {
            if !narrow(&mut narrowed, self.by_framework.get(&framework)) {
                return Vec::new();
            }
        }

        let mut ids: Vec<PatternId> = match narrowed {
            Some(ids) => ids.into_iter().cloned().collect(),
            None => self.by_id.keys().cloned().collect(),
        };
        ids.sort();
        ids
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            patterns: self.by_id.len(),
            tags: self.by_tag.len(),
            categories: self.by_category.len(),
            frameworks: self.by_framework.len(),
            skipped: self.skipped,
            build_time: self.build_time,
        }
    }
}

/// Intersect the running result with `next`. Returns false once nothing is left.
fn narrow<'a>(
    narrowed: &mut Option<HashSet<&'a PatternId>>,
    next: Option<&'a HashSet<PatternId>>,
) -> bool {
    let Some(next) = next else {
        *narrowed = Some(HashSet::new());
        return false;
    };
    let result: HashSet<&PatternId> = match narrowed.take() {
        None => next.iter().collect(),
        Some(current) => current.into_iter().filter(|id| next.contains(*id)).collect(),
    };
    let non_empty = !result.is_empty();
    *narrowed = Some(result);
    non_empty
}
