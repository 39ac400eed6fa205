//! One handle over a store, its index and the suggestion engine

use std::sync::Arc;

use crate::config::MotifConfig;
use crate::error::Result;
use crate::index::{IndexStats, PatternIndexCache};
use crate::pattern::{Category, PatternRecord};
use crate::quality::{QualityReport, validate_quality};
use crate::search::{SearchOptions, search_patterns};
use crate::store::{FsPatternStore, PatternId, PatternStore, StoreAudit, StoredPattern, audit_store};
use crate::suggest::{PatternSuggestion, SuggestOptions, SuggestionEngine};

/// A pattern store together with the index built over it.
///
/// Writes made through the library invalidate the index. Writes made
/// directly to the store or the filesystem are not seen until
/// [`PatternLibrary::reindex`] or [`PatternIndexCache::invalidate`] is called.
#[derive(Debug, Clone)]
pub struct PatternLibrary {
    store: Arc<dyn PatternStore>,
    cache: Arc<PatternIndexCache>,
    suggestions: SuggestionEngine,
}

impl PatternLibrary {
    pub fn new(store: Arc<dyn PatternStore>, load_concurrency: usize) -> Self {
        let cache = Arc::new(
            PatternIndexCache::new(Arc::clone(&store)).with_load_concurrency(load_concurrency),
        );
        Self {
            store,
            suggestions: SuggestionEngine::new(Arc::clone(&cache)),
            cache,
        }
    }

    /// Open the filesystem store named by `config`
    pub fn from_config(config: &MotifConfig) -> Self {
        let store: Arc<dyn PatternStore> = Arc::new(FsPatternStore::new(&config.store.root));
        Self::new(store, config.index.load_concurrency)
    }

    pub fn store(&self) -> &Arc<dyn PatternStore> {
        &self.store
    }

    pub fn cache(&self) -> &Arc<PatternIndexCache> {
        &self.cache
    }

    pub async fn save(&self, record: &PatternRecord) -> Result<PatternId> {
        let id = self.store.save(record).await?;
        self.cache.invalidate();
        Ok(id)
    }

    pub async fn load(&self, id: &PatternId) -> Result<PatternRecord> {
        self.store.load(id).await
    }

    pub async fn delete(&self, id: &PatternId) -> Result<()> {
        self.store.delete(id).await?;
        self.cache.invalidate();
        Ok(())
    }

    pub async fn list(&self, category: Option<Category>) -> Result<Vec<PatternId>> {
        self.store.list(category).await
    }

    /// Search by reading every candidate document
    pub async fn search(&self, options: &SearchOptions) -> Result<Vec<StoredPattern>> {
        search_patterns(self.store.as_ref(), options).await
    }

    /// Search through the index
    pub async fn search_fast(&self, options: &SearchOptions) -> Result<Vec<PatternId>> {
        Ok(self.cache.search_fast(options).await?)
    }

    pub async fn suggest(&self, options: &SuggestOptions) -> Result<Vec<PatternSuggestion>> {
        self.suggestions.suggest(options).await
    }

    pub async fn quality(&self, id: &PatternId) -> Result<QualityReport> {
        Ok(validate_quality(&self.store.load(id).await?))
    }

    pub async fn audit(&self) -> Result<StoreAudit> {
        audit_store(self.store.as_ref()).await
    }

    /// Rebuild the index from scratch and report on it
    pub async fn reindex(&self) -> Result<IndexStats> {
        Ok(self.cache.build().await?.stats())
    }

    /// Stats for the current index, building it if needed
    pub async fn index_stats(&self) -> Result<IndexStats> {
        Ok(self.cache.get().await?.stats())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Framework;
    use tempfile::TempDir;

    fn library(dir: &TempDir) -> PatternLibrary {
        PatternLibrary::new(Arc::new(FsPatternStore::new(dir.path())), 4)
    }

    fn record(name: &str) -> PatternRecord {
        PatternRecord::new(
            name,
            Category::Feedback,
            ["toast", "alert"],
            [Framework::Svelte],
            ["Auto-dismiss", "Stack newest on top", "Announce politely"],
        )
    }

    #[tokio::test]
    async fn writes_through_the_library_refresh_the_index() {
        let dir = TempDir::new().unwrap();
        let library = library(&dir);
        let by_tag = SearchOptions::new().tag("toast");

        assert!(library.search_fast(&by_tag).await.unwrap().is_empty());

        let id = library.save(&record("Toast Stack")).await.unwrap();
        assert_eq!(library.search_fast(&by_tag).await.unwrap(), vec![id.clone()]);

        library.delete(&id).await.unwrap();
        assert!(library.search_fast(&by_tag).await.unwrap().is_empty());
        assert_eq!(library.cache().builds(), 3);
    }

    #[tokio::test]
    async fn quality_loads_then_grades() {
        let dir = TempDir::new().unwrap();
        let library = library(&dir);
        let id = library.save(&record("Toast Stack")).await.unwrap();

        let report = library.quality(&id).await.unwrap();
        // Only the missing code example is flagged
        assert_eq!(report.score, 90);
        assert_eq!(report.issues[0].field, "code_examples");

        assert!(library.quality(&PatternId::from("feedback/nope.yaml")).await.is_err());
    }

    #[tokio::test]
    async fn reindex_reports_stats() {
        let dir = TempDir::new().unwrap();
        let library = library(&dir);
        library.save(&record("Toast Stack")).await.unwrap();
        library.save(&record("Inline Alert")).await.unwrap();

        let stats = library.reindex().await.unwrap();
        assert_eq!(stats.patterns, 2);
        assert_eq!(stats.tags, 2);
        assert_eq!(library.index_stats().await.unwrap().patterns, 2);
    }
}
