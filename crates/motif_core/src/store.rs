//! PatternStore trait and the filesystem-backed implementation
//!
//! Every record lives in its own YAML document at
//! `<root>/<category>/<slug>.yaml`. The path relative to the root is the
//! record's id. Validation happens at both edges: nothing invalid is written,
//! and anything that no longer validates on read is rejected.

use std::fmt::{self, Display};
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::pattern::{Category, PatternDraft, PatternRecord};

/// File extension of stored pattern documents
pub const PATTERN_EXTENSION: &str = "yaml";

/// Identifier of a stored pattern: its `/`-separated path relative to the store root
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternId(String);

impl PatternId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id a record will be stored under
    pub fn for_record(record: &PatternRecord) -> Self {
        Self(format!(
            "{}/{}.{}",
            record.category,
            record.slug(),
            PATTERN_EXTENSION
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id sits directly in `category`'s directory, which is
    /// where a category listing looks
    pub fn is_filed_under(&self, category: Category) -> bool {
        self.0
            .split_once('/')
            .is_some_and(|(dir, file)| dir == category.as_str() && !file.contains('/'))
    }
}

impl Display for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PatternId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PatternId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A record together with the id it was loaded from
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPattern {
    pub id: PatternId,
    pub record: PatternRecord,
}

/// Trait for pattern storage operations
///
/// Abstracts over the storage implementation so the index cache and the
/// suggestion engine can run against anything that can list and load records.
#[async_trait]
pub trait PatternStore: Send + Sync + fmt::Debug {
    /// Validate and persist a record, overwriting any record with the same slug
    /// in the same category. Returns the id it was stored under.
    async fn save(&self, record: &PatternRecord) -> Result<PatternId>;

    /// Load and validate a record
    async fn load(&self, id: &PatternId) -> Result<PatternRecord>;

    /// Remove a record. Removing an absent record succeeds.
    async fn delete(&self, id: &PatternId) -> Result<()>;

    /// List stored ids, optionally only those in one category
    async fn list(&self, category: Option<Category>) -> Result<Vec<PatternId>>;

    /// Human-readable location of the store, used in logs and errors
    fn location(&self) -> String;
}

/// Pattern store backed by a directory of YAML documents
#[derive(Debug, Clone)]
pub struct FsPatternStore {
    root: PathBuf,
}

impl FsPatternStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an id to a path under the root, refusing ids that escape it
    pub fn path_for(&self, id: &PatternId) -> Result<PathBuf> {
        let relative = Path::new(id.as_str());
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if id.as_str().is_empty() || escapes {
            return Err(CoreError::InvalidId {
                id: id.to_string(),
                reason: "must be a relative path inside the store".to_string(),
            });
        }
        Ok(self.root.join(relative))
    }

    fn id_for_path(&self, path: &Path) -> Option<PatternId> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<_> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<_>>()?;
        Some(PatternId(parts.join("/")))
    }

    /// Collect pattern documents below `dir`. Missing directories are empty.
    async fn collect(&self, dir: &Path, recursive: bool) -> Result<Vec<PatternId>> {
        let mut ids = Vec::new();
        let mut pending = vec![dir.to_path_buf()];

        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(CoreError::io(&dir, e)),
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| CoreError::io(&dir, e))?
            {
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| CoreError::io(&path, e))?;
                if file_type.is_dir() {
                    if recursive {
                        pending.push(path);
                    }
                } else if is_pattern_document(&path) {
                    if let Some(id) = self.id_for_path(&path) {
                        ids.push(id);
                    }
                }
            }
        }

        ids.sort();
        Ok(ids)
    }
}

fn is_pattern_document(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(PATTERN_EXTENSION)
}

#[async_trait]
impl PatternStore for FsPatternStore {
    async fn save(&self, record: &PatternRecord) -> Result<PatternId> {
        record.validate().map_err(CoreError::validation)?;

        let id = PatternId::for_record(record);
        let path = self.path_for(&id)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CoreError::io(parent, e))?;
        }

        let content = record
            .to_yaml()
            .map_err(|cause| CoreError::SerializationError {
                data_type: "pattern record".to_string(),
                cause,
            })?;
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| CoreError::io(&path, e))?;

        tracing::debug!(id = %id, "saved pattern");
        Ok(id)
    }

    async fn load(&self, id: &PatternId) -> Result<PatternRecord> {
        let path = self.path_for(id)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CoreError::not_found(id.as_str()));
            }
            Err(e) => return Err(CoreError::io(&path, e)),
        };

        PatternDraft::from_yaml(&content)
            .and_then(PatternDraft::validate)
            .map_err(|violations| CoreError::Validation {
                id: Some(id.to_string()),
                violations,
            })
    }

    async fn delete(&self, id: &PatternId) -> Result<()> {
        let path = self.path_for(id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(id = %id, "deleted pattern");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CoreError::io(&path, e)),
        }
    }

    async fn list(&self, category: Option<Category>) -> Result<Vec<PatternId>> {
        match category {
            Some(category) => self.collect(&self.root.join(category.as_str()), false).await,
            None => self.collect(&self.root, true).await,
        }
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }
}

/// Outcome of validating every document in a store
#[derive(Debug, Default)]
pub struct StoreAudit {
    pub valid: Vec<PatternId>,
    pub invalid: Vec<(PatternId, CoreError)>,
}

impl StoreAudit {
    pub fn is_clean(&self) -> bool {
        self.invalid.is_empty()
    }

    pub fn total(&self) -> usize {
        self.valid.len() + self.invalid.len()
    }
}

/// Load every stored document and sort the ids into valid and invalid
pub async fn audit_store(store: &dyn PatternStore) -> Result<StoreAudit> {
    let mut audit = StoreAudit::default();
    for id in store.list(None).await? {
        match store.load(&id).await {
            Ok(_) => audit.valid.push(id),
            Err(e) => audit.invalid.push((id, e)),
        }
    }
    Ok(audit)
}
