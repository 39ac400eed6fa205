//! Motif Core - design pattern knowledge base
//!
//! This crate provides the validated pattern record, a durable YAML store,
//! linear and indexed search, context-aware suggestions and a quality gate
//! that grades records for completeness.

pub mod config;
pub mod context;
pub mod error;
pub mod index;
pub mod library;
pub mod pattern;
pub mod quality;
pub mod search;
pub mod store;
pub mod suggest;

pub use config::{MotifConfig, load_config, load_config_from_standard_locations, save_config};
pub use context::{TaskContext, analyze_task_context, extract_categories};
pub use error::{CoreError, IndexBuildError, Result};
pub use index::{IndexStats, PatternIndex, PatternIndexCache, PatternMetadata};
pub use library::PatternLibrary;
pub use pattern::{
    Category, Framework, PatternDraft, PatternRecord, Violation, WcagLevel,
    parse_pattern_documents,
};
pub use quality::{QualityIssue, QualityLevel, QualityReport, Severity, validate_quality};
pub use search::{SearchOptions, search_patterns};
pub use store::{FsPatternStore, PatternId, PatternStore, StoreAudit, StoredPattern, audit_store};
pub use suggest::{PatternSuggestion, SuggestOptions, SuggestionEngine};
