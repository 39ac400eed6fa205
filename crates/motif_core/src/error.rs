use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::pattern::Violation;

/// Configuration-specific errors
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(String),

    #[error("Invalid value for field {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Failure of an index build as a whole.
///
/// Per-record problems never end up here; they are logged and skipped. This
/// is cloneable because every caller waiting on the same build receives it.
#[derive(Error, Diagnostic, Debug, Clone)]
pub enum IndexBuildError {
    #[error("Failed to enumerate patterns under {root}: {cause}")]
    #[diagnostic(
        code(motif_core::index_enumerate),
        help("Check that the pattern store root exists and is readable")
    )]
    Enumerate { root: String, cause: String },
}

#[derive(Error, Diagnostic, Debug)]
pub enum CoreError {
    #[error("Pattern failed validation: {}", format_violations(.violations))]
    #[diagnostic(
        code(motif_core::validation),
        help("Fix the listed fields and try again")
    )]
    Validation {
        /// Store id of the offending document, when it came from disk
        id: Option<String>,
        violations: Vec<Violation>,
    },

    #[error("Pattern not found: {id}")]
    #[diagnostic(
        code(motif_core::not_found),
        help("Use `motif list` to see the stored pattern ids")
    )]
    NotFound { id: String },

    #[error("Invalid pattern id '{id}': {reason}")]
    #[diagnostic(
        code(motif_core::invalid_id),
        help("Pattern ids are paths relative to the store root, e.g. layout/css-grid-system.yaml")
    )]
    InvalidId { id: String, reason: String },

    #[error("IO error on {}", path.display())]
    #[diagnostic(code(motif_core::io))]
    Io {
        path: PathBuf,
        #[source]
        cause: std::io::Error,
    },

    #[error("Serialization error")]
    #[diagnostic(
        code(motif_core::serialization_error),
        help("Failed to serialize/deserialize {data_type}")
    )]
    SerializationError {
        data_type: String,
        #[source]
        cause: serde_yaml::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    IndexBuild(#[from] IndexBuildError),

    #[error("Configuration error for field '{field}'")]
    #[diagnostic(
        code(motif_core::configuration_error),
        help("Check configuration file at {config_path}\nExpected: {expected}")
    )]
    ConfigurationError {
        config_path: String,
        field: String,
        expected: String,
        #[source]
        cause: ConfigError,
    },
}

impl CoreError {
    pub fn validation(violations: Vec<Violation>) -> Self {
        Self::Validation {
            id: None,
            violations,
        }
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn io(path: impl Into<PathBuf>, cause: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            cause,
        }
    }

    /// Violations carried by a validation error, empty for every other kind
    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::Validation { violations, .. } => violations,
            _ => &[],
        }
    }
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, CoreError>;
