//! Shared error type across spanstats crates.

use thiserror::Error;

/// Stable error codes (used in logs and by tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// A measure with the same name already exists.
    DuplicateMeasure,
    /// A different view with the same name already exists.
    DuplicateView,
    /// Aggregation definition rejected (bad boundaries).
    InvalidAggregation,
    /// Tag key rejected.
    InvalidTag,
    /// Required configuration is absent.
    MissingConfig,
    /// Configuration present but invalid.
    BadConfig,
    /// An export sink could not be set up.
    ExporterInit,
    /// The database collaborator failed.
    Database,
    /// A blocking wait was interrupted.
    Interrupted,
    /// Anything else.
    Internal,
}

impl ErrorCode {
    /// String representation used in structured logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::DuplicateMeasure => "DUPLICATE_MEASURE",
            ErrorCode::DuplicateView => "DUPLICATE_VIEW",
            ErrorCode::InvalidAggregation => "INVALID_AGGREGATION",
            ErrorCode::InvalidTag => "INVALID_TAG",
            ErrorCode::MissingConfig => "MISSING_CONFIG",
            ErrorCode::BadConfig => "BAD_CONFIG",
            ErrorCode::ExporterInit => "EXPORTER_INIT",
            ErrorCode::Database => "DATABASE",
            ErrorCode::Interrupted => "INTERRUPTED",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Failure classes reported by the database collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbErrorKind {
    AlreadyExists,
    NotFound,
    InvalidArgument,
    Unavailable,
}

impl DbErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DbErrorKind::AlreadyExists => "ALREADY_EXISTS",
            DbErrorKind::NotFound => "NOT_FOUND",
            DbErrorKind::InvalidArgument => "INVALID_ARGUMENT",
            DbErrorKind::Unavailable => "UNAVAILABLE",
        }
    }
}

impl std::fmt::Display for DbErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, StatsError>;

/// Unified error type used by core and agent.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("measure already defined: {0}")]
    DuplicateMeasure(String),
    #[error("view already registered with a different definition: {0}")]
    DuplicateView(String),
    #[error("invalid aggregation: {0}")]
    InvalidAggregation(String),
    #[error("invalid tag: {0}")]
    InvalidTag(String),
    #[error("missing config: {0}")]
    MissingConfig(String),
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("exporter init failed: {0}")]
    ExporterInit(String),
    #[error("database {kind}: {message}")]
    Database { kind: DbErrorKind, message: String },
    #[error("interrupted while waiting")]
    Interrupted,
    #[error("internal: {0}")]
    Internal(String),
}

impl StatsError {
    /// Shorthand for a database failure.
    pub fn db(kind: DbErrorKind, message: impl Into<String>) -> Self {
        StatsError::Database {
            kind,
            message: message.into(),
        }
    }

    /// Map to a stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            StatsError::DuplicateMeasure(_) => ErrorCode::DuplicateMeasure,
            StatsError::DuplicateView(_) => ErrorCode::DuplicateView,
            StatsError::InvalidAggregation(_) => ErrorCode::InvalidAggregation,
            StatsError::InvalidTag(_) => ErrorCode::InvalidTag,
            StatsError::MissingConfig(_) => ErrorCode::MissingConfig,
            StatsError::BadConfig(_) => ErrorCode::BadConfig,
            StatsError::ExporterInit(_) => ErrorCode::ExporterInit,
            StatsError::Database { .. } => ErrorCode::Database,
            StatsError::Interrupted => ErrorCode::Interrupted,
            StatsError::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Underlying database failure class, if this is a database error.
    pub fn db_kind(&self) -> Option<DbErrorKind> {
        match self {
            StatsError::Database { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Configuration and exporter errors abort startup; nothing else does.
    pub fn is_startup_fatal(&self) -> bool {
        matches!(
            self,
            StatsError::MissingConfig(_) | StatsError::BadConfig(_) | StatsError::ExporterInit(_)
        )
    }
}
