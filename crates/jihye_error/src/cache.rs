//! Timed cache error types.

/// Kinds of cache errors.
///
/// Both are expected, recoverable conditions. The cache never retries on its
/// own; callers decide whether to backfill or fall back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum CacheErrorKind {
    /// No live entry exists for the key
    #[display("No live cache entry for key {}", _0)]
    NotFound(String),
    /// A non-overriding insert collided with a live entry
    #[display("Cache entry already exists for key {}", _0)]
    AlreadyExists(String),
}

/// Cache error with location tracking.
///
/// # Examples
///
/// ```
/// use jihye_error::{CacheError, CacheErrorKind};
///
/// let err = CacheError::new(CacheErrorKind::NotFound("42".to_string()));
/// assert!(err.is_not_found());
/// assert!(format!("{}", err).contains("42"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Cache Error: {} at line {} in {}", kind, line, file)]
pub struct CacheError {
    /// The kind of error that occurred
    pub kind: CacheErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl CacheError {
    /// Create a new cache error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: CacheErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for a [`CacheErrorKind::NotFound`] error.
    #[track_caller]
    pub fn not_found(key: impl std::fmt::Debug) -> Self {
        Self::new(CacheErrorKind::NotFound(format!("{:?}", key)))
    }

    /// Shorthand for a [`CacheErrorKind::AlreadyExists`] error.
    #[track_caller]
    pub fn already_exists(key: impl std::fmt::Debug) -> Self {
        Self::new(CacheErrorKind::AlreadyExists(format!("{:?}", key)))
    }

    /// True when the key had no live entry.
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, CacheErrorKind::NotFound(_))
    }

    /// True when a non-overriding insert hit a live entry.
    pub fn is_already_exists(&self) -> bool {
        matches!(self.kind, CacheErrorKind::AlreadyExists(_))
    }
}

/// Result type for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;
