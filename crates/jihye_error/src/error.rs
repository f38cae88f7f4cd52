//! Top-level error wrapper types.

use crate::{CacheError, ConfigError, SettingsError};

/// Every error a Jihye crate can surface.
///
/// # Examples
///
/// ```
/// use jihye_error::{CacheError, JihyeError};
///
/// let err: JihyeError = CacheError::not_found(7u64).into();
/// assert!(format!("{}", err).contains("Cache Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum JihyeErrorKind {
    /// Timed cache error
    #[from(CacheError)]
    Cache(CacheError),
    /// Guild settings error
    #[from(SettingsError)]
    Settings(SettingsError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
}

/// Jihye error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Jihye Error: {}", _0)]
pub struct JihyeError(Box<JihyeErrorKind>);

impl JihyeError {
    /// Create a new error from a kind.
    pub fn new(kind: JihyeErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &JihyeErrorKind {
        &self.0
    }

    /// The settings error, if this is one.
    pub fn as_settings(&self) -> Option<&SettingsError> {
        match self.kind() {
            JihyeErrorKind::Settings(e) => Some(e),
            _ => None,
        }
    }
}

impl<T> From<T> for JihyeError
where
    T: Into<JihyeErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Jihye operations.
pub type JihyeResult<T> = std::result::Result<T, JihyeError>;
