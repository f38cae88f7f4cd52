//! Guild settings store error types.

/// Kinds of settings errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum SettingsErrorKind {
    /// No stored settings for the guild
    #[display("No settings stored for guild {}", _0)]
    NotFound(u64),
    /// The named setting does not exist
    #[display("Unknown setting: {}", _0)]
    InvalidSetting(String),
    /// The value is not acceptable for the setting
    #[display("Invalid setting value: {}", _0)]
    InvalidValue(String),
    /// The backing store could not be read or written
    #[display("Settings store unavailable: {}", _0)]
    Unavailable(String),
    /// Stored data could not be encoded or decoded
    #[display("Settings serialization failed: {}", _0)]
    Serialization(String),
}

/// Settings error with location tracking.
///
/// # Examples
///
/// ```
/// use jihye_error::{SettingsError, SettingsErrorKind};
///
/// let err = SettingsError::new(SettingsErrorKind::InvalidSetting("colour".to_string()));
/// assert!(format!("{}", err).contains("colour"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Settings Error: {} at line {} in {}", kind, line, file)]
pub struct SettingsError {
    /// The kind of error that occurred
    pub kind: SettingsErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl SettingsError {
    /// Create a new settings error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: SettingsErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
