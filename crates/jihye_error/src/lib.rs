//! Error types for the Jihye bot.
//!
//! Every error follows the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum names the specific condition
//! - `*Error` struct wraps the kind together with the source location
//! - constructors use `#[track_caller]` so the location is captured automatically
//!
//! # Examples
//!
//! ```
//! use jihye_error::{ConfigError, JihyeResult};
//!
//! fn load() -> JihyeResult<String> {
//!     Err(ConfigError::new("missing [bot] section"))?
//! }
//!
//! assert!(load().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod config;
mod error;
mod settings;

pub use cache::{CacheError, CacheErrorKind, CacheResult};
pub use config::ConfigError;
pub use error::{JihyeError, JihyeErrorKind, JihyeResult};
pub use settings::{SettingsError, SettingsErrorKind};
