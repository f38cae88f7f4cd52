//! Guild settings persistence.
//!
//! The settings store is the source of truth for per-guild configuration
//! (currently the command prefix). The prefix cache sits in front of it and
//! falls back here on a miss.
//!
//! - `SettingsStore` - async trait implemented by storage backends
//! - `MemorySettingsStore` - process-local backend, mostly for tests
//! - `JsonFileSettingsStore` - JSON document on disk mirrored in memory
//! - `SettingsManager` - validation and defaults on top of a store

#![warn(missing_docs)]

mod file;
mod manager;
mod memory;
mod setting;
mod store;

pub use file::JsonFileSettingsStore;
pub use manager::SettingsManager;
pub use memory::MemorySettingsStore;
pub use setting::{GuildSettings, Setting};
pub use store::SettingsStore;
