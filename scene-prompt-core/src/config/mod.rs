//! Configuration handling.
//!
//! - `value`: the closed `ConfigValue` model parsed from TOML
//! - `library`: configuration sources loaded from disk or memory
//! - `overrides`: override paths, lookup and input option listing

/// Configuration value model (`Tag`, `TagList`, `Choice`, `Section`).
pub mod value;

/// Set of named configuration sources.
///
/// Loading failures degrade to empty sources instead of errors.
pub mod library;

/// Caller overrides: the `"random"` sentinel, path lookup and input lists.
pub mod overrides;
