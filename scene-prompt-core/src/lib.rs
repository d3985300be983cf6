//! Weighted, seeded prompt generation library.
//!
//! This crate turns a tree of configuration sources into comma-separated
//! prompts:
//! - Weighted tag lists (`name:weight`) sampled without replacement
//! - Choice nodes with probability, repeat ranges and list indirection
//! - A fixed scene tree (composition, action, subject, environment)
//! - One seed per request, fully reproducible output
//!
//! Start from `model::generator::PromptGenerator`.

/// Configuration values, sources and overrides.
pub mod config;

/// Error type shared by the whole crate.
pub mod error;

/// Tag resolution, components and prompt generation.
pub mod model;

/// I/O utilities (file loading, path helpers).
///
/// Not exposed
pub(crate) mod io;
