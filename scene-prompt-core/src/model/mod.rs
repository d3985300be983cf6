//! Top-level module for prompt generation.
//!
//! - Weighted tag sets (`WeightedSet`)
//! - Seeded resolution of configuration values (`TagResolver`)
//! - The component tree (`Component`)
//! - Prompt serialization (`stringify`)
//! - A high-level generation interface (`PromptGenerator`)

/// High-level interface: shared configuration, one scene per request.
pub mod generator;

/// Components of the scene tree and the action variants.
pub mod component;

/// Seeded resolution of configuration values into tags.
///
/// Handles probability gating, repeat counts and `list` indirection.
pub mod resolver;

/// Parsing of `name:weight` entries and weighted sampling without replacement.
pub mod weighted_set;

/// Joins resolved tags into a normalized prompt string.
pub mod serializer;
