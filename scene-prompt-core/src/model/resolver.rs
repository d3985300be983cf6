use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::value::{ChoiceNode, ConfigValue, Repeat};
use crate::error::{PromptError, Result};
use crate::model::weighted_set::WeightedSet;

/// Default parameters applied when a choice node does not set its own.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Draw {
	/// Chance that the value contributes anything at all.
	pub probability: f64,
	/// Number of distinct tags to draw.
	pub repeat: Repeat,
}

impl Default for Draw {
	fn default() -> Self {
		Self { probability: 1.0, repeat: Repeat::Count(1) }
	}
}

/// Resolves configuration values into concrete tags.
///
/// A resolver owns the seeded generator of one generation request. Every
/// random decision in the request goes through it, in a fixed order, so the
/// same seed always yields the same tags. `ChaCha8Rng` keeps that sequence
/// stable across platforms and runs.
///
/// A resolver must not be shared between requests: create one per request
/// with `TagResolver::new(seed)` and pass it down by `&mut`.
#[derive(Clone, Debug)]
pub struct TagResolver {
	rng: ChaCha8Rng,
}

impl TagResolver {
	/// Creates a resolver whose generator is seeded with `seed`.
	pub fn new(seed: u64) -> Self {
		Self { rng: ChaCha8Rng::seed_from_u64(seed) }
	}

	/// Resolves `value` with the default draw (probability 1, repeat 1).
	pub fn resolve(&mut self, value: &ConfigValue) -> Result<Vec<String>> {
		self.resolve_with(value, Draw::default())
	}

	/// Resolves `value` into zero or more tags.
	///
	/// # Behavior
	/// - `Tag`: returned as is; the generator is not advanced.
	/// - `TagList`: `defaults.repeat` distinct tags drawn by weight.
	/// - `Choice`: node settings override `defaults`; the `list` selector (if
	///   any) picks which named list to sample, then the node may not fire
	///   depending on its probability.
	///
	/// # Errors
	/// - `PromptError::ConfigShape` for a `Section`, which holds no tags.
	/// - `PromptError::Format` for a malformed `name:weight` entry.
	pub fn resolve_with(&mut self, value: &ConfigValue, defaults: Draw) -> Result<Vec<String>> {
		match value {
			ConfigValue::Tag(tag) => Ok(vec![tag.clone()]),
			ConfigValue::TagList(tags) => {
				let set = WeightedSet::parse(tags)?;
				let count = self.repeat_count(defaults.repeat, set.available());
				Ok(set.sample(count, &mut self.rng))
			}
			ConfigValue::Choice(node) => self.resolve_choice(node, defaults),
			ConfigValue::Section(_) => Err(PromptError::shape(
				"",
				"a section groups entries and cannot be resolved to tags",
			)),
		}
	}

	fn resolve_choice(&mut self, node: &ChoiceNode, defaults: Draw) -> Result<Vec<String>> {
		let probability = node.probability.unwrap_or(defaults.probability);
		let repeat = node.repeat.unwrap_or(defaults.repeat);

		let tags = self.select_list(node)?;
		let set = WeightedSet::parse(tags)?;
		let count = self.repeat_count(repeat, set.available());

		if self.rng.random::<f64>() >= probability {
			log::debug!("choice node skipped (probability {probability})");
			return Ok(Vec::new());
		}

		Ok(set.sample(count, &mut self.rng))
	}

	/// Picks the tag list a choice node samples from.
	///
	/// With a selector, one name is drawn from it (phase 1) and the sibling of
	/// that name is returned (phase 2). Without one, `tags` is used directly.
	fn select_list<'a>(&mut self, node: &'a ChoiceNode) -> Result<&'a [String]> {
		let Some(selector) = &node.selector else {
			return node
				.direct_tags()
				.ok_or_else(|| PromptError::shape("", "choice node has neither `tags` nor `list`"));
		};

		let names = WeightedSet::parse(selector)?;
		let Some(name) = names.sample(1, &mut self.rng).pop() else {
			return Ok(&[]);
		};
		log::debug!("selector picked list `{name}`");

		node.named_list(&name)
			.ok_or_else(|| PromptError::shape(&name, "selected list does not exist on the node"))
	}

	/// Fixes the number of tags to draw from a pool of `available` candidates.
	///
	/// A range draws uniformly in `[min, min(max, available))`; when that
	/// interval is empty, `min` is used. The sampler clamps to the pool size.
	fn repeat_count(&mut self, repeat: Repeat, available: usize) -> usize {
		match repeat {
			Repeat::Count(n) => n,
			Repeat::Range(min, max) => {
				let upper = max.min(available);
				if min < upper {
					self.rng.random_range(min..upper)
				} else {
					min
				}
			}
		}
	}
}

/// Resolves a single value with a fresh generator seeded by `seed`.
///
/// Convenient for one-off resolutions; a full prompt threads one
/// `TagResolver` through every component instead.
pub fn resolve_seeded(value: &ConfigValue, seed: u64, defaults: Draw) -> Result<Vec<String>> {
	TagResolver::new(seed).resolve_with(value, defaults)
}
