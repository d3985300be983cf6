use rand::Rng;

use crate::error::{PromptError, Result};

/// Weight given to an entry without a `:weight` suffix.
const DEFAULT_WEIGHT: f64 = 1.0;

/// A parsed tag list: candidate names and their normalized probabilities.
///
/// Built from raw entries such as `["red:2", "blue"]`, which gives
/// `names = ["red", "blue"]` and `weights = [2/3, 1/3]`.
///
/// ## Invariants
/// - `names` and `weights` have the same length and keep the input order
/// - Weights are finite and non-negative
/// - Weights sum to 1, unless every weight is zero (then all stay zero)
/// - Duplicate names are kept as separate candidates
#[derive(Clone, Debug, PartialEq)]
pub struct WeightedSet {
	names: Vec<String>,
	weights: Vec<f64>,
}

impl WeightedSet {
	/// Parses raw tag entries into a weighted set.
	///
	/// An entry containing exactly one `:` is weighted: the part after the
	/// colon must be a non-negative real. Entries with no colon, or with
	/// several colons, are plain tags of weight 1.
	///
	/// # Errors
	/// Returns `PromptError::Format` if a weight does not parse, is negative
	/// or is not finite.
	pub fn parse<S: AsRef<str>>(entries: &[S]) -> Result<Self> {
		let mut names = Vec::with_capacity(entries.len());
		let mut raw_weights = Vec::with_capacity(entries.len());

		for entry in entries {
			let (name, weight) = Self::parse_entry(entry.as_ref())?;
			names.push(name.to_owned());
			raw_weights.push(weight);
		}

		let total: f64 = raw_weights.iter().sum();
		let weights = if total > 0.0 {
			raw_weights.iter().map(|w| w / total).collect()
		} else {
			raw_weights
		};

		Ok(Self { names, weights })
	}

	/// Splits a single entry into its name and raw weight.
	pub(crate) fn parse_entry(entry: &str) -> Result<(&str, f64)> {
		let (name, weight) = match entry.split_once(':') {
			Some((name, weight)) if !weight.contains(':') => (name, weight),
			_ => return Ok((entry, DEFAULT_WEIGHT)),
		};

		let weight: f64 = weight
			.trim()
			.parse()
			.map_err(|e| PromptError::format(entry, format!("{e}")))?;

		if !weight.is_finite() {
			return Err(PromptError::format(entry, "weight must be finite"));
		}
		if weight < 0.0 {
			return Err(PromptError::format(entry, "weight must not be negative"));
		}

		Ok((name.trim_end(), weight))
	}

	/// Returns the candidate names, in input order.
	pub fn names(&self) -> &[String] {
		&self.names
	}

	/// Returns the normalized weights, aligned with `names`.
	pub fn weights(&self) -> &[f64] {
		&self.weights
	}

	/// Number of candidates that can actually be drawn (non-zero weight).
	pub fn available(&self) -> usize {
		self.weights.iter().filter(|w| **w > 0.0).count()
	}

	pub fn is_empty(&self) -> bool {
		self.names.is_empty()
	}

	/// Draws up to `count` distinct candidates without replacement.
	///
	/// Each draw picks one remaining candidate proportionally to its weight,
	/// then removes it from the pool. If fewer than `count` candidates have a
	/// non-zero weight, the result is clamped to the pool size.
	///
	/// The draw order is fully determined by `rng`: the same generator state
	/// always yields the same names in the same order.
	pub fn sample<R: Rng>(&self, count: usize, rng: &mut R) -> Vec<String> {
		let mut pool: Vec<(usize, f64)> = self
			.weights
			.iter()
			.copied()
			.enumerate()
			.filter(|(_, w)| *w > 0.0)
			.collect();

		let count = count.min(pool.len());
		let mut selected = Vec::with_capacity(count);

		for _ in 0..count {
			let total: f64 = pool.iter().map(|(_, w)| w).sum();
			let mut r = rng.random::<f64>() * total;

			// Fallback to the last candidate absorbs floating point residue
			let mut picked = pool.len() - 1;
			for (position, (_, weight)) in pool.iter().enumerate() {
				if r < *weight {
					picked = position;
					break;
				}
				r -= weight;
			}

			let (index, _) = pool.remove(picked);
			selected.push(self.names[index].clone());
		}

		selected
	}
}
