use std::collections::BTreeMap;

use crate::error::{PromptError, Result};
use crate::model::weighted_set::WeightedSet;

/// Reserved keys that turn a TOML table into a choice node.
pub(crate) const PROBABILITY_KEY: &str = "probability";
pub(crate) const REPEAT_KEY: &str = "repeat";
pub(crate) const TAGS_KEY: &str = "tags";
pub(crate) const LIST_KEY: &str = "list";

/// A table of named configuration values (a component subtree, or a grouping
/// section inside one).
pub type ConfigTable = BTreeMap<String, ConfigValue>;

/// A configuration value, classified once when the TOML is parsed.
///
/// # Variants
/// - `Tag`: an atomic string, resolved verbatim.
/// - `TagList`: candidate tags, each optionally `name:weight`.
/// - `Choice`: a table carrying `probability`, `repeat`, `tags` and/or `list`.
/// - `Section`: a table with none of those keys; only a container for
///   other values, never resolved directly.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigValue {
	Tag(String),
	TagList(Vec<String>),
	Choice(ChoiceNode),
	Section(ConfigTable),
}

/// How many tags a choice node draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Repeat {
	/// Exactly this many (clamped to the pool size).
	Count(usize),
	/// A count drawn in `[min, max)`, with `max` clamped to the pool size.
	Range(usize, usize),
}

impl Default for Repeat {
	fn default() -> Self {
		Repeat::Count(1)
	}
}

/// A structured choice: probability of firing, repeat count and candidates.
///
/// When `selector` is set, resolving the node first draws one name from it,
/// then samples from the sibling list of that name in `lists`. Otherwise
/// `tags` is sampled directly.
///
/// ## Invariants
/// - `probability`, when set, is within `0.0..=1.0`
/// - Every name of `selector` (weight stripped) is a key of `lists`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChoiceNode {
	pub probability: Option<f64>,
	pub repeat: Option<Repeat>,
	pub tags: Option<Vec<String>>,
	pub selector: Option<Vec<String>>,
	pub lists: BTreeMap<String, Vec<String>>,
}

impl ChoiceNode {
	/// Returns the tag list to sample from, without consulting `selector`.
	pub fn direct_tags(&self) -> Option<&[String]> {
		self.tags.as_deref()
	}

	/// Looks up the sibling list chosen by the selector.
	pub fn named_list(&self, name: &str) -> Option<&[String]> {
		self.lists.get(name).map(Vec::as_slice)
	}
}

impl ConfigValue {
	/// Parses every entry of a TOML document into a `ConfigTable`.
	///
	/// # Errors
	/// Returns `PromptError::ConfigShape` for values that fit none of the
	/// variants, and `PromptError::Format` for malformed selector weights.
	pub fn parse_table(table: &toml::Table) -> Result<ConfigTable> {
		Self::parse_entries("", table)
	}

	fn parse_entries(prefix: &str, table: &toml::Table) -> Result<ConfigTable> {
		table
			.iter()
			.map(|(key, value)| {
				let path = join_path(prefix, key);
				Ok((key.clone(), Self::from_toml(&path, value)?))
			})
			.collect()
	}

	/// Classifies a single TOML value found at `path`.
	pub fn from_toml(path: &str, value: &toml::Value) -> Result<Self> {
		match value {
			toml::Value::String(tag) => Ok(ConfigValue::Tag(tag.clone())),
			toml::Value::Array(items) => Ok(ConfigValue::TagList(string_list(path, items)?)),
			toml::Value::Table(table) if is_choice(table) => {
				Ok(ConfigValue::Choice(parse_choice(path, table)?))
			}
			toml::Value::Table(table) => Ok(ConfigValue::Section(Self::parse_entries(path, table)?)),
			other => Err(PromptError::shape(
				path,
				format!("expected a tag, a tag list or a table, got {}", other.type_str()),
			)),
		}
	}

	/// Short human-readable name of the variant, used in error messages.
	pub fn kind(&self) -> &'static str {
		match self {
			ConfigValue::Tag(_) => "tag",
			ConfigValue::TagList(_) => "tag list",
			ConfigValue::Choice(_) => "choice node",
			ConfigValue::Section(_) => "section",
		}
	}
}

fn is_choice(table: &toml::Table) -> bool {
	[PROBABILITY_KEY, REPEAT_KEY, TAGS_KEY, LIST_KEY]
		.iter()
		.any(|key| table.contains_key(*key))
}

fn join_path(prefix: &str, key: &str) -> String {
	if prefix.is_empty() {
		key.to_owned()
	} else {
		format!("{prefix}.{key}")
	}
}

fn string_list(path: &str, items: &[toml::Value]) -> Result<Vec<String>> {
	items
		.iter()
		.map(|item| match item {
			toml::Value::String(tag) => Ok(tag.clone()),
			other => Err(PromptError::shape(
				path,
				format!("tag lists may only contain strings, found {}", other.type_str()),
			)),
		})
		.collect()
}

fn parse_choice(path: &str, table: &toml::Table) -> Result<ChoiceNode> {
	let mut node = ChoiceNode::default();

	for (key, value) in table {
		let field_path = join_path(path, key);
		match key.as_str() {
			PROBABILITY_KEY => node.probability = Some(parse_probability(&field_path, value)?),
			REPEAT_KEY => node.repeat = Some(parse_repeat(&field_path, value)?),
			TAGS_KEY => node.tags = Some(parse_tag_source(&field_path, value)?),
			LIST_KEY => node.selector = Some(parse_tag_source(&field_path, value)?),
			_ => {
				node.lists.insert(key.clone(), parse_sibling(&field_path, value)?);
			}
		}
	}

	if let Some(selector) = &node.selector {
		for entry in selector {
			let (name, _) = WeightedSet::parse_entry(entry)?;
			if !node.lists.contains_key(name) {
				return Err(PromptError::shape(
					path,
					format!("`list` names `{name}` but the node has no such field"),
				));
			}
		}
	} else if node.tags.is_none() {
		return Err(PromptError::shape(path, "choice node needs `tags` or `list`"));
	}

	Ok(node)
}

fn parse_probability(path: &str, value: &toml::Value) -> Result<f64> {
	let probability = match value {
		toml::Value::Float(p) => *p,
		toml::Value::Integer(p) => *p as f64,
		other => {
			return Err(PromptError::shape(path, format!("expected a number, got {}", other.type_str())));
		}
	};
	if !(0.0..=1.0).contains(&probability) {
		return Err(PromptError::shape(path, format!("probability must be between 0 and 1, got {probability}")));
	}
	Ok(probability)
}

fn parse_count(path: &str, value: &toml::Value) -> Result<usize> {
	match value {
		toml::Value::Integer(n) if *n >= 0 => Ok(*n as usize),
		other => Err(PromptError::shape(path, format!("expected a non-negative integer, got {other}"))),
	}
}

fn parse_repeat(path: &str, value: &toml::Value) -> Result<Repeat> {
	match value {
		toml::Value::Array(bounds) if bounds.len() == 2 => {
			Ok(Repeat::Range(parse_count(path, &bounds[0])?, parse_count(path, &bounds[1])?))
		}
		toml::Value::Array(_) => Err(PromptError::shape(path, "repeat range must be `[min, max]`")),
		other => Ok(Repeat::Count(parse_count(path, other)?)),
	}
}

/// `tags` and `list` accept a tag list or a single tag.
fn parse_tag_source(path: &str, value: &toml::Value) -> Result<Vec<String>> {
	match value {
		toml::Value::String(tag) => Ok(vec![tag.clone()]),
		toml::Value::Array(items) => string_list(path, items),
		other => Err(PromptError::shape(path, format!("expected a tag list, got {}", other.type_str()))),
	}
}

/// Sibling lists are one level deep: a tag list, a tag, or a table holding
/// only `tags`. Anything nested further is rejected.
fn parse_sibling(path: &str, value: &toml::Value) -> Result<Vec<String>> {
	match value {
		toml::Value::Table(table) => match table.get(TAGS_KEY) {
			Some(tags) if table.len() == 1 => parse_tag_source(&join_path(path, TAGS_KEY), tags),
			_ => Err(PromptError::shape(
				path,
				"named lists of a choice node may only hold `tags`; deeper nesting is not supported",
			)),
		},
		other => parse_tag_source(path, other),
	}
}
