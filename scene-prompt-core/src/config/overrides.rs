use std::collections::BTreeMap;

use crate::config::value::{ConfigTable, ConfigValue, LIST_KEY, TAGS_KEY};
use crate::error::{PromptError, Result};
use crate::model::weighted_set::WeightedSet;

/// Override value meaning "leave this input to the resolver".
pub const RANDOM: &str = "random";

/// Caller-supplied overrides: input name → `RANDOM` or a selection path.
pub type Overrides = BTreeMap<String, String>;

/// Returns `true` if `value` is the "use randomness" sentinel.
pub fn is_random(value: &str) -> bool {
	value.trim().eq_ignore_ascii_case(RANDOM)
}

/// Splits an override path into its separator and segments.
///
/// Paths containing `/` are split on `/` only; other paths are split on `.`.
/// Empty segments are ignored.
fn segments(path: &str) -> (char, Vec<&str>) {
	let separator = if path.contains('/') { '/' } else { '.' };
	let parts = path.split(separator).map(str::trim).filter(|s| !s.is_empty()).collect();
	(separator, parts)
}

/// Finds the value addressed by `path` inside `table`.
///
/// Segments walk through sections, through the named lists and `tags` of a
/// choice node, and finally may name a single tag inside a tag list, which
/// yields that tag (weight stripped) as a plain `ConfigValue::Tag`. A tag
/// name may itself contain the separator (`shot/f/1.8 bokeh`): the rest of
/// the path is tried as a whole tag name before walking further.
///
/// # Errors
/// Returns `PromptError::Lookup` if the path is empty or any segment is missing.
pub fn lookup(table: &ConfigTable, path: &str) -> Result<ConfigValue> {
	let (separator, parts) = segments(path);
	let Some((first, rest)) = parts.split_first() else {
		return Err(PromptError::lookup(path, "empty path"));
	};

	let mut current = table
		.get(*first)
		.cloned()
		.ok_or_else(|| PromptError::lookup(path, format!("no entry named `{first}`")))?;

	for (position, segment) in rest.iter().enumerate() {
		if rest.len() - position > 1 {
			let remainder = rest[position..].join(&separator.to_string());
			if let Some(tag) = tag_named(&current, &remainder) {
				return tag;
			}
		}
		current = step(&current, segment).ok_or_else(|| {
			PromptError::lookup(path, format!("`{segment}` not found in {}", current.kind()))
		})??;
	}

	Ok(current)
}

fn step(value: &ConfigValue, segment: &str) -> Option<Result<ConfigValue>> {
	match value {
		ConfigValue::Section(table) => table.get(segment).cloned().map(Ok),
		ConfigValue::Choice(node) => match segment {
			TAGS_KEY => node.tags.clone().map(|tags| Ok(ConfigValue::TagList(tags))),
			LIST_KEY => node.selector.clone().map(|list| Ok(ConfigValue::TagList(list))),
			_ => node
				.named_list(segment)
				.map(|list| Ok(ConfigValue::TagList(list.to_vec())))
				.or_else(|| node.direct_tags().and_then(|tags| find_tag(tags, segment))),
		},
		ConfigValue::TagList(tags) => find_tag(tags, segment),
		ConfigValue::Tag(_) => None,
	}
}

/// Looks for a tag called `name` directly inside `value`.
fn tag_named(value: &ConfigValue, name: &str) -> Option<Result<ConfigValue>> {
	match value {
		ConfigValue::TagList(tags) => find_tag(tags, name),
		ConfigValue::Choice(node) => node.direct_tags().and_then(|tags| find_tag(tags, name)),
		_ => None,
	}
}

fn find_tag(tags: &[String], name: &str) -> Option<Result<ConfigValue>> {
	for entry in tags {
		match WeightedSet::parse_entry(entry) {
			Ok((tag, _)) if tag == name => return Some(Ok(ConfigValue::Tag(tag.to_owned()))),
			Ok(_) => continue,
			Err(e) => return Some(Err(e)),
		}
	}
	None
}

/// Returns a copy of `table` with the overrides for `keys` applied.
///
/// Only keys listed in `keys` are considered; the sentinel leaves an entry
/// untouched. The input table is never modified, so a shared snapshot can
/// serve any number of requests.
///
/// # Errors
/// Propagates `PromptError::Lookup` from `lookup`.
pub fn apply(table: &ConfigTable, keys: &[&str], overrides: &Overrides) -> Result<ConfigTable> {
	let mut snapshot = table.clone();
	for key in keys {
		let Some(path) = overrides.get(*key) else { continue };
		if is_random(path) {
			continue;
		}
		let value = lookup(table, path)?;
		log::debug!("override `{key}` -> `{path}`");
		snapshot.insert((*key).to_owned(), value);
	}
	Ok(snapshot)
}

/// Lists the selectable options of one entry: the sentinel first, then the
/// path of every tag reachable from the entry.
///
/// Mirrors what a host shows in a drop-down for that input.
pub fn input_options(table: &ConfigTable, key: &str) -> Vec<String> {
	let mut options = vec![RANDOM.to_owned()];
	if let Some(value) = table.get(key) {
		collect_paths(key, value, &mut options);
	}
	options
}

fn collect_paths(prefix: &str, value: &ConfigValue, out: &mut Vec<String>) {
	let push_tags = |prefix: &str, tags: &[String], out: &mut Vec<String>| {
		for entry in tags {
			let (name, _) = WeightedSet::parse_entry(entry).unwrap_or((entry.as_str(), 0.0));
			out.push(format!("{prefix}/{name}"));
		}
	};

	match value {
		ConfigValue::Tag(_) => {}
		ConfigValue::TagList(tags) => push_tags(prefix, tags, out),
		ConfigValue::Choice(node) => {
			if let Some(tags) = node.direct_tags() {
				push_tags(prefix, tags, out);
			}
			for (name, list) in &node.lists {
				let nested = format!("{prefix}/{name}");
				out.push(nested.clone());
				push_tags(&nested, list, out);
			}
		}
		ConfigValue::Section(table) => {
			for (name, nested) in table {
				collect_paths(&format!("{prefix}/{name}"), nested, out);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn table() -> ConfigTable {
		let source = r#"
			mood = "calm"
			colors = ["red:2", "blue"]

			[hair]
			list = ["short", "long"]
			short = ["bob cut"]
			long = ["braids", "ponytail"]

			[framing]
			tags = ["close-up:3", "wide shot"]

			[places.indoor]
			rooms = ["kitchen", "library"]
		"#;
		ConfigValue::parse_table(&source.parse::<toml::Table>().unwrap()).unwrap()
	}

	#[test]
	fn looks_up_a_single_tag_in_a_list() {
		assert_eq!(lookup(&table(), "colors/red").unwrap(), ConfigValue::Tag("red".to_owned()));
		assert_eq!(lookup(&table(), "framing.close-up").unwrap(), ConfigValue::Tag("close-up".to_owned()));
	}

	#[test]
	fn looks_up_named_lists_and_sections() {
		assert_eq!(
			lookup(&table(), "hair/long").unwrap(),
			ConfigValue::TagList(vec!["braids".to_owned(), "ponytail".to_owned()])
		);
		assert_eq!(lookup(&table(), "places/indoor/rooms/library").unwrap(), ConfigValue::Tag("library".to_owned()));
	}

	#[test]
	fn missing_path_is_a_lookup_error() {
		assert!(matches!(lookup(&table(), "hair/medium"), Err(PromptError::Lookup { .. })));
		assert!(matches!(lookup(&table(), "nothing"), Err(PromptError::Lookup { .. })));
		assert!(matches!(lookup(&table(), "mood/calm"), Err(PromptError::Lookup { .. })));
		assert!(matches!(lookup(&table(), " / "), Err(PromptError::Lookup { .. })));
	}

	#[test]
	fn apply_replaces_only_concrete_overrides() {
		let base = table();
		let mut overrides = Overrides::new();
		overrides.insert("hair".to_owned(), "hair/short/bob cut".to_owned());
		overrides.insert("framing".to_owned(), "Random".to_owned());
		overrides.insert("unrelated".to_owned(), "colors/red".to_owned());

		let snapshot = apply(&base, &["hair", "framing"], &overrides).unwrap();

		assert_eq!(snapshot["hair"], ConfigValue::Tag("bob cut".to_owned()));
		assert_eq!(snapshot["framing"], base["framing"]);
		assert!(!snapshot.contains_key("unrelated"));
		assert_ne!(base["hair"], snapshot["hair"]);
	}

	#[test]
	fn tag_names_may_contain_separators() {
		let source = r#"
			shot = ["f/1.8 bokeh", "1.5x zoom", "wide shot"]
			lens = { tags = ["35mm f/1.4:2", "85mm"] }
		"#;
		let table = ConfigValue::parse_table(&source.parse::<toml::Table>().unwrap()).unwrap();

		assert_eq!(lookup(&table, "shot/f/1.8 bokeh").unwrap(), ConfigValue::Tag("f/1.8 bokeh".to_owned()));
		assert_eq!(lookup(&table, "shot.1.5x zoom").unwrap(), ConfigValue::Tag("1.5x zoom".to_owned()));
		assert_eq!(lookup(&table, "lens/35mm f/1.4").unwrap(), ConfigValue::Tag("35mm f/1.4".to_owned()));

		for key in ["shot", "lens"] {
			for option in input_options(&table, key).iter().skip(1) {
				assert!(lookup(&table, option).is_ok(), "{option} should resolve");
			}
		}
	}

	#[test]
	fn options_start_with_the_sentinel() {
		let options = input_options(&table(), "hair");
		assert_eq!(
			options,
			vec!["random", "hair/long", "hair/long/braids", "hair/long/ponytail", "hair/short", "hair/short/bob cut"]
		);
		for option in options.iter().skip(1) {
			assert!(lookup(&table(), option).is_ok(), "{option} should resolve");
		}
	}
}
