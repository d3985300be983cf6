use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::library::ConfigLibrary;
use crate::config::overrides::{self, Overrides};
use crate::config::value::{ConfigTable, ConfigValue};
use crate::error::{PromptError, Result};
use crate::model::resolver::TagResolver;
use crate::model::serializer::stringify;

/// The kind of action a scene depicts.
///
/// Selects which section of the `action` source feeds the action component.
/// Chosen explicitly by the caller, never sampled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
	#[default]
	Pose,
	Movement,
	Interaction,
}

impl ActionType {
	pub const ALL: [ActionType; 3] = [ActionType::Pose, ActionType::Movement, ActionType::Interaction];

	pub fn as_str(&self) -> &'static str {
		match self {
			ActionType::Pose => "pose",
			ActionType::Movement => "movement",
			ActionType::Interaction => "interaction",
		}
	}
}

impl fmt::Display for ActionType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for ActionType {
	type Err = PromptError;

	fn from_str(s: &str) -> Result<Self> {
		ActionType::ALL
			.into_iter()
			.find(|action| action.as_str().eq_ignore_ascii_case(s.trim()))
			.ok_or_else(|| PromptError::lookup(s, "unknown action type"))
	}
}

/// The closed set of components a scene is built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentKind {
	Scene(ActionType),
	Composition,
	Action(ActionType),
	Character,
	Environment,
}

impl ComponentKind {
	/// Name of the component inside its parent.
	pub fn name(&self) -> &'static str {
		match self {
			ComponentKind::Scene(_) => "scene",
			ComponentKind::Composition => "composition",
			ComponentKind::Action(_) => "action",
			ComponentKind::Character => "subject",
			ComponentKind::Environment => "environment",
		}
	}

	/// Name of the configuration source holding the component's data.
	pub fn source(&self) -> Option<&'static str> {
		match self {
			ComponentKind::Scene(_) => None,
			ComponentKind::Composition => Some("composition"),
			ComponentKind::Action(_) => Some("action"),
			ComponentKind::Character => Some("character"),
			ComponentKind::Environment => Some("environment"),
		}
	}

	/// Entries resolved by the component itself, in output order.
	pub fn entries(&self) -> &'static [&'static str] {
		match self {
			ComponentKind::Scene(_) => &[],
			ComponentKind::Composition => &["shot", "angle", "lighting", "style"],
			ComponentKind::Action(ActionType::Pose) => &["pose", "expression"],
			ComponentKind::Action(ActionType::Movement) => &["movement", "pace"],
			ComponentKind::Action(ActionType::Interaction) => &["gesture", "object"],
			ComponentKind::Character => &["count", "age", "build", "hair", "eyes", "outfit", "accessory"],
			ComponentKind::Environment => &["location", "time", "weather", "mood"],
		}
	}

	/// Child components, in output order.
	pub fn children(&self) -> Vec<ComponentKind> {
		match self {
			ComponentKind::Scene(action) => vec![
				ComponentKind::Composition,
				ComponentKind::Action(*action),
				ComponentKind::Character,
				ComponentKind::Environment,
			],
			_ => Vec::new(),
		}
	}
}

/// A node of the composition tree.
///
/// A component owns the data subtree read from its configuration source and
/// its child components. Its fragment is its own entries, resolved in order,
/// followed by the fragments of its children.
///
/// # Lifecycle
/// - Built once per request with `Component::new`.
/// - `apply_overrides` replaces overridden entries in a fresh copy of the
///   source data, so nothing from a previous request survives.
/// - `build_fragment` rebuilds the children before resolving them.
///
/// ## Invariants
/// - Children are owned exclusively; the tree is acyclic (kinds are fixed)
/// - After `propagate_seed`, every node of the tree carries the same seed
#[derive(Clone, Debug)]
pub struct Component {
	kind: ComponentKind,
	seed: u64,
	library: Arc<ConfigLibrary>,
	data: ConfigTable,
	overrides: Overrides,
	children: Vec<Component>,
}

impl Component {
	/// Creates a component and its children from the shared library.
	///
	/// A missing source is not an error: the component gets an empty subtree
	/// and will produce an empty fragment.
	pub fn new(kind: ComponentKind, seed: u64, library: Arc<ConfigLibrary>) -> Self {
		let data = Self::load_data(kind, &library);
		let children = kind
			.children()
			.into_iter()
			.map(|child| Component::new(child, seed, Arc::clone(&library)))
			.collect();

		Self { kind, seed, library, data, overrides: Overrides::new(), children }
	}

	/// Creates the root `scene` component.
	pub fn scene(seed: u64, action: ActionType, library: Arc<ConfigLibrary>) -> Self {
		Self::new(ComponentKind::Scene(action), seed, library)
	}

	/// Reads the component's subtree, degrading to an empty table.
	fn load_data(kind: ComponentKind, library: &ConfigLibrary) -> ConfigTable {
		let Some(source) = kind.source() else {
			return ConfigTable::new();
		};
		let Some(table) = library.source(source) else {
			log::warn!("configuration source `{source}` is missing, `{}` will be empty", kind.name());
			return ConfigTable::new();
		};

		match kind {
			ComponentKind::Action(action) => match table.get(action.as_str()) {
				Some(ConfigValue::Section(section)) => section.clone(),
				Some(other) => {
					log::warn!("`{source}.{action}` is a {}, expected a section", other.kind());
					ConfigTable::new()
				}
				None => {
					log::warn!("`{source}` has no `{action}` section");
					ConfigTable::new()
				}
			},
			_ => table.clone(),
		}
	}

	pub fn kind(&self) -> ComponentKind {
		self.kind
	}

	pub fn name(&self) -> &'static str {
		self.kind.name()
	}

	pub fn seed(&self) -> u64 {
		self.seed
	}

	/// Current data subtree (overrides included).
	pub fn data(&self) -> &ConfigTable {
		&self.data
	}

	pub fn children(&self) -> &[Component] {
		&self.children
	}

	/// Switches the action variant of a scene (or of an action component).
	///
	/// Children are rebuilt immediately; other kinds are left untouched.
	pub fn define_action(&mut self, action: ActionType) {
		let kind = match self.kind {
			ComponentKind::Scene(_) => ComponentKind::Scene(action),
			ComponentKind::Action(_) => ComponentKind::Action(action),
			_ => return,
		};
		*self = Component::new(kind, self.seed, Arc::clone(&self.library));
	}

	/// Sets the seed on this component and on every descendant.
	pub fn propagate_seed(&mut self, seed: u64) {
		self.seed = seed;
		for child in &mut self.children {
			child.propagate_seed(seed);
		}
	}

	/// Applies overrides to this component's own entries.
	///
	/// Only the overrides named after its entries are looked at. The sentinel
	/// `"random"` leaves an entry to the resolver; any other value is a path
	/// looked up in the component's source data. The overrides are kept so
	/// that `rebuild_children` hands them to the fresh children.
	///
	/// # Errors
	/// Returns `PromptError::Lookup` if an override path does not resolve.
	pub fn apply_overrides(&mut self, overrides: &Overrides) -> Result<()> {
		let source = Self::load_data(self.kind, &self.library);
		self.data = overrides::apply(&source, self.kind.entries(), overrides)?;
		self.overrides = overrides.clone();
		Ok(())
	}

	/// Rebuilds the children from the library, carrying over seed and
	/// overrides. This is the only place children receive overrides.
	fn rebuild_children(&mut self) -> Result<()> {
		let mut children = Vec::new();
		for kind in self.kind.children() {
			let mut child = Component::new(kind, self.seed, Arc::clone(&self.library));
			child.apply_overrides(&self.overrides)?;
			children.push(child);
		}
		self.children = children;
		Ok(())
	}

	/// Resolves this component into one prompt fragment.
	///
	/// Own entries come first, in declared order, then each child's fragment.
	/// Entries absent from the data are skipped.
	///
	/// # Errors
	/// Propagates resolution errors; shape errors are reported with the
	/// component and entry they were found in.
	pub fn build_fragment(&mut self, resolver: &mut TagResolver) -> Result<String> {
		self.rebuild_children()?;

		let mut parts = Vec::new();
		for entry in self.kind.entries() {
			let Some(value) = self.data.get(*entry) else { continue };
			let tags = resolver
				.resolve(value)
				.map_err(|e| e.within(&format!("{}.{entry}", self.name())))?;
			parts.push(stringify(tags));
		}

		for child in &mut self.children {
			parts.push(child.build_fragment(resolver)?);
		}

		Ok(stringify(parts))
	}

	/// Builds the fragment for `seed` and `overrides` from scratch.
	///
	/// One `TagResolver` seeded with `seed` serves the whole subtree.
	pub fn build(&mut self, seed: u64, overrides: &Overrides) -> Result<String> {
		self.propagate_seed(seed);
		self.apply_overrides(overrides)?;
		let mut resolver = TagResolver::new(self.seed);
		self.build_fragment(&mut resolver)
	}

	/// Selectable options of every input of the subtree.
	///
	/// Keys are entry names; each list starts with `"random"`.
	pub fn inputs(&self) -> BTreeMap<String, Vec<String>> {
		let source = Self::load_data(self.kind, &self.library);
		let mut inputs = BTreeMap::new();
		for entry in self.kind.entries() {
			inputs.insert((*entry).to_owned(), overrides::input_options(&source, entry));
		}
		for child in &self.children {
			for (key, options) in child.inputs() {
				match inputs.get_mut(&key) {
					Some(existing) => existing.extend(options.into_iter().skip(1)),
					None => {
						inputs.insert(key, options);
					}
				}
			}
		}
		inputs
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const CHARACTER: &str = r#"
		age = ["young adult", "middle-aged", "elderly"]
		hair = ["red hair:2", "black hair", "silver hair"]
		eyes = { tags = ["green eyes", "brown eyes"], probability = 0.0 }
	"#;

	fn library() -> Arc<ConfigLibrary> {
		let action = r#"
			[pose]
			pose = ["sitting", "standing"]
		"#;
		Arc::new(ConfigLibrary::from_sources([("character", CHARACTER), ("action", action)]).unwrap())
	}

	#[test]
	fn missing_source_gives_empty_fragment() {
		let mut component = Component::new(ComponentKind::Environment, 1, library());
		assert!(component.data().is_empty());
		assert_eq!(component.build(1, &Overrides::new()).unwrap(), "");
	}

	#[test]
	fn entries_follow_declared_order() {
		let mut component = Component::new(ComponentKind::Character, 0, library());
		let fragment = component.build(5, &Overrides::new()).unwrap();
		let parts: Vec<&str> = fragment.split(", ").collect();
		assert_eq!(parts.len(), 2);
		assert!(["young adult", "middle-aged", "elderly"].contains(&parts[0]));
		assert!(parts[1].ends_with("hair"));
	}

	#[test]
	fn seed_reaches_every_descendant() {
		let mut scene = Component::scene(1, ActionType::Pose, library());
		scene.propagate_seed(77);
		assert_eq!(scene.seed(), 77);
		assert!(scene.children().iter().all(|child| child.seed() == 77));
	}

	#[test]
	fn scene_children_are_in_fixed_order() {
		let scene = Component::scene(0, ActionType::Movement, library());
		let names: Vec<&str> = scene.children().iter().map(Component::name).collect();
		assert_eq!(names, vec!["composition", "action", "subject", "environment"]);
		assert_eq!(scene.children()[1].kind(), ComponentKind::Action(ActionType::Movement));
	}

	#[test]
	fn define_action_swaps_the_variant() {
		let mut scene = Component::scene(3, ActionType::Movement, library());
		assert!(scene.children()[1].data().is_empty());
		scene.define_action(ActionType::Pose);
		assert_eq!(scene.seed(), 3);
		assert_eq!(scene.children()[1].kind(), ComponentKind::Action(ActionType::Pose));
		assert!(scene.children()[1].data().contains_key("pose"));
	}

	#[test]
	fn overrides_reach_children_and_survive_rebuild() {
		let mut overrides = Overrides::new();
		overrides.insert("hair".to_owned(), "hair/silver hair".to_owned());
		overrides.insert("pose".to_owned(), "pose.sitting".to_owned());

		for seed in 0..20 {
			let mut scene = Component::scene(0, ActionType::Pose, library());
			let prompt = scene.build(seed, &overrides).unwrap();
			assert!(prompt.starts_with("sitting, "), "{prompt}");
			assert!(prompt.ends_with(", silver hair"), "{prompt}");
		}
	}

	#[test]
	fn children_receive_overrides_when_rebuilt() {
		let mut overrides = Overrides::new();
		overrides.insert("pose".to_owned(), "pose/sitting".to_owned());
		let mut scene = Component::scene(0, ActionType::Pose, library());

		scene.apply_overrides(&overrides).unwrap();
		assert!(matches!(scene.children()[1].data()["pose"], ConfigValue::TagList(_)));

		scene.build(4, &overrides).unwrap();
		assert_eq!(scene.children()[1].data()["pose"], ConfigValue::Tag("sitting".to_owned()));
	}

	#[test]
	fn overrides_do_not_leak_between_builds() {
		let mut overrides = Overrides::new();
		overrides.insert("pose".to_owned(), "pose/sitting".to_owned());
		let mut scene = Component::scene(0, ActionType::Pose, library());
		scene.build(1, &overrides).unwrap();

		let mut seen_standing = false;
		for seed in 0..50 {
			let prompt = scene.build(seed, &Overrides::new()).unwrap();
			seen_standing |= prompt.starts_with("standing");
		}
		assert!(seen_standing);
	}

	#[test]
	fn bad_override_path_fails() {
		let mut overrides = Overrides::new();
		overrides.insert("hair".to_owned(), "hair/green hair".to_owned());
		let mut scene = Component::scene(0, ActionType::Pose, library());
		assert!(matches!(scene.build(0, &overrides), Err(PromptError::Lookup { .. })));
	}

	#[test]
	fn section_entry_reports_its_location() {
		let library = ConfigLibrary::from_sources([("environment", "[location]\nindoor = 'kitchen'")]).unwrap();
		let mut component = Component::new(ComponentKind::Environment, 0, Arc::new(library));
		let err = component.build(0, &Overrides::new()).unwrap_err();
		assert!(matches!(err, PromptError::ConfigShape { ref path, .. } if path == "environment.location"));
	}

	#[test]
	fn inputs_list_every_entry() {
		let scene = Component::scene(0, ActionType::Pose, library());
		let inputs = scene.inputs();
		assert_eq!(inputs["hair"], vec!["random", "hair/red hair", "hair/black hair", "hair/silver hair"]);
		assert_eq!(inputs["lighting"], vec!["random"]);
		assert!(inputs.contains_key("pose"));
		assert!(!inputs.contains_key("movement"));
	}

	#[test]
	fn action_type_parses_case_insensitively() {
		assert_eq!("Movement".parse::<ActionType>().unwrap(), ActionType::Movement);
		assert!(matches!("dance".parse::<ActionType>(), Err(PromptError::Lookup { .. })));
	}
}
