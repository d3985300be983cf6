use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::config::library::ConfigLibrary;
use crate::config::overrides::{is_random, Overrides};
use crate::error::{PromptError, Result};
use crate::model::component::{ActionType, Component};

/// High-level prompt generator.
///
/// # Responsibilities
/// - Hold the configuration library shared by every request
/// - Build a fresh `scene` tree for each request
/// - Validate overrides against the inputs the tree declares
///
/// `generate` takes `&self` and keeps no per-request state, so a single
/// generator can serve concurrent requests.
#[derive(Clone, Debug)]
pub struct PromptGenerator {
	library: Arc<ConfigLibrary>,
	action: ActionType,
}

impl PromptGenerator {
	/// Creates a generator over an already loaded library.
	pub fn new(library: ConfigLibrary) -> Self {
		Self { library: Arc::new(library), action: ActionType::default() }
	}

	/// Creates a generator by loading all `.toml` sources from a directory.
	///
	/// # Errors
	/// Returns an error if a source holds values of an unsupported shape.
	/// Missing or unreadable sources only produce warnings (see
	/// `ConfigLibrary::load_dir`).
	pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
		Ok(Self::new(ConfigLibrary::load_dir(dir)?))
	}

	/// Returns the same generator with another action type.
	pub fn with_action(mut self, action: ActionType) -> Self {
		self.action = action;
		self
	}

	pub fn set_action(&mut self, action: ActionType) {
		self.action = action;
	}

	pub fn action(&self) -> ActionType {
		self.action
	}

	pub fn library(&self) -> &ConfigLibrary {
		&self.library
	}

	/// Builds a new, unresolved scene tree for `seed`.
	pub fn scene(&self, seed: u64) -> Component {
		Component::scene(seed, self.action, Arc::clone(&self.library))
	}

	/// Selectable options of every input of the scene.
	///
	/// Each list starts with the `"random"` sentinel followed by the paths
	/// accepted as override values.
	pub fn inputs(&self) -> BTreeMap<String, Vec<String>> {
		self.scene(0).inputs()
	}

	/// Generates one prompt.
	///
	/// # Parameters
	/// - `seed`: fixes every random draw; the same seed and overrides always
	///   give the same prompt.
	/// - `overrides`: input name → `"random"` or a selection path.
	///
	/// # Errors
	/// - `PromptError::Lookup` if an override names an unknown input or a
	///   path that does not resolve.
	/// - `PromptError::ConfigShape` / `PromptError::Format` if the
	///   configuration cannot be resolved.
	///
	/// No partial prompt is returned on error.
	pub fn generate(&self, seed: u64, overrides: &Overrides) -> Result<String> {
		let mut scene = self.scene(seed);
		let inputs = scene.inputs();

		if let Some((key, _)) = overrides
			.iter()
			.find(|(key, value)| !is_random(value) && !inputs.contains_key(key.as_str()))
		{
			return Err(PromptError::lookup(key, "no component declares this input"));
		}

		let prompt = scene.build(seed, overrides)?;
		log::debug!("seed {seed} ({}) -> {prompt}", self.action);
		Ok(prompt)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn generator() -> PromptGenerator {
		let composition = r#"
			shot = ["close-up:3", "wide shot"]
		"#;
		let environment = r#"
			location = { list = ["indoor", "outdoor"], indoor = ["kitchen"], outdoor = ["forest", "beach"] }
		"#;
		let library = ConfigLibrary::from_sources([("composition", composition), ("environment", environment)]).unwrap();
		PromptGenerator::new(library)
	}

	#[test]
	fn generate_is_deterministic() {
		let generator = generator();
		for seed in 0..50 {
			assert_eq!(
				generator.generate(seed, &Overrides::new()).unwrap(),
				generator.generate(seed, &Overrides::new()).unwrap()
			);
		}
	}

	#[test]
	fn unknown_input_is_rejected() {
		let mut overrides = Overrides::new();
		overrides.insert("shoes".to_owned(), "shoes/boots".to_owned());
		let err = generator().generate(0, &overrides).unwrap_err();
		assert!(matches!(err, PromptError::Lookup { ref path, .. } if path == "shoes"));
	}

	#[test]
	fn unknown_input_set_to_random_is_ignored() {
		let mut overrides = Overrides::new();
		overrides.insert("shoes".to_owned(), "random".to_owned());
		assert!(generator().generate(0, &overrides).is_ok());
	}

	#[test]
	fn inputs_start_with_random() {
		let inputs = generator().inputs();
		assert!(inputs.values().all(|options| options[0] == "random"));
		assert_eq!(inputs["shot"], vec!["random", "shot/close-up", "shot/wide shot"]);
	}
}
