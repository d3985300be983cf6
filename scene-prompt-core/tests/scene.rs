use std::collections::HashSet;

use proptest::prelude::*;

use scene_prompt_core::config::library::ConfigLibrary;
use scene_prompt_core::config::overrides::Overrides;
use scene_prompt_core::config::value::ConfigValue;
use scene_prompt_core::error::PromptError;
use scene_prompt_core::model::component::ActionType;
use scene_prompt_core::model::generator::PromptGenerator;
use scene_prompt_core::model::resolver::TagResolver;

const CONFIG_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../config");

fn generator() -> PromptGenerator {
	PromptGenerator::from_dir(CONFIG_DIR).expect("bundled configuration is valid")
}

fn overrides(pairs: &[(&str, &str)]) -> Overrides {
	pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
}

#[test]
fn every_action_type_produces_a_prompt() {
	for action in ActionType::ALL {
		let generator = generator().with_action(action);
		let prompt = generator.generate(2024, &Overrides::new()).unwrap();
		assert!(!prompt.is_empty());
		assert!(!prompt.contains(", ,"), "{prompt}");
		assert!(prompt.contains("1person"), "{prompt}");
	}
}

#[test]
fn every_listed_option_is_a_valid_override() {
	let generator = generator();
	for (input, options) in generator.inputs() {
		for option in options {
			let result = generator.generate(1, &overrides(&[(input.as_str(), option.as_str())]));
			assert!(result.is_ok(), "{input} = {option}: {result:?}");
		}
	}
}

#[test]
fn tag_override_is_copied_verbatim() {
	let prompt = generator().generate(3, &overrides(&[("shot", "shot/wide shot")])).unwrap();
	assert!(prompt.starts_with("wide shot, "), "{prompt}");
}

#[test]
fn list_override_restricts_sampling() {
	let short: HashSet<&str> = ["short hair", "buzz cut", "bob cut", "pixie cut"].into_iter().collect();
	let generator = generator();
	for seed in 0..100 {
		let prompt = generator.generate(seed, &overrides(&[("hair", "hair/short")])).unwrap();
		assert!(prompt.split(", ").any(|tag| short.contains(tag)), "{prompt}");
	}
}

#[test]
fn random_sentinel_changes_nothing() {
	let generator = generator();
	let sentinel = overrides(&[("hair", "random"), ("time", "random")]);
	for seed in 0..20 {
		assert_eq!(generator.generate(seed, &sentinel).unwrap(), generator.generate(seed, &Overrides::new()).unwrap());
	}
}

#[test]
fn different_seeds_give_different_prompts() {
	let generator = generator();
	let prompts: HashSet<String> = (0..50).map(|seed| generator.generate(seed, &Overrides::new()).unwrap()).collect();
	assert!(prompts.len() > 40);
}

#[test]
fn broken_path_fails_without_output() {
	let err = generator().generate(0, &overrides(&[("eyes", "eyes/violet eyes")])).unwrap_err();
	assert!(matches!(err, PromptError::Lookup { .. }));
}

#[test]
fn missing_configuration_degrades_to_empty_prompt() {
	let generator = PromptGenerator::new(ConfigLibrary::default());
	assert_eq!(generator.generate(0, &Overrides::new()).unwrap(), "");
}

#[test]
fn malformed_weight_surfaces_from_generate() {
	let library = ConfigLibrary::from_sources([("environment", "time = ['noon:often']")]).unwrap();
	let err = PromptGenerator::new(library).generate(0, &Overrides::new()).unwrap_err();
	assert!(matches!(err, PromptError::Format { ref entry, .. } if entry == "noon:often"));
}

proptest! {
	#[test]
	fn generation_is_reproducible(seed in any::<u64>(), action in 0usize..3) {
		let generator = generator().with_action(ActionType::ALL[action]);
		let first = generator.generate(seed, &Overrides::new()).unwrap();
		let second = generator.generate(seed, &Overrides::new()).unwrap();
		prop_assert_eq!(first, second);
	}

	#[test]
	fn fixed_override_ignores_the_seed(a in any::<u64>(), b in any::<u64>()) {
		let generator = generator();
		let fixed = overrides(&[("shot", "shot/close-up")]);
		let first = generator.generate(a, &fixed).unwrap();
		let second = generator.generate(b, &fixed).unwrap();
		prop_assert_eq!(first.split(", ").next(), Some("close-up"));
		prop_assert_eq!(second.split(", ").next(), Some("close-up"));
	}

	#[test]
	fn repeated_draws_never_duplicate(seed in any::<u64>()) {
		let library = ConfigLibrary::load_dir(CONFIG_DIR).unwrap();
		let character = library.source("character").unwrap();
		for entry in ["outfit", "accessory"] {
			let value: &ConfigValue = &character[entry];
			let tags = TagResolver::new(seed).resolve(value).unwrap();
			let unique: HashSet<&String> = tags.iter().collect();
			prop_assert_eq!(unique.len(), tags.len());
			prop_assert!(tags.len() <= 3);
		}
	}
}
