use scene_prompt_core::config::overrides::{Overrides, RANDOM};
use scene_prompt_core::model::component::ActionType;
use scene_prompt_core::model::generator::PromptGenerator;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Load every configuration source from the "config" directory (.toml files)
    // Missing or unreadable sources are replaced by empty ones
    let mut app: PromptGenerator = PromptGenerator::from_dir("./config")?;
    println!("Loaded sources: {}", app.library().source_names().join(", "));

    // The same seed always gives the same prompt
    let seed = 42;
    let first = app.generate(seed, &Overrides::new())?;
    let second = app.generate(seed, &Overrides::new())?;
    println!("Seed {seed}: {first}");
    println!("Same seed gives the same prompt: {}", first == second);

    // The action type picks which part of "action.toml" is used
    for action in ActionType::ALL {
        app.set_action(action);
        println!("{action}: {}", app.generate(seed, &Overrides::new())?);
    }
    app.set_action(ActionType::Pose);

    // Each input can be left to randomness or fixed with a path
    // Print the options of a few inputs
    let inputs = app.inputs();
    for name in ["shot", "hair", "location"] {
        println!("Options for '{name}': {}", inputs[name].join(" | "));
    }

    // Fix some inputs: a single tag, a whole named list, and one left random
    let mut overrides = Overrides::new();
    overrides.insert("shot".to_owned(), "shot/close-up".to_owned());
    overrides.insert("location".to_owned(), "location/nature".to_owned());
    overrides.insert("hair".to_owned(), RANDOM.to_owned());
    for seed in 0..5 {
        println!("Overridden prompt {}: {}", seed + 1, app.generate(seed, &overrides)?);
    }

    // Invalid overrides are reported, no prompt is produced
    overrides.insert("hair".to_owned(), "hair/rainbow".to_owned());
    match app.generate(seed, &overrides) {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("Invalid path: {e}"),
    }
    overrides.remove("hair");
    overrides.insert("shoes".to_owned(), "shoes/boots".to_owned());
    match app.generate(seed, &overrides) {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("Unknown input: {e}"),
    }

    // Generate 10 prompts with random inputs
    for i in 0..10 {
        println!("Generated prompt {}: {}", i + 1, app.generate(i, &Overrides::new())?);
    }

    Ok(())
}
