use std::collections::HashMap;
use std::env;
use std::sync::{Arc, Mutex};

use actix_cors::Cors;
use actix_web::{get, put, web, App, HttpResponse, HttpServer, Responder};

use rand::Rng;
use serde::Deserialize;
use scene_prompt_core::config::overrides::Overrides;
use scene_prompt_core::error::PromptError;
use scene_prompt_core::model::component::ActionType;
use scene_prompt_core::model::generator::PromptGenerator;

/// Default folder holding the `.toml` configuration sources.
const DEFAULT_CONFIG_DIR: &str = "./config";

/// Default bind address.
const DEFAULT_BIND: &str = "127.0.0.1:5000";

/// Response header carrying the seed actually used.
const SEED_HEADER: &str = "x-prompt-seed";

/// Query parameter names that are not overrides.
const SEED_PARAM: &str = "seed";
const ACTION_PARAM: &str = "action";

#[derive(Deserialize)]
struct InputsQuery {
	action: Option<ActionType>,
}

struct SharedData {
	config_dir: String,
	generator: Arc<PromptGenerator>,
}

impl SharedData {
	/// Returns the current generator without holding the lock afterwards.
	fn generator(data: &web::Data<Mutex<SharedData>>) -> Result<Arc<PromptGenerator>, HttpResponse> {
		match data.lock() {
			Ok(shared) => Ok(Arc::clone(&shared.generator)),
			Err(_) => Err(HttpResponse::InternalServerError().body("Generator lock failed")),
		}
	}
}

/// Splits the raw query into seed, action type and overrides.
///
/// Every parameter other than `seed` and `action` is an override.
fn parse_generate_query(query: &HashMap<String, String>) -> Result<(Option<u64>, Option<ActionType>, Overrides), String> {
	let seed = match query.get(SEED_PARAM) {
		Some(s) => Some(s.trim().parse::<u64>().map_err(|_| "Seed must be a non-negative integer".to_owned())?),
		None => None,
	};

	let action = match query.get(ACTION_PARAM) {
		Some(s) => Some(s.parse::<ActionType>().map_err(|e| e.to_string())?),
		None => None,
	};

	let overrides = query
		.iter()
		.filter(|(key, _)| key.as_str() != SEED_PARAM && key.as_str() != ACTION_PARAM)
		.map(|(key, value)| (key.clone(), value.clone()))
		.collect();

	Ok((seed, action, overrides))
}

fn error_response(error: &PromptError) -> HttpResponse {
	HttpResponse::BadRequest().body(error.to_string())
}

/// HTTP GET endpoint `/v1/generate`
///
/// Generates a prompt. A random seed is drawn when none is given; the seed
/// used is returned in the `x-prompt-seed` header so the prompt can be
/// reproduced.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<Mutex<SharedData>>, query: web::Query<HashMap<String, String>>) -> impl Responder {
	let (seed, action, overrides) = match parse_generate_query(&query) {
		Ok(parsed) => parsed,
		Err(e) => return HttpResponse::BadRequest().body(e),
	};

	let generator = match SharedData::generator(&data) {
		Ok(generator) => generator,
		Err(response) => return response,
	};

	let seed = seed.unwrap_or_else(|| rand::rng().random());
	let generator = match action {
		Some(action) => (*generator).clone().with_action(action),
		None => (*generator).clone(),
	};

	match generator.generate(seed, &overrides) {
		Ok(prompt) => HttpResponse::Ok().insert_header((SEED_HEADER, seed.to_string())).body(prompt),
		Err(e) => {
			log::info!("generation failed for seed {seed}: {e}");
			error_response(&e)
		}
	}
}

/// HTTP GET endpoint `/v1/inputs`
///
/// Lists every input with its selectable options as JSON.
#[get("/v1/inputs")]
async fn get_inputs(data: web::Data<Mutex<SharedData>>, query: web::Query<InputsQuery>) -> impl Responder {
	let generator = match SharedData::generator(&data) {
		Ok(generator) => generator,
		Err(response) => return response,
	};

	let inputs = match query.action {
		Some(action) => (*generator).clone().with_action(action).inputs(),
		None => generator.inputs(),
	};

	HttpResponse::Ok().json(inputs)
}

#[get("/v1/sources")]
async fn get_sources(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	match SharedData::generator(&data) {
		Ok(generator) => HttpResponse::Ok().body(generator.library().source_names().join("\n")),
		Err(response) => response,
	}
}

#[put("/v1/reload")]
async fn put_reload(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Generator lock failed"),
	};

	match PromptGenerator::from_dir(&shared_data.config_dir) {
		Ok(generator) => {
			shared_data.generator = Arc::new(generator);
			HttpResponse::Ok().body("Configuration reloaded successfully")
		}
		Err(e) => HttpResponse::InternalServerError().body(format!("Failed to reload configuration: {e}")),
	}
}

/// Main entry point for the server.
///
/// Loads the configuration sources once, shares the generator behind an
/// `Arc` (swapped on reload) and starts an Actix-web HTTP server.
///
/// # Notes
/// - `SCENE_PROMPT_CONFIG_DIR` sets the configuration folder (default `./config`).
/// - `SCENE_PROMPT_BIND` sets the bind address (default `127.0.0.1:5000`).
/// - `RUST_LOG` controls logging.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::init();

	let config_dir = env::var("SCENE_PROMPT_CONFIG_DIR").unwrap_or_else(|_| DEFAULT_CONFIG_DIR.to_owned());
	let bind = env::var("SCENE_PROMPT_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_owned());

	let generator = PromptGenerator::from_dir(&config_dir)
		.map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
	log::info!("serving prompts from {config_dir} on {bind}");

	let shared_data = SharedData { config_dir, generator: Arc::new(generator) };
	let shared_generator = web::Data::new(Mutex::new(shared_data));

	HttpServer::new(move || {
		App::new()
			.wrap(Cors::permissive())
			.app_data(shared_generator.clone())
			.service(get_generated)
			.service(get_inputs)
			.service(get_sources)
			.service(put_reload)
	})
		.bind(bind)?
		.run()
		.await
}
