use std::collections::BTreeMap;
use std::path::Path;

use crate::config::value::{ConfigTable, ConfigValue};
use crate::error::Result;
use crate::io;

/// Extension of configuration source files.
pub const SOURCE_EXTENSION: &str = "toml";

/// Every configuration source loaded for one generator.
///
/// Each source is the parsed content of `<name>.toml` and becomes the data
/// subtree of the component reading that name. The library is read-only once
/// built; share it behind an `Arc` and let each request copy what it needs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConfigLibrary {
	sources: BTreeMap<String, ConfigTable>,
}

impl ConfigLibrary {
	/// Loads every `.toml` file of a directory.
	///
	/// # Behavior
	/// - The source name is the file name without extension.
	/// - A missing directory, an unreadable file or invalid TOML does not fail:
	///   the source is skipped (or left empty) and a warning is logged, so
	///   components fall back to an empty subtree.
	///
	/// # Errors
	/// Returns `PromptError::ConfigShape` / `PromptError::Format` when a file
	/// parses as TOML but holds values the resolver cannot interpret.
	pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
		let folder = io::normalize_folder(dir.as_ref());
		let mut library = Self::default();

		let files = match io::list_files(&folder, SOURCE_EXTENSION) {
			Ok(files) => files,
			Err(e) => {
				log::warn!("cannot list configuration folder {}: {e}", folder.display());
				return Ok(library);
			}
		};

		for file in files {
			let path = folder.join(&file);
			let name = match io::get_filename(&path) {
				Ok(name) => name,
				Err(e) => {
					log::warn!("skipping {}: {e}", path.display());
					continue;
				}
			};
			let content = match io::read_file(&path) {
				Ok(content) => content,
				Err(e) => {
					log::warn!("cannot read {}: {e}", path.display());
					library.sources.insert(name, ConfigTable::new());
					continue;
				}
			};
			library.insert_source(&name, &content)?;
		}

		log::info!("loaded {} configuration source(s) from {}", library.sources.len(), folder.display());
		Ok(library)
	}

	/// Builds a library from in-memory `(name, toml)` pairs.
	///
	/// Invalid TOML degrades to an empty source, like `load_dir`.
	pub fn from_sources<'a, I>(sources: I) -> Result<Self>
	where
		I: IntoIterator<Item = (&'a str, &'a str)>,
	{
		let mut library = Self::default();
		for (name, content) in sources {
			library.insert_source(name, content)?;
		}
		Ok(library)
	}

	fn insert_source(&mut self, name: &str, content: &str) -> Result<()> {
		let table = match content.parse::<toml::Table>() {
			Ok(table) => ConfigValue::parse_table(&table)?,
			Err(e) => {
				log::warn!("configuration source `{name}` is not valid TOML, using an empty one: {e}");
				ConfigTable::new()
			}
		};
		self.sources.insert(name.to_owned(), table);
		Ok(())
	}

	/// Returns the subtree of source `name`, or `None` if it was never loaded.
	pub fn source(&self, name: &str) -> Option<&ConfigTable> {
		self.sources.get(name)
	}

	/// Names of all loaded sources, sorted.
	pub fn source_names(&self) -> Vec<String> {
		self.sources.keys().cloned().collect()
	}

	pub fn is_empty(&self) -> bool {
		self.sources.is_empty()
	}
}
