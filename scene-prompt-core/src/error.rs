use thiserror::Error;

/// Errors raised while parsing configuration or generating a prompt.
///
/// Configuration that cannot be *loaded* (missing file, unreadable TOML) is not
/// an error: it degrades to an empty source. Everything below propagates
/// unrecovered to the caller of `PromptGenerator::generate`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PromptError {
	/// A configuration value has a shape the resolver cannot interpret.
	#[error("invalid configuration shape at `{path}`: {reason}")]
	ConfigShape { path: String, reason: String },

	/// A `name:weight` annotation whose weight is not a usable number.
	#[error("invalid weight in tag entry `{entry}`: {reason}")]
	Format { entry: String, reason: String },

	/// An override path (or input name) that does not resolve.
	#[error("lookup failed for `{path}`: {reason}")]
	Lookup { path: String, reason: String },
}

impl PromptError {
	pub(crate) fn shape(path: &str, reason: impl Into<String>) -> Self {
		Self::ConfigShape { path: path.to_owned(), reason: reason.into() }
	}

	pub(crate) fn format(entry: &str, reason: impl Into<String>) -> Self {
		Self::Format { entry: entry.to_owned(), reason: reason.into() }
	}

	pub(crate) fn lookup(path: &str, reason: impl Into<String>) -> Self {
		Self::Lookup { path: path.to_owned(), reason: reason.into() }
	}

	/// Prefixes the path of a shape error with the location it was raised in.
	pub(crate) fn within(self, prefix: &str) -> Self {
		match self {
			Self::ConfigShape { path, reason } if path.is_empty() => {
				Self::ConfigShape { path: prefix.to_owned(), reason }
			}
			Self::ConfigShape { path, reason } => Self::ConfigShape { path: format!("{prefix}.{path}"), reason },
			other => other,
		}
	}
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, PromptError>;
