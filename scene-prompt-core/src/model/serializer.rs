/// Separator placed between tags in a prompt.
pub const SEPARATOR: &str = ", ";

/// Joins tags (or already joined fragments) into one prompt string.
///
/// Every piece is first split on the separator, so a fragment like
/// `"red dress, "` contributes only `"red dress"`. Empty and whitespace-only
/// entries are skipped, then any `", ,"` left is collapsed to `","`.
/// The result is normalized: splitting it on `", "` and joining again gives
/// the same string.
///
/// Example: `["close-up", "", "smiling, , red dress"]` →
/// `"close-up, smiling, red dress"`
pub fn stringify<I, S>(tags: I) -> String
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	let mut prompt = tags
		.into_iter()
		.flat_map(|tag| {
			tag.as_ref()
				.split(SEPARATOR)
				.filter(|entry| !entry.trim().is_empty())
				.map(str::to_owned)
				.collect::<Vec<_>>()
		})
		.collect::<Vec<_>>()
		.join(SEPARATOR);

	while prompt.contains(", ,") {
		prompt = prompt.replace(", ,", ",");
	}
	prompt
}
