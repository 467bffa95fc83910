//! Language metadata and user-facing editing preferences.

use std::path::Path;

use serde::Deserialize;

/// Display name of the language.
pub const LANGUAGE_NAME: &str = "Boo";

/// Open-file dialog filter in `description|pattern` form.
pub const FORMAT_FILTER_LIST: &str = "Boo files(*.boo)|*.boo";

/// File extensions associated with the language.
pub const EXTENSIONS: &[&str] = &["boo"];

/// Returns true if `path` has a language extension.
pub fn matches_path(path: &Path) -> bool {
	path.extension()
		.and_then(|e| e.to_str())
		.is_some_and(|ext| EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
}

/// Editing preferences a host applies to language buffers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LanguagePreferences {
	/// Display width of a tab character.
	pub tab_size: usize,
	/// Columns per indentation level.
	pub indent_size: usize,
	/// Indent with tabs instead of spaces.
	pub insert_tabs: bool,
	/// Highlight the bracket matching the one at the cursor.
	pub match_braces: bool,
	/// Colorize using the scanner.
	pub colorize: bool,
}

impl Default for LanguagePreferences {
	fn default() -> Self {
		Self {
			tab_size: 4,
			indent_size: 4,
			insert_tabs: true,
			match_braces: true,
			colorize: true,
		}
	}
}

impl LanguagePreferences {
	/// Clamps sizes to at least one column.
	pub fn normalized(mut self) -> Self {
		self.tab_size = self.tab_size.max(1);
		self.indent_size = self.indent_size.max(1);
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn recognizes_language_paths() {
		assert!(matches_path(Path::new("src/main.boo")));
		assert!(matches_path(Path::new("SHOUT.BOO")));
		assert!(!matches_path(Path::new("main.py")));
		assert!(!matches_path(Path::new("boo")));
	}

	#[test]
	fn normalized_clamps_zero_sizes() {
		let prefs = LanguagePreferences {
			tab_size: 0,
			indent_size: 0,
			..Default::default()
		}
		.normalized();
		assert_eq!((prefs.tab_size, prefs.indent_size), (1, 1));
	}
}
