use std::borrow::Cow;

use ropey::{Rope, RopeSlice};

use crate::SourceId;
use crate::rope::line_text;

/// Immutable, versioned view of a document's content at one point in time.
///
/// Cloning is cheap: the rope shares its chunks, so analysis tasks and caches
/// can hold snapshots indefinitely without copying text or observing later
/// edits. Two snapshots are equal when they name the same source and version.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
	source_id: SourceId,
	version: u64,
	text: Rope,
}

impl DocumentSnapshot {
	/// Creates a snapshot of `text` at `version`.
	pub fn new(source_id: SourceId, version: u64, text: Rope) -> Self {
		Self { source_id, version, text }
	}

	/// Creates a snapshot from a string slice.
	pub fn from_text(source_id: SourceId, version: u64, text: &str) -> Self {
		Self::new(source_id, version, Rope::from_str(text))
	}

	pub fn source_id(&self) -> SourceId {
		self.source_id
	}

	pub fn version(&self) -> u64 {
		self.version
	}

	/// Returns the full text.
	pub fn text(&self) -> RopeSlice<'_> {
		self.text.slice(..)
	}

	/// Returns the number of lines, including the empty line after a trailing newline.
	pub fn line_count(&self) -> usize {
		self.text.len_lines()
	}

	/// Returns the text of line `idx` without its terminator, or `None` past the end.
	pub fn line(&self, idx: usize) -> Option<Cow<'_, str>> {
		(idx < self.line_count()).then(|| line_text(self.text.line(idx)))
	}

	/// Iterates all lines without terminators.
	pub fn lines(&self) -> impl Iterator<Item = Cow<'_, str>> + '_ {
		self.text.lines().map(line_text)
	}
}

impl PartialEq for DocumentSnapshot {
	fn eq(&self, other: &Self) -> bool {
		self.source_id == other.source_id && self.version == other.version
	}
}

impl Eq for DocumentSnapshot {}
