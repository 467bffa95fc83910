use ropey::Rope;

use crate::range::{LineCol, TextRange};
use crate::rope::line_content_len;
use crate::{DocumentSnapshot, SourceId};

/// A single text change: replace `range` with `replacement` (or delete it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
	pub range: TextRange,
	pub replacement: Option<String>,
}

impl Change {
	pub fn insert(at: LineCol, text: impl Into<String>) -> Self {
		Self {
			range: TextRange::point(at),
			replacement: Some(text.into()),
		}
	}

	pub fn replace(range: TextRange, text: impl Into<String>) -> Self {
		Self {
			range,
			replacement: Some(text.into()),
		}
	}

	pub fn delete(range: TextRange) -> Self {
		Self { range, replacement: None }
	}
}

/// The editing surface's mutable buffer for one source.
///
/// Every content-changing operation bumps the version by one and returns the
/// resulting [`DocumentSnapshot`]. Positions past the end of a line or the
/// document are clamped.
#[derive(Debug, Clone)]
pub struct Document {
	source_id: SourceId,
	version: u64,
	text: Rope,
}

impl Document {
	/// Creates a document at version 0.
	pub fn new(source_id: SourceId, text: &str) -> Self {
		Self {
			source_id,
			version: 0,
			text: Rope::from_str(text),
		}
	}

	pub fn source_id(&self) -> SourceId {
		self.source_id
	}

	pub fn version(&self) -> u64 {
		self.version
	}

	/// Returns a snapshot of the current content.
	pub fn snapshot(&self) -> DocumentSnapshot {
		DocumentSnapshot::new(self.source_id, self.version, self.text.clone())
	}

	/// Applies one change and returns the new snapshot.
	pub fn apply(&mut self, change: &Change) -> DocumentSnapshot {
		self.apply_all(std::slice::from_ref(change))
	}

	/// Applies changes in order, each against the result of the previous one,
	/// as a single version bump. An empty change set leaves the version alone.
	pub fn apply_all(&mut self, changes: &[Change]) -> DocumentSnapshot {
		if changes.is_empty() {
			return self.snapshot();
		}
		for change in changes {
			let start = self.char_at(change.range.start);
			let end = self.char_at(change.range.end).max(start);
			if end > start {
				self.text.remove(start..end);
			}
			if let Some(text) = change.replacement.as_deref()
				&& !text.is_empty()
			{
				self.text.insert(start, text);
			}
		}
		self.bump()
	}

	/// Replaces the whole content.
	pub fn set_text(&mut self, text: &str) -> DocumentSnapshot {
		self.text = Rope::from_str(text);
		self.bump()
	}

	fn bump(&mut self) -> DocumentSnapshot {
		self.version += 1;
		self.snapshot()
	}

	/// Converts a clamped line/column position to a char index.
	fn char_at(&self, pos: LineCol) -> usize {
		let last_line = self.text.len_lines() - 1;
		if pos.line > last_line {
			return self.text.len_chars();
		}
		let line_start = self.text.line_to_byte(pos.line);
		let col = pos.col.min(line_content_len(self.text.line(pos.line)));
		self.text.byte_to_char(line_start + col)
	}
}
