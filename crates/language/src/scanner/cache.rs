use tarn_primitives::DocumentSnapshot;

use super::{LineState, line_end_state};

/// Per-line entry states, so colorization can restart at any line without
/// rescanning the document from the top.
///
/// `entry[i]` is the lexer state at the start of line `i`; entry 0 is always
/// [`LineState::Normal`]. After an edit on line `n`, [`Self::invalidate_from`]
/// keeps entries `0..=n` (they depend only on earlier lines) and drops the rest.
#[derive(Debug, Clone)]
pub struct LineStateCache {
	entry: Vec<LineState>,
}

impl Default for LineStateCache {
	fn default() -> Self {
		Self::new()
	}
}

impl LineStateCache {
	pub fn new() -> Self {
		Self {
			entry: vec![LineState::Normal],
		}
	}

	/// Number of lines whose entry state is known.
	pub fn valid_lines(&self) -> usize {
		self.entry.len()
	}

	/// Returns the state at the start of `line`, scanning forward from the
	/// last cached line as needed. Lines past the end clamp to the state
	/// after the final line.
	pub fn state_at(&mut self, snapshot: &DocumentSnapshot, line: usize) -> LineState {
		let target = line.min(snapshot.line_count());
		while self.entry.len() <= target {
			let idx = self.entry.len() - 1;
			let state = self.entry[idx];
			let next = match snapshot.line(idx) {
				Some(text) => line_end_state(&text, state),
				None => state,
			};
			self.entry.push(next);
		}
		self.entry[target]
	}

	/// Drops cached states that may depend on `line`.
	pub fn invalidate_from(&mut self, line: usize) {
		self.entry.truncate(line.saturating_add(1).max(1));
	}
}
