use std::ops::Range;

/// A position in a document: zero-based line and byte column within that line.
///
/// Columns are UTF-8 byte offsets into the line text, excluding the line
/// terminator. Field order makes the derived ordering document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LineCol {
	/// Zero-based line index.
	pub line: usize,
	/// Byte column within the line.
	pub col: usize,
}

impl LineCol {
	/// Creates a position from line and column.
	pub const fn new(line: usize, col: usize) -> Self {
		Self { line, col }
	}
}

/// A half-open text range `[start, end)` expressed in line/column positions.
///
/// Constructors normalize so that `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TextRange {
	pub start: LineCol,
	pub end: LineCol,
}

impl TextRange {
	/// Creates a range, swapping the endpoints if they are reversed.
	pub fn new(a: LineCol, b: LineCol) -> Self {
		if b < a { Self { start: b, end: a } } else { Self { start: a, end: b } }
	}

	/// Creates a zero-width range at a position.
	pub fn point(at: LineCol) -> Self {
		Self { start: at, end: at }
	}

	/// Creates a range covering `cols` on a single line.
	pub fn on_line(line: usize, cols: Range<usize>) -> Self {
		Self::new(LineCol::new(line, cols.start), LineCol::new(line, cols.end))
	}

	/// Returns true if the range starts and ends at the same position.
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.start == self.end
	}

	/// Returns true if any part of the range lies on `line`.
	///
	/// A range ending at column 0 of a line does not touch that line unless it
	/// is also empty there.
	pub fn touches_line(&self, line: usize) -> bool {
		if line < self.start.line || line > self.end.line {
			return false;
		}
		if line == self.end.line && self.end.col == 0 && self.start.line < line {
			return false;
		}
		true
	}

	/// Returns the inclusive line span of this range.
	pub fn lines(&self) -> std::ops::RangeInclusive<usize> {
		self.start.line..=self.end.line
	}
}
