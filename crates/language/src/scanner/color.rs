use std::ops::Range;

use super::{LineState, Token, scan_line};
use crate::token::TokenKind;

/// Token reported to a line colorizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
	/// Byte range within the source passed to [`ColorScanner::set_source`].
	pub span: Range<usize>,
	pub kind: TokenKind,
	/// Index into the colorable-item table.
	pub color: usize,
}

/// Line-by-line colorizer used by hosts independently of full analysis.
///
/// Protocol: call [`Self::set_source`] with a line, then [`Self::scan_token`]
/// until it returns `None`. The caller owns the [`LineState`] and passes the
/// state from the previous line in; after the line is exhausted it holds the
/// state to feed into the next line.
#[derive(Debug, Default)]
pub struct ColorScanner {
	source: String,
	offset: usize,
	pending: Option<std::vec::IntoIter<Token>>,
}

impl ColorScanner {
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the line to scan, starting at byte `offset`.
	pub fn set_source(&mut self, line: &str, offset: usize) {
		self.source.clear();
		self.source.push_str(line);
		self.offset = offset.min(self.source.len());
		while !self.source.is_char_boundary(self.offset) {
			self.offset -= 1;
		}
		self.pending = None;
	}

	/// Returns the next token of the current line, updating `state`.
	pub fn scan_token(&mut self, state: &mut LineState) -> Option<TokenInfo> {
		let offset = self.offset;
		let tokens = self.pending.get_or_insert_with(|| {
			let (tokens, end) = scan_line(&self.source[offset..], *state);
			*state = end;
			tokens.into_iter()
		});
		let token = tokens.next()?;
		Some(TokenInfo {
			span: token.span.start + offset..token.span.end + offset,
			kind: token.kind,
			color: token.kind.index(),
		})
	}
}
