//! Resumable line scanner.
//!
//! Lexing is total and line-oriented: every line is scanned from the
//! [`LineState`] carried out of the previous line, so any line boundary is a
//! valid restart point. Unrecognized input becomes [`TokenKind::Unknown`]
//! tokens rather than errors.

use std::ops::Range;

use logos::Logos;
use tarn_primitives::DocumentSnapshot;

use crate::lexer::{RawToken, quote_terminated};
use crate::token::{TokenKind, is_keyword};

mod cache;
mod color;

pub use cache::LineStateCache;
pub use color::{ColorScanner, TokenInfo};

/// Lexer state carried across a line boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineState {
	/// Not inside any multi-line construct.
	#[default]
	Normal,
	/// Inside a block comment; `depth` counts unclosed `/*` openers.
	BlockComment { depth: u16 },
	/// Inside a `"""` string.
	TripleString,
}

/// Lexical problem attached to a best-effort token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexIssue {
	/// Character sequence the lexer does not recognize.
	UnknownCharacter,
	/// Single-line string literal without a closing quote.
	UnterminatedString,
}

/// A token within one line; `span` is a byte range into the line text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
	pub span: Range<usize>,
	pub kind: TokenKind,
	pub issue: Option<LexIssue>,
}

impl Token {
	fn new(span: Range<usize>, kind: TokenKind) -> Self {
		Self { span, kind, issue: None }
	}
}

/// A token positioned in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedToken {
	pub line: usize,
	/// Byte columns within the line.
	pub columns: Range<usize>,
	pub kind: TokenKind,
	pub issue: Option<LexIssue>,
}

/// A classified span on one line, as stored in analysis results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
	pub columns: Range<usize>,
	pub kind: TokenKind,
}

/// Scans one line starting in `state`, returning its tokens and the state
/// carried into the next line.
pub fn scan_line(text: &str, mut state: LineState) -> (Vec<Token>, LineState) {
	let mut tokens = Vec::new();
	let mut pos = 0;
	while pos < text.len() {
		match state {
			LineState::BlockComment { depth } => {
				let (len, next) = scan_block_comment(&text[pos..], depth);
				tokens.push(Token::new(pos..pos + len, TokenKind::Comment));
				pos += len;
				state = next;
			}
			LineState::TripleString => match text[pos..].find(r#"""""#) {
				Some(idx) => {
					let end = pos + idx + 3;
					tokens.push(Token::new(pos..end, TokenKind::String));
					pos = end;
					state = LineState::Normal;
				}
				None => {
					tokens.push(Token::new(pos..text.len(), TokenKind::String));
					pos = text.len();
				}
			},
			LineState::Normal => {
				(pos, state) = scan_normal(text, pos, &mut tokens);
			}
		}
	}
	(tokens, state)
}

/// Returns only the state carried out of a line.
pub fn line_end_state(text: &str, state: LineState) -> LineState {
	scan_line(text, state).1
}

/// Scans a block comment body; `depth == 0` means `s` starts at the opener.
///
/// Returns the consumed byte length and the resulting state.
fn scan_block_comment(s: &str, mut depth: u16) -> (usize, LineState) {
	let bytes = s.as_bytes();
	let mut i = 0;
	while i < bytes.len() {
		match (bytes[i], bytes.get(i + 1)) {
			(b'/', Some(b'*')) => {
				depth = depth.saturating_add(1);
				i += 2;
			}
			(b'*', Some(b'/')) => {
				depth = depth.saturating_sub(1);
				i += 2;
				if depth == 0 {
					return (i, LineState::Normal);
				}
			}
			_ => i += 1,
		}
	}
	(bytes.len(), LineState::BlockComment { depth: depth.max(1) })
}

/// Lexes normal-state tokens from `start` until the line ends or a
/// multi-line construct begins.
fn scan_normal(text: &str, start: usize, tokens: &mut Vec<Token>) -> (usize, LineState) {
	let rest = &text[start..];
	let mut lexer = RawToken::lexer(rest);
	while let Some(raw) = lexer.next() {
		let span = lexer.span();
		let abs = start + span.start..start + span.end;
		let slice = lexer.slice();
		let token = match raw {
			Ok(RawToken::Ident) => {
				let kind = if is_keyword(slice) { TokenKind::Keyword } else { TokenKind::Identifier };
				Token::new(abs, kind)
			}
			Ok(RawToken::Number) => Token::new(abs, TokenKind::Number),
			Ok(RawToken::DoubleString) => string_token(abs, slice, '"'),
			Ok(RawToken::SingleString) => string_token(abs, slice, '\''),
			Ok(RawToken::LineComment) => Token::new(abs, TokenKind::Comment),
			Ok(RawToken::Operator) => Token::new(abs, TokenKind::Operator),
			Ok(RawToken::Delimiter) => Token::new(abs, TokenKind::Delimiter),
			Ok(RawToken::BlockCommentOpen) => return (abs.start, LineState::BlockComment { depth: 0 }),
			Ok(RawToken::TripleQuote) => {
				return match text[abs.end..].find(r#"""""#) {
					Some(idx) => {
						let end = abs.end + idx + 3;
						tokens.push(Token::new(abs.start..end, TokenKind::String));
						(end, LineState::Normal)
					}
					None => {
						tokens.push(Token::new(abs.start..text.len(), TokenKind::String));
						(text.len(), LineState::TripleString)
					}
				};
			}
			Err(()) => Token {
				span: abs,
				kind: TokenKind::Unknown,
				issue: Some(LexIssue::UnknownCharacter),
			},
		};
		tokens.push(token);
	}
	(text.len(), LineState::Normal)
}

fn string_token(span: Range<usize>, slice: &str, quote: char) -> Token {
	Token {
		span,
		kind: TokenKind::String,
		issue: (!quote_terminated(slice, quote)).then_some(LexIssue::UnterminatedString),
	}
}

/// Returns the state at the start of `line`, scanning from the top of the document.
pub fn state_at(snapshot: &DocumentSnapshot, line: usize) -> LineState {
	snapshot
		.lines()
		.take(line)
		.fold(LineState::Normal, |state, text| line_end_state(&text, state))
}

/// Lazily tokenizes lines `start_line..end_line` of a snapshot.
///
/// The start state is recomputed by scanning the preceding lines; use
/// [`tokenize_from`] with a cached state to avoid that.
pub fn tokenize(snapshot: &DocumentSnapshot, start_line: usize, end_line: usize) -> Tokens<'_> {
	let start_line = start_line.min(snapshot.line_count());
	tokenize_from(snapshot, start_line, end_line, state_at(snapshot, start_line))
}

/// Lazily tokenizes lines `start_line..end_line`, starting in `state`.
pub fn tokenize_from(snapshot: &DocumentSnapshot, start_line: usize, end_line: usize, state: LineState) -> Tokens<'_> {
	Tokens {
		snapshot,
		next_line: start_line,
		end_line: end_line.min(snapshot.line_count()),
		state,
		line: start_line,
		buffered: Vec::new().into_iter(),
	}
}

/// Lazy, finite token sequence over a line range.
///
/// Cloning yields an independent iterator that resumes from the same point.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
	snapshot: &'a DocumentSnapshot,
	next_line: usize,
	end_line: usize,
	state: LineState,
	line: usize,
	buffered: std::vec::IntoIter<Token>,
}

impl Tokens<'_> {
	/// State carried out of the most recently scanned line.
	pub fn state(&self) -> LineState {
		self.state
	}

	/// Index of the next line that will be scanned.
	pub fn next_line(&self) -> usize {
		self.next_line
	}
}

impl Iterator for Tokens<'_> {
	type Item = ClassifiedToken;

	fn next(&mut self) -> Option<Self::Item> {
		loop {
			if let Some(token) = self.buffered.next() {
				return Some(ClassifiedToken {
					line: self.line,
					columns: token.span,
					kind: token.kind,
					issue: token.issue,
				});
			}
			if self.next_line >= self.end_line {
				return None;
			}
			let text = self.snapshot.line(self.next_line)?;
			let (tokens, end) = scan_line(&text, self.state);
			self.state = end;
			self.line = self.next_line;
			self.next_line += 1;
			self.buffered = tokens.into_iter();
		}
	}
}

/// A fully scanned document: tokens per line plus the final lexer state.
#[derive(Debug, Clone)]
pub struct LexedDocument {
	pub lines: Vec<Vec<Token>>,
	/// State at the start of each line.
	pub entry_states: Vec<LineState>,
	/// State carried out of the last line.
	pub end_state: LineState,
}

impl LexedDocument {
	/// Scans every line of `snapshot`.
	pub fn scan(snapshot: &DocumentSnapshot) -> Self {
		let mut lines = Vec::with_capacity(snapshot.line_count());
		let mut entry_states = Vec::with_capacity(snapshot.line_count());
		let mut state = LineState::Normal;
		for text in snapshot.lines() {
			entry_states.push(state);
			let (tokens, end) = scan_line(&text, state);
			lines.push(tokens);
			state = end;
		}
		Self {
			lines,
			entry_states,
			end_state: state,
		}
	}

	/// Returns the classifications of every non-empty line, keyed by line.
	pub fn classifications(&self) -> impl Iterator<Item = (usize, Vec<Classification>)> + '_ {
		self.lines.iter().enumerate().filter(|(_, tokens)| !tokens.is_empty()).map(|(line, tokens)| {
			let spans = tokens
				.iter()
				.map(|t| Classification {
					columns: t.span.clone(),
					kind: t.kind,
				})
				.collect();
			(line, spans)
		})
	}
}
