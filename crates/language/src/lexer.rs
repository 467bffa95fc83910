//! Logos-based lexer for the normal (not-inside-comment/string) line state.
//!
//! Multi-line constructs are only *opened* here; the scanner tracks their
//! continuation across lines.

use logos::Logos;

/// Raw token recognized in the normal lexer state.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\f\r]+")]
pub(crate) enum RawToken {
	#[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
	Ident,

	#[regex(r"[0-9][0-9_]*(\.[0-9]+)?([eE][+-]?[0-9]+)?[LlFf]?")]
	#[regex(r"0[xX][0-9a-fA-F]+[Ll]?")]
	Number,

	/// Double-quoted string, possibly missing its closing quote.
	#[regex(r#""([^"\\]|\\.)*"?"#)]
	DoubleString,

	/// Single-quoted string, possibly missing its closing quote.
	#[regex(r"'([^'\\]|\\.)*'?")]
	SingleString,

	/// Opening `"""` of a string that may span lines.
	#[token("\"\"\"")]
	TripleQuote,

	#[regex(r"(#|//)[^\n]*")]
	LineComment,

	/// Opening `/*` of a (nestable) block comment.
	#[token("/*")]
	BlockCommentOpen,

	#[token("+")]
	#[token("-")]
	#[token("*")]
	#[token("/")]
	#[token("%")]
	#[token("=")]
	#[token("==")]
	#[token("!=")]
	#[token("<")]
	#[token(">")]
	#[token("<=")]
	#[token(">=")]
	#[token("+=")]
	#[token("-=")]
	#[token("*=")]
	#[token("/=")]
	#[token("**")]
	#[token("<<")]
	#[token(">>")]
	#[token("&")]
	#[token("|")]
	#[token("^")]
	#[token("~")]
	#[token("!")]
	#[token("=~")]
	#[token("&&")]
	#[token("||")]
	#[token("=>")]
	#[token("->")]
	#[token("++")]
	#[token("--")]
	#[token("?")]
	#[token("@")]
	#[token("$")]
	Operator,

	#[token("(")]
	#[token(")")]
	#[token("[")]
	#[token("]")]
	#[token("{")]
	#[token("}")]
	#[token(",")]
	#[token(":")]
	#[token(".")]
	#[token(";")]
	Delimiter,
}

/// Returns true if a quoted literal slice ends with its own (unescaped) closing quote.
pub(crate) fn quote_terminated(slice: &str, quote: char) -> bool {
	let mut chars = slice.chars();
	if chars.next() != Some(quote) {
		return false;
	}
	let mut escaped = false;
	let mut closed = false;
	for c in chars {
		if closed {
			return false;
		}
		match c {
			'\\' if !escaped => escaped = true,
			c if c == quote && !escaped => closed = true,
			_ => escaped = false,
		}
	}
	closed
}
