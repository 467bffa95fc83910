use tarn_primitives::{DocumentSnapshot, LineCol, TextRange};

use crate::diagnostic::{Diagnostic, codes};
use crate::scanner::{LexIssue, LexedDocument, LineState};

/// Diagnostics the scanner alone can report.
///
/// Covers unknown characters, unterminated single-line strings, and
/// multi-line constructs still open at the end of the document.
pub fn lexical_diagnostics(snapshot: &DocumentSnapshot, lexed: &LexedDocument) -> Vec<Diagnostic> {
	let mut out = Vec::new();
	for (line, tokens) in lexed.lines.iter().enumerate() {
		for token in tokens {
			let Some(issue) = token.issue else {
				continue;
			};
			let range = TextRange::on_line(line, token.span.clone());
			out.push(match issue {
				LexIssue::UnknownCharacter => {
					let text = snapshot.line(line).unwrap_or_default();
					let ch = text.get(token.span.clone()).unwrap_or("?");
					Diagnostic::error(codes::UNKNOWN_CHARACTER, range, format!("unknown character '{ch}'"))
				}
				LexIssue::UnterminatedString => {
					Diagnostic::error(codes::UNTERMINATED_STRING, range, "unterminated string literal")
				}
			});
		}
	}

	let (code, message) = match lexed.end_state {
		LineState::Normal => return out,
		LineState::BlockComment { .. } => (codes::UNTERMINATED_COMMENT, "unterminated block comment"),
		LineState::TripleString => (codes::UNTERMINATED_TRIPLE_STRING, "unterminated triple-quoted string"),
	};
	let last = snapshot.line_count().saturating_sub(1);
	let col = snapshot.line(last).map_or(0, |t| t.len());
	out.push(Diagnostic::error(code, TextRange::point(LineCol::new(last, col)), message));
	out
}
