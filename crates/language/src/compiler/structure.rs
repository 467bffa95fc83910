//! Bracket, indentation, and declaration checks over a scanned document.

use std::borrow::Cow;
use std::ops::Range;

use tarn_primitives::{LineCol, TextRange};

use super::symbols::{Symbol, SymbolId, SymbolKind, SymbolTable};
use crate::diagnostic::{Diagnostic, codes};
use crate::scanner::{LexedDocument, LineState, Token};
use crate::token::TokenKind;

/// Keywords that may precede a declaring keyword.
const MODIFIERS: &[&str] = &[
	"abstract",
	"final",
	"internal",
	"override",
	"partial",
	"private",
	"protected",
	"public",
	"static",
	"transient",
	"virtual",
];

pub(super) fn check(
	texts: &[Cow<'_, str>],
	lexed: &LexedDocument,
	tab_width: usize,
	diagnostics: &mut Vec<Diagnostic>,
	symbols: &mut SymbolTable,
) {
	let depth = check_brackets(texts, lexed, diagnostics);
	let mut blocks = BlockState::default();

	for (line, tokens) in lexed.lines.iter().enumerate() {
		// Lines starting inside a bracket, comment, or string continue the previous logical line.
		if lexed.entry_states[line] != LineState::Normal || depth[line] > 0 {
			continue;
		}
		let code: Vec<&Token> = tokens.iter().filter(|t| t.kind != TokenKind::Comment).collect();
		if code.is_empty() {
			continue;
		}
		let text = texts[line].as_ref();
		let (indent, indent_bytes) = measure_indent(text, tab_width);

		blocks.indent(line, indent, indent_bytes, diagnostics);
		blocks.close_scopes(indent, symbols);

		if let Some(decl) = declaration(text, &code) {
			blocks.declare(line, decl, text, &code, diagnostics, symbols);
		}

		let exit_state = lexed.entry_states.get(line + 1).copied().unwrap_or(lexed.end_state);
		let ends_with_colon = code.last().is_some_and(|t| t.kind == TokenKind::Delimiter && &text[t.span.clone()] == ":");
		if ends_with_colon && depth[line + 1] == 0 && exit_state == LineState::Normal {
			let colon = code.last().map_or(0..0, |t| t.span.clone());
			blocks.header = Some(TextRange::on_line(line, colon));
			blocks.open_body = blocks.declared_container.take();
		} else {
			blocks.declared_container = None;
		}
		blocks.last_logical = line;
	}

	blocks.finish(diagnostics, symbols);
}

/// Records bracket mismatches; returns the nesting depth at the start of each
/// line plus one trailing entry for the end of the document.
fn check_brackets(texts: &[Cow<'_, str>], lexed: &LexedDocument, diagnostics: &mut Vec<Diagnostic>) -> Vec<usize> {
	let mut stack: Vec<(u8, LineCol)> = Vec::new();
	let mut depth = Vec::with_capacity(lexed.lines.len() + 1);

	for (line, tokens) in lexed.lines.iter().enumerate() {
		depth.push(stack.len());
		let bytes = texts[line].as_bytes();
		for token in tokens.iter().filter(|t| t.kind == TokenKind::Delimiter) {
			let ch = bytes[token.span.start];
			let at = TextRange::on_line(line, token.span.clone());
			match ch {
				b'(' | b'[' | b'{' => stack.push((ch, at.start)),
				b')' | b']' | b'}' => match stack.last().copied() {
					None => diagnostics.push(Diagnostic::error(
						codes::UNMATCHED_BRACKET,
						at,
						format!("unmatched closing '{}'", ch as char),
					)),
					Some((open, _)) if closing(open) == ch => {
						stack.pop();
					}
					Some((open, pos)) => {
						stack.pop();
						diagnostics.push(Diagnostic::error(
							codes::MISMATCHED_BRACKET,
							at,
							format!(
								"'{}' does not close '{}' opened at {}:{}",
								ch as char,
								open as char,
								pos.line + 1,
								pos.col + 1
							),
						));
					}
				},
				_ => {}
			}
		}
	}
	depth.push(stack.len());

	for (open, pos) in stack {
		diagnostics.push(Diagnostic::error(
			codes::UNMATCHED_BRACKET,
			TextRange::on_line(pos.line, pos.col..pos.col + 1),
			format!("unclosed '{}'", open as char),
		));
	}
	depth
}

fn closing(open: u8) -> u8 {
	match open {
		b'(' => b')',
		b'[' => b']',
		_ => b'}',
	}
}

/// Returns the visual indentation width and its byte length.
fn measure_indent(text: &str, tab_width: usize) -> (usize, usize) {
	let mut width = 0;
	let mut bytes = 0;
	for b in text.bytes() {
		match b {
			b' ' => width += 1,
			b'\t' => width += tab_width - width % tab_width,
			_ => break,
		}
		bytes += 1;
	}
	(width, bytes)
}

struct Declaration {
	kind: SymbolKind,
	keyword: Range<usize>,
	/// Index into the line's code tokens of the first name token.
	name_at: usize,
}

fn declaration(text: &str, code: &[&Token]) -> Option<Declaration> {
	let mut idx = 0;
	while let Some(t) = code.get(idx)
		&& t.kind == TokenKind::Keyword
		&& MODIFIERS.contains(&&text[t.span.clone()])
	{
		idx += 1;
	}
	let keyword = code.get(idx).filter(|t| t.kind == TokenKind::Keyword)?;
	let kind = SymbolKind::from_keyword(&text[keyword.span.clone()])?;
	Some(Declaration {
		kind,
		keyword: keyword.span.clone(),
		name_at: idx + 1,
	})
}

/// Reads a (possibly dotted) name starting at `code[at]`.
fn read_name(text: &str, code: &[&Token], at: usize, qualified: bool) -> Option<Range<usize>> {
	let first = code.get(at).filter(|t| is_name(text, t))?;
	let mut span = first.span.clone();
	if qualified {
		let mut idx = at + 1;
		while let (Some(dot), Some(part)) = (code.get(idx), code.get(idx + 1))
			&& dot.span.start == span.end
			&& &text[dot.span.clone()] == "."
			&& part.span.start == dot.span.end
			&& is_name(text, part)
		{
			span.end = part.span.end;
			idx += 2;
		}
	}
	Some(span)
}

/// Identifiers, plus the contextual keywords that remain usable as names.
fn is_name(text: &str, token: &Token) -> bool {
	match token.kind {
		TokenKind::Identifier => true,
		TokenKind::Keyword => matches!(&text[token.span.clone()], "get" | "set" | "event" | "macro"),
		_ => false,
	}
}

#[derive(Default)]
struct BlockState {
	/// Open indentation levels; the base level 0 is implicit.
	levels: Vec<usize>,
	/// Colon of the last block header still waiting for its body.
	header: Option<TextRange>,
	/// Container declared on the current line.
	declared_container: Option<SymbolId>,
	/// Container whose body starts on the next logical line.
	open_body: Option<SymbolId>,
	/// Containers with open bodies and their header indentation.
	scopes: Vec<(usize, SymbolId)>,
	last_logical: usize,
}

impl BlockState {
	fn current(&self) -> usize {
		self.levels.last().copied().unwrap_or(0)
	}

	fn indent(&mut self, line: usize, indent: usize, indent_bytes: usize, diagnostics: &mut Vec<Diagnostic>) {
		let header = self.header.take();
		let open_body = self.open_body.take();
		let current = self.current();

		if indent > current {
			if header.is_none() {
				diagnostics.push(Diagnostic::error(
					codes::UNEXPECTED_INDENT,
					TextRange::on_line(line, 0..indent_bytes),
					"unexpected indentation",
				));
			}
			self.levels.push(indent);
			if let Some(id) = open_body {
				self.scopes.push((current, id));
			}
			return;
		}

		if let Some(colon) = header {
			diagnostics.push(Diagnostic::error(codes::EXPECTED_INDENTED_BLOCK, colon, "expected an indented block"));
		}
		if indent < current {
			while self.current() > indent {
				self.levels.pop();
			}
			if self.current() != indent {
				diagnostics.push(Diagnostic::error(
					codes::INCONSISTENT_DEDENT,
					TextRange::on_line(line, 0..indent_bytes),
					"dedent does not match any outer indentation level",
				));
				self.levels.push(indent);
			}
		}
	}

	/// Ends every scope whose header is at or deeper than `indent`.
	fn close_scopes(&mut self, indent: usize, symbols: &mut SymbolTable) {
		while let Some(&(header_indent, id)) = self.scopes.last()
			&& header_indent >= indent
		{
			symbols.close(id, self.last_logical);
			self.scopes.pop();
		}
	}

	fn declare(
		&mut self,
		line: usize,
		decl: Declaration,
		text: &str,
		code: &[&Token],
		diagnostics: &mut Vec<Diagnostic>,
		symbols: &mut SymbolTable,
	) {
		let Some(name) = read_name(text, code, decl.name_at, decl.kind.is_qualified()) else {
			diagnostics.push(Diagnostic::error(
				codes::EXPECTED_IDENTIFIER,
				TextRange::on_line(line, decl.keyword),
				format!("expected a name after '{}'", decl.kind.as_str()),
			));
			return;
		};

		let scope = self.scopes.last().map(|&(_, id)| id);
		let name_text = &text[name.clone()];
		let range = TextRange::on_line(line, name);
		if let Some(prev) = symbols.conflicting(scope, name_text, decl.kind) {
			diagnostics.push(Diagnostic::warning(
				codes::DUPLICATE_DECLARATION,
				range,
				format!("'{}' is already declared on line {}", name_text, prev.line() + 1),
			));
		}

		let id = symbols.push(Symbol {
			name: name_text.to_owned(),
			kind: decl.kind,
			range,
			scope,
			extent: line..=line,
		});
		if decl.kind.has_body() {
			self.declared_container = Some(id);
		}
	}

	fn finish(mut self, diagnostics: &mut Vec<Diagnostic>, symbols: &mut SymbolTable) {
		if let Some(colon) = self.header.take() {
			diagnostics.push(Diagnostic::error(codes::EXPECTED_INDENTED_BLOCK, colon, "expected an indented block"));
		}
		for (_, id) in self.scopes.drain(..).rev() {
			symbols.close(id, self.last_logical);
		}
	}
}
