use pretty_assertions::assert_eq;
use tarn_primitives::{DocumentSnapshot, LineCol, SourceId, TextRange};

use super::*;
use crate::diagnostic::{Severity, codes};

fn compile(text: &str) -> CompileOutput {
	compile_with(StructuralCompiler::default(), text)
}

fn compile_with(compiler: StructuralCompiler, text: &str) -> CompileOutput {
	let snap = DocumentSnapshot::from_text(SourceId(1), 1, text);
	compiler.compile(&snap).expect("structural compile never faults")
}

fn codes_of(out: &CompileOutput) -> Vec<(&'static str, usize)> {
	out.diagnostics.iter().map(|d| (d.code, d.range.start.line)).collect()
}

const PROGRAM: &str = "namespace Demo
import System.IO

class Greeter:
	def greet(name as string):
		print \"hi ${name}\"

	def greet():
		pass

def main():
	Greeter().greet()
";

#[test]
fn well_formed_program_has_no_diagnostics() {
	let out = compile(PROGRAM);
	assert_eq!(out.diagnostics, vec![]);
}

#[test]
fn collects_declarations_with_scopes_and_extents() {
	let out = compile(PROGRAM);
	let decls: Vec<_> = out
		.symbols
		.iter()
		.map(|s| (s.name.as_str(), s.kind, s.scope, s.extent.clone()))
		.collect();
	let greeter = Some(SymbolId(2));
	assert_eq!(
		decls,
		vec![
			("Demo", SymbolKind::Namespace, None, 0..=0),
			("System.IO", SymbolKind::Import, None, 1..=1),
			("Greeter", SymbolKind::Class, None, 3..=8),
			("greet", SymbolKind::Method, greeter, 4..=5),
			("greet", SymbolKind::Method, greeter, 7..=8),
			("main", SymbolKind::Method, None, 10..=11),
		]
	);
	assert_eq!(out.symbols.find("Greeter").map(|s| s.range), Some(TextRange::on_line(3, 6..13)));
	assert_eq!(out.symbols.children(SymbolId(2)).count(), 2);
}

#[test]
fn visibility_follows_enclosing_extent() {
	let out = compile(PROGRAM);
	assert_eq!(out.symbols.visible_at(5).count(), 6);
	assert_eq!(out.symbols.visible_at(11).count(), 4);
}

#[test]
fn unclosed_bracket_reports_opener_and_skips_continuation() {
	let out = compile("x = (1 + 2\n      y = 3");
	assert_eq!(codes_of(&out), vec![(codes::UNMATCHED_BRACKET, 0)]);
	assert_eq!(out.diagnostics[0].range, TextRange::on_line(0, 4..5));
}

#[test]
fn mismatched_and_stray_closers() {
	let out = compile("x = (1]\ny = 2)");
	assert_eq!(
		codes_of(&out),
		vec![(codes::MISMATCHED_BRACKET, 0), (codes::UNMATCHED_BRACKET, 1)]
	);
	assert_eq!(out.diagnostics[0].range, TextRange::on_line(0, 6..7));
}

#[test]
fn header_without_body() {
	let out = compile("if x:\ny = 1");
	assert_eq!(codes_of(&out), vec![(codes::EXPECTED_INDENTED_BLOCK, 0)]);
	assert_eq!(out.diagnostics[0].range, TextRange::on_line(0, 4..5));

	let out = compile("def f():");
	assert_eq!(codes_of(&out), vec![(codes::EXPECTED_INDENTED_BLOCK, 0)]);
}

#[test]
fn unexpected_indent_and_bad_dedent() {
	let out = compile("x = 1\n\ty = 2");
	assert_eq!(codes_of(&out), vec![(codes::UNEXPECTED_INDENT, 1)]);
	assert_eq!(out.diagnostics[0].range, TextRange::on_line(1, 0..1));

	let out = compile("if a:\n        b\n    c");
	assert_eq!(codes_of(&out), vec![(codes::INCONSISTENT_DEDENT, 2)]);
}

#[test]
fn tab_width_controls_indent_comparison() {
	let src = "if a:\n\tb\n    c";
	assert_eq!(compile_with(StructuralCompiler::new(4), src).diagnostics, vec![]);
	let out = compile_with(StructuralCompiler::new(8), src);
	assert_eq!(codes_of(&out), vec![(codes::INCONSISTENT_DEDENT, 2)]);
}

#[test]
fn comments_and_bracket_continuations_are_not_logical_lines() {
	assert_eq!(compile("if a:\n# note\n\tb").diagnostics, vec![]);
	assert_eq!(compile("call(a,\n        b)\nx = 1").diagnostics, vec![]);
}

#[test]
fn missing_declaration_name() {
	let out = compile("class");
	assert_eq!(codes_of(&out), vec![(codes::EXPECTED_IDENTIFIER, 0)]);
	assert_eq!(out.diagnostics[0].range, TextRange::on_line(0, 0..5));
	assert!(out.symbols.is_empty());
}

#[test]
fn duplicate_types_warn_but_overloads_do_not() {
	let out = compile("class A:\n\tpass\nclass A:\n\tpass");
	assert_eq!(codes_of(&out), vec![(codes::DUPLICATE_DECLARATION, 2)]);
	assert_eq!(out.diagnostics[0].severity, Severity::Warning);
	assert_eq!(out.diagnostics[0].range, TextRange::on_line(2, 6..7));

	assert_eq!(compile("def f():\n\tpass\ndef f(x):\n\tpass").diagnostics, vec![]);
}

#[test]
fn modifiers_precede_declaring_keyword() {
	let out = compile("public static def Run():\n\tpass");
	assert_eq!(out.diagnostics, vec![]);
	let run = out.symbols.find("Run").expect("declared");
	assert_eq!(run.kind, SymbolKind::Method);
	assert_eq!(run.extent, 0..=1);
}

#[test]
fn lexical_errors_are_reported() {
	let out = compile("x = `");
	assert_eq!(codes_of(&out), vec![(codes::UNKNOWN_CHARACTER, 0)]);
	assert_eq!(out.diagnostics[0].message, "unknown character '`'");

	let out = compile("x = 1\n/* open");
	assert_eq!(codes_of(&out), vec![(codes::UNTERMINATED_COMMENT, 1)]);
	assert_eq!(out.diagnostics[0].range, TextRange::point(LineCol::new(1, 7)));

	let out = compile("s = 'abc");
	assert_eq!(codes_of(&out), vec![(codes::UNTERMINATED_STRING, 0)]);
}

#[test]
fn refinement_marks_declared_names() {
	let snap = DocumentSnapshot::from_text(SourceId(1), 1, PROGRAM);
	let out = StructuralCompiler::default().compile(&snap).expect("compile");
	let mut classes: LineClassifications = LexedDocument::scan(&snap).classifications().collect();
	refine_classifications(&snap, &mut classes, &out.symbols);

	let kinds = |line: usize| -> Vec<TokenKind> { classes[&line].iter().map(|c| c.kind).collect() };
	assert_eq!(
		kinds(11),
		vec![
			TokenKind::TypeName,
			TokenKind::Delimiter,
			TokenKind::Delimiter,
			TokenKind::Delimiter,
			TokenKind::Function,
			TokenKind::Delimiter,
			TokenKind::Delimiter,
		]
	);
	assert_eq!(classes[&4][1].kind, TokenKind::Function);
	assert_eq!(classes[&4].iter().filter(|c| c.kind == TokenKind::Identifier).count(), 2);
}

#[test]
fn structural_compiler_is_reentrant() {
	assert!(StructuralCompiler::default().is_reentrant());
	assert_eq!(StructuralCompiler::new(0).tab_width(), 1);
}
