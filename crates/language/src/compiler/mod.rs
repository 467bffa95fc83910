//! Compiler seam and the structural compiler for Boo sources.
//!
//! The analysis core treats [`Compiler`] as opaque. [`StructuralCompiler`] is
//! the implementation shipped with the workspace: it runs the scanner, then
//! checks block structure and collects declarations. It does no type checking.

use std::borrow::Cow;
use std::collections::BTreeMap;

use rustc_hash::FxHashSet;
use tarn_primitives::{DocumentSnapshot, SourceId};
use thiserror::Error;

use crate::diagnostic::Diagnostic;
use crate::scanner::{Classification, LexedDocument};
use crate::token::TokenKind;

mod lexical;
mod structure;
mod symbols;

pub use lexical::lexical_diagnostics;
pub use symbols::{Symbol, SymbolId, SymbolKind, SymbolTable};

/// Classified spans keyed by line.
pub type LineClassifications = BTreeMap<usize, Vec<Classification>>;

/// Output of one compile.
#[derive(Debug, Clone, Default)]
pub struct CompileOutput {
	pub diagnostics: Vec<Diagnostic>,
	pub symbols: SymbolTable,
}

/// Catastrophic compiler failure.
///
/// Ordinary source errors are diagnostics, not faults.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileFault {
	#[error("compiler rejected {source_id}: {message}")]
	Rejected { source_id: SourceId, message: String },
	#[error("internal compiler error: {0}")]
	Internal(String),
}

/// An opaque full-analysis pipeline.
pub trait Compiler: Send + Sync {
	/// Compiles one snapshot. Must be called from a worker context.
	fn compile(&self, snapshot: &DocumentSnapshot) -> Result<CompileOutput, CompileFault>;

	/// Returns true if concurrent `compile` calls are safe.
	fn is_reentrant(&self) -> bool {
		false
	}
}

/// Block-structure and declaration checker.
#[derive(Debug, Clone, Copy)]
pub struct StructuralCompiler {
	tab_width: usize,
}

impl Default for StructuralCompiler {
	fn default() -> Self {
		Self::new(4)
	}
}

impl StructuralCompiler {
	/// Creates a compiler measuring tabs as `tab_width` columns.
	pub fn new(tab_width: usize) -> Self {
		Self {
			tab_width: tab_width.max(1),
		}
	}

	pub fn tab_width(&self) -> usize {
		self.tab_width
	}
}

impl Compiler for StructuralCompiler {
	fn compile(&self, snapshot: &DocumentSnapshot) -> Result<CompileOutput, CompileFault> {
		let lexed = LexedDocument::scan(snapshot);
		let texts: Vec<Cow<'_, str>> = snapshot.lines().collect();

		let mut diagnostics = lexical_diagnostics(snapshot, &lexed);
		let mut symbols = SymbolTable::default();
		structure::check(&texts, &lexed, self.tab_width, &mut diagnostics, &mut symbols);
		diagnostics.sort_by_key(|d| d.range.start);

		tracing::trace!(
			source_id = %snapshot.source_id(),
			version = snapshot.version(),
			diagnostics = diagnostics.len(),
			symbols = symbols.len(),
			"structural compile finished"
		);
		Ok(CompileOutput { diagnostics, symbols })
	}

	fn is_reentrant(&self) -> bool {
		true
	}
}

/// Reclassifies identifiers that name declared types or methods.
pub fn refine_classifications(snapshot: &DocumentSnapshot, classifications: &mut LineClassifications, symbols: &SymbolTable) {
	let mut types = FxHashSet::default();
	let mut methods = FxHashSet::default();
	for sym in symbols.iter() {
		if sym.kind.is_type() {
			types.insert(sym.name.as_str());
		} else if sym.kind == SymbolKind::Method {
			methods.insert(sym.name.as_str());
		}
	}
	if types.is_empty() && methods.is_empty() {
		return;
	}

	for (&line, spans) in classifications.iter_mut() {
		let Some(text) = snapshot.line(line) else {
			continue;
		};
		for span in spans.iter_mut().filter(|s| s.kind == TokenKind::Identifier) {
			let Some(word) = text.get(span.columns.clone()) else {
				continue;
			};
			if types.contains(word) {
				span.kind = TokenKind::TypeName;
			} else if methods.contains(word) {
				span.kind = TokenKind::Function;
			}
		}
	}
}

#[cfg(test)]
mod tests;
