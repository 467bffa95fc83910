//! Read-only query view over the latest analysis result of one document.

use std::ops::Range;
use std::sync::Arc;

use tarn_language::{Classification, Diagnostic, Symbol};
use tarn_primitives::SourceId;

use crate::result::AnalysisResult;
use crate::types::AnalysisKind;

/// Queries over the result that was current when the scope was created.
///
/// A scope never triggers or waits on analysis. It may be stale; compare
/// [`AuthoringScope::snapshot_version`] against the document's version.
#[derive(Debug, Clone)]
pub struct AuthoringScope {
	source_id: SourceId,
	result: Option<Arc<AnalysisResult>>,
}

impl AuthoringScope {
	pub(crate) fn new(source_id: SourceId, result: Option<Arc<AnalysisResult>>) -> Self {
		Self { source_id, result }
	}

	pub fn source_id(&self) -> SourceId {
		self.source_id
	}

	/// Returns the underlying result, if any analysis has completed.
	pub fn result(&self) -> Option<&AnalysisResult> {
		self.result.as_deref()
	}

	/// Version the result was computed for.
	pub fn snapshot_version(&self) -> Option<u64> {
		self.result.as_ref().map(|r| r.snapshot_version)
	}

	pub fn kind(&self) -> Option<AnalysisKind> {
		self.result.as_ref().map(|r| r.kind)
	}

	/// Returns true if the result is older than `current_version` or missing.
	pub fn is_stale(&self, current_version: u64) -> bool {
		self.snapshot_version().is_none_or(|v| v < current_version)
	}

	pub fn diagnostics(&self) -> &[Diagnostic] {
		self.result.as_ref().map(|r| r.diagnostics.as_slice()).unwrap_or_default()
	}

	/// Diagnostics whose range touches `line`.
	pub fn diagnostics_at(&self, line: usize) -> impl Iterator<Item = &Diagnostic> + '_ {
		self.diagnostics().iter().filter(move |d| d.range.touches_line(line))
	}

	/// Classified spans for each line in `lines` that has any.
	pub fn classification_for(&self, lines: Range<usize>) -> impl Iterator<Item = (usize, &[Classification])> + '_ {
		self.result
			.iter()
			.flat_map(move |r| r.classifications.range(lines.clone()))
			.map(|(&line, spans)| (line, spans.as_slice()))
	}

	/// All declarations in source order.
	pub fn declarations(&self) -> impl Iterator<Item = &Symbol> + '_ {
		self.result.iter().flat_map(|r| r.symbols.iter())
	}

	/// Declarations visible from `line`.
	pub fn declarations_in_scope(&self, line: usize) -> impl Iterator<Item = &Symbol> + '_ {
		self.result.iter().flat_map(move |r| r.symbols.visible_at(line))
	}

	pub fn find_declaration(&self, name: &str) -> Option<&Symbol> {
		self.result.as_ref().and_then(|r| r.symbols.find(name))
	}
}

#[cfg(test)]
mod tests {
	use tarn_primitives::DocumentSnapshot;

	use super::*;
	use crate::pipeline::{AnalysisEngine, Pipeline};

	fn scope_for(text: &str) -> AuthoringScope {
		let snap = DocumentSnapshot::from_text(SourceId(4), 2, text);
		let result = Pipeline::default().analyze(&snap, AnalysisKind::FullCheck).unwrap();
		AuthoringScope::new(SourceId(4), Some(Arc::new(result)))
	}

	#[test]
	fn empty_scope_answers_without_results() {
		let scope = AuthoringScope::new(SourceId(1), None);
		assert!(scope.is_stale(0));
		assert!(scope.diagnostics().is_empty());
		assert_eq!(scope.diagnostics_at(0).count(), 0);
		assert_eq!(scope.classification_for(0..10).count(), 0);
		assert_eq!(scope.declarations().count(), 0);
		assert!(scope.find_declaration("A").is_none());
	}

	#[test]
	fn line_queries() {
		let scope = scope_for("class A:\n\tdef f():\n\t\tx = (\n\ty = 1");
		assert_eq!(scope.snapshot_version(), Some(2));
		assert!(!scope.is_stale(2));
		assert!(scope.is_stale(3));
		assert_eq!(scope.diagnostics_at(2).map(|d| d.code).collect::<Vec<_>>(), vec!["BC0101"]);
		assert_eq!(scope.diagnostics_at(0).count(), 0);
		let lines: Vec<usize> = scope.classification_for(1..3).map(|(l, _)| l).collect();
		assert_eq!(lines, vec![1, 2]);
	}

	#[test]
	fn declaration_queries() {
		let scope = scope_for("class A:\n\tdef f():\n\t\tpass\ndef g():\n\tpass");
		assert_eq!(scope.declarations().count(), 3);
		assert_eq!(scope.find_declaration("f").map(|s| s.line()), Some(1));
		let visible: Vec<&str> = scope.declarations_in_scope(4).map(|s| s.name.as_str()).collect();
		assert_eq!(visible, vec!["A", "g"]);
		let inside: Vec<&str> = scope.declarations_in_scope(2).map(|s| s.name.as_str()).collect();
		assert_eq!(inside, vec!["A", "f", "g"]);
	}
}
