use std::time::Duration;

use tarn_language::{Diagnostic, LineClassifications, SymbolTable};
use tarn_primitives::SourceId;

use crate::types::AnalysisKind;

/// Output of one completed analysis of one snapshot.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
	pub source_id: SourceId,
	pub snapshot_version: u64,
	pub kind: AnalysisKind,
	/// Ordered by start position.
	pub diagnostics: Vec<Diagnostic>,
	pub classifications: LineClassifications,
	/// Empty for lexical results.
	pub symbols: SymbolTable,
	pub elapsed: Duration,
}

impl AnalysisResult {
	/// Publication order key.
	pub fn rank(&self) -> (u64, AnalysisKind) {
		(self.snapshot_version, self.kind)
	}

	pub fn error_count(&self) -> usize {
		self.diagnostics.iter().filter(|d| d.is_error()).count()
	}
}
