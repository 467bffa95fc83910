//! Analysis pipeline: scanner plus the opaque compiler.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Instant;

use tarn_language::{
	Compiler, LexedDocument, LineClassifications, StructuralCompiler, SymbolTable, lexical_diagnostics,
	refine_classifications,
};
use tarn_primitives::DocumentSnapshot;

use crate::error::PipelineFault;
use crate::result::AnalysisResult;
use crate::types::AnalysisKind;

/// Produces analysis results for snapshots (mockable for tests).
pub trait AnalysisEngine: Send + Sync {
	fn analyze(&self, snapshot: &DocumentSnapshot, kind: AnalysisKind) -> Result<AnalysisResult, PipelineFault>;

	/// Returns true if concurrent `FullCheck` runs are safe.
	fn is_reentrant(&self) -> bool {
		false
	}
}

/// The production engine: scanner for lexical passes, compiler for full checks.
pub struct Pipeline {
	compiler: Arc<dyn Compiler>,
}

impl Default for Pipeline {
	fn default() -> Self {
		Self::new(Arc::new(StructuralCompiler::default()))
	}
}

impl Pipeline {
	pub fn new(compiler: Arc<dyn Compiler>) -> Self {
		Self { compiler }
	}

	fn run(&self, snapshot: &DocumentSnapshot, kind: AnalysisKind) -> Result<AnalysisResult, PipelineFault> {
		let t0 = Instant::now();
		let lexed = LexedDocument::scan(snapshot);
		let mut classifications: LineClassifications = lexed.classifications().collect();

		let (diagnostics, symbols) = match kind {
			AnalysisKind::LexicalOnly => (lexical_diagnostics(snapshot, &lexed), SymbolTable::default()),
			AnalysisKind::FullCheck => {
				let output = self.compiler.compile(snapshot)?;
				refine_classifications(snapshot, &mut classifications, &output.symbols);
				(output.diagnostics, output.symbols)
			}
		};

		Ok(AnalysisResult {
			source_id: snapshot.source_id(),
			snapshot_version: snapshot.version(),
			kind,
			diagnostics,
			classifications,
			symbols,
			elapsed: t0.elapsed(),
		})
	}
}

impl AnalysisEngine for Pipeline {
	fn analyze(&self, snapshot: &DocumentSnapshot, kind: AnalysisKind) -> Result<AnalysisResult, PipelineFault> {
		catch_unwind(AssertUnwindSafe(|| self.run(snapshot, kind)))
			.unwrap_or_else(|payload| Err(PipelineFault::Panicked(panic_message(payload.as_ref()))))
	}

	fn is_reentrant(&self) -> bool {
		self.compiler.is_reentrant()
	}
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(s) = payload.downcast_ref::<&str>() {
		(*s).to_owned()
	} else if let Some(s) = payload.downcast_ref::<String>() {
		s.clone()
	} else {
		"non-string panic payload".to_owned()
	}
}
