//! Host-facing language service.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::Mutex;
use tarn_language::{
	ColorScanner, ColorableItem, Compiler, FORMAT_FILTER_LIST, LANGUAGE_NAME, LanguagePreferences, LineState,
	LineStateCache, StructuralCompiler, classification_kind, classification_kind_count,
};
use tarn_primitives::{Change, Document, DocumentSnapshot, SourceId, TextRange};

use crate::cache::ResultCache;
use crate::config::ServiceConfig;
use crate::coordinator::{Coordinator, CoordinatorCfg, IdleReport};
use crate::error::{PipelineFault, SchedulerRegistrationFault};
use crate::metrics::AnalysisMetrics;
use crate::pipeline::{AnalysisEngine, Pipeline};
use crate::scheduler::{ComponentId, ComponentRegistration, IdleFlags, IdleScheduler, SiteContext};
use crate::scope::AuthoringScope;
use crate::types::{AnalysisReason, DocPhase};

/// What the host hands over when it opens a document.
#[derive(Debug, Clone, Default)]
pub struct DocumentHandle {
	pub path: Option<PathBuf>,
	pub text: String,
}

impl DocumentHandle {
	pub fn new(text: impl Into<String>) -> Self {
		Self {
			path: None,
			text: text.into(),
		}
	}

	pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
		self.path = Some(path.into());
		self
	}
}

struct Inner {
	config: ServiceConfig,
	cache: Arc<ResultCache>,
	coordinator: Mutex<Coordinator>,
	scheduler: Mutex<IdleScheduler>,
	next_source: AtomicU64,
	preferences: OnceLock<LanguagePreferences>,
}

impl Inner {
	/// Records a request.
	///
	/// Without idle registration every request collects finished work, and
	/// explicit triggers also dispatch their document directly.
	fn request(&self, snapshot: DocumentSnapshot, reason: AnalysisReason) {
		let source_id = snapshot.source_id();
		let degraded = !self.scheduler.lock().is_registered();
		let mut coord = self.coordinator.lock();
		coord.request(snapshot, reason, Instant::now());
		if !degraded {
			return;
		}
		let report = if reason.is_explicit() {
			coord.pump(source_id)
		} else {
			coord.collect_finished()
		};
		tracing::debug!(
			source_id = %source_id,
			completed = report.completed,
			dispatched = report.dispatched.is_some(),
			"analysis.pump"
		);
	}
}

/// The language service: owns the scheduler, coordinator, and result cache.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct LanguageService {
	inner: Arc<Inner>,
}

impl Default for LanguageService {
	fn default() -> Self {
		Self::new(ServiceConfig::default())
	}
}

impl LanguageService {
	/// Creates a service backed by the structural compiler.
	pub fn new(config: ServiceConfig) -> Self {
		let compiler = StructuralCompiler::new(config.preferences.tab_size);
		Self::with_compiler(config, Arc::new(compiler))
	}

	pub fn with_compiler(config: ServiceConfig, compiler: Arc<dyn Compiler>) -> Self {
		Self::with_engine(config, Arc::new(Pipeline::new(compiler)))
	}

	pub fn with_engine(config: ServiceConfig, engine: Arc<dyn AnalysisEngine>) -> Self {
		let config = config.normalized();
		let cache = Arc::new(ResultCache::new());
		let coordinator = Coordinator::new(CoordinatorCfg::from(&config), engine, cache.clone());
		let scheduler = IdleScheduler::new(ComponentRegistration::from_config(&config));
		Self {
			inner: Arc::new(Inner {
				config,
				cache,
				coordinator: Mutex::new(coordinator),
				scheduler: Mutex::new(scheduler),
				next_source: AtomicU64::new(1),
				preferences: OnceLock::new(),
			}),
		}
	}

	pub fn config(&self) -> &ServiceConfig {
		&self.inner.config
	}

	/// Registers for idle notifications.
	///
	/// On failure the service keeps working degraded: idle ticks are ignored
	/// and saves or explicit checks dispatch work directly.
	pub fn start(&self, site: &dyn SiteContext) -> Result<ComponentId, SchedulerRegistrationFault> {
		self.inner.scheduler.lock().start(site).inspect_err(|e| {
			tracing::warn!(error = %e, "idle registration failed; running without idle scheduling");
		})
	}

	/// Revokes the idle registration. Safe to call repeatedly.
	pub fn stop(&self, site: &dyn SiteContext) {
		self.inner.scheduler.lock().stop(site);
	}

	pub fn component_id(&self) -> ComponentId {
		self.inner.scheduler.lock().component_id()
	}

	/// Handles one idle notification.
	pub fn on_idle(&self, periodic: bool) -> IdleReport {
		self.on_idle_at(periodic, Instant::now())
	}

	/// [`Self::on_idle`] with an explicit clock.
	pub fn on_idle_at(&self, periodic: bool, now: Instant) -> IdleReport {
		if !self.inner.scheduler.lock().is_registered() {
			return IdleReport::ignored();
		}
		self.inner.coordinator.lock().tick(now, periodic)
	}

	/// Handles an idle notification given as raw host flags.
	pub fn do_idle(&self, flags: IdleFlags) -> IdleReport {
		let accepted = self.inner.scheduler.lock().accept(flags);
		match accepted {
			Some(periodic) => self.inner.coordinator.lock().tick(Instant::now(), periodic),
			None => IdleReport::ignored(),
		}
	}

	/// Opens a document and queues its first lexical pass.
	pub fn create_source(&self, handle: DocumentHandle) -> Source {
		let source_id = SourceId(self.inner.next_source.fetch_add(1, Ordering::Relaxed));
		let document = Document::new(source_id, &handle.text);
		let snapshot = document.snapshot();
		{
			let mut coord = self.inner.coordinator.lock();
			coord.open(snapshot.clone(), Instant::now());
			coord.request(snapshot, AnalysisReason::Edit, Instant::now());
		}
		tracing::debug!(source_id = %source_id, path = ?handle.path, "source opened");
		Source {
			inner: self.inner.clone(),
			document,
			path: handle.path,
			line_states: LineStateCache::new(),
			closed: false,
		}
	}

	/// Requests analysis of the source's current text and returns the latest
	/// available results without waiting.
	pub fn request_analysis(&self, source: &Source, reason: AnalysisReason) -> AuthoringScope {
		self.inner.request(source.snapshot(), reason);
		self.scope(source.id())
	}

	/// Returns the latest results for a document without requesting anything.
	pub fn scope(&self, source_id: SourceId) -> AuthoringScope {
		AuthoringScope::new(source_id, self.inner.cache.latest(source_id))
	}

	/// Most recent analysis fault for a document and the version it hit.
	pub fn last_fault(&self, source_id: SourceId) -> Option<(u64, PipelineFault)> {
		self.inner.coordinator.lock().last_fault(source_id)
	}

	pub fn phase(&self, source_id: SourceId) -> Option<DocPhase> {
		self.inner.coordinator.lock().phase(source_id)
	}

	pub fn classification_kind_count(&self) -> usize {
		classification_kind_count()
	}

	pub fn classification_kind(&self, index: usize) -> Option<&'static ColorableItem> {
		classification_kind(index)
	}

	/// Creates a line colorizer for a source.
	pub fn create_scanner(&self, source: &Source) -> ColorScanner {
		tracing::trace!(source_id = %source.id(), "scanner created");
		ColorScanner::new()
	}

	pub fn name(&self) -> &'static str {
		LANGUAGE_NAME
	}

	pub fn format_filter_list(&self) -> &'static str {
		FORMAT_FILTER_LIST
	}

	/// Editing preferences, resolved once on first use.
	pub fn language_preferences(&self) -> &LanguagePreferences {
		self.inner
			.preferences
			.get_or_init(|| self.inner.config.preferences.clone().normalized())
	}

	/// Snapshot of analysis statistics.
	pub fn metrics(&self) -> AnalysisMetrics {
		self.inner.coordinator.lock().metrics().clone()
	}
}

/// One open document.
///
/// Dropping a source closes it.
pub struct Source {
	inner: Arc<Inner>,
	document: Document,
	path: Option<PathBuf>,
	line_states: LineStateCache,
	closed: bool,
}

impl Source {
	pub fn id(&self) -> SourceId {
		self.document.source_id()
	}

	pub fn version(&self) -> u64 {
		self.document.version()
	}

	pub fn path(&self) -> Option<&Path> {
		self.path.as_deref()
	}

	pub fn snapshot(&self) -> DocumentSnapshot {
		self.document.snapshot()
	}

	/// Replaces `range` with `text` and queues a lexical pass.
	pub fn edit(&mut self, range: TextRange, text: &str) -> DocumentSnapshot {
		self.apply(&[Change::replace(range, text)])
	}

	/// Applies several changes as one version and queues a lexical pass.
	/// Nothing is queued for an empty change set.
	pub fn apply(&mut self, changes: &[Change]) -> DocumentSnapshot {
		let Some(first) = changes.iter().map(|c| c.range.start.line).min() else {
			return self.snapshot();
		};
		self.line_states.invalidate_from(first);
		let snapshot = self.document.apply_all(changes);
		self.inner.request(snapshot.clone(), AnalysisReason::Edit);
		snapshot
	}

	/// Replaces the whole text and queues a lexical pass.
	pub fn set_text(&mut self, text: &str) -> DocumentSnapshot {
		self.line_states.invalidate_from(0);
		let snapshot = self.document.set_text(text);
		self.inner.request(snapshot.clone(), AnalysisReason::Edit);
		snapshot
	}

	/// Lexer state at the start of `line`, for hosts restarting a
	/// [`ColorScanner`] mid-document. Only lines after the last edit are
	/// rescanned.
	pub fn line_state(&mut self, line: usize) -> LineState {
		let snapshot = self.document.snapshot();
		self.line_states.state_at(&snapshot, line)
	}

	/// Queues a full check of the current text.
	pub fn save(&self) {
		self.inner.request(self.snapshot(), AnalysisReason::Save);
	}

	pub fn close(mut self) {
		self.close_inner();
	}

	fn close_inner(&mut self) {
		if std::mem::replace(&mut self.closed, true) {
			return;
		}
		self.inner.coordinator.lock().close(self.id());
		tracing::debug!(source_id = %self.id(), "source closed");
	}
}

impl Drop for Source {
	fn drop(&mut self) {
		self.close_inner();
	}
}
