//! Per-document request state machine.
//!
//! Each open document cycles `Idle → Pending → Running → Idle`:
//! - single-flight per document (at most one running analysis)
//! - newer requests coalesce into one pending slot per document
//! - global permit cap on full checks (one unless the engine is reentrant)
//! - oldest pending request first, one unit of work per tick
//! - superseded work runs to completion and its result is discarded

use std::sync::Arc;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use tarn_primitives::{DocumentSnapshot, SourceId};
use tokio::sync::Semaphore;

use crate::cache::{PublishOutcome, ResultCache};
use crate::config::ServiceConfig;
use crate::error::PipelineFault;
use crate::metrics::{AnalysisMetrics, Completion};
use crate::pipeline::AnalysisEngine;
use crate::result::AnalysisResult;
use crate::types::{AnalysisKind, AnalysisReason, AnalysisRequest, DocPhase, TaskId};

mod tasks;

use tasks::TaskCollector;

/// Scheduling knobs taken from [`ServiceConfig`].
#[derive(Debug, Clone, Copy)]
pub struct CoordinatorCfg {
	pub max_concurrent_full_checks: usize,
	pub lexical_inline: bool,
	pub idle_refresh: bool,
	pub refresh_delay: Duration,
}

impl Default for CoordinatorCfg {
	fn default() -> Self {
		Self::from(&ServiceConfig::default())
	}
}

impl From<&ServiceConfig> for CoordinatorCfg {
	fn from(cfg: &ServiceConfig) -> Self {
		Self {
			max_concurrent_full_checks: cfg.max_concurrent_full_checks,
			lexical_inline: cfg.lexical_inline,
			idle_refresh: cfg.idle_refresh,
			refresh_delay: cfg.refresh_delay(),
		}
	}
}

/// A unit of work started by a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatched {
	pub source_id: SourceId,
	pub version: u64,
	pub kind: AnalysisKind,
	/// Worker task, `None` when the analysis ran inline.
	pub task: Option<TaskId>,
}

/// Summary of one idle tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdleReport {
	/// The tick was not processed (scheduler not registered).
	pub ignored: bool,
	/// Finished analyses collected, including inline runs.
	pub completed: usize,
	pub published: usize,
	pub discarded: usize,
	pub faulted: usize,
	/// Idle-refresh requests recorded.
	pub refreshes: usize,
	/// Full checks skipped for lack of a compiler permit.
	pub throttled: usize,
	pub dispatched: Option<Dispatched>,
	/// Documents still pending after the tick.
	pub pending: usize,
	/// Analyses still running after the tick.
	pub running: usize,
}

impl IdleReport {
	pub(crate) fn ignored() -> Self {
		Self {
			ignored: true,
			..Self::default()
		}
	}
}

struct Pending {
	request: AnalysisRequest,
	/// Order in which the document became pending.
	seq: u64,
}

#[derive(Clone, Copy)]
struct Running {
	task: TaskId,
	version: u64,
}

struct DocSlot {
	/// Latest snapshot seen for the document.
	snapshot: DocumentSnapshot,
	pending: Option<Pending>,
	running: Option<Running>,
	last_change_at: Instant,
	/// Version of the last completed full check, successful or not.
	full_checked: Option<u64>,
	last_fault: Option<(u64, PipelineFault)>,
}

impl DocSlot {
	fn phase(&self) -> DocPhase {
		if self.running.is_some() {
			DocPhase::Running
		} else if self.pending.is_some() {
			DocPhase::Pending
		} else {
			DocPhase::Idle
		}
	}
}

/// Tracks pending and running analyses for every open document.
pub struct Coordinator {
	cfg: CoordinatorCfg,
	engine: Arc<dyn AnalysisEngine>,
	permits: Arc<Semaphore>,
	cache: Arc<ResultCache>,
	docs: FxHashMap<SourceId, DocSlot>,
	collector: TaskCollector,
	metrics: AnalysisMetrics,
	next_seq: u64,
}

impl Coordinator {
	pub fn new(cfg: CoordinatorCfg, engine: Arc<dyn AnalysisEngine>, cache: Arc<ResultCache>) -> Self {
		let permits = if engine.is_reentrant() {
			cfg.max_concurrent_full_checks.max(1)
		} else {
			1
		};
		Self {
			cfg,
			engine,
			permits: Arc::new(Semaphore::new(permits)),
			cache,
			docs: FxHashMap::default(),
			collector: TaskCollector::new(),
			metrics: AnalysisMetrics::new(),
			next_seq: 0,
		}
	}

	pub fn cache(&self) -> &Arc<ResultCache> {
		&self.cache
	}

	pub fn metrics(&self) -> &AnalysisMetrics {
		&self.metrics
	}

	/// Number of full checks allowed to run at once.
	pub fn full_check_permits(&self) -> usize {
		if self.engine.is_reentrant() {
			self.cfg.max_concurrent_full_checks.max(1)
		} else {
			1
		}
	}

	/// Creates the document's slot and its cache entry.
	pub fn open(&mut self, snapshot: DocumentSnapshot, now: Instant) {
		let source_id = snapshot.source_id();
		self.cache.open(source_id);
		self.docs.insert(
			source_id,
			DocSlot {
				snapshot,
				pending: None,
				running: None,
				last_change_at: now,
				full_checked: None,
				last_fault: None,
			},
		);
		tracing::debug!(source_id = %source_id, "analysis.open");
	}

	/// Removes the document. A running analysis finishes and its result is dropped.
	pub fn close(&mut self, source_id: SourceId) -> bool {
		let Some(slot) = self.docs.remove(&source_id) else {
			return false;
		};
		self.cache.remove(source_id);
		tracing::debug!(
			source_id = %source_id,
			running_version = ?slot.running.map(|r| r.version),
			"analysis.close"
		);
		true
	}

	pub fn is_open(&self, source_id: SourceId) -> bool {
		self.docs.contains_key(&source_id)
	}

	pub fn phase(&self, source_id: SourceId) -> Option<DocPhase> {
		self.docs.get(&source_id).map(DocSlot::phase)
	}

	pub fn pending_request(&self, source_id: SourceId) -> Option<AnalysisRequest> {
		self.docs.get(&source_id)?.pending.as_ref().map(|p| p.request)
	}

	/// Most recent analysis fault for a document and the version it hit.
	pub fn last_fault(&self, source_id: SourceId) -> Option<(u64, PipelineFault)> {
		self.docs.get(&source_id)?.last_fault.clone()
	}

	pub fn pending_count(&self) -> usize {
		self.docs.values().filter(|d| d.pending.is_some()).count()
	}

	pub fn running_count(&self) -> usize {
		self.collector.len()
	}

	/// Returns true if a tick would find pending or finished work.
	pub fn has_work(&self) -> bool {
		self.docs.values().any(|d| d.pending.is_some()) || self.collector.any_finished()
	}

	pub(crate) fn any_task_finished(&self) -> bool {
		self.collector.any_finished()
	}

	/// Records a request for `snapshot`, coalescing into the pending slot.
	///
	/// With inline lexical mode, an edit's lexical pass runs and publishes here.
	/// Returns false if the document is not open or the request is already
	/// covered: the cache holds its `(version, kind)` or a full check of that
	/// version is running.
	pub fn request(&mut self, snapshot: DocumentSnapshot, reason: AnalysisReason, now: Instant) -> bool {
		let source_id = snapshot.source_id();
		let request = AnalysisRequest::new(source_id, snapshot.version(), reason);
		let inline = self.cfg.lexical_inline && request.kind == AnalysisKind::LexicalOnly;

		let Some(slot) = self.docs.get_mut(&source_id) else {
			tracing::warn!(source_id = %source_id, reason = reason.as_str(), "analysis request for closed document");
			return false;
		};
		if snapshot.version() > slot.snapshot.version() {
			slot.snapshot = snapshot;
			slot.last_change_at = now;
		}

		let running_covers = request.kind == AnalysisKind::FullCheck
			&& slot.running.is_some_and(|r| r.version >= request.snapshot_version);
		if running_covers || self.cache.covers(source_id, request.snapshot_version, request.kind) {
			tracing::trace!(
				source_id = %source_id,
				version = request.snapshot_version,
				kind = request.kind.as_str(),
				reason = reason.as_str(),
				"analysis.request.covered"
			);
			return false;
		}

		if inline {
			// The inline pass covers any pending lexical request; a pending full check stays.
			match slot.pending.as_mut() {
				Some(p) if p.request.kind == AnalysisKind::FullCheck => p.request.coalesce(request),
				_ => slot.pending = None,
			}
			let snapshot = slot.snapshot.clone();
			let mut report = IdleReport::default();
			self.run_inline(snapshot, &mut report);
			return true;
		}

		match slot.pending.as_mut() {
			Some(p) => p.request.coalesce(request),
			None => {
				slot.pending = Some(Pending {
					request,
					seq: self.next_seq,
				});
				self.next_seq += 1;
			}
		}
		tracing::trace!(
			source_id = %source_id,
			version = request.snapshot_version,
			kind = request.kind.as_str(),
			reason = reason.as_str(),
			"analysis.request"
		);
		true
	}

	/// Runs one idle tick: collect, refresh (periodic only), dispatch one unit.
	pub fn tick(&mut self, now: Instant, periodic: bool) -> IdleReport {
		if !periodic && !self.has_work() {
			return IdleReport::default();
		}

		let mut report = IdleReport::default();
		self.collect(&mut report);
		if periodic && self.cfg.idle_refresh {
			self.schedule_refreshes(now, &mut report);
		}
		self.dispatch_next(None, &mut report);
		self.finish_report(&mut report);

		tracing::trace!(
			periodic,
			completed = report.completed,
			published = report.published,
			refreshes = report.refreshes,
			throttled = report.throttled,
			dispatched = ?report.dispatched.map(|d| (d.source_id.0, d.version, d.kind.as_str())),
			pending = report.pending,
			running = report.running,
			"analysis.tick"
		);
		report
	}

	/// Collects finished work without dispatching anything.
	pub fn collect_finished(&mut self) -> IdleReport {
		let mut report = IdleReport::default();
		self.collect(&mut report);
		self.finish_report(&mut report);
		report
	}

	/// Collects finished work and dispatches `source_id`'s pending request.
	///
	/// Used when idle ticks are unavailable and a trigger must act directly.
	pub fn pump(&mut self, source_id: SourceId) -> IdleReport {
		let mut report = IdleReport::default();
		self.collect(&mut report);
		self.dispatch_next(Some(source_id), &mut report);
		self.finish_report(&mut report);
		report
	}

	fn finish_report(&self, report: &mut IdleReport) {
		report.pending = self.pending_count();
		report.running = self.running_count();
	}

	fn collect(&mut self, report: &mut IdleReport) {
		for done in self.collector.drain_finished() {
			if let Some(slot) = self.docs.get_mut(&done.source_id)
				&& slot.running.is_some_and(|r| r.task == done.id)
			{
				slot.running = None;
			}
			self.complete(done.source_id, done.version, done.kind, done.result, done.elapsed, report);
		}
	}

	fn schedule_refreshes(&mut self, now: Instant, report: &mut IdleReport) {
		let mut due: Vec<(SourceId, DocumentSnapshot)> = self
			.docs
			.iter()
			.filter(|(_, slot)| {
				slot.pending.is_none()
					&& slot.running.is_none()
					&& slot.full_checked != Some(slot.snapshot.version())
					&& now.saturating_duration_since(slot.last_change_at) >= self.cfg.refresh_delay
			})
			.map(|(&id, slot)| (id, slot.snapshot.clone()))
			.collect();
		due.sort_by_key(|(id, _)| *id);

		for (_, snapshot) in due {
			if self.request(snapshot, AnalysisReason::IdleRefresh, now) {
				report.refreshes += 1;
			}
		}
	}

	/// Starts the oldest dispatchable request, or `only`'s request when given.
	fn dispatch_next(&mut self, only: Option<SourceId>, report: &mut IdleReport) {
		let mut candidates: Vec<(u64, SourceId)> = self
			.docs
			.iter()
			.filter(|(id, slot)| only.is_none_or(|o| o == **id) && slot.running.is_none())
			.filter_map(|(&id, slot)| slot.pending.as_ref().map(|p| (p.seq, id)))
			.collect();
		candidates.sort_unstable();

		for (_, source_id) in candidates {
			let Some(slot) = self.docs.get_mut(&source_id) else {
				continue;
			};
			let Some(kind) = slot.pending.as_ref().map(|p| p.request.kind) else {
				continue;
			};
			let snapshot = slot.snapshot.clone();
			let version = snapshot.version();
			if self.cache.covers(source_id, version, kind) {
				slot.pending = None;
				tracing::trace!(source_id = %source_id, version, kind = kind.as_str(), "analysis.covered");
				continue;
			}

			match kind {
				AnalysisKind::LexicalOnly => {
					slot.pending = None;
					report.dispatched = Some(Dispatched {
						source_id,
						version,
						kind,
						task: None,
					});
					self.run_inline(snapshot, report);
					return;
				}
				AnalysisKind::FullCheck => {
					let Some(task) = self.collector.spawn(&self.permits, self.engine.clone(), snapshot, kind) else {
						tracing::trace!(source_id = %source_id, version, "analysis.throttled");
						report.throttled += 1;
						self.metrics.record_throttled();
						continue;
					};
					slot.pending = None;
					slot.running = Some(Running { task, version });
					report.dispatched = Some(Dispatched {
						source_id,
						version,
						kind,
						task: Some(task),
					});
					tracing::debug!(source_id = %source_id, version, task = task.0, "analysis.spawned");
					return;
				}
			}
		}
	}

	fn run_inline(&mut self, snapshot: DocumentSnapshot, report: &mut IdleReport) {
		let t0 = Instant::now();
		let result = self.engine.analyze(&snapshot, AnalysisKind::LexicalOnly);
		self.complete(
			snapshot.source_id(),
			snapshot.version(),
			AnalysisKind::LexicalOnly,
			result,
			t0.elapsed(),
			report,
		);
	}

	fn complete(
		&mut self,
		source_id: SourceId,
		version: u64,
		kind: AnalysisKind,
		result: Result<AnalysisResult, PipelineFault>,
		elapsed: Duration,
		report: &mut IdleReport,
	) {
		report.completed += 1;
		if kind == AnalysisKind::FullCheck
			&& let Some(slot) = self.docs.get_mut(&source_id)
		{
			slot.full_checked = slot.full_checked.max(Some(version));
		}

		let completion = match result {
			Ok(result) => match self.cache.publish(result) {
				PublishOutcome::Published => {
					tracing::debug!(source_id = %source_id, version, kind = kind.as_str(), ?elapsed, "analysis.published");
					report.published += 1;
					Completion::Published
				}
				PublishOutcome::Superseded {
					cached_version,
					cached_kind,
				} => {
					tracing::debug!(
						source_id = %source_id,
						version,
						kind = kind.as_str(),
						cached_version,
						cached_kind = cached_kind.as_str(),
						"analysis.superseded"
					);
					report.discarded += 1;
					Completion::Discarded
				}
				PublishOutcome::Closed => {
					tracing::debug!(source_id = %source_id, version, "analysis result for closed document dropped");
					report.discarded += 1;
					Completion::Discarded
				}
			},
			Err(error) => {
				tracing::warn!(source_id = %source_id, version, kind = kind.as_str(), error = %error, "analysis fault; keeping previous result");
				if let Some(slot) = self.docs.get_mut(&source_id) {
					slot.last_fault = Some((version, error));
				}
				report.faulted += 1;
				Completion::Faulted
			}
		};
		self.metrics.record(kind, elapsed, completion);
	}
}

#[cfg(test)]
mod invariants;
