use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::Notify;
use tokio::time::{sleep, timeout};

use super::*;

/// What [`MockEngine`] returns from a full check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MockOutcome {
	Ok,
	Fault,
	Panic,
}

/// Mock analysis engine whose full checks block until explicitly released.
///
/// Lexical passes run straight through since they execute on the caller's
/// thread. Full checks wait on a [`Notify`] barrier so tests control when
/// worker tasks finish.
pub(crate) struct MockEngine {
	pub(crate) full_count: AtomicUsize,
	pub(crate) max_active_per_doc: AtomicUsize,
	pub(crate) analyzed: Mutex<Vec<(SourceId, u64, AnalysisKind)>>,
	pub(crate) outcome: Mutex<MockOutcome>,
	pub(crate) notify: Arc<Notify>,
	reentrant: bool,
	active: Mutex<FxHashMap<SourceId, usize>>,
}

impl MockEngine {
	pub(crate) fn new() -> Self {
		Self::with_reentrancy(false)
	}

	pub(crate) fn with_reentrancy(reentrant: bool) -> Self {
		Self {
			full_count: AtomicUsize::new(0),
			max_active_per_doc: AtomicUsize::new(0),
			analyzed: Mutex::new(Vec::new()),
			outcome: Mutex::new(MockOutcome::Ok),
			notify: Arc::new(Notify::new()),
			reentrant,
			active: Mutex::new(FxHashMap::default()),
		}
	}

	pub(crate) fn set_outcome(&self, outcome: MockOutcome) {
		*self.outcome.lock() = outcome;
	}

	/// Allows one pending full check to proceed.
	pub(crate) fn proceed(&self) {
		self.notify.notify_one();
	}

	/// Allows all pending full checks to proceed immediately.
	pub(crate) fn proceed_all(&self) {
		for _ in 0..100 {
			self.notify.notify_one();
		}
	}

	pub(crate) fn analyzed(&self) -> Vec<(SourceId, u64, AnalysisKind)> {
		self.analyzed.lock().clone()
	}
}

impl AnalysisEngine for MockEngine {
	fn analyze(&self, snapshot: &DocumentSnapshot, kind: AnalysisKind) -> Result<AnalysisResult, PipelineFault> {
		let source_id = snapshot.source_id();
		self.analyzed.lock().push((source_id, snapshot.version(), kind));

		if kind == AnalysisKind::FullCheck {
			self.full_count.fetch_add(1, Ordering::SeqCst);
			let active = {
				let mut map = self.active.lock();
				let n = map.entry(source_id).or_default();
				*n += 1;
				*n
			};
			self.max_active_per_doc.fetch_max(active, Ordering::SeqCst);
			futures::executor::block_on(self.notify.notified());
			*self.active.lock().entry(source_id).or_default() -= 1;

			match *self.outcome.lock() {
				MockOutcome::Ok => {}
				MockOutcome::Fault => return Err(PipelineFault::Worker("mock fault".into())),
				MockOutcome::Panic => panic!("mock engine panic"),
			}
		}

		Ok(AnalysisResult {
			source_id,
			snapshot_version: snapshot.version(),
			kind,
			diagnostics: Vec::new(),
			classifications: Default::default(),
			symbols: Default::default(),
			elapsed: Duration::ZERO,
		})
	}

	fn is_reentrant(&self) -> bool {
		self.reentrant
	}
}

/// RAII guard that unblocks all pending full checks on drop, preventing test hangs.
pub(crate) struct EngineGuard(pub(crate) Arc<MockEngine>);

impl Drop for EngineGuard {
	fn drop(&mut self) {
		self.0.proceed_all();
	}
}

pub(crate) fn snap(id: u64, version: u64) -> DocumentSnapshot {
	DocumentSnapshot::from_text(SourceId(id), version, "x = 1")
}

pub(crate) fn coordinator(engine: &Arc<MockEngine>, cfg: CoordinatorCfg) -> Coordinator {
	Coordinator::new(cfg, engine.clone(), Arc::new(ResultCache::new()))
}

/// Latest published `(version, kind)` for a document.
pub(crate) fn cached(coord: &Coordinator, id: u64) -> Option<(u64, AnalysisKind)> {
	coord.cache().latest(SourceId(id)).map(|r| r.rank())
}

/// Spins until a worker task has finished, up to one second.
pub(crate) async fn wait_for_finish(coord: &Coordinator) {
	timeout(Duration::from_secs(1), async {
		while !coord.any_task_finished() {
			sleep(Duration::from_millis(1)).await;
		}
	})
	.await
	.expect("Task did not finish in time");
}

/// Must enforce single-flight per document.
///
/// - Enforced in: `Coordinator::dispatch_next`
/// - Failure symptom: Two analyses of one document race to publish.
#[cfg_attr(test, tokio::test)]
pub(crate) async fn test_single_flight_per_doc() {
	let engine = Arc::new(MockEngine::with_reentrancy(true));
	let _guard = EngineGuard(engine.clone());
	let mut coord = coordinator(
		&engine,
		CoordinatorCfg {
			max_concurrent_full_checks: 4,
			..Default::default()
		},
	);
	let now = Instant::now();
	coord.open(snap(1, 0), now);

	coord.request(snap(1, 1), AnalysisReason::Save, now);
	let r = coord.tick(now, false);
	assert_eq!(r.dispatched.map(|d| d.version), Some(1));

	coord.request(snap(1, 2), AnalysisReason::Save, now);
	assert_eq!(coord.phase(SourceId(1)), Some(DocPhase::Running));
	let r = coord.tick(now, false);
	assert_eq!(r.dispatched, None);
	assert_eq!(r.pending, 1);
	assert_eq!(engine.full_count.load(Ordering::SeqCst), 1);

	engine.proceed();
	wait_for_finish(&coord).await;
	let r = coord.tick(now, false);
	assert_eq!(r.published, 1);
	assert_eq!(r.dispatched.map(|d| d.version), Some(2));

	engine.proceed();
	wait_for_finish(&coord).await;
	coord.tick(now, false);
	assert_eq!(cached(&coord, 1), Some((2, AnalysisKind::FullCheck)));
	assert_eq!(engine.max_active_per_doc.load(Ordering::SeqCst), 1);
	assert_eq!(coord.phase(SourceId(1)), Some(DocPhase::Idle));
}

/// Must never downgrade a pending full check to a lexical pass.
///
/// - Enforced in: `AnalysisRequest::coalesce`
/// - Failure symptom: A save followed by a keystroke never gets compiled.
#[cfg_attr(test, tokio::test)]
pub(crate) async fn test_full_check_never_downgraded() {
	let engine = Arc::new(MockEngine::new());
	let _guard = EngineGuard(engine.clone());
	let mut coord = coordinator(&engine, CoordinatorCfg::default());
	let now = Instant::now();
	coord.open(snap(1, 0), now);

	coord.request(snap(1, 1), AnalysisReason::Save, now);
	coord.request(snap(1, 2), AnalysisReason::Edit, now);
	let pending = coord.pending_request(SourceId(1)).unwrap();
	assert_eq!(pending.kind, AnalysisKind::FullCheck);
	assert_eq!(pending.reason, AnalysisReason::Edit);
	assert_eq!(pending.snapshot_version, 2);

	let r = coord.tick(now, false);
	let d = r.dispatched.unwrap();
	assert_eq!((d.version, d.kind), (2, AnalysisKind::FullCheck));
	assert!(d.task.is_some());
}

/// Must coalesce requests made before a tick into one run on the newest snapshot.
///
/// - Enforced in: `Coordinator::request`
/// - Failure symptom: One analysis per keystroke instead of one per idle period.
#[cfg_attr(test, tokio::test)]
pub(crate) async fn test_rapid_edits_coalesce() {
	let engine = Arc::new(MockEngine::new());
	let mut coord = coordinator(&engine, CoordinatorCfg::default());
	let now = Instant::now();
	coord.open(snap(1, 0), now);

	coord.request(snap(1, 1), AnalysisReason::Edit, now);
	coord.request(snap(1, 2), AnalysisReason::Edit, now);
	let r = coord.tick(now, false);
	assert_eq!(r.completed, 1);
	assert_eq!(engine.analyzed(), vec![(SourceId(1), 2, AnalysisKind::LexicalOnly)]);
	assert_eq!(coord.tick(now, false), IdleReport::default());
}

/// Must publish results in increasing `(version, kind)` order.
///
/// - Enforced in: `ResultCache::publish`
/// - Failure symptom: A slow check of an old version overwrites newer colors.
#[cfg_attr(test, tokio::test)]
pub(crate) async fn test_older_result_is_superseded() {
	let engine = Arc::new(MockEngine::new());
	let _guard = EngineGuard(engine.clone());
	let mut coord = coordinator(
		&engine,
		CoordinatorCfg {
			lexical_inline: true,
			..Default::default()
		},
	);
	let now = Instant::now();
	coord.open(snap(1, 0), now);

	coord.request(snap(1, 1), AnalysisReason::Save, now);
	coord.tick(now, false);
	coord.request(snap(1, 2), AnalysisReason::Edit, now);
	assert_eq!(cached(&coord, 1), Some((2, AnalysisKind::LexicalOnly)));

	engine.proceed();
	wait_for_finish(&coord).await;
	let r = coord.tick(now, false);
	assert_eq!((r.completed, r.discarded, r.published), (1, 1, 0));
	assert_eq!(cached(&coord, 1), Some((2, AnalysisKind::LexicalOnly)));
	assert!(coord.metrics().discard_rate(AnalysisKind::FullCheck) > 0.0);
}

/// Must keep the previous result when an analysis faults.
///
/// - Enforced in: `Coordinator::complete`
/// - Failure symptom: Diagnostics and colors vanish after a compiler crash.
#[cfg_attr(test, tokio::test)]
pub(crate) async fn test_fault_retains_previous_result() {
	let engine = Arc::new(MockEngine::new());
	let _guard = EngineGuard(engine.clone());
	let mut coord = coordinator(&engine, CoordinatorCfg::default());
	let now = Instant::now();
	coord.open(snap(1, 0), now);

	coord.request(snap(1, 2), AnalysisReason::Save, now);
	coord.tick(now, false);
	engine.proceed();
	wait_for_finish(&coord).await;
	coord.tick(now, false);
	assert_eq!(cached(&coord, 1), Some((2, AnalysisKind::FullCheck)));

	engine.set_outcome(MockOutcome::Fault);
	coord.request(snap(1, 3), AnalysisReason::Save, now);
	coord.tick(now, false);
	engine.proceed();
	wait_for_finish(&coord).await;
	let r = coord.tick(now, false);
	assert_eq!(r.faulted, 1);
	assert_eq!(cached(&coord, 1), Some((2, AnalysisKind::FullCheck)));
	assert_eq!(coord.phase(SourceId(1)), Some(DocPhase::Idle));
	assert_eq!(coord.last_fault(SourceId(1)), Some((3, PipelineFault::Worker("mock fault".into()))));
}

/// Must contain engine panics on the worker.
///
/// - Enforced in: `TaskCollector::drain_finished`
/// - Failure symptom: A panicking compiler takes down the host.
#[cfg_attr(test, tokio::test)]
pub(crate) async fn test_engine_panic_is_contained() {
	let engine = Arc::new(MockEngine::new());
	let _guard = EngineGuard(engine.clone());
	let mut coord = coordinator(&engine, CoordinatorCfg::default());
	let now = Instant::now();
	coord.open(snap(1, 0), now);
	engine.set_outcome(MockOutcome::Panic);

	coord.request(snap(1, 1), AnalysisReason::ExplicitCheck, now);
	coord.tick(now, false);
	engine.proceed();
	wait_for_finish(&coord).await;
	let r = coord.tick(now, false);
	assert_eq!(r.faulted, 1);
	assert_eq!(cached(&coord, 1), None);
	assert_eq!(coord.running_count(), 0);
}

/// Must not recompute a version whose full check is cached or running.
///
/// - Enforced in: `Coordinator::request`, `Coordinator::dispatch_next`
/// - Failure symptom: Every save of unchanged text starts another compile.
#[cfg_attr(test, tokio::test)]
pub(crate) async fn test_checked_version_is_not_rechecked() {
	let engine = Arc::new(MockEngine::new());
	let _guard = EngineGuard(engine.clone());
	let mut coord = coordinator(&engine, CoordinatorCfg::default());
	let now = Instant::now();
	coord.open(snap(1, 0), now);

	assert!(coord.request(snap(1, 1), AnalysisReason::Save, now));
	coord.tick(now, false);
	assert!(!coord.request(snap(1, 1), AnalysisReason::ExplicitCheck, now));
	assert_eq!(coord.pending_count(), 0);

	engine.proceed();
	wait_for_finish(&coord).await;
	assert_eq!(coord.tick(now, false).published, 1);

	assert!(!coord.request(snap(1, 1), AnalysisReason::Save, now));
	assert!(!coord.request(snap(1, 1), AnalysisReason::Edit, now));
	assert_eq!(coord.tick(now, false), IdleReport::default());
	assert_eq!(coord.pump(SourceId(1)).dispatched, None);
	assert_eq!(engine.full_count.load(Ordering::SeqCst), 1);
	assert_eq!(coord.metrics().discard_rate(AnalysisKind::FullCheck), 0.0);
}

/// Must drop results of documents closed while their analysis ran.
///
/// - Enforced in: `Coordinator::close`, `ResultCache::publish`
/// - Failure symptom: A closed document's slot reappears.
#[cfg_attr(test, tokio::test)]
pub(crate) async fn test_closed_document_drops_result() {
	let engine = Arc::new(MockEngine::new());
	let _guard = EngineGuard(engine.clone());
	let mut coord = coordinator(&engine, CoordinatorCfg::default());
	let now = Instant::now();
	coord.open(snap(1, 0), now);

	coord.request(snap(1, 1), AnalysisReason::Save, now);
	coord.tick(now, false);
	assert!(coord.close(SourceId(1)));
	assert!(!coord.close(SourceId(1)));

	engine.proceed();
	wait_for_finish(&coord).await;
	let r = coord.tick(now, false);
	assert_eq!((r.completed, r.discarded), (1, 1));
	assert!(!coord.cache().contains(SourceId(1)));
	assert_eq!(coord.phase(SourceId(1)), None);
}
