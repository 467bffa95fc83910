use std::sync::Arc;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use tarn_primitives::{DocumentSnapshot, SourceId};
use tarn_worker::TaskClass;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::error::PipelineFault;
use crate::pipeline::{AnalysisEngine, panic_message};
use crate::result::AnalysisResult;
use crate::types::{AnalysisKind, TaskId};

/// Output of a finished worker task.
pub(super) struct TaskDone {
	pub(super) id: TaskId,
	pub(super) source_id: SourceId,
	pub(super) version: u64,
	pub(super) kind: AnalysisKind,
	pub(super) result: Result<AnalysisResult, PipelineFault>,
	pub(super) elapsed: Duration,
}

struct Inflight {
	source_id: SourceId,
	version: u64,
	kind: AnalysisKind,
	handle: JoinHandle<TaskDone>,
}

/// Owns the join handles of dispatched analyses.
pub(crate) struct TaskCollector {
	next_id: u64,
	tasks: FxHashMap<u64, Inflight>,
}

impl TaskCollector {
	pub(super) fn new() -> Self {
		Self {
			next_id: 0,
			tasks: FxHashMap::default(),
		}
	}

	/// Starts `snapshot` on a worker if a compiler permit is free.
	///
	/// Returns `None` when throttled. The permit is held until the analysis
	/// returns, not until the result is collected.
	pub(super) fn spawn(
		&mut self,
		permits: &Arc<Semaphore>,
		engine: Arc<dyn AnalysisEngine>,
		snapshot: DocumentSnapshot,
		kind: AnalysisKind,
	) -> Option<TaskId> {
		let permit = permits.clone().try_acquire_owned().ok()?;

		let id_val = self.next_id;
		self.next_id = self.next_id.wrapping_add(1);
		let task_id = TaskId(id_val);

		let source_id = snapshot.source_id();
		let version = snapshot.version();

		let handle = tarn_worker::spawn_blocking(TaskClass::CpuBlocking, move || {
			let _permit = permit;

			let t0 = Instant::now();
			let result = engine.analyze(&snapshot, kind);
			TaskDone {
				id: task_id,
				source_id,
				version,
				kind,
				result,
				elapsed: t0.elapsed(),
			}
		});

		self.tasks.insert(
			id_val,
			Inflight {
				source_id,
				version,
				kind,
				handle,
			},
		);
		Some(task_id)
	}

	/// Removes and returns every finished task without blocking.
	pub(super) fn drain_finished(&mut self) -> Vec<TaskDone> {
		let mut done = Vec::new();

		self.tasks.retain(|&id, task| match tarn_primitives::poll_once(&mut task.handle) {
			None => true,
			Some(Ok(task_done)) => {
				done.push(task_done);
				false
			}
			Some(Err(e)) => {
				tracing::error!(source_id = %task.source_id, version = task.version, error = %e, "analysis task join error");
				let message = if e.is_panic() {
					panic_message(e.into_panic().as_ref())
				} else {
					e.to_string()
				};
				done.push(TaskDone {
					id: TaskId(id),
					source_id: task.source_id,
					version: task.version,
					kind: task.kind,
					result: Err(PipelineFault::Worker(message)),
					elapsed: Duration::ZERO,
				});
				false
			}
		});

		done.sort_by_key(|d| d.id.0);
		done
	}

	pub(super) fn any_finished(&self) -> bool {
		self.tasks.values().any(|t| t.handle.is_finished())
	}

	pub(super) fn len(&self) -> usize {
		self.tasks.len()
	}
}
