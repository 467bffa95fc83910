//! Latest-result slots, one per open document.
//!
//! Each slot is an atomically swapped pointer: readers load a complete
//! [`AnalysisResult`] or nothing, never a partially written one.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tarn_primitives::SourceId;

use crate::result::AnalysisResult;
use crate::types::AnalysisKind;

pub(crate) type Slot = Arc<ArcSwapOption<AnalysisResult>>;

/// Outcome of offering a result to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
	Published,
	/// The slot already holds a result at the same or a later `(version, kind)`.
	Superseded { cached_version: u64, cached_kind: AnalysisKind },
	/// The document was closed while the analysis ran.
	Closed,
}

#[derive(Default)]
pub struct ResultCache {
	slots: RwLock<FxHashMap<SourceId, Slot>>,
}

impl ResultCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates the slot for a newly opened document.
	pub(crate) fn open(&self, source_id: SourceId) {
		self.slots.write().entry(source_id).or_default();
	}

	pub(crate) fn remove(&self, source_id: SourceId) {
		self.slots.write().remove(&source_id);
	}

	pub fn contains(&self, source_id: SourceId) -> bool {
		self.slots.read().contains_key(&source_id)
	}

	/// Returns the latest published result for a document.
	pub fn latest(&self, source_id: SourceId) -> Option<Arc<AnalysisResult>> {
		self.slots.read().get(&source_id).and_then(|slot| slot.load_full())
	}

	/// Returns true if the slot already holds a result at or past `(version, kind)`.
	pub fn covers(&self, source_id: SourceId, version: u64, kind: AnalysisKind) -> bool {
		self.latest(source_id).is_some_and(|r| r.rank() >= (version, kind))
	}

	/// Publishes `result` if it advances the document's slot in `(version, kind)` order.
	pub(crate) fn publish(&self, result: AnalysisResult) -> PublishOutcome {
		// Writers hold the map lock so the compare and the swap cannot interleave.
		let slots = self.slots.write();
		let Some(slot) = slots.get(&result.source_id) else {
			return PublishOutcome::Closed;
		};
		if let Some(current) = slot.load().as_deref()
			&& current.rank() >= result.rank()
		{
			return PublishOutcome::Superseded {
				cached_version: current.snapshot_version,
				cached_kind: current.kind,
			};
		}
		slot.store(Some(Arc::new(result)));
		PublishOutcome::Published
	}

	pub fn len(&self) -> usize {
		self.slots.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.slots.read().is_empty()
	}
}
