use tarn_primitives::SourceId;

/// Depth of analysis. Ordered: a `FullCheck` subsumes a `LexicalOnly`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AnalysisKind {
	/// Scanner only; cheap enough to run on the caller's thread.
	LexicalOnly,
	/// Full compiler pipeline; runs on a worker.
	FullCheck,
}

impl AnalysisKind {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::LexicalOnly => "lexical",
			Self::FullCheck => "full",
		}
	}
}

/// What triggered a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisReason {
	Edit,
	Save,
	ExplicitCheck,
	IdleRefresh,
}

impl AnalysisReason {
	/// Analysis depth a trigger asks for.
	pub const fn kind(self) -> AnalysisKind {
		match self {
			Self::Edit => AnalysisKind::LexicalOnly,
			Self::Save | Self::ExplicitCheck | Self::IdleRefresh => AnalysisKind::FullCheck,
		}
	}

	/// Returns true for triggers the user asked for directly.
	pub const fn is_explicit(self) -> bool {
		matches!(self, Self::Save | Self::ExplicitCheck)
	}

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Edit => "edit",
			Self::Save => "save",
			Self::ExplicitCheck => "check",
			Self::IdleRefresh => "idle-refresh",
		}
	}
}

/// A request for analysis of one document version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisRequest {
	pub source_id: SourceId,
	pub snapshot_version: u64,
	pub kind: AnalysisKind,
	pub reason: AnalysisReason,
}

impl AnalysisRequest {
	pub fn new(source_id: SourceId, snapshot_version: u64, reason: AnalysisReason) -> Self {
		Self {
			source_id,
			snapshot_version,
			kind: reason.kind(),
			reason,
		}
	}

	/// Folds a newer request into this one.
	///
	/// The kind never downgrades; reason and version follow the newer request.
	pub fn coalesce(&mut self, newer: AnalysisRequest) {
		debug_assert_eq!(self.source_id, newer.source_id);
		self.kind = self.kind.max(newer.kind);
		self.reason = newer.reason;
		self.snapshot_version = self.snapshot_version.max(newer.snapshot_version);
	}
}

/// Identifier of a dispatched worker task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub(crate) u64);

/// Per-document position in the `Idle → Pending → Running` cycle.
///
/// `Running` documents may also hold a pending request recorded during the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocPhase {
	Idle,
	Pending,
	Running,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn req(version: u64, reason: AnalysisReason) -> AnalysisRequest {
		AnalysisRequest::new(SourceId(1), version, reason)
	}

	#[test]
	fn coalesce_never_downgrades_kind() {
		let mut pending = req(1, AnalysisReason::Save);
		pending.coalesce(req(2, AnalysisReason::Edit));
		assert_eq!(pending.kind, AnalysisKind::FullCheck);
		assert_eq!(pending.reason, AnalysisReason::Edit);
		assert_eq!(pending.snapshot_version, 2);
	}

	#[test]
	fn coalesce_upgrades_kind() {
		let mut pending = req(3, AnalysisReason::Edit);
		pending.coalesce(req(3, AnalysisReason::ExplicitCheck));
		assert_eq!(pending.kind, AnalysisKind::FullCheck);
		assert_eq!(pending.reason, AnalysisReason::ExplicitCheck);
	}

	#[test]
	fn kinds_are_ordered() {
		assert!(AnalysisKind::LexicalOnly < AnalysisKind::FullCheck);
	}
}
