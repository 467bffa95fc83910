use std::time::Duration;

use crate::types::AnalysisKind;

/// Smoothing factor for the exponential moving averages.
/// alpha = 2 / (N + 1). For N=10, alpha ~= 0.18.
const EMA_ALPHA: f64 = 0.2;

#[derive(Debug, Clone, Copy, Default)]
struct Ema {
	value: f64,
	initialized: bool,
}

impl Ema {
	fn update(&mut self, next: f64) {
		if self.initialized {
			self.value = EMA_ALPHA * next + (1.0 - EMA_ALPHA) * self.value;
		} else {
			self.value = next;
			self.initialized = true;
		}
	}
}

/// How a completed analysis ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
	Published,
	/// Finished but did not advance the cache (or its document closed).
	Discarded,
	Faulted,
}

#[derive(Debug, Clone, Copy, Default)]
struct Entry {
	runs: u64,
	duration_ms: Ema,
	fault_rate: Ema,
	discard_rate: Ema,
}

/// Per-kind analysis statistics.
#[derive(Debug, Clone, Default)]
pub struct AnalysisMetrics {
	lexical: Entry,
	full: Entry,
	throttled: u64,
}

impl AnalysisMetrics {
	pub fn new() -> Self {
		Self::default()
	}

	fn entry(&self, kind: AnalysisKind) -> &Entry {
		match kind {
			AnalysisKind::LexicalOnly => &self.lexical,
			AnalysisKind::FullCheck => &self.full,
		}
	}

	fn entry_mut(&mut self, kind: AnalysisKind) -> &mut Entry {
		match kind {
			AnalysisKind::LexicalOnly => &mut self.lexical,
			AnalysisKind::FullCheck => &mut self.full,
		}
	}

	pub fn record(&mut self, kind: AnalysisKind, elapsed: Duration, completion: Completion) {
		let entry = self.entry_mut(kind);
		entry.runs += 1;
		entry.duration_ms.update(elapsed.as_secs_f64() * 1000.0);
		entry.fault_rate.update(if completion == Completion::Faulted { 1.0 } else { 0.0 });
		entry.discard_rate.update(if completion == Completion::Discarded { 1.0 } else { 0.0 });
	}

	pub fn record_throttled(&mut self) {
		self.throttled += 1;
	}

	/// Completed runs of `kind`.
	pub fn runs(&self, kind: AnalysisKind) -> u64 {
		self.entry(kind).runs
	}

	pub fn avg_duration(&self, kind: AnalysisKind) -> Option<Duration> {
		let entry = self.entry(kind);
		entry
			.duration_ms
			.initialized
			.then(|| Duration::from_secs_f64(entry.duration_ms.value / 1000.0))
	}

	pub fn fault_rate(&self, kind: AnalysisKind) -> f64 {
		self.entry(kind).fault_rate.value
	}

	pub fn discard_rate(&self, kind: AnalysisKind) -> f64 {
		self.entry(kind).discard_rate.value
	}

	/// Full checks skipped because no compiler permit was free.
	pub fn throttled(&self) -> u64 {
		self.throttled
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ema_update() {
		let mut ema = Ema::default();
		ema.update(100.0);
		assert_eq!(ema.value, 100.0);
		ema.update(200.0);
		// 0.2 * 200 + 0.8 * 100 = 40 + 80 = 120
		assert_eq!(ema.value, 120.0);
	}

	#[test]
	fn rates_track_per_kind() {
		let mut metrics = AnalysisMetrics::new();
		assert_eq!(metrics.avg_duration(AnalysisKind::FullCheck), None);

		metrics.record(AnalysisKind::FullCheck, Duration::from_millis(100), Completion::Published);
		metrics.record(AnalysisKind::FullCheck, Duration::from_millis(200), Completion::Faulted);
		assert_eq!(metrics.runs(AnalysisKind::FullCheck), 2);
		let avg = metrics.avg_duration(AnalysisKind::FullCheck).unwrap();
		assert!((avg.as_secs_f64() - 0.120).abs() < 1e-6);
		// 0.2 * 1.0 + 0.8 * 0.0
		assert!((metrics.fault_rate(AnalysisKind::FullCheck) - 0.2).abs() < 1e-9);
		assert_eq!(metrics.discard_rate(AnalysisKind::FullCheck), 0.0);
		assert_eq!(metrics.runs(AnalysisKind::LexicalOnly), 0);
	}
}
