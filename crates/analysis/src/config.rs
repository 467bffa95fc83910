//! Service configuration loaded from TOML.
//!
//! ```toml
//! idle_interval_ms = 300
//! max_concurrent_full_checks = 2
//!
//! [preferences]
//! tab_size = 8
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tarn_language::LanguagePreferences;
use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("invalid configuration: {0}")]
	Parse(#[from] toml::de::Error),
}

/// Tuning knobs for scheduling and analysis.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
	/// Interval requested for periodic idle notifications.
	pub idle_interval_ms: u64,
	/// Ask the host for periodic (timer-driven) idle ticks.
	pub periodic_idle: bool,
	/// Concurrent full checks across documents; only honored for reentrant compilers.
	pub max_concurrent_full_checks: usize,
	/// Run the lexical pass synchronously on every edit.
	pub lexical_inline: bool,
	/// Quiet period before an unchecked document is re-checked.
	pub refresh_delay_ms: u64,
	/// Schedule full checks for quiet, unchecked documents on periodic ticks.
	pub idle_refresh: bool,
	pub preferences: LanguagePreferences,
}

impl Default for ServiceConfig {
	fn default() -> Self {
		Self {
			idle_interval_ms: 300,
			periodic_idle: true,
			max_concurrent_full_checks: 1,
			lexical_inline: false,
			refresh_delay_ms: 1500,
			idle_refresh: true,
			preferences: LanguagePreferences::default(),
		}
	}
}

impl ServiceConfig {
	/// Parses a TOML document; missing fields take their defaults.
	pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
		let cfg: Self = toml::from_str(input)?;
		Ok(cfg.normalized())
	}

	/// Reads and parses a TOML file.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		Self::from_toml(&input)
	}

	/// Clamps counts and intervals to usable minimums.
	pub fn normalized(mut self) -> Self {
		self.idle_interval_ms = self.idle_interval_ms.max(1);
		self.max_concurrent_full_checks = self.max_concurrent_full_checks.max(1);
		self.preferences = self.preferences.normalized();
		self
	}

	pub fn idle_interval(&self) -> Duration {
		Duration::from_millis(self.idle_interval_ms)
	}

	pub fn refresh_delay(&self) -> Duration {
		Duration::from_millis(self.refresh_delay_ms)
	}
}
