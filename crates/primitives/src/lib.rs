//! Core value types for the analysis service: source identity, immutable
//! document snapshots, the editable document buffer, and line/column ranges.

/// Editable document buffer producing versioned snapshots.
pub mod document;
/// Non-blocking future polling.
pub mod future;
/// Identifier types for open sources.
pub mod ids;
/// Line/column positions and ranges.
pub mod range;
/// Rope helpers for line access.
pub mod rope;
/// Immutable versioned document views.
pub mod snapshot;

pub use document::{Change, Document};
pub use future::poll_once;
pub use ids::SourceId;
pub use range::{LineCol, TextRange};
pub use ropey::{Rope, RopeSlice};
pub use snapshot::DocumentSnapshot;
