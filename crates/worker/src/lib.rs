//! Worker execution context for analysis work that must not run on the
//! host's input thread.
//!
//! Work is classified with [`TaskClass`] for tracing and spawned onto the
//! ambient tokio runtime when one exists, or onto a small process-wide
//! fallback runtime when the host drives the service from a plain thread.

mod class;
mod spawn;

pub use class::TaskClass;
pub use spawn::{has_ambient_runtime, spawn_blocking};
