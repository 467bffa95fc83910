use std::sync::OnceLock;

use tokio::task::JoinHandle;

use crate::TaskClass;

static GLOBAL_RT: OnceLock<tokio::runtime::Runtime> = OnceLock::new();

fn runtime_handle() -> tokio::runtime::Handle {
	if let Ok(handle) = tokio::runtime::Handle::try_current() {
		return handle;
	}

	let runtime = GLOBAL_RT.get_or_init(|| {
		tokio::runtime::Builder::new_multi_thread()
			.enable_all()
			.worker_threads(1)
			.thread_name("tarn-worker-global")
			.build()
			.expect("failed to build tarn-worker global tokio runtime")
	});
	runtime.handle().clone()
}

/// Returns true if the caller is inside a tokio runtime context.
pub fn has_ambient_runtime() -> bool {
	tokio::runtime::Handle::try_current().is_ok()
}

/// Spawns blocking work with shared worker classification metadata.
///
/// Uses the ambient runtime's blocking pool when called from inside a tokio
/// runtime, otherwise a lazily built process-wide runtime.
pub fn spawn_blocking<F, R>(class: TaskClass, f: F) -> JoinHandle<R>
where
	F: FnOnce() -> R + Send + 'static,
	R: Send + 'static,
{
	tracing::trace!(worker_class = class.as_str(), "worker.spawn_blocking");
	runtime_handle().spawn_blocking(f)
}
