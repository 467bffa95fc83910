use tarn_language::CompileFault;
use thiserror::Error;

/// Catastrophic analysis failure. The previously cached result stays in place.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineFault {
	#[error(transparent)]
	Compiler(#[from] CompileFault),
	#[error("analysis panicked: {0}")]
	Panicked(String),
	#[error("worker task failed: {0}")]
	Worker(String),
}

/// Failure to register with the host's idle notifications.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulerRegistrationFault {
	#[error("host site provides no component manager")]
	NoComponentManager,
	#[error("component manager rejected registration: {0}")]
	Rejected(String),
	#[error("component manager returned the null component id")]
	InvalidComponentId,
}
