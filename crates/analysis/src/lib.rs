//! Idle-driven incremental analysis for Boo sources.
//!
//! Edits record analysis requests with the [`Coordinator`]; host idle
//! notifications, delivered through the [`IdleScheduler`] registration, run
//! at most one unit of work per tick. Lexical passes run inline, full checks
//! on a worker. Completed results are swapped into the [`ResultCache`] and
//! read through an [`AuthoringScope`].
//!
//! Hosts normally use the [`LanguageService`] facade.

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod result;
pub mod scheduler;
pub mod scope;
pub mod service;
pub mod types;

pub use cache::{PublishOutcome, ResultCache};
pub use config::{ConfigError, ServiceConfig};
pub use coordinator::{Coordinator, CoordinatorCfg, Dispatched, IdleReport};
pub use error::{PipelineFault, SchedulerRegistrationFault};
pub use metrics::{AnalysisMetrics, Completion};
pub use pipeline::{AnalysisEngine, Pipeline};
pub use result::AnalysisResult;
pub use scheduler::{
	AdviseFlags, ComponentFlags, ComponentId, ComponentManager, ComponentRegistration, IdleFlags, IdleScheduler,
	ManualComponentManager, ManualSite, SiteContext,
};
pub use scope::AuthoringScope;
pub use service::{DocumentHandle, LanguageService, Source};
pub use types::{AnalysisKind, AnalysisReason, AnalysisRequest, DocPhase, TaskId};
