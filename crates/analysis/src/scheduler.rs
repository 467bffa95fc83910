//! Registration with the host's idle notifications.
//!
//! The host's component manager is injected through [`SiteContext`], so tests
//! and the CLI can drive synthetic ticks with [`ManualComponentManager`].

use std::sync::Arc;
use std::time::Duration;

use bitflags::bitflags;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::config::ServiceConfig;
use crate::error::SchedulerRegistrationFault;

/// Host-assigned registration handle; `0` means unregistered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ComponentId(pub u32);

impl ComponentId {
	pub const NONE: ComponentId = ComponentId(0);

	pub fn is_none(self) -> bool {
		self == Self::NONE
	}
}

bitflags! {
	/// Notifications a component asks the host for.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
	pub struct ComponentFlags: u32 {
		const NEED_IDLE_TIME = 1 << 0;
		const NEED_PERIODIC_IDLE_TIME = 1 << 1;
	}

	/// Host state changes a component wants to be advised of.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
	pub struct AdviseFlags: u32 {
		const MODAL = 1 << 0;
		const REDRAW_OFF = 1 << 1;
		const WARNINGS_OFF = 1 << 2;
	}

	/// Flags the host passes with an idle notification.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct IdleFlags: u32 {
		const PERIODIC = 1 << 0;
		const NON_PERIODIC = 1 << 1;
		const PRIORITY = 1 << 2;
	}
}

/// What the service asks of the host when it registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentRegistration {
	pub flags: ComponentFlags,
	pub advise: AdviseFlags,
	pub idle_interval: Duration,
}

impl ComponentRegistration {
	pub fn from_config(cfg: &ServiceConfig) -> Self {
		let mut flags = ComponentFlags::NEED_IDLE_TIME;
		if cfg.periodic_idle {
			flags |= ComponentFlags::NEED_PERIODIC_IDLE_TIME;
		}
		Self {
			flags,
			advise: AdviseFlags::all(),
			idle_interval: cfg.idle_interval(),
		}
	}
}

/// The host's component manager.
pub trait ComponentManager: Send + Sync {
	/// Registers a component; the returned id must be non-zero.
	fn register_component(&self, registration: &ComponentRegistration) -> Result<ComponentId, String>;

	/// Revokes a registration; returns false if `id` was unknown.
	fn revoke_component(&self, id: ComponentId) -> bool;
}

/// The host site a service is started and stopped against.
pub trait SiteContext {
	fn component_manager(&self) -> Option<Arc<dyn ComponentManager>>;
}

/// Owns the service's idle registration.
pub struct IdleScheduler {
	registration: ComponentRegistration,
	component_id: ComponentId,
	manager: Option<Arc<dyn ComponentManager>>,
}

impl IdleScheduler {
	pub fn new(registration: ComponentRegistration) -> Self {
		Self {
			registration,
			component_id: ComponentId::NONE,
			manager: None,
		}
	}

	pub fn registration(&self) -> &ComponentRegistration {
		&self.registration
	}

	pub fn component_id(&self) -> ComponentId {
		self.component_id
	}

	pub fn is_registered(&self) -> bool {
		!self.component_id.is_none()
	}

	/// Registers with the site's component manager. Already registered is a no-op.
	pub fn start(&mut self, site: &dyn SiteContext) -> Result<ComponentId, SchedulerRegistrationFault> {
		if self.is_registered() {
			return Ok(self.component_id);
		}
		let manager = site.component_manager().ok_or(SchedulerRegistrationFault::NoComponentManager)?;
		let id = manager
			.register_component(&self.registration)
			.map_err(SchedulerRegistrationFault::Rejected)?;
		if id.is_none() {
			return Err(SchedulerRegistrationFault::InvalidComponentId);
		}

		tracing::info!(component_id = id.0, interval = ?self.registration.idle_interval, "idle scheduler registered");
		self.component_id = id;
		self.manager = Some(manager);
		Ok(id)
	}

	/// Revokes the registration. Idempotent; the handle is always zeroed.
	///
	/// Uses the site's manager when available, otherwise the manager captured
	/// at registration. Returns true if a revoke was attempted.
	pub fn stop(&mut self, site: &dyn SiteContext) -> bool {
		let id = std::mem::take(&mut self.component_id);
		let captured = self.manager.take();
		if id.is_none() {
			return false;
		}
		let Some(manager) = site.component_manager().or(captured) else {
			tracing::warn!(component_id = id.0, "no component manager to revoke idle registration");
			return false;
		};
		let revoked = manager.revoke_component(id);
		tracing::info!(component_id = id.0, revoked, "idle scheduler stopped");
		true
	}

	/// Returns whether a notification with `flags` is periodic, or `None` if
	/// notifications are not being accepted.
	pub fn accept(&self, flags: IdleFlags) -> Option<bool> {
		self.is_registered().then(|| flags.contains(IdleFlags::PERIODIC))
	}
}

#[derive(Default)]
struct ManualState {
	next_id: u32,
	registered: FxHashMap<ComponentId, ComponentRegistration>,
	revoke_calls: usize,
	reject: Option<String>,
	null_ids: bool,
}

/// In-process component manager for hosts without one (CLI, tests).
///
/// The owner drives ticks itself, typically every
/// [`ComponentRegistration::idle_interval`].
#[derive(Default)]
pub struct ManualComponentManager {
	state: Mutex<ManualState>,
}

impl ManualComponentManager {
	pub fn new() -> Self {
		Self::default()
	}

	/// Makes subsequent registrations fail with `message`.
	pub fn reject_with(&self, message: impl Into<String>) {
		self.state.lock().reject = Some(message.into());
	}

	/// Makes subsequent registrations return the null id.
	pub fn return_null_ids(&self) {
		self.state.lock().null_ids = true;
	}

	pub fn registered_count(&self) -> usize {
		self.state.lock().registered.len()
	}

	pub fn registration(&self, id: ComponentId) -> Option<ComponentRegistration> {
		self.state.lock().registered.get(&id).copied()
	}

	pub fn revoke_calls(&self) -> usize {
		self.state.lock().revoke_calls
	}
}

impl ComponentManager for ManualComponentManager {
	fn register_component(&self, registration: &ComponentRegistration) -> Result<ComponentId, String> {
		let mut state = self.state.lock();
		if let Some(message) = &state.reject {
			return Err(message.clone());
		}
		if state.null_ids {
			return Ok(ComponentId::NONE);
		}
		state.next_id += 1;
		let id = ComponentId(state.next_id);
		state.registered.insert(id, *registration);
		Ok(id)
	}

	fn revoke_component(&self, id: ComponentId) -> bool {
		let mut state = self.state.lock();
		state.revoke_calls += 1;
		state.registered.remove(&id).is_some()
	}
}

/// A site exposing an optional component manager.
#[derive(Clone, Default)]
pub struct ManualSite {
	manager: Option<Arc<dyn ComponentManager>>,
}

impl ManualSite {
	pub fn new(manager: Arc<dyn ComponentManager>) -> Self {
		Self { manager: Some(manager) }
	}

	/// A site whose manager lookup fails.
	pub fn without_manager() -> Self {
		Self::default()
	}
}

impl SiteContext for ManualSite {
	fn component_manager(&self) -> Option<Arc<dyn ComponentManager>> {
		self.manager.clone()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn setup() -> (Arc<ManualComponentManager>, ManualSite, IdleScheduler) {
		let manager = Arc::new(ManualComponentManager::new());
		let site = ManualSite::new(manager.clone());
		let scheduler = IdleScheduler::new(ComponentRegistration::from_config(&ServiceConfig::default()));
		(manager, site, scheduler)
	}

	#[test]
	fn start_registers_idle_and_periodic_time() {
		let (manager, site, mut scheduler) = setup();
		let id = scheduler.start(&site).unwrap();
		assert!(!id.is_none());
		let reg = manager.registration(id).unwrap();
		assert!(reg.flags.contains(ComponentFlags::NEED_IDLE_TIME | ComponentFlags::NEED_PERIODIC_IDLE_TIME));
		assert_eq!(reg.advise, AdviseFlags::all());
		assert_eq!(reg.idle_interval, Duration::from_millis(300));

		assert_eq!(scheduler.start(&site).unwrap(), id);
		assert_eq!(manager.registered_count(), 1);
	}

	#[test]
	fn non_periodic_config_omits_periodic_flag() {
		let cfg = ServiceConfig {
			periodic_idle: false,
			..Default::default()
		};
		let reg = ComponentRegistration::from_config(&cfg);
		assert_eq!(reg.flags, ComponentFlags::NEED_IDLE_TIME);
	}

	#[test]
	fn stop_twice_revokes_once() {
		let (manager, site, mut scheduler) = setup();
		scheduler.start(&site).unwrap();
		assert!(scheduler.stop(&site));
		assert!(!scheduler.stop(&site));
		assert_eq!(manager.revoke_calls(), 1);
		assert_eq!(manager.registered_count(), 0);
		assert_eq!(scheduler.component_id(), ComponentId::NONE);
	}

	#[test]
	fn stop_without_registration_is_noop() {
		let (manager, site, mut scheduler) = setup();
		assert!(!scheduler.stop(&site));
		assert_eq!(manager.revoke_calls(), 0);
	}

	#[test]
	fn stop_falls_back_to_captured_manager() {
		let (manager, site, mut scheduler) = setup();
		scheduler.start(&site).unwrap();
		assert!(scheduler.stop(&ManualSite::without_manager()));
		assert_eq!(manager.revoke_calls(), 1);
		assert!(!scheduler.is_registered());
	}

	#[test]
	fn registration_faults() {
		let (manager, site, mut scheduler) = setup();
		assert_eq!(
			scheduler.start(&ManualSite::without_manager()),
			Err(SchedulerRegistrationFault::NoComponentManager)
		);

		manager.return_null_ids();
		assert_eq!(scheduler.start(&site), Err(SchedulerRegistrationFault::InvalidComponentId));

		manager.reject_with("busy");
		assert_eq!(scheduler.start(&site), Err(SchedulerRegistrationFault::Rejected("busy".into())));
		assert!(!scheduler.is_registered());
	}

	#[test]
	fn accepts_ticks_only_while_registered() {
		let (_manager, site, mut scheduler) = setup();
		assert_eq!(scheduler.accept(IdleFlags::PERIODIC), None);
		scheduler.start(&site).unwrap();
		assert_eq!(scheduler.accept(IdleFlags::PERIODIC | IdleFlags::PRIORITY), Some(true));
		assert_eq!(scheduler.accept(IdleFlags::NON_PERIODIC), Some(false));
	}
}
