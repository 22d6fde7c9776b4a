//! Capability injection between a mounted feature module and the dispatcher.
//!
//! A feature module registers a [`FeatureController`] on a [`BridgeSlot`] while
//! it is mounted and publishes a fresh [`BridgeSnapshot`] whenever its state
//! changes. Dropping the returned [`BridgeRegistration`] retracts it, so the
//! dispatcher can never act on a module that is gone.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

/// One selectable entity of the feature module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordEntry {
    pub id: String,
    pub keyword: String,
}

impl KeywordEntry {
    pub fn new(id: &str, keyword: &str) -> Self {
        Self {
            id: id.to_string(),
            keyword: keyword.to_string(),
        }
    }
}

/// Read view of the feature module's state at the time it was published
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BridgeSnapshot {
    pub selected_keyword: Option<KeywordEntry>,
    pub keywords: Vec<KeywordEntry>,
    pub budget_amount: Option<f64>,
    pub focused_province: Option<String>,
}

impl BridgeSnapshot {
    pub fn find_by_id(&self, id: &str) -> Option<&KeywordEntry> {
        self.keywords.iter().find(|k| k.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&KeywordEntry> {
        let name = name.trim().to_lowercase();
        self.keywords
            .iter()
            .find(|k| k.keyword.to_lowercase() == name)
    }
}

/// Mutators a feature module may expose. Anything it does not override
/// reports [`BridgeError::Unsupported`].
#[async_trait]
pub trait FeatureController: Send + Sync {
    async fn select_keyword(&self, _keyword_id: &str) -> Result<(), BridgeError> {
        Err(BridgeError::Unsupported)
    }

    async fn calculate_geoint(&self) -> Result<(), BridgeError> {
        Err(BridgeError::Unsupported)
    }

    async fn calculate_budget(&self) -> Result<(), BridgeError> {
        Err(BridgeError::Unsupported)
    }

    async fn set_budget(&self, _amount: f64) -> Result<(), BridgeError> {
        Err(BridgeError::Unsupported)
    }

    async fn focus_province(&self, _province: &str) -> Result<(), BridgeError> {
        Err(BridgeError::Unsupported)
    }

    async fn drill_down_province(&self, _province: &str) -> Result<(), BridgeError> {
        Err(BridgeError::Unsupported)
    }

    async fn reset_map_view(&self) -> Result<(), BridgeError> {
        Err(BridgeError::Unsupported)
    }
}

/// The live handle the dispatcher works with
#[derive(Clone)]
pub struct ContextBridge {
    pub snapshot: Arc<BridgeSnapshot>,
    pub controller: Arc<dyn FeatureController>,
}

struct Registered {
    generation: u64,
    bridge: ContextBridge,
}

type Shared = RwLock<Option<Registered>>;

fn write_lock(shared: &Shared) -> std::sync::RwLockWriteGuard<'_, Option<Registered>> {
    match shared.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Apply `f` only while `generation` is still the registered one.
fn update_if_current(shared: &Shared, generation: u64, f: impl FnOnce(&mut Option<Registered>)) {
    let mut guard = write_lock(shared);
    if guard.as_ref().map(|r| r.generation) == Some(generation) {
        f(&mut guard);
    }
}

fn replace_snapshot(shared: &Shared, generation: u64, snapshot: BridgeSnapshot) {
    update_if_current(shared, generation, |current| {
        if let Some(registered) = current.as_mut() {
            registered.bridge.snapshot = Arc::new(snapshot);
        }
    });
}

/// Optional reference to the active feature module's bridge
#[derive(Clone, Default)]
pub struct BridgeSlot {
    current: Arc<Shared>,
    generations: Arc<AtomicU64>,
}

impl BridgeSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount a feature module. Replaces whatever was registered before.
    pub fn register(
        &self,
        controller: Arc<dyn FeatureController>,
        snapshot: BridgeSnapshot,
    ) -> BridgeRegistration {
        let generation = self.generations.fetch_add(1, Ordering::SeqCst) + 1;
        *write_lock(&self.current) = Some(Registered {
            generation,
            bridge: ContextBridge {
                snapshot: Arc::new(snapshot),
                controller,
            },
        });
        tracing::debug!(generation, "context bridge registered");

        BridgeRegistration {
            slot: self.clone(),
            generation,
        }
    }

    pub fn current(&self) -> Option<ContextBridge> {
        let guard = match self.current.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.as_ref().map(|r| r.bridge.clone())
    }

    pub fn is_active(&self) -> bool {
        self.current().is_some()
    }
}

/// Held by whoever mounted the feature module; dropping it unmounts the bridge
pub struct BridgeRegistration {
    slot: BridgeSlot,
    generation: u64,
}

impl BridgeRegistration {
    /// Replace the published snapshot wholesale
    pub fn publish(&self, snapshot: BridgeSnapshot) {
        replace_snapshot(&self.slot.current, self.generation, snapshot);
    }

    /// A handle the feature module itself can publish through. It does not
    /// keep the registration alive.
    pub fn publisher(&self) -> BridgePublisher {
        BridgePublisher {
            slot: Arc::downgrade(&self.slot.current),
            generation: self.generation,
        }
    }
}

impl Drop for BridgeRegistration {
    fn drop(&mut self) {
        update_if_current(&self.slot.current, self.generation, |current| {
            *current = None;
        });
        tracing::debug!(generation = self.generation, "context bridge retracted");
    }
}

/// Weak publishing handle; a no-op once the registration is gone
#[derive(Clone)]
pub struct BridgePublisher {
    slot: Weak<Shared>,
    generation: u64,
}

impl BridgePublisher {
    pub fn publish(&self, snapshot: BridgeSnapshot) {
        if let Some(shared) = self.slot.upgrade() {
            replace_snapshot(&shared, self.generation, snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Inert;

    #[async_trait]
    impl FeatureController for Inert {}

    fn snapshot_with(keyword: &str) -> BridgeSnapshot {
        BridgeSnapshot {
            keywords: vec![KeywordEntry::new("1", keyword)],
            ..Default::default()
        }
    }

    #[test]
    fn test_slot_starts_empty() {
        assert!(BridgeSlot::new().current().is_none());
    }

    #[test]
    fn test_register_publish_and_drop() {
        let slot = BridgeSlot::new();
        let registration = slot.register(Arc::new(Inert), snapshot_with("kahve"));
        assert_eq!(slot.current().unwrap().snapshot.keywords[0].keyword, "kahve");

        registration.publish(snapshot_with("çay"));
        assert_eq!(slot.current().unwrap().snapshot.keywords[0].keyword, "çay");

        drop(registration);
        assert!(!slot.is_active());
    }

    #[test]
    fn test_stale_registration_does_not_clear_newer_one() {
        let slot = BridgeSlot::new();
        let first = slot.register(Arc::new(Inert), snapshot_with("old"));
        let second = slot.register(Arc::new(Inert), snapshot_with("new"));

        first.publish(snapshot_with("stale"));
        drop(first);

        assert_eq!(slot.current().unwrap().snapshot.keywords[0].keyword, "new");
        drop(second);
        assert!(slot.current().is_none());
    }

    #[test]
    fn test_publisher_stops_after_unmount() {
        let slot = BridgeSlot::new();
        let registration = slot.register(Arc::new(Inert), snapshot_with("kahve"));
        let publisher = registration.publisher();

        publisher.publish(snapshot_with("çay"));
        assert_eq!(slot.current().unwrap().snapshot.keywords[0].keyword, "çay");

        drop(registration);
        publisher.publish(snapshot_with("ghost"));
        assert!(slot.current().is_none());
    }

    #[test]
    fn test_find_by_name_ignores_case() {
        let snapshot = snapshot_with("Kahve Makinesi");
        assert_eq!(snapshot.find_by_name(" kahve makinesi ").unwrap().id, "1");
        assert!(snapshot.find_by_id("2").is_none());
    }

    #[tokio::test]
    async fn test_default_mutators_are_unsupported() {
        let controller = Inert;
        assert_eq!(controller.calculate_geoint().await, Err(BridgeError::Unsupported));
        assert_eq!(controller.set_budget(10.0).await, Err(BridgeError::Unsupported));
    }
}
