//! Per-key in-flight population registry.
//!
//! Serializes the miss-then-populate critical section of
//! `get_or_populate` so that N concurrent misses on the same key run the
//! factory once. Each key in flight holds one slot; callers lock the slot,
//! re-check the cache, and only the first one through runs the factory.
//! Slots are torn down when population completes or fails.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

#[derive(Default)]
pub(crate) struct InflightRegistry {
    slots: DashMap<String, Arc<Mutex<()>>>,
}

impl InflightRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the slot for `key`, creating it if no population is in
    /// flight. Every concurrent caller for the same key gets the same slot.
    pub(crate) fn slot(&self, key: &str) -> Arc<Mutex<()>> {
        self.slots
            .entry(key.to_string())
            .or_default()
            .clone()
    }

    /// Tears the slot down once its population cycle is over. Only removes
    /// the exact slot the caller holds, so a cycle that started after this
    /// one keeps its own registration.
    pub(crate) fn release(&self, key: &str, slot: &Arc<Mutex<()>>) {
        self.slots.remove_if(key, |_, current| Arc::ptr_eq(current, slot));
    }
}
