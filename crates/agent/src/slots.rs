//! Per-customer processing slots
//!
//! Messages from one customer are processed one at a time in arrival order.
//! Each slot is a FIFO async mutex that also remembers the decisions for the
//! most recent message ids so redelivered messages are answered without
//! being routed (and counted) twice.
//!
//! Slots nobody holds or waits on are swept once they have been idle for the
//! configured TTL, so the map tracks active customers rather than every
//! customer ever seen.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use dealer_agent_config::constants::routing::{SLOT_IDLE_TTL_SECS, SLOT_SWEEP_EVERY};
use dealer_agent_core::RoutingDecision;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Recently routed messages for one customer
#[derive(Debug)]
pub struct CustomerSlot {
    recent: VecDeque<(String, RoutingDecision)>,
    capacity: usize,
    last_used: Instant,
}

impl CustomerSlot {
    fn new(capacity: usize) -> Self {
        Self {
            recent: VecDeque::with_capacity(capacity.min(64)),
            capacity,
            last_used: Instant::now(),
        }
    }

    /// Decision already produced for a message id
    pub fn lookup(&self, message_id: &str) -> Option<&RoutingDecision> {
        self.recent
            .iter()
            .find(|(id, _)| id == message_id)
            .map(|(_, decision)| decision)
    }

    pub fn remember(&mut self, message_id: String, decision: RoutingDecision) {
        if self.capacity == 0 {
            return;
        }
        if self.recent.len() >= self.capacity {
            self.recent.pop_front();
        }
        self.recent.push_back((message_id, decision));
    }

    pub fn len(&self) -> usize {
        self.recent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }
}

/// Slots keyed by customer id
pub struct CustomerSlots {
    slots: DashMap<String, Arc<Mutex<CustomerSlot>>>,
    dedup_window: usize,
    idle_ttl: Duration,
    acquisitions: AtomicUsize,
}

impl CustomerSlots {
    pub fn new(dedup_window: usize) -> Self {
        Self {
            slots: DashMap::new(),
            dedup_window,
            idle_ttl: Duration::from_secs(SLOT_IDLE_TTL_SECS),
            acquisitions: AtomicUsize::new(0),
        }
    }

    pub fn with_idle_ttl(mut self, idle_ttl: Duration) -> Self {
        self.idle_ttl = idle_ttl;
        self
    }

    /// Wait for this customer's turn. Waiters are served in FIFO order.
    pub async fn acquire(&self, customer_id: &str) -> OwnedMutexGuard<CustomerSlot> {
        let n = self.acquisitions.fetch_add(1, Ordering::Relaxed) + 1;
        if n % SLOT_SWEEP_EVERY == 0 {
            self.evict_idle();
        }

        let slot = self
            .slots
            .entry(customer_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(CustomerSlot::new(self.dedup_window))))
            .clone();
        let mut guard = slot.lock_owned().await;
        guard.last_used = Instant::now();
        guard
    }

    /// Drop slots that are unheld, unawaited and idle past the TTL.
    /// Returns the number removed.
    pub fn evict_idle(&self) -> usize {
        let before = self.slots.len();
        let ttl = self.idle_ttl;
        // retain holds the shard lock, so no acquire can clone a slot mid-check
        self.slots.retain(|_, slot| {
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            match slot.try_lock() {
                Ok(inner) => inner.last_used.elapsed() < ttl,
                Err(_) => true,
            }
        });
        let removed = before.saturating_sub(self.slots.len());
        if removed > 0 {
            tracing::debug!(removed, remaining = self.slots.len(), "Evicted idle customer slots");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_slot_evicts_oldest() {
        let mut slot = CustomerSlot::new(2);
        slot.remember("m1".into(), RoutingDecision::degraded("m1", "c"));
        slot.remember("m2".into(), RoutingDecision::degraded("m2", "c"));
        slot.remember("m3".into(), RoutingDecision::degraded("m3", "c"));
        assert!(slot.lookup("m1").is_none());
        assert!(slot.lookup("m3").is_some());
        assert_eq!(slot.len(), 2);
    }

    #[test]
    fn test_zero_capacity_remembers_nothing() {
        let mut slot = CustomerSlot::new(0);
        slot.remember("m1".into(), RoutingDecision::degraded("m1", "c"));
        assert!(slot.is_empty());
    }

    #[tokio::test]
    async fn test_same_customer_is_serialized_in_order() {
        let slots = Arc::new(CustomerSlots::new(4));
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let first = slots.acquire("cust-1").await;
        let mut handles = Vec::new();
        for i in 0..5 {
            let slots = slots.clone();
            let order = order.clone();
            handles.push(tokio::spawn(async move {
                let _guard = slots.acquire("cust-1").await;
                order.lock().push(i);
            }));
            // let each waiter enqueue before the next one
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        drop(first);
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_different_customers_do_not_block() {
        let slots = CustomerSlots::new(4);
        let _a = slots.acquire("cust-a").await;
        let b = tokio::time::timeout(Duration::from_millis(100), slots.acquire("cust-b")).await;
        assert!(b.is_ok());
        assert_eq!(slots.len(), 2);
    }

    #[tokio::test]
    async fn test_idle_slots_are_swept() {
        let slots = CustomerSlots::new(4).with_idle_ttl(Duration::ZERO);
        for i in 0..10_000 {
            let guard = slots.acquire(&format!("cust-{}", i)).await;
            drop(guard);
        }
        assert!(slots.len() <= SLOT_SWEEP_EVERY);

        slots.evict_idle();
        assert!(slots.is_empty());
    }

    #[tokio::test]
    async fn test_held_and_recent_slots_survive_eviction() {
        let slots = CustomerSlots::new(4);
        let held = slots.acquire("cust-held").await;
        let mut recent = slots.acquire("cust-recent").await;
        recent.remember("m1".into(), RoutingDecision::degraded("m1", "cust-recent"));
        drop(recent);

        assert_eq!(slots.evict_idle(), 0);
        assert_eq!(slots.len(), 2);
        drop(held);

        // dedup memory is still there for a redelivery
        let recent = slots.acquire("cust-recent").await;
        assert!(recent.lookup("m1").is_some());
    }
}
