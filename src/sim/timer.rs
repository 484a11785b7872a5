//! Cancellable one-shot timers driven by the frame loop
//!
//! Timers never run on their own thread. The owner advances the clock once
//! per frame and gets back the keys whose deadline passed, in deadline
//! order. At most one timer is pending per key: scheduling a key that is
//! already pending cancels the old timer first.

use std::collections::BTreeMap;

/// Handle to one scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct Pending<K> {
    key: K,
    deadline_ms: u64,
}

/// Keyed timer queue
#[derive(Debug, Clone)]
pub struct TimerQueue<K> {
    now_ms: u64,
    next_handle: u64,
    pending: BTreeMap<TimerHandle, Pending<K>>,
}

impl<K> Default for TimerQueue<K> {
    fn default() -> Self {
        Self {
            now_ms: 0,
            next_handle: 1,
            pending: BTreeMap::new(),
        }
    }
}

impl<K: Clone + Eq> TimerQueue<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current clock (milliseconds since the queue was created)
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Schedule `key` to fire after `delay_ms`, replacing any pending timer for the same key
    pub fn schedule(&mut self, key: K, delay_ms: u32) -> TimerHandle {
        self.cancel_key(&key);

        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.pending.insert(
            handle,
            Pending {
                key,
                deadline_ms: self.now_ms + u64::from(delay_ms),
            },
        );
        handle
    }

    /// Cancel a timer by handle; false if it already fired or was cancelled
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.pending.remove(&handle).is_some()
    }

    /// Cancel whatever timer is pending for `key`
    pub fn cancel_key(&mut self, key: &K) -> bool {
        let found = self
            .pending
            .iter()
            .find(|(_, p)| p.key == *key)
            .map(|(handle, _)| *handle);
        match found {
            Some(handle) => self.cancel(handle),
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.values().any(|p| p.key == *key)
    }

    /// Deadline of the pending timer for `key`
    pub fn deadline(&self, key: &K) -> Option<u64> {
        self.pending
            .values()
            .find(|p| p.key == *key)
            .map(|p| p.deadline_ms)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Move the clock forward and return every key that came due
    pub fn advance(&mut self, dt_ms: u32) -> Vec<K> {
        self.now_ms += u64::from(dt_ms);

        let mut due: Vec<(u64, TimerHandle)> = self
            .pending
            .iter()
            .filter(|(_, p)| p.deadline_ms <= self.now_ms)
            .map(|(handle, p)| (p.deadline_ms, *handle))
            .collect();
        // Earliest deadline first, scheduling order breaks ties
        due.sort();

        due.into_iter()
            .filter_map(|(_, handle)| self.pending.remove(&handle))
            .map(|p| p.key)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_after_delay() {
        let mut timers = TimerQueue::new();
        timers.schedule("grow", 100);

        assert!(timers.advance(99).is_empty());
        assert_eq!(timers.advance(1), vec!["grow"]);
        assert!(timers.advance(1000).is_empty());
        assert!(timers.is_empty());
    }

    #[test]
    fn test_reschedule_replaces_pending_timer() {
        let mut timers = TimerQueue::new();
        let first = timers.schedule("laser", 100);
        timers.advance(60);
        let second = timers.schedule("laser", 100);

        assert_ne!(first, second);
        assert_eq!(timers.len(), 1);
        assert!(!timers.cancel(first));
        assert_eq!(timers.deadline(&"laser"), Some(160));

        // Old deadline passes silently
        assert!(timers.advance(50).is_empty());
        assert_eq!(timers.advance(50), vec!["laser"]);
    }

    #[test]
    fn test_due_keys_in_deadline_order() {
        let mut timers = TimerQueue::new();
        timers.schedule(3, 30);
        timers.schedule(1, 10);
        timers.schedule(2, 20);
        assert_eq!(timers.advance(100), vec![1, 2, 3]);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut timers = TimerQueue::new();
        let handle = timers.schedule('s', 10);
        assert!(timers.cancel(handle));
        assert!(!timers.cancel(handle));
        assert!(!timers.cancel_key(&'s'));
        assert!(timers.advance(20).is_empty());
    }
}
