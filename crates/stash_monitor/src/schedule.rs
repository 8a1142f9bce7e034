//! Keyed deadline schedule.
//!
//! Holds at most one pending deadline per key. Arming a key that already has
//! a deadline replaces it in the same call, so a stale deadline can never
//! fire after the key was rescheduled.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use tokio::time::Instant;

#[derive(Debug)]
pub struct FlushSchedule<K> {
    /// Deadlines ordered by time; the sequence number breaks ties in arming order
    deadlines: BTreeMap<(Instant, u64), K>,
    handles: HashMap<K, (Instant, u64)>,
    next_seq: u64,
}

impl<K> Default for FlushSchedule<K> {
    fn default() -> Self {
        Self {
            deadlines: BTreeMap::new(),
            handles: HashMap::new(),
            next_seq: 0,
        }
    }
}

impl<K: Clone + Eq + Hash> FlushSchedule<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the deadline for `key`, cancelling any pending one.
    ///
    /// Returns `true` if a pending deadline was replaced.
    pub fn arm(&mut self, key: K, at: Instant) -> bool {
        let replaced = self.cancel(&key);
        let handle = (at, self.next_seq);
        self.next_seq += 1;
        self.deadlines.insert(handle, key.clone());
        self.handles.insert(key, handle);
        replaced
    }

    /// Removes the pending deadline for `key`, if any.
    pub fn cancel(&mut self, key: &K) -> bool {
        match self.handles.remove(key) {
            Some(handle) => {
                self.deadlines.remove(&handle);
                true
            }
            None => false,
        }
    }

    /// The earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.keys().next().map(|(at, _)| *at)
    }

    /// Removes and returns every key whose deadline is at or before `now`,
    /// earliest first.
    pub fn pop_due(&mut self, now: Instant) -> Vec<K> {
        let mut due = Vec::new();
        while let Some(entry) = self.deadlines.first_entry() {
            if entry.key().0 > now {
                break;
            }
            let key = entry.remove();
            self.handles.remove(&key);
            due.push(key);
        }
        due
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_pop_due_in_deadline_order() {
        let start = Instant::now();
        let mut schedule = FlushSchedule::new();
        schedule.arm("late", start + Duration::from_secs(20));
        schedule.arm("early", start + Duration::from_secs(10));

        assert_eq!(schedule.next_deadline(), Some(start + Duration::from_secs(10)));
        assert!(schedule.pop_due(start + Duration::from_secs(5)).is_empty());
        assert_eq!(schedule.pop_due(start + Duration::from_secs(20)), vec!["early", "late"]);
        assert!(schedule.is_empty());
        assert_eq!(schedule.next_deadline(), None);
    }

    #[test]
    fn test_rearm_replaces_pending_deadline() {
        let start = Instant::now();
        let mut schedule = FlushSchedule::new();
        assert!(!schedule.arm("survivor", start + Duration::from_secs(30)));
        assert!(schedule.arm("survivor", start + Duration::from_secs(35)));

        assert_eq!(schedule.len(), 1);
        assert!(schedule.pop_due(start + Duration::from_secs(30)).is_empty());
        assert_eq!(schedule.next_deadline(), Some(start + Duration::from_secs(35)));
        assert_eq!(schedule.pop_due(start + Duration::from_secs(35)), vec!["survivor"]);
    }

    #[test]
    fn test_equal_deadlines_fire_in_arming_order() {
        let at = Instant::now();
        let mut schedule = FlushSchedule::new();
        schedule.arm("b", at);
        schedule.arm("a", at);
        assert_eq!(schedule.pop_due(at), vec!["b", "a"]);
    }

    #[test]
    fn test_cancel() {
        let start = Instant::now();
        let mut schedule = FlushSchedule::new();
        schedule.arm("survivor", start);
        assert!(schedule.cancel(&"survivor"));
        assert!(!schedule.cancel(&"survivor"));
        assert!(schedule.pop_due(start).is_empty());
    }
}
