//! Per-player loot aggregation.
//!
//! Each player with recent qualifying removals has one open window. A
//! window collects items until no new removal arrives for
//! [`DEBOUNCE_INTERVAL`], at which point it is flushed as a [`LootSummary`]
//! and forgotten.
//!
//! Window lifecycle for one player:
//!
//! * **open**: first removal with no window; flush armed at `now + interval`
//! * **extend**: removal within `interval` of the window start; item appended,
//!   flush re-armed, storage type kept
//! * **rollover**: removal more than `interval` after the window start while the
//!   window is still open; the old window is closed and a fresh one opened
//! * **flush**: the armed deadline passes with no further removal

use crate::schedule::FlushSchedule;
use crate::types::LootSummary;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Idle time after which an open window is flushed.
pub const DEBOUNCE_INTERVAL: Duration = Duration::from_millis(30_000);

#[derive(Debug, Clone)]
struct AggregationRecord {
    window_start: Instant,
    count: u32,
    storage_type: String,
    items: Vec<String>,
}

impl AggregationRecord {
    fn open(item: &str, storage_type: &str, now: Instant) -> Self {
        Self {
            window_start: now,
            count: 1,
            storage_type: storage_type.to_string(),
            items: vec![item.to_string()],
        }
    }

    fn into_summary(self, player: String) -> LootSummary {
        LootSummary {
            player,
            total_count: self.count,
            storage_type: self.storage_type,
            items: self.items,
        }
    }
}

/// What a qualifying removal did to its player's window.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowUpdate {
    Opened,
    Extended { count: u32 },
    /// The previous window was closed; its summary must be delivered.
    RolledOver { closed: LootSummary },
}

/// Owns every open window and the flush deadline of each.
#[derive(Debug)]
pub struct LootAggregator {
    window: Duration,
    records: HashMap<String, AggregationRecord>,
    schedule: FlushSchedule<String>,
}

impl Default for LootAggregator {
    fn default() -> Self {
        Self::new(DEBOUNCE_INTERVAL)
    }
}

impl LootAggregator {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            records: HashMap::new(),
            schedule: FlushSchedule::new(),
        }
    }

    /// Records one qualifying removal by `player` at `now`.
    ///
    /// Re-arms the player's flush deadline to `now + window` in every case.
    ///
    /// # Arguments
    ///
    /// * `player` - Aggregation key, the actor name from the log line
    /// * `item` - Item appended to the window
    /// * `storage_type` - Label kept for the window; ignored on extension
    /// * `now` - Time of the removal
    ///
    /// # Returns
    ///
    /// * [`WindowUpdate::Opened`] when the player had no open window
    /// * [`WindowUpdate::Extended`] when `now` is at most `window` after the
    ///   window start
    /// * [`WindowUpdate::RolledOver`] otherwise, carrying the closed window's
    ///   summary; the new window holds only `item`
    ///
    /// # Example
    ///
    /// ```rust
    /// use stash_monitor::{LootAggregator, WindowUpdate};
    /// use std::time::Duration;
    /// use tokio::time::Instant;
    ///
    /// let mut aggregator = LootAggregator::default();
    /// let start = Instant::now();
    ///
    /// assert_eq!(aggregator.record("Survivor", "Apple", "Barrel", start), WindowUpdate::Opened);
    /// assert_eq!(
    ///     aggregator.record("Survivor", "Rope", "Barrel", start + Duration::from_secs(5)),
    ///     WindowUpdate::Extended { count: 2 }
    /// );
    /// ```
    pub fn record(
        &mut self,
        player: &str,
        item: &str,
        storage_type: &str,
        now: Instant,
    ) -> WindowUpdate {
        let update = match self.records.get_mut(player) {
            None => {
                self.records
                    .insert(player.to_string(), AggregationRecord::open(item, storage_type, now));
                WindowUpdate::Opened
            }
            Some(record) if now.saturating_duration_since(record.window_start) <= self.window => {
                record.count += 1;
                record.items.push(item.to_string());
                WindowUpdate::Extended {
                    count: record.count,
                }
            }
            Some(record) => {
                let closed = std::mem::replace(record, AggregationRecord::open(item, storage_type, now));
                WindowUpdate::RolledOver {
                    closed: closed.into_summary(player.to_string()),
                }
            }
        };

        self.schedule.arm(player.to_string(), now + self.window);
        debug!("🧺 Window for {} after {}: {:?}", player, item, update);
        update
    }

    /// Closes every window whose flush deadline is at or before `now`.
    pub fn flush_due(&mut self, now: Instant) -> Vec<LootSummary> {
        self.schedule
            .pop_due(now)
            .into_iter()
            .filter_map(|player| {
                let record = self.records.remove(&player)?;
                Some(record.into_summary(player))
            })
            .collect()
    }

    /// When the next window is due to be flushed.
    pub fn next_flush(&self) -> Option<Instant> {
        self.schedule.next_deadline()
    }

    pub fn open_windows(&self) -> usize {
        self.records.len()
    }

    #[cfg(test)]
    pub(crate) fn pending_count(&self, player: &str) -> Option<u32> {
        self.records.get(player).map(|record| record.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_extend_within_window() {
        let t0 = Instant::now();
        let mut aggregator = LootAggregator::default();

        assert_eq!(aggregator.record("A", "Apple", "(Blue)", t0), WindowUpdate::Opened);
        assert_eq!(
            aggregator.record("A", "Rope", "(Green)", t0 + ms(5_000)),
            WindowUpdate::Extended { count: 2 }
        );

        assert!(aggregator.flush_due(t0 + ms(30_000)).is_empty());
        assert_eq!(aggregator.pending_count("A"), Some(2));
        assert_eq!(aggregator.next_flush(), Some(t0 + ms(35_000)));

        let summaries = aggregator.flush_due(t0 + ms(35_000));
        assert_eq!(
            summaries,
            vec![LootSummary {
                player: "A".to_string(),
                total_count: 2,
                storage_type: "(Blue)".to_string(),
                items: vec!["Apple".to_string(), "Rope".to_string()],
            }]
        );
        assert_eq!(aggregator.open_windows(), 0);
    }

    #[test]
    fn test_extend_at_exact_window_boundary() {
        let t0 = Instant::now();
        let mut aggregator = LootAggregator::default();
        aggregator.record("A", "Apple", "Barrel", t0);
        assert_eq!(
            aggregator.record("A", "Rope", "Barrel", t0 + ms(30_000)),
            WindowUpdate::Extended { count: 2 }
        );
    }

    #[test]
    fn test_rollover_after_window() {
        let t0 = Instant::now();
        let mut aggregator = LootAggregator::default();
        aggregator.record("A", "Apple", "(Blue)", t0);

        let update = aggregator.record("A", "Rope", "(Green)", t0 + ms(40_000));
        assert_eq!(
            update,
            WindowUpdate::RolledOver {
                closed: LootSummary {
                    player: "A".to_string(),
                    total_count: 1,
                    storage_type: "(Blue)".to_string(),
                    items: vec!["Apple".to_string()],
                }
            }
        );

        assert_eq!(aggregator.pending_count("A"), Some(1));
        let summaries = aggregator.flush_due(t0 + ms(70_000));
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].total_count, 1);
        assert_eq!(summaries[0].storage_type, "(Green)");
        assert_eq!(summaries[0].items, vec!["Rope".to_string()]);
    }

    #[test]
    fn test_rollover_measured_from_window_start() {
        let t0 = Instant::now();
        let mut aggregator = LootAggregator::default();
        aggregator.record("A", "Apple", "Barrel", t0);
        aggregator.record("A", "Rope", "Barrel", t0 + ms(20_000));

        match aggregator.record("A", "Nails", "Tent", t0 + ms(35_000)) {
            WindowUpdate::RolledOver { closed } => {
                assert_eq!(closed.total_count, 2);
                assert_eq!(closed.items, vec!["Apple".to_string(), "Rope".to_string()]);
            }
            other => panic!("expected rollover, got {:?}", other),
        }
    }

    #[test]
    fn test_flush_on_idle() {
        let t0 = Instant::now();
        let mut aggregator = LootAggregator::default();
        aggregator.record("A", "Apple", "Barrel", t0);

        assert_eq!(aggregator.next_flush(), Some(t0 + ms(30_000)));
        assert!(aggregator.flush_due(t0 + ms(29_999)).is_empty());

        let summaries = aggregator.flush_due(t0 + ms(30_000));
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].total_count, 1);
        assert_eq!(aggregator.pending_count("A"), None);
        assert!(aggregator.flush_due(t0 + ms(90_000)).is_empty());
    }

    #[test]
    fn test_players_are_independent() {
        let t0 = Instant::now();
        let mut aggregator = LootAggregator::default();
        aggregator.record("A", "Apple", "Barrel", t0);
        aggregator.record("B", "Rope", "Tent", t0 + ms(10_000));
        aggregator.record("A", "Nails", "Barrel", t0 + ms(15_000));

        assert_eq!(aggregator.open_windows(), 2);
        assert_eq!(aggregator.pending_count("A"), Some(2));
        assert_eq!(aggregator.pending_count("B"), Some(1));

        let first = aggregator.flush_due(t0 + ms(40_000));
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].player, "B");

        let second = aggregator.flush_due(t0 + ms(45_000));
        assert_eq!(second[0].player, "A");
    }
}
