//! The monitoring loop.
//!
//! [`StashMonitor`] ties the pieces together on a single task: file watcher
//! notifications feed the tail reader, every new line is evaluated against the
//! distance threshold and the storage keywords, and expired aggregation
//! windows are flushed when their deadline passes. All state is owned by
//! the monitor, so nothing here needs a lock.

use crate::aggregation::{LootAggregator, WindowUpdate, DEBOUNCE_INTERVAL};
use crate::distance::{distance, extract_coordinate_pair, round_to_centimetres};
use crate::error::MonitorError;
use crate::parser::{parse_event, StorageTypeMatcher};
use crate::sink::AlertSink;
use crate::tail::{SizeWatcher, TailReader};
use crate::threshold::ThresholdReader;
use crate::types::{DistanceAlert, Dispatch};
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

/// Lines that cannot be removal events are skipped before any pattern runs.
const REMOVAL_MARKER: &str = "removed";

/// Default interval at which the file watcher compares metadata.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Settings the monitor is started with.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Log file to tail
    pub log_file: PathBuf,
    /// How often the file watcher compares the log file's metadata
    pub poll_interval: Duration,
    /// Storage keywords that make a removal count towards aggregation
    pub storage_types: Vec<String>,
    /// Idle time after which a player's window is flushed
    pub aggregation_window: Duration,
}

impl MonitorConfig {
    pub fn new(log_file: impl Into<PathBuf>, storage_types: Vec<String>) -> Self {
        Self {
            log_file: log_file.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            storage_types,
            aggregation_window: DEBOUNCE_INTERVAL,
        }
    }
}

/// Running totals, reported when the monitor stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    pub lines_read: u64,
    pub removals_parsed: u64,
    pub distance_alerts: u64,
    pub summaries_flushed: u64,
    pub failed_deliveries: u64,
}

pub struct StashMonitor<S> {
    watcher: SizeWatcher,
    tail: TailReader,
    matcher: StorageTypeMatcher,
    threshold: ThresholdReader,
    aggregator: LootAggregator,
    sink: S,
    stats: MonitorStats,
}

impl<S: AlertSink> StashMonitor<S> {
    /// Prepares a monitor positioned at the current end of the log file.
    ///
    /// Registers the file watcher immediately; nothing is read until
    /// [`StashMonitor::run`] or [`StashMonitor::poll_once`] is called.
    ///
    /// # Arguments
    ///
    /// * `config` - Log file, poll interval, storage keywords and window length
    /// * `threshold` - Live view of the maximum distance
    /// * `sink` - Receives distance alerts and loot summaries
    ///
    /// # Errors
    ///
    /// * [`MonitorError::ZeroDuration`] if the poll interval or the
    ///   aggregation window is zero
    /// * [`MonitorError::Pattern`] if a storage keyword is blank
    /// * [`MonitorError::Metadata`] or [`MonitorError::Watch`] if the log file
    ///   cannot be stat'ed or watched
    pub async fn open(
        config: MonitorConfig,
        threshold: ThresholdReader,
        sink: S,
    ) -> Result<Self, MonitorError> {
        if config.poll_interval.is_zero() {
            return Err(MonitorError::ZeroDuration("Poll interval"));
        }
        if config.aggregation_window.is_zero() {
            return Err(MonitorError::ZeroDuration("Aggregation window"));
        }

        let matcher = StorageTypeMatcher::new(&config.storage_types)?;
        if matcher.is_empty() {
            warn!("🏷️ No storage types configured, loot summaries are disabled");
        }

        let watcher = SizeWatcher::new(&config.log_file, config.poll_interval).await?;
        let size = watcher.last_size();

        info!(
            "👀 Watching {} from byte {} ({} storage types, max distance {}m)",
            config.log_file.display(),
            size,
            matcher.len(),
            threshold.current()
        );

        Ok(Self {
            watcher,
            tail: TailReader::with_known_size(&config.log_file, size),
            matcher,
            threshold,
            aggregator: LootAggregator::new(config.aggregation_window),
            sink,
            stats: MonitorStats::default(),
        })
    }

    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    pub fn open_windows(&self) -> usize {
        self.aggregator.open_windows()
    }

    /// Evaluates one log line without delivering anything.
    ///
    /// The distance check and the aggregation update are independent: one
    /// line can produce an alert, update a window, both, or neither. The
    /// returned dispatches are in delivery order.
    pub fn evaluate_line(&mut self, line: &str, now: Instant) -> Vec<Dispatch> {
        let mut dispatches = Vec::new();
        if line.trim().is_empty() || !line.contains(REMOVAL_MARKER) {
            return dispatches;
        }

        let Some(event) = parse_event(line) else {
            return dispatches;
        };
        self.stats.removals_parsed += 1;

        if let Some((player, storage)) = extract_coordinate_pair(line) {
            let meters = round_to_centimetres(distance(&player, &storage));
            debug!("📍 {} removed {} at {}m from storage", event.actor, event.item, meters);

            if self.threshold.exceeded_by(meters) {
                warn!(
                    "🚨 {} removed {} from {} at {}m (max {}m)",
                    event.actor,
                    event.item,
                    event.source_label,
                    meters,
                    self.threshold.current()
                );
                dispatches.push(Dispatch::DistanceAlert(DistanceAlert::new(&event, meters)));
            }
        }

        if let Some(storage) = self.matcher.find(line) {
            debug!("🏷️ Matched storage type {} as {}", storage.keyword, storage.label);
            let update = self
                .aggregator
                .record(&event.actor, &event.item, &storage.label, now);
            if let WindowUpdate::RolledOver { closed } = update {
                dispatches.push(Dispatch::LootSummary(closed));
            }
        }

        dispatches
    }

    /// Evaluates one line and delivers whatever it produced.
    pub async fn process_line(&mut self, line: &str, now: Instant) {
        self.stats.lines_read += 1;
        for dispatch in self.evaluate_line(line, now) {
            self.deliver(dispatch).await;
        }
    }

    /// Flushes every window due at `now`. Returns how many were flushed.
    pub async fn flush_due(&mut self, now: Instant) -> usize {
        let summaries = self.aggregator.flush_due(now);
        let flushed = summaries.len();
        for summary in summaries {
            self.deliver(Dispatch::LootSummary(summary)).await;
        }
        flushed
    }

    /// Checks the file once and processes any appended lines.
    ///
    /// Returns the number of lines read.
    pub async fn poll_once(&mut self) -> Result<usize, MonitorError> {
        let Some(change) = self.watcher.poll().await? else {
            return Ok(0);
        };

        let lines = self.tail.apply(change).await?;
        let now = Instant::now();
        for line in &lines {
            self.process_line(line, now).await;
        }
        Ok(lines.len())
    }

    /// Runs the monitor until `shutdown` completes or the log file becomes
    /// unreadable.
    ///
    /// Waits on three sources at once, in this priority order:
    ///
    /// 1. `shutdown` completing
    /// 2. the earliest aggregation window reaching its flush deadline
    /// 3. a file watcher notification, after which appended lines are read
    ///    and evaluated in file order
    ///
    /// # Arguments
    ///
    /// * `shutdown` - Future that completes when the monitor should stop
    ///
    /// # Returns
    ///
    /// The final [`MonitorStats`]. Windows still open at shutdown are
    /// dropped without a summary.
    ///
    /// # Errors
    ///
    /// Returns the first [`MonitorError`] from stat'ing or reading the log
    /// file, for example when it is deleted while being watched. Delivery
    /// failures are never fatal.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use stash_monitor::{threshold_channel, ChannelSink, MonitorConfig, StashMonitor};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = MonitorConfig::new("server.ADM", vec!["Barrel".to_string()]);
    /// let (_writer, reader) = threshold_channel(10.0)?;
    /// let (sink, _dispatches) = ChannelSink::new();
    ///
    /// let monitor = StashMonitor::open(config, reader, sink).await?;
    /// let stats = monitor
    ///     .run(async {
    ///         let _ = tokio::signal::ctrl_c().await;
    ///     })
    ///     .await?;
    /// println!("{} lines read", stats.lines_read);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run<F>(mut self, shutdown: F) -> Result<MonitorStats, MonitorError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!("✅ Monitoring {}", self.tail.path().display());

        loop {
            let next_flush = self.aggregator.next_flush();
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = sleep_until_deadline(next_flush) => {
                    self.flush_due(Instant::now()).await;
                }
                notified = self.watcher.notified() => {
                    notified?;
                    self.poll_once().await?;
                }
            }
        }

        let abandoned = self.aggregator.open_windows();
        if abandoned > 0 {
            info!("🧺 Dropping {} open loot window(s) on shutdown", abandoned);
        }
        info!(
            "📊 Monitor stopped: {} lines, {} removals, {} alerts, {} summaries",
            self.stats.lines_read,
            self.stats.removals_parsed,
            self.stats.distance_alerts,
            self.stats.summaries_flushed
        );
        Ok(self.stats)
    }

    async fn deliver(&mut self, dispatch: Dispatch) {
        match &dispatch {
            Dispatch::DistanceAlert(_) => self.stats.distance_alerts += 1,
            Dispatch::LootSummary(_) => self.stats.summaries_flushed += 1,
        }

        if let Err(e) = self.sink.deliver(&dispatch).await {
            self.stats.failed_deliveries += 1;
            warn!("❌ Failed to deliver dispatch for {}: {}", dispatch.player(), e);
        }
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
