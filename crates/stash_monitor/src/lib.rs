//! # Stash Monitor
//!
//! Watches a game server admin log for items being taken out of storage and
//! reports two kinds of suspicious activity:
//!
//! * **Distance alerts**: a player removed an item from a container that was
//!   further away than the configured maximum distance (free-camera looting).
//! * **Loot summaries**: all removals one player made from configured storage
//!   types, collected into a single rolling window per player.
//!
//! ## Data Flow
//!
//! 1. [`SizeWatcher`] receives `notify` events for the log file and reports
//!    size changes
//! 2. [`TailReader`] reads only the bytes appended since the last change
//! 3. [`parse_event`] and [`extract_coordinate_pair`] break each line apart
//! 4. The distance is compared against the live [`ThresholdReader`] value
//! 5. Lines naming a configured storage type update the [`LootAggregator`]
//! 6. Alerts and flushed windows are handed to an [`AlertSink`]
//!
//! [`StashMonitor`] runs all of this on one task.
//!
//! ## Log Format
//!
//! ```text
//! Player "<name>" (id=<id> pos=<x, y, z>) removed <item> from <source> at <x, z, y>
//! ```
//!
//! The storage coordinates are logged with their last two axes swapped
//! relative to the player coordinates.
//!
//! ## Example
//!
//! ```rust,no_run
//! use stash_monitor::{threshold_channel, ChannelSink, MonitorConfig, StashMonitor};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MonitorConfig::new("server.ADM", vec!["Barrel".to_string(), "Tent".to_string()]);
//! let (writer, reader) = threshold_channel(10.0)?;
//! let (sink, mut dispatches) = ChannelSink::new();
//!
//! let monitor = StashMonitor::open(config, reader, sink).await?;
//! tokio::spawn(monitor.run(std::future::pending()));
//!
//! writer.set(25.0)?;
//! while let Some(dispatch) = dispatches.recv().await {
//!     println!("{:?}", dispatch);
//! }
//! # Ok(())
//! # }
//! ```

pub use aggregation::{LootAggregator, WindowUpdate, DEBOUNCE_INTERVAL};
pub use distance::{distance, extract_coordinate_pair, round_to_centimetres};
pub use error::{DispatchError, MonitorError, PatternError, ThresholdError};
pub use monitor::{MonitorConfig, MonitorStats, StashMonitor, DEFAULT_POLL_INTERVAL};
pub use parser::{extract_storage_type_label, parse_event, StorageMatch, StorageTypeMatcher};
pub use sink::{AlertSink, ChannelSink};
pub use tail::{SizeChange, SizeWatcher, TailReader};
pub use threshold::{threshold_channel, ThresholdReader, ThresholdWriter};
pub use types::{Dispatch, DistanceAlert, LogEvent, LootSummary, Position};

pub mod aggregation;
pub mod distance;
pub mod error;
pub mod monitor;
pub mod parser;
pub mod schedule;
pub mod sink;
pub mod tail;
pub mod threshold;
pub mod types;
