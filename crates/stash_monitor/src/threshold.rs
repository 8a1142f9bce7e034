//! Live-adjustable maximum distance.
//!
//! The threshold has exactly one [`ThresholdWriter`]; any number of
//! [`ThresholdReader`]s observe its latest value. A replacement applies to
//! every event evaluated after it.

use crate::error::ThresholdError;
use tokio::sync::watch;
use tracing::info;

/// Creates the writer/reader pair for a threshold starting at `initial`.
pub fn threshold_channel(initial: f64) -> Result<(ThresholdWriter, ThresholdReader), ThresholdError> {
    let initial = finite(initial)?;
    let (tx, rx) = watch::channel(initial);
    Ok((ThresholdWriter { tx }, ThresholdReader { rx }))
}

fn finite(value: f64) -> Result<f64, ThresholdError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ThresholdError::NotFinite(value))
    }
}

/// The single owner allowed to replace the threshold.
#[derive(Debug)]
pub struct ThresholdWriter {
    tx: watch::Sender<f64>,
}

impl ThresholdWriter {
    /// Replaces the threshold and returns the previous value.
    ///
    /// Non-finite values are rejected and the current value is kept.
    pub fn set(&self, meters: f64) -> Result<f64, ThresholdError> {
        let meters = finite(meters)?;
        let previous = self.tx.send_replace(meters);
        info!("📐 Maximum distance changed from {}m to {}m", previous, meters);
        Ok(previous)
    }

    /// Parses operator input and applies it with [`ThresholdWriter::set`].
    pub fn set_from_str(&self, input: &str) -> Result<f64, ThresholdError> {
        let input = input.trim();
        let meters = input
            .parse::<f64>()
            .map_err(|_| ThresholdError::NotNumeric(input.to_string()))?;
        self.set(meters)
    }

    pub fn current(&self) -> f64 {
        *self.tx.borrow()
    }

}

/// Read access to the current threshold.
#[derive(Debug, Clone)]
pub struct ThresholdReader {
    rx: watch::Receiver<f64>,
}

impl ThresholdReader {
    pub fn current(&self) -> f64 {
        *self.rx.borrow()
    }

    /// Whether `distance` is strictly beyond the current threshold.
    pub fn exceeded_by(&self, distance: f64) -> bool {
        distance > self.current()
    }
}
