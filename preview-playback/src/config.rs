//! # Playback Configuration
//!
//! Tunables for the playback controller.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Playback controller configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Sampling period of the progress poller while a track plays.
    ///
    /// Also bounds how quickly the poller reacts to cancellation: leaving
    /// `Playing` silences it within one period.
    ///
    /// Default: 300 ms.
    #[serde(default = "default_progress_interval")]
    pub progress_interval: Duration,

    /// Buffer capacity of the snapshot broadcast channel.
    ///
    /// Phase changes are rare; the buffer mostly absorbs bursts of position
    /// ticks for slow observers. Observers that still fall behind see a
    /// `Lagged` error and resume with the newest snapshots.
    ///
    /// Default: 64.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            progress_interval: default_progress_interval(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl PlaybackConfig {
    /// Set the progress sampling period.
    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Set the snapshot buffer capacity.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }
}

fn default_progress_interval() -> Duration {
    Duration::from_millis(300)
}

fn default_event_capacity() -> usize {
    64
}
