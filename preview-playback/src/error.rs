//! # Playback Error Types
//!
//! Error taxonomy for the playback core. Decoder failures never escape the
//! controller as faults; they are folded into the `Failed` phase, and these
//! variants describe what happened in logs and in command-level results.

use preview_bridge::BridgeError;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// The decoder could not open the stream (network or format error).
    #[error("Failed to open stream: {message}")]
    OpenFailed { message: String },

    /// The decoder failed while the stream was loaded or playing.
    #[error("Decoder failed: {message}")]
    DecoderFailed { message: String },

    /// `load` was called for a track that has no streamable preview.
    #[error("Track has no streamable source: {track_id}")]
    MissingSource { track_id: String },

    /// Internal state-machine guard; indicates a controller bug if it ever
    /// surfaces outside tests.
    #[error("Invalid phase transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// A phase string could not be parsed.
    #[error("Unknown playback phase: {0}")]
    InvalidPhase(String),

    /// The controller task has shut down and no longer accepts commands.
    #[error("Playback controller closed")]
    ControllerClosed,
}

impl PlaybackError {
    /// Returns `true` if this error folds the session into the `Failed`
    /// phase (as opposed to internal guards and lifecycle errors).
    pub fn is_playback_failure(&self) -> bool {
        matches!(
            self,
            PlaybackError::OpenFailed { .. }
                | PlaybackError::DecoderFailed { .. }
                | PlaybackError::MissingSource { .. }
        )
    }
}

impl From<BridgeError> for PlaybackError {
    /// Classify a bridge fault for logging and folding: open failures keep
    /// their identity, everything else surfaced by a running decoder is a
    /// decoder failure.
    fn from(error: BridgeError) -> Self {
        match error {
            BridgeError::OpenFailed(message) => PlaybackError::OpenFailed { message },
            other => PlaybackError::DecoderFailed {
                message: other.to_string(),
            },
        }
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_classification() {
        assert!(PlaybackError::OpenFailed {
            message: "404".into()
        }
        .is_playback_failure());
        assert!(PlaybackError::MissingSource {
            track_id: "t".into()
        }
        .is_playback_failure());
        assert!(!PlaybackError::ControllerClosed.is_playback_failure());
    }

    #[test]
    fn bridge_errors_classify_into_playback_failures() {
        let error = PlaybackError::from(BridgeError::OpenFailed("404".into()));
        assert!(matches!(error, PlaybackError::OpenFailed { .. }));
        assert!(error.is_playback_failure());

        let error = PlaybackError::from(BridgeError::DecoderFailed("stalled".into()));
        assert!(matches!(error, PlaybackError::DecoderFailed { .. }));
        assert!(error.is_playback_failure());

        // Any other bridge fault from a running decoder counts as one too
        let error = PlaybackError::from(BridgeError::NotAvailable("no engine".into()));
        assert!(matches!(error, PlaybackError::DecoderFailed { .. }));
    }
}
