//! Decoder bridge trait and supporting types.
//!
//! The playback core treats the media decoder as an opaque capability: it can
//! open a streamable URI, start and pause output, seek, and report the
//! current playback offset. Anything the decoder decides on its own -
//! reaching the end of the stream, or failing mid-playback - is delivered
//! asynchronously as a [`DecoderEvent`].
//!
//! Host applications are expected to provide concrete implementations
//! backed by their platform media engine (ExoPlayer, AVPlayer, a local
//! symphonia pipeline, ...). Implementations must be safe to share across
//! async tasks.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::broadcast;

/// Receiver half for decoder notifications.
///
/// Every call to [`Decoder::subscribe`] returns an independent receiver;
/// events published after the call are observed by all of them.
pub type DecoderEvents = broadcast::Receiver<DecoderEvent>;

/// Asynchronous notifications emitted by a decoder while a stream is loaded.
///
/// These are the decoder-initiated counterparts to the command methods on
/// [`Decoder`]: the core issues commands and reacts to events, never the
/// other way around.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum DecoderEvent {
    /// The current stream played to its natural end.
    Finished,
    /// The decoder failed while a stream was loaded or playing.
    Error {
        /// Human-readable failure description.
        message: String,
    },
}

/// Trait for platform decoder adapters that drive native media engines.
///
/// # Contract
///
/// - [`open`](Decoder::open) resolves once the stream is ready to play, or
///   with an error when it cannot be opened. A new `open` implicitly discards
///   whatever was loaded before.
/// - [`start`](Decoder::start), [`pause`](Decoder::pause) and
///   [`seek`](Decoder::seek) act on the currently opened stream.
/// - [`position`](Decoder::position) is a cheap query and may fail
///   transiently while the engine is between states; callers are expected to
///   tolerate that and retry on their next sampling tick.
/// - [`stop`](Decoder::stop) releases the engine back to an idle state.
#[async_trait::async_trait]
pub trait Decoder: Send + Sync {
    /// Open the given stream URI. Resolves when the stream is ready to play.
    async fn open(&self, uri: &str) -> Result<()>;

    /// Begin or resume playback of the opened stream.
    async fn start(&self) -> Result<()>;

    /// Pause playback without releasing the stream.
    async fn pause(&self) -> Result<()>;

    /// Seek to an absolute position within the stream.
    async fn seek(&self, position: Duration) -> Result<()>;

    /// Query the current playback offset.
    async fn position(&self) -> Result<Duration>;

    /// Release the opened stream and return the engine to idle.
    async fn stop(&self) -> Result<()>;

    /// Subscribe to decoder-initiated events for the currently loaded stream.
    fn subscribe(&self) -> DecoderEvents;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoder_event_serialization() {
        let event = DecoderEvent::Error {
            message: "bad stream".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("bad stream"));

        let back: DecoderEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[tokio::test]
    async fn decoder_events_fan_out() {
        let (tx, _) = broadcast::channel::<DecoderEvent>(8);
        let mut a = tx.subscribe();
        let mut b = tx.subscribe();

        tx.send(DecoderEvent::Finished).unwrap();

        assert_eq!(a.recv().await.unwrap(), DecoderEvent::Finished);
        assert_eq!(b.recv().await.unwrap(), DecoderEvent::Finished);
    }
}
