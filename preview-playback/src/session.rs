//! # Playback Session State Machine
//!
//! The single mutable record of "what is loaded and what is it doing",
//! with validated phase transitions.
//!
//! ## State Machine
//!
//! ```text
//!        load                 ready            play
//! Empty ─────→ Preparing ──────────→ Ready ─────────→ Playing
//!   ↑              │ open error                        │   ↑
//!   │              └─────────→ Failed        pause ────┘   │ play
//!   │                                          ↓           │
//!   │ reset (from any phase)                 Paused     Completed
//!   └───────────────────────────             finished ────┘
//! ```
//!
//! `Failed` and `Completed` are both re-enterable: a fresh `load` restarts
//! from `Preparing`, and `play` on `Completed` replays the finished track
//! from the beginning.
//!
//! The session is exclusively owned by the controller task; nothing else
//! mutates it. All transition methods validate against the table in
//! `validate_transition` and return [`PlaybackError::InvalidTransition`]
//! when misused.

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ============================================================================
// Phase
// ============================================================================

/// The discrete playback state of the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackPhase {
    /// Nothing loaded.
    Empty,
    /// A stream is being opened by the decoder.
    Preparing,
    /// The stream is open and ready to play.
    Ready,
    /// Audio is audible; the progress poller is running.
    Playing,
    /// Playback suspended, position retained.
    Paused,
    /// The stream played to its natural end.
    Completed,
    /// Opening or playing the stream failed. Cleared by a fresh load.
    Failed,
}

impl PlaybackPhase {
    /// Check if a `play` command is meaningful in this phase.
    pub fn can_play(&self) -> bool {
        matches!(
            self,
            PlaybackPhase::Ready | PlaybackPhase::Paused | PlaybackPhase::Completed
        )
    }

    /// Check if a track is associated with the session in this phase.
    pub fn has_track(&self) -> bool {
        !matches!(self, PlaybackPhase::Empty)
    }

    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackPhase::Empty => "empty",
            PlaybackPhase::Preparing => "preparing",
            PlaybackPhase::Ready => "ready",
            PlaybackPhase::Playing => "playing",
            PlaybackPhase::Paused => "paused",
            PlaybackPhase::Completed => "completed",
            PlaybackPhase::Failed => "failed",
        }
    }
}

impl FromStr for PlaybackPhase {
    type Err = PlaybackError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "empty" => Ok(PlaybackPhase::Empty),
            "preparing" => Ok(PlaybackPhase::Preparing),
            "ready" => Ok(PlaybackPhase::Ready),
            "playing" => Ok(PlaybackPhase::Playing),
            "paused" => Ok(PlaybackPhase::Paused),
            "completed" => Ok(PlaybackPhase::Completed),
            "failed" => Ok(PlaybackPhase::Failed),
            _ => Err(PlaybackError::InvalidPhase(s.to_string())),
        }
    }
}

impl std::fmt::Display for PlaybackPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Session
// ============================================================================

/// The authoritative record of the currently loaded preview.
///
/// Cloned copies serve as the snapshots published to observers; the mutable
/// original lives inside the controller task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackSession {
    /// Identity of the loaded item, `None` only in `Empty`.
    pub track_id: Option<String>,
    /// Streamable location of the loaded item.
    pub source_uri: Option<String>,
    /// Current phase, see [`PlaybackPhase`].
    pub phase: PlaybackPhase,
    /// Last known playback offset in milliseconds. Monotonically
    /// non-decreasing within a single `Playing` run.
    pub position_ms: u64,
}

impl PlaybackSession {
    /// Create an empty session.
    pub fn new() -> Self {
        Self {
            track_id: None,
            source_uri: None,
            phase: PlaybackPhase::Empty,
            position_ms: 0,
        }
    }

    /// Start loading a new track. Valid from any phase; an in-flight load or
    /// running playback is considered superseded by the caller.
    pub fn begin_load(&mut self, track_id: impl Into<String>, source_uri: impl Into<String>) {
        self.track_id = Some(track_id.into());
        self.source_uri = Some(source_uri.into());
        self.phase = PlaybackPhase::Preparing;
        self.position_ms = 0;
    }

    /// Record a load that cannot proceed because the track has no streamable
    /// source. Valid from any phase, lands directly in `Failed`.
    pub fn fail_load(&mut self, track_id: impl Into<String>) {
        self.track_id = Some(track_id.into());
        self.source_uri = None;
        self.phase = PlaybackPhase::Failed;
        self.position_ms = 0;
    }

    /// The decoder reported the stream ready.
    pub fn mark_ready(&mut self) -> Result<()> {
        self.transition(PlaybackPhase::Ready)
    }

    /// The decoder reported an error. Valid from every phase with a track
    /// loaded, since runtime faults can surface at any point.
    pub fn mark_failed(&mut self) -> Result<()> {
        self.transition(PlaybackPhase::Failed)
    }

    /// Playback started from `Ready` or resumed from `Paused`.
    pub fn begin_play(&mut self) -> Result<()> {
        if !matches!(self.phase, PlaybackPhase::Ready | PlaybackPhase::Paused) {
            return Err(self.invalid(PlaybackPhase::Playing));
        }
        self.phase = PlaybackPhase::Playing;
        Ok(())
    }

    /// Replay the finished track from the beginning.
    pub fn replay(&mut self) -> Result<()> {
        if self.phase != PlaybackPhase::Completed {
            return Err(self.invalid(PlaybackPhase::Playing));
        }
        self.phase = PlaybackPhase::Playing;
        self.position_ms = 0;
        Ok(())
    }

    /// Suspend playback, keeping the current position.
    pub fn pause(&mut self) -> Result<()> {
        self.transition(PlaybackPhase::Paused)
    }

    /// The stream played to its end. Position rewinds to 0 so a later
    /// replay starts clean.
    pub fn complete(&mut self) -> Result<()> {
        self.transition(PlaybackPhase::Completed)?;
        self.position_ms = 0;
        Ok(())
    }

    /// Drop everything and return to `Empty`. Valid from any phase.
    pub fn reset(&mut self) {
        self.track_id = None;
        self.source_uri = None;
        self.phase = PlaybackPhase::Empty;
        self.position_ms = 0;
    }

    /// Record a polled position. Only meaningful while `Playing`; the offset
    /// never moves backwards within a run.
    pub fn update_position(&mut self, position_ms: u64) -> Result<()> {
        if self.phase != PlaybackPhase::Playing {
            return Err(PlaybackError::InvalidTransition {
                from: self.phase.as_str().to_string(),
                to: "update_position".to_string(),
            });
        }
        self.position_ms = self.position_ms.max(position_ms);
        Ok(())
    }

    fn transition(&mut self, to: PlaybackPhase) -> Result<()> {
        self.validate_transition(to)?;
        self.phase = to;
        Ok(())
    }

    /// Validate a phase transition
    fn validate_transition(&self, to: PlaybackPhase) -> Result<()> {
        let valid = match (self.phase, to) {
            // Decoder readiness
            (PlaybackPhase::Preparing, PlaybackPhase::Ready) => true,

            // Pausing
            (PlaybackPhase::Playing, PlaybackPhase::Paused) => true,

            // Natural end of stream
            (PlaybackPhase::Playing, PlaybackPhase::Completed) => true,

            // Failure can strike whenever a track is loaded
            (from, PlaybackPhase::Failed) => from.has_track(),

            // All other transitions go through begin_load/begin_play/
            // replay/reset, which have their own guards
            _ => false,
        };

        if !valid {
            return Err(self.invalid(to));
        }

        Ok(())
    }

    fn invalid(&self, to: PlaybackPhase) -> PlaybackError {
        PlaybackError::InvalidTransition {
            from: self.phase.as_str().to_string(),
            to: to.as_str().to_string(),
        }
    }
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_empty() {
        let session = PlaybackSession::new();
        assert_eq!(session.phase, PlaybackPhase::Empty);
        assert!(session.track_id.is_none());
        assert!(session.source_uri.is_none());
        assert_eq!(session.position_ms, 0);
    }

    #[test]
    fn load_enters_preparing_and_rewinds() {
        let mut session = PlaybackSession::new();
        session.position_ms = 42; // stale garbage must not survive a load
        session.begin_load("track-1", "https://example.com/p.mp3");

        assert_eq!(session.phase, PlaybackPhase::Preparing);
        assert_eq!(session.track_id.as_deref(), Some("track-1"));
        assert_eq!(session.source_uri.as_deref(), Some("https://example.com/p.mp3"));
        assert_eq!(session.position_ms, 0);
    }

    #[test]
    fn load_without_source_fails_immediately() {
        let mut session = PlaybackSession::new();
        session.fail_load("track-1");

        assert_eq!(session.phase, PlaybackPhase::Failed);
        assert_eq!(session.track_id.as_deref(), Some("track-1"));
        assert!(session.source_uri.is_none());
    }

    #[test]
    fn full_playback_lifecycle() {
        let mut session = PlaybackSession::new();
        session.begin_load("track-1", "uri");
        session.mark_ready().unwrap();
        session.begin_play().unwrap();
        session.update_position(1500).unwrap();
        session.pause().unwrap();

        assert_eq!(session.phase, PlaybackPhase::Paused);
        assert_eq!(session.position_ms, 1500);

        session.begin_play().unwrap();
        session.update_position(3540).unwrap();
        session.complete().unwrap();

        assert_eq!(session.phase, PlaybackPhase::Completed);
        assert_eq!(session.position_ms, 0);
    }

    #[test]
    fn replay_only_from_completed() {
        let mut session = PlaybackSession::new();
        session.begin_load("track-1", "uri");
        session.mark_ready().unwrap();
        assert!(session.replay().is_err());

        session.begin_play().unwrap();
        session.update_position(2000).unwrap();
        session.complete().unwrap();

        session.replay().unwrap();
        assert_eq!(session.phase, PlaybackPhase::Playing);
        assert_eq!(session.position_ms, 0);
    }

    #[test]
    fn ready_requires_preparing() {
        let mut session = PlaybackSession::new();
        assert!(session.mark_ready().is_err());

        session.begin_load("track-1", "uri");
        session.mark_ready().unwrap();
        // A second ready for the same load is a protocol violation
        assert!(session.mark_ready().is_err());
    }

    #[test]
    fn pause_requires_playing() {
        let mut session = PlaybackSession::new();
        session.begin_load("track-1", "uri");
        assert!(session.pause().is_err());

        session.mark_ready().unwrap();
        assert!(session.pause().is_err());

        session.begin_play().unwrap();
        session.pause().unwrap();
        assert!(session.pause().is_err());
    }

    #[test]
    fn failure_requires_a_loaded_track() {
        let mut session = PlaybackSession::new();
        assert!(session.mark_failed().is_err());

        session.begin_load("track-1", "uri");
        session.mark_failed().unwrap();
        assert_eq!(session.phase, PlaybackPhase::Failed);

        // Failed is re-enterable via load
        session.begin_load("track-2", "uri-2");
        assert_eq!(session.phase, PlaybackPhase::Preparing);
    }

    #[test]
    fn position_updates_only_while_playing() {
        let mut session = PlaybackSession::new();
        session.begin_load("track-1", "uri");
        session.mark_ready().unwrap();
        assert!(session.update_position(100).is_err());

        session.begin_play().unwrap();
        session.update_position(300).unwrap();
        assert_eq!(session.position_ms, 300);

        // Never moves backwards within a run
        session.update_position(250).unwrap();
        assert_eq!(session.position_ms, 300);
    }

    #[test]
    fn reset_from_every_phase_yields_empty() {
        let phases: Vec<Box<dyn Fn(&mut PlaybackSession)>> = vec![
            Box::new(|_s| {}),
            Box::new(|s| s.begin_load("t", "u")),
            Box::new(|s| {
                s.begin_load("t", "u");
                s.mark_ready().unwrap();
            }),
            Box::new(|s| {
                s.begin_load("t", "u");
                s.mark_ready().unwrap();
                s.begin_play().unwrap();
            }),
            Box::new(|s| s.fail_load("t")),
        ];

        for setup in phases {
            let mut session = PlaybackSession::new();
            setup(&mut session);
            session.reset();

            assert_eq!(session.phase, PlaybackPhase::Empty);
            assert!(session.track_id.is_none());
            assert!(session.source_uri.is_none());
            assert_eq!(session.position_ms, 0);
        }
    }

    #[test]
    fn empty_iff_no_track() {
        let mut session = PlaybackSession::new();
        assert_eq!(session.phase == PlaybackPhase::Empty, session.track_id.is_none());

        session.begin_load("t", "u");
        assert_eq!(session.phase == PlaybackPhase::Empty, session.track_id.is_none());

        session.mark_failed().unwrap();
        assert_eq!(session.phase == PlaybackPhase::Empty, session.track_id.is_none());

        session.reset();
        assert_eq!(session.phase == PlaybackPhase::Empty, session.track_id.is_none());
    }

    #[test]
    fn phase_round_trips_through_strings() {
        for phase in [
            PlaybackPhase::Empty,
            PlaybackPhase::Preparing,
            PlaybackPhase::Ready,
            PlaybackPhase::Playing,
            PlaybackPhase::Paused,
            PlaybackPhase::Completed,
            PlaybackPhase::Failed,
        ] {
            assert_eq!(phase.as_str().parse::<PlaybackPhase>().unwrap(), phase);
        }
        assert!("loitering".parse::<PlaybackPhase>().is_err());
    }

    #[test]
    fn session_serialization() {
        let mut session = PlaybackSession::new();
        session.begin_load("track-9", "https://example.com/x.mp3");

        let json = serde_json::to_string(&session).unwrap();
        assert!(json.contains("preparing"));

        let back: PlaybackSession = serde_json::from_str(&json).unwrap();
        assert_eq!(back, session);
    }
}
