//! # Foreground Promotion Policy
//!
//! Decides when the hosting process must be promoted to a user-visible
//! foreground state so the OS does not kill it while audio plays with no
//! visible UI.
//!
//! The rule is deliberately narrow: promotion is required if and only if
//! audio is audible *and* unattended, i.e. `phase == Playing` while the app
//! has no visible surface. Everything else - paused, completed, failed, or
//! a visible app - drops back to (or stays in) background. Keying the
//! decision off the phase rather than "a track is loaded" is what makes
//! `Paused` in the background release the promotion.
//!
//! The policy is a pure function; the controller feeds it the session phase,
//! the externally-owned visibility signal, and the current promotion state,
//! and only talks to the OS when the decision actually flips that state.

use crate::session::PlaybackPhase;

/// Outcome of a foreground policy evaluation.
///
/// Derived fresh on every session or visibility change, never stored. The
/// `Remain*` variants exist so callers can skip redundant OS calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForegroundDecision {
    /// Promotion is required and not yet held: request it.
    BecomeForeground,
    /// Promotion is required and already held: nothing to do.
    RemainForeground,
    /// Promotion is held but no longer required: release it.
    LeaveForeground,
    /// Promotion is not required and not held: nothing to do.
    RemainBackground,
}

impl ForegroundDecision {
    /// Whether this decision requires an OS call.
    pub fn requires_action(&self) -> bool {
        matches!(
            self,
            ForegroundDecision::BecomeForeground | ForegroundDecision::LeaveForeground
        )
    }
}

/// Evaluate the foreground policy.
///
/// `promoted` is the caller's record of whether the process currently holds
/// a foreground promotion.
pub fn decide(phase: PlaybackPhase, app_visible: bool, promoted: bool) -> ForegroundDecision {
    let required = phase == PlaybackPhase::Playing && !app_visible;

    match (required, promoted) {
        (true, false) => ForegroundDecision::BecomeForeground,
        (true, true) => ForegroundDecision::RemainForeground,
        (false, true) => ForegroundDecision::LeaveForeground,
        (false, false) => ForegroundDecision::RemainBackground,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_PHASES: [PlaybackPhase; 7] = [
        PlaybackPhase::Empty,
        PlaybackPhase::Preparing,
        PlaybackPhase::Ready,
        PlaybackPhase::Playing,
        PlaybackPhase::Paused,
        PlaybackPhase::Completed,
        PlaybackPhase::Failed,
    ];

    #[test]
    fn unattended_playback_promotes() {
        assert_eq!(
            decide(PlaybackPhase::Playing, false, false),
            ForegroundDecision::BecomeForeground
        );
        assert_eq!(
            decide(PlaybackPhase::Playing, false, true),
            ForegroundDecision::RemainForeground
        );
    }

    #[test]
    fn visible_playback_stays_background() {
        assert_eq!(
            decide(PlaybackPhase::Playing, true, false),
            ForegroundDecision::RemainBackground
        );
        assert_eq!(
            decide(PlaybackPhase::Playing, true, true),
            ForegroundDecision::LeaveForeground
        );
    }

    #[test]
    fn only_playing_ever_promotes() {
        for phase in ALL_PHASES {
            if phase == PlaybackPhase::Playing {
                continue;
            }
            for visible in [true, false] {
                assert_eq!(
                    decide(phase, visible, false),
                    ForegroundDecision::RemainBackground,
                    "phase {phase} visible {visible}"
                );
                assert_eq!(
                    decide(phase, visible, true),
                    ForegroundDecision::LeaveForeground,
                    "phase {phase} visible {visible}"
                );
            }
        }
    }

    #[test]
    fn pause_in_background_demotes() {
        // The case the policy exists for: backgrounded playback is paused,
        // the promotion must drop even though the app is still hidden.
        assert_eq!(
            decide(PlaybackPhase::Paused, false, true),
            ForegroundDecision::LeaveForeground
        );
    }

    #[test]
    fn requires_action_matches_variants() {
        assert!(ForegroundDecision::BecomeForeground.requires_action());
        assert!(ForegroundDecision::LeaveForeground.requires_action());
        assert!(!ForegroundDecision::RemainForeground.requires_action());
        assert!(!ForegroundDecision::RemainBackground.requires_action());
    }
}
