//! OS Foreground Integration
//!
//! While audio plays with no visible UI surface, mobile platforms will
//! eventually kill the hosting process unless it is promoted to a
//! user-visible "foreground" state (a persistent notification on Android,
//! the equivalent background-audio entitlement flow on iOS). The playback
//! core decides *when* promotion is needed; this trait is *how* the request
//! reaches the OS.
//!
//! # Platform Notes
//!
//! - **Android**: `startForeground` with a media notification carrying the
//!   display text, `stopForeground` on demotion
//! - **iOS**: activate/deactivate the audio session category
//! - **Desktop**: typically a no-op implementation

use crate::error::Result;

/// OS integration for foreground promotion of the hosting process.
///
/// Implementations must be idempotent: promoting an already-promoted process
/// or demoting an already-background one is a safe no-op. The core still
/// avoids issuing redundant calls, but adapters should not rely on that.
#[async_trait::async_trait]
pub trait ForegroundHost: Send + Sync {
    /// Request foreground promotion, showing `display_text` to the user.
    async fn promote(&self, display_text: &str) -> Result<()>;

    /// Drop the foreground promotion and return to a normal background state.
    async fn demote(&self) -> Result<()>;
}
