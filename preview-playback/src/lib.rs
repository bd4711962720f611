//! # Preview Playback
//!
//! Session orchestration for 30-second track previews.
//!
//! ## Overview
//!
//! This crate turns a platform decoder and a foreground host (both abstract
//! traits from `preview-bridge`) into a safe, race-free playback controller:
//!
//! - [`PlaybackSession`] / [`PlaybackPhase`]: the validated state machine a
//!   preview moves through, from `Empty` to `Playing` to `Completed`.
//! - [`PlaybackController`]: the actor-backed command surface the UI talks
//!   to. All mutations are serialized through a single task; stale decoder
//!   callbacks from superseded loads are discarded by generation.
//! - [`foreground`]: the pure promote/demote policy keeping audio alive when
//!   the app leaves the screen while playing.
//! - [`PlaybackConfig`]: tunables (progress poll interval, event capacity).
//!
//! ## Usage
//!
//! ```ignore
//! let controller = PlaybackController::spawn(decoder, host, PlaybackConfig::default());
//! controller.load(track)?;
//! let mut snapshots = controller.subscribe();
//! while let Ok(session) = snapshots.recv().await {
//!     render(&session);
//! }
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod foreground;
mod poller;
pub mod session;

pub use config::PlaybackConfig;
pub use controller::PlaybackController;
pub use error::{PlaybackError, Result};
pub use foreground::{decide, ForegroundDecision};
pub use session::{PlaybackPhase, PlaybackSession};
