//! Workspace facade crate.
//!
//! Host applications can depend on `preview-player` and get the bridge traits,
//! the runtime utilities, and the playback core re-exported from one place
//! instead of wiring each workspace crate individually.

pub use preview_bridge as bridge;
pub use preview_playback as playback;
pub use preview_runtime as runtime;
