//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the playback core and the
//! platform-specific layers around it. The core never talks to a concrete
//! media engine or to the OS directly; it drives a [`Decoder`](decoder::Decoder)
//! and asks a [`ForegroundHost`](host::ForegroundHost) to keep the process
//! alive while unattended audio plays. Each supported platform (desktop,
//! iOS, Android) ships its own adapters for these traits.
//!
//! ## Traits
//!
//! - [`Decoder`](decoder::Decoder) - opaque media decoder: open a stream URI,
//!   start/pause/seek, report the current offset, announce end-of-stream
//! - [`ForegroundHost`](host::ForegroundHost) - OS integration for promoting
//!   the process to a user-visible foreground state (e.g., a notification)
//!
//! ## Types
//!
//! - [`Track`](track::Track) - descriptor supplied by the search/playlist
//!   layer; the core only interprets its preview URI and display text
//! - [`DecoderEvent`](decoder::DecoderEvent) - asynchronous decoder
//!   notifications (finished, runtime error)
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Platform
//! implementations should convert native errors into `BridgeError` with an
//! actionable message; the core folds them into its own failure state and
//! never lets them propagate as panics.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so adapters can be shared across
//! async tasks behind an `Arc`.

pub mod decoder;
pub mod error;
pub mod host;
pub mod track;

pub use error::{BridgeError, Result};

// Re-export commonly used types
pub use decoder::{Decoder, DecoderEvent, DecoderEvents};
pub use host::ForegroundHost;
pub use track::Track;
