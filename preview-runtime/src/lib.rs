//! # Runtime Module
//!
//! Provides foundational runtime infrastructure for the preview player:
//! - Logging and tracing infrastructure
//! - Broadcast event bus primitives
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the other workspace crates
//! depend on. It establishes the logging conventions and the event
//! broadcasting mechanism used to publish playback state to observers.

pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
pub use events::{EventBus, EventStream};
pub use logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
