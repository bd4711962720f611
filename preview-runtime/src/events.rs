//! # Event Bus
//!
//! Broadcast primitives for publishing state to observers, built on
//! `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! The playback core publishes a snapshot of its session after every state
//! change. Zero, one, or many observers (UI surfaces, the OS-integration
//! layer) can attach and detach independently; the publisher never needs to
//! know who is listening. [`EventBus`] is the publishing half,
//! [`EventStream`] an optional receiving wrapper with predicate filtering.
//!
//! ## Ordering and lag
//!
//! `broadcast` delivers events to every live subscriber in emission order.
//! A subscriber that falls more than the bus capacity behind receives
//! `RecvError::Lagged(n)` and resumes with the newest events; this is the
//! coalescing behavior wanted for position ticks (a newer position always
//! supersedes an undelivered older one). Subscribers should treat `Lagged`
//! as non-fatal and `Closed` as shutdown.
//!
//! ## Usage
//!
//! ```rust
//! use preview_runtime::events::EventBus;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus: EventBus<u32> = EventBus::new(16);
//! let mut sub = bus.subscribe();
//!
//! bus.emit(7).ok();
//! assert_eq!(sub.recv().await.unwrap(), 7);
//! # }
//! ```

use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for an event bus channel.
///
/// Balances memory usage with the ability to absorb bursts of position
/// ticks. Subscribers that fall further behind receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 64;

// ============================================================================
// Event Bus
// ============================================================================

/// Central bus for publishing events of type `T` to any number of observers.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned per subscriber)
/// - Lagging detection for slow subscribers
pub struct EventBus<T> {
    sender: broadcast::Sender<T>,
}

impl<T: Clone> EventBus<T> {
    /// Creates a new event bus with the specified buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error when there are no active subscribers. Publishers that do not
    /// care whether anyone is listening call `.ok()` on the result.
    pub fn emit(&self, event: T) -> Result<usize, SendError<T>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber receiving all events emitted after this call.
    ///
    /// Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<T> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<T: Clone> Default for EventBus<T> {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl<T> Clone for EventBus<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T> fmt::Debug for EventBus<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.sender.receiver_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with predicate filtering.
///
/// Useful for observers that only care about a subset of events, e.g. phase
/// changes but not position ticks.
pub struct EventStream<T> {
    receiver: Receiver<T>,
    filter: Option<EventFilter<T>>,
}

impl<T: Clone> EventStream<T> {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<T>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Adds a filter predicate; `recv` only returns events that match.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` when the subscriber fell behind by `n`
    /// events, `RecvError::Closed` when all senders have been dropped.
    pub async fn recv(&mut self) -> Result<T, RecvError> {
        loop {
            let event = self.receiver.recv().await?;

            let Some(filter) = &self.filter else {
                return Ok(event);
            };

            if filter(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive a matching event without blocking.
    ///
    /// Returns `None` when no events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<T, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    let Some(filter) = &self.filter else {
                        return Some(Ok(event));
                    };

                    if filter(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl<T> fmt::Debug for EventStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
