//! # Progress Poller
//!
//! Periodic sampling of the decoder offset while a track plays.
//!
//! The poller is a cooperatively cancellable task owned by the controller:
//! started exactly once on entry into `Playing`, cancelled exactly once on
//! any exit. It never mutates the session itself - every sample goes back
//! through the controller's command channel, tagged with the generation of
//! the load it belongs to, so a tick in flight across a `load`/`reset` race
//! is discarded by the same guard as any other stale message.
//!
//! A transient `position()` failure skips the tick; the session keeps its
//! last known offset and the loop carries on.

use crate::controller::Command;
use preview_bridge::Decoder;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Handle for a running progress sampling task.
pub(crate) struct ProgressPoller {
    token: CancellationToken,
}

impl ProgressPoller {
    /// Spawn the sampling loop.
    ///
    /// Every `period`, reads the decoder offset and reports it through
    /// `commands`. The loop exits when cancelled, or when the controller is
    /// gone.
    pub(crate) fn spawn(
        decoder: Arc<dyn Decoder>,
        commands: mpsc::WeakUnboundedSender<Command>,
        generation: u64,
        period: Duration,
    ) -> Self {
        let token = CancellationToken::new();
        let loop_token = token.clone();

        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = loop_token.cancelled() => break,
                    _ = ticker.tick() => {
                        match decoder.position().await {
                            Ok(position) => {
                                let Some(commands) = commands.upgrade() else {
                                    break;
                                };
                                if commands
                                    .send(Command::Progress { generation, position })
                                    .is_err()
                                {
                                    break;
                                }
                            }
                            Err(error) => {
                                // Transient: keep the last known position
                                debug!(%error, "position read failed, skipping tick");
                            }
                        }
                    }
                }
            }
        });

        Self { token }
    }

    /// Cancel the sampling loop. Idempotent; the task observes the token
    /// within one tick period.
    pub(crate) fn stop(&self) {
        self.token.cancel();
    }
}

impl Drop for ProgressPoller {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
