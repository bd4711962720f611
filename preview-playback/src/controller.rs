//! # Playback Controller
//!
//! Orchestrates the preview session: drives the decoder, runs the progress
//! poller, evaluates the foreground policy, and publishes session snapshots
//! to observers.
//!
//! ## Concurrency model
//!
//! The controller is an actor. [`PlaybackController`] is a cheap cloneable
//! handle whose command methods are non-blocking sends into an unbounded
//! channel; a single spawned task owns the mutable [`PlaybackSession`] and
//! applies every input - UI commands, decoder resolutions, poller ticks,
//! visibility signals - strictly one at a time. No two session mutations can
//! interleave, and snapshots are emitted in exactly the order the mutations
//! happened.
//!
//! ## Generations
//!
//! Every `load` (and `reset`) bumps a generation counter and cancels the
//! previous load's guard token. Decoder `open` resolutions, decoder notices,
//! and poller ticks all carry the generation they were spawned under; the
//! actor discards anything stale, so a late "ready" for an abandoned track
//! can never resurrect a superseded session.
//!
//! ## Failure folding
//!
//! Decoder errors never escape as faults. Open failures, runtime decoder
//! errors, and loads without a streamable source all fold into the `Failed`
//! phase and are reported to observers exactly once; retry is a fresh
//! `load` from the UI layer.

use crate::config::PlaybackConfig;
use crate::foreground::{self, ForegroundDecision};
use crate::poller::ProgressPoller;
use crate::session::{PlaybackPhase, PlaybackSession};
use preview_bridge::{Decoder, DecoderEvent, ForegroundHost, Track};
use preview_runtime::events::EventBus;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

// ============================================================================
// Commands
// ============================================================================

/// Inputs serialized through the controller task.
///
/// The first group comes from the public handle, the second from tasks the
/// controller spawned itself (tagged with their generation).
pub(crate) enum Command {
    Load(Track),
    Play,
    Pause,
    Reset,
    AppVisibility(bool),
    OpenResolved {
        generation: u64,
        result: preview_bridge::Result<()>,
    },
    DecoderNotice {
        generation: u64,
        event: DecoderEvent,
    },
    Progress {
        generation: u64,
        position: Duration,
    },
}

// ============================================================================
// Public Handle
// ============================================================================

/// Handle to a running playback controller.
///
/// Clones share the same underlying controller task. All command methods are
/// non-blocking: they enqueue the command and return immediately; the
/// resulting phase transition happens inside the controller task and is
/// observable via [`subscribe`](PlaybackController::subscribe) or
/// [`current_state`](PlaybackController::current_state).
#[derive(Clone)]
pub struct PlaybackController {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<PlaybackSession>,
    events: EventBus<PlaybackSession>,
}

impl PlaybackController {
    /// Spawn a controller task over the given decoder and foreground host.
    pub fn spawn(
        decoder: Arc<dyn Decoder>,
        host: Arc<dyn ForegroundHost>,
        config: PlaybackConfig,
    ) -> Self {
        let (commands, inbox) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(PlaybackSession::new());
        let events = EventBus::new(config.event_capacity);

        let task = ControllerTask {
            session: PlaybackSession::new(),
            current_track: None,
            decoder,
            host,
            config,
            generation: 0,
            load_guard: None,
            poller: None,
            promoted: false,
            app_visible: true,
            commands: commands.downgrade(),
            events: events.clone(),
            state: state_tx,
        };
        tokio::spawn(task.run(inbox));

        Self {
            commands,
            state: state_rx,
            events,
        }
    }

    /// Load a track for preview playback.
    ///
    /// Cancels any in-flight load or running playback of a previous track.
    /// A track without a streamable preview URI lands directly in `Failed`.
    pub fn load(&self, track: Track) -> crate::Result<()> {
        self.send(Command::Load(track))
    }

    /// Start or resume playback.
    ///
    /// A no-op unless the session is `Ready`, `Paused`, or `Completed`
    /// (replay); tolerant of UI double-taps racing decoder readiness.
    pub fn play(&self) -> crate::Result<()> {
        self.send(Command::Play)
    }

    /// Pause playback. A no-op unless the session is `Playing`.
    pub fn pause(&self) -> crate::Result<()> {
        self.send(Command::Pause)
    }

    /// Drop the current track and return the session to `Empty`.
    pub fn reset(&self) -> crate::Result<()> {
        self.send(Command::Reset)
    }

    /// Report an app-visibility change from the OS-integration layer.
    pub fn set_app_visible(&self, visible: bool) -> crate::Result<()> {
        self.send(Command::AppVisibility(visible))
    }

    /// Synchronous snapshot of the current session. Never blocks.
    pub fn current_state(&self) -> PlaybackSession {
        self.state.borrow().clone()
    }

    /// Subscribe to session snapshots.
    ///
    /// Every phase change and every position update is delivered in
    /// emission order. Slow observers may see `Lagged` and resume with the
    /// newest snapshots; dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackSession> {
        self.events.subscribe()
    }

    fn send(&self, command: Command) -> crate::Result<()> {
        self.commands
            .send(command)
            .map_err(|_| crate::PlaybackError::ControllerClosed)
    }
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("session", &*self.state.borrow())
            .finish()
    }
}

// ============================================================================
// Controller Task
// ============================================================================

/// The single-writer actor behind [`PlaybackController`].
struct ControllerTask {
    session: PlaybackSession,
    current_track: Option<Track>,
    decoder: Arc<dyn Decoder>,
    host: Arc<dyn ForegroundHost>,
    config: PlaybackConfig,

    /// Monotonic tag distinguishing the current load from superseded ones.
    generation: u64,
    /// Cancels the open task and notice forwarder of the current load.
    load_guard: Option<CancellationToken>,
    poller: Option<ProgressPoller>,

    /// Whether the process currently holds a foreground promotion.
    promoted: bool,
    /// Visibility signal owned by the OS-integration layer.
    app_visible: bool,

    /// Weak self-sender handed to spawned helpers; weak so the controller
    /// shuts down once every public handle is gone.
    commands: mpsc::WeakUnboundedSender<Command>,
    events: EventBus<PlaybackSession>,
    state: watch::Sender<PlaybackSession>,
}

impl ControllerTask {
    async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = inbox.recv().await {
            match command {
                Command::Load(track) => self.handle_load(track).await,
                Command::Play => self.handle_play().await,
                Command::Pause => self.handle_pause().await,
                Command::Reset => self.handle_reset().await,
                Command::AppVisibility(visible) => self.handle_visibility(visible).await,
                Command::OpenResolved { generation, result } => {
                    self.handle_open_resolved(generation, result).await;
                }
                Command::DecoderNotice { generation, event } => {
                    self.handle_decoder_notice(generation, event).await;
                }
                Command::Progress {
                    generation,
                    position,
                } => self.handle_progress(generation, position).await,
            }
        }

        self.stop_poller();
        self.cancel_load_guard();
        debug!("playback controller shut down");
    }

    // ------------------------------------------------------------------
    // UI commands
    // ------------------------------------------------------------------

    async fn handle_load(&mut self, track: Track) {
        self.supersede();

        let Some(uri) = track.preview_url.clone() else {
            let error = crate::PlaybackError::MissingSource {
                track_id: track.id.clone(),
            };
            warn!(%error, "load rejected");
            self.session.fail_load(track.id.clone());
            self.current_track = Some(track);
            self.publish();
            self.apply_foreground().await;
            return;
        };

        info!(track_id = %track.id, "loading track");
        self.session.begin_load(track.id.clone(), uri.clone());
        self.current_track = Some(track);
        self.publish();
        self.apply_foreground().await;

        let guard = CancellationToken::new();
        self.load_guard = Some(guard.clone());
        self.spawn_open(uri, guard.clone());
        self.spawn_notice_forwarder(guard);
    }

    async fn handle_play(&mut self) {
        match self.session.phase {
            PlaybackPhase::Ready | PlaybackPhase::Paused => {
                if let Err(error) = self.decoder.start().await {
                    let error = crate::PlaybackError::from(error);
                    warn!(%error, "decoder start failed");
                    self.fail().await;
                    return;
                }
                if self.session.begin_play().is_ok() {
                    debug!(position_ms = self.session.position_ms, "playback started");
                    self.publish();
                    self.start_poller();
                    self.apply_foreground().await;
                }
            }
            PlaybackPhase::Completed => {
                // Replay from the top
                if let Err(error) = self.decoder.seek(Duration::ZERO).await {
                    let error = crate::PlaybackError::from(error);
                    warn!(%error, "decoder seek failed");
                    self.fail().await;
                    return;
                }
                if let Err(error) = self.decoder.start().await {
                    let error = crate::PlaybackError::from(error);
                    warn!(%error, "decoder start failed");
                    self.fail().await;
                    return;
                }
                if self.session.replay().is_ok() {
                    debug!("replaying completed track");
                    self.publish();
                    self.start_poller();
                    self.apply_foreground().await;
                }
            }
            phase => {
                debug!(%phase, "ignoring play command");
            }
        }
    }

    async fn handle_pause(&mut self) {
        if self.session.phase != PlaybackPhase::Playing {
            debug!(phase = %self.session.phase, "ignoring pause command");
            return;
        }

        self.stop_poller();
        if let Err(error) = self.decoder.pause().await {
            let error = crate::PlaybackError::from(error);
            warn!(%error, "decoder pause failed");
            self.fail().await;
            return;
        }
        if self.session.pause().is_ok() {
            debug!(position_ms = self.session.position_ms, "playback paused");
            self.publish();
            self.apply_foreground().await;
        }
    }

    async fn handle_reset(&mut self) {
        self.supersede();
        self.current_track = None;

        if let Err(error) = self.decoder.stop().await {
            warn!(%error, "decoder stop failed during reset");
        }

        let was_empty = self.session.phase == PlaybackPhase::Empty;
        self.session.reset();
        if !was_empty {
            info!("session reset");
            self.publish();
        }
        self.apply_foreground().await;
    }

    async fn handle_visibility(&mut self, visible: bool) {
        if self.app_visible != visible {
            debug!(visible, "app visibility changed");
        }
        self.app_visible = visible;
        self.apply_foreground().await;
    }

    // ------------------------------------------------------------------
    // Decoder feedback
    // ------------------------------------------------------------------

    async fn handle_open_resolved(
        &mut self,
        generation: u64,
        result: preview_bridge::Result<()>,
    ) {
        if generation != self.generation {
            debug!(generation, "discarding stale open resolution");
            return;
        }
        if self.session.phase != PlaybackPhase::Preparing {
            debug!(phase = %self.session.phase, "open resolved outside of preparing");
            return;
        }

        match result {
            Ok(()) => {
                if self.session.mark_ready().is_ok() {
                    info!(track_id = ?self.session.track_id, "stream ready");
                    self.publish();
                    self.apply_foreground().await;
                }
            }
            Err(error) => {
                let error = crate::PlaybackError::from(error);
                warn!(%error, "failed to open stream");
                self.fail().await;
            }
        }
    }

    async fn handle_decoder_notice(&mut self, generation: u64, event: DecoderEvent) {
        if generation != self.generation {
            debug!(generation, "discarding stale decoder notice");
            return;
        }

        match event {
            DecoderEvent::Finished => {
                if self.session.phase != PlaybackPhase::Playing {
                    return;
                }
                self.stop_poller();
                if self.session.complete().is_ok() {
                    info!(track_id = ?self.session.track_id, "track completed");
                    self.publish();
                    self.apply_foreground().await;
                }
            }
            DecoderEvent::Error { message } => {
                let error = crate::PlaybackError::DecoderFailed { message };
                warn!(%error, "decoder reported failure");
                self.fail().await;
            }
        }
    }

    async fn handle_progress(&mut self, generation: u64, position: Duration) {
        if generation != self.generation || self.session.phase != PlaybackPhase::Playing {
            return;
        }

        let position_ms = position.as_millis() as u64;
        if self.session.update_position(position_ms).is_ok() {
            self.publish();
            self.apply_foreground().await;
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Invalidate everything belonging to the previous load: cancel its
    /// guard (open task + notice forwarder), silence the poller, and bump
    /// the generation so anything still in flight is rejected on arrival.
    fn supersede(&mut self) {
        self.generation += 1;
        self.cancel_load_guard();
        self.stop_poller();
    }

    fn cancel_load_guard(&mut self) {
        if let Some(guard) = self.load_guard.take() {
            guard.cancel();
        }
    }

    /// Fold a decoder failure into the `Failed` phase.
    async fn fail(&mut self) {
        self.stop_poller();
        if self.session.mark_failed().is_ok() {
            self.publish();
            self.apply_foreground().await;
        }
    }

    fn publish(&self) {
        let snapshot = self.session.clone();
        self.state.send_replace(snapshot.clone());
        self.events.emit(snapshot).ok();
    }

    /// Idempotent: a no-op when the poller is already running.
    fn start_poller(&mut self) {
        if self.poller.is_some() || self.session.phase != PlaybackPhase::Playing {
            return;
        }
        self.poller = Some(ProgressPoller::spawn(
            Arc::clone(&self.decoder),
            self.commands.clone(),
            self.generation,
            self.config.progress_interval,
        ));
    }

    /// Idempotent: a no-op when the poller is already stopped.
    fn stop_poller(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop();
        }
    }

    async fn apply_foreground(&mut self) {
        let decision = foreground::decide(self.session.phase, self.app_visible, self.promoted);
        if !decision.requires_action() {
            return;
        }
        match decision {
            ForegroundDecision::BecomeForeground => {
                let text = self
                    .current_track
                    .as_ref()
                    .map(Track::display_text)
                    .unwrap_or_default();
                self.promoted = true;
                info!(%text, "promoting to foreground");
                if let Err(error) = self.host.promote(&text).await {
                    warn!(%error, "foreground promotion failed");
                }
            }
            ForegroundDecision::LeaveForeground => {
                self.promoted = false;
                info!("demoting from foreground");
                if let Err(error) = self.host.demote().await {
                    warn!(%error, "foreground demotion failed");
                }
            }
            // Remain* decisions were filtered out above
            ForegroundDecision::RemainForeground | ForegroundDecision::RemainBackground => {}
        }
    }

    /// Resolve the decoder open off the actor so loads never block the
    /// command loop; the guard aborts it when the load is superseded.
    fn spawn_open(&self, uri: String, guard: CancellationToken) {
        let decoder = Arc::clone(&self.decoder);
        let commands = self.commands.clone();
        let generation = self.generation;

        tokio::spawn(async move {
            tokio::select! {
                _ = guard.cancelled() => {}
                result = decoder.open(&uri) => {
                    if let Some(commands) = commands.upgrade() {
                        let _ = commands.send(Command::OpenResolved { generation, result });
                    }
                }
            }
        });
    }

    /// Forward decoder notices (finished, runtime errors) for the current
    /// load, tagged with its generation.
    fn spawn_notice_forwarder(&self, guard: CancellationToken) {
        let mut notices = self.decoder.subscribe();
        let commands = self.commands.clone();
        let generation = self.generation;

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = guard.cancelled() => break,
                    notice = notices.recv() => match notice {
                        Ok(event) => {
                            let Some(commands) = commands.upgrade() else { break };
                            if commands
                                .send(Command::DecoderNotice { generation, event })
                                .is_err()
                            {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            warn!(missed, "decoder notices lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        });
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use preview_bridge::DecoderEvents;

    mock! {
        pub StrictDecoder {}

        #[async_trait::async_trait]
        impl Decoder for StrictDecoder {
            async fn open(&self, uri: &str) -> preview_bridge::Result<()>;
            async fn start(&self) -> preview_bridge::Result<()>;
            async fn pause(&self) -> preview_bridge::Result<()>;
            async fn seek(&self, position: Duration) -> preview_bridge::Result<()>;
            async fn position(&self) -> preview_bridge::Result<Duration>;
            async fn stop(&self) -> preview_bridge::Result<()>;
            fn subscribe(&self) -> DecoderEvents;
        }
    }

    mock! {
        pub StrictHost {}

        #[async_trait::async_trait]
        impl ForegroundHost for StrictHost {
            async fn promote(&self, display_text: &str) -> preview_bridge::Result<()>;
            async fn demote(&self) -> preview_bridge::Result<()>;
        }
    }

    /// Commands that are no-ops in `Empty` must touch neither the decoder
    /// nor the host: the mocks have no expectations, so any call panics.
    #[tokio::test]
    async fn play_and_pause_on_empty_session_touch_nothing() {
        let decoder = Arc::new(MockStrictDecoder::new());
        let host = Arc::new(MockStrictHost::new());
        let controller = PlaybackController::spawn(decoder, host, PlaybackConfig::default());
        let mut snapshots = controller.subscribe();

        controller.play().unwrap();
        controller.pause().unwrap();
        controller.set_app_visible(false).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(controller.current_state().phase, PlaybackPhase::Empty);
        assert!(snapshots.try_recv().is_err(), "no snapshot for no-ops");
    }

    #[tokio::test]
    async fn load_without_preview_fails_without_opening_decoder() {
        let decoder = Arc::new(MockStrictDecoder::new());
        let host = Arc::new(MockStrictHost::new());
        let controller = PlaybackController::spawn(decoder, host, PlaybackConfig::default());
        let mut snapshots = controller.subscribe();

        controller
            .load(Track::without_preview("t1", "No Preview"))
            .unwrap();

        let snapshot = snapshots.recv().await.unwrap();
        assert_eq!(snapshot.phase, PlaybackPhase::Failed);
        assert_eq!(snapshot.track_id.as_deref(), Some("t1"));
        assert!(snapshot.source_uri.is_none());
    }

    #[tokio::test]
    async fn clones_keep_the_controller_alive() {
        let decoder = Arc::new(MockStrictDecoder::new());
        let host = Arc::new(MockStrictHost::new());
        let controller = PlaybackController::spawn(decoder, host, PlaybackConfig::default());

        let probe = controller.clone();
        drop(controller);
        // The remaining clone keeps the task alive
        assert!(probe.play().is_ok());
    }
}
