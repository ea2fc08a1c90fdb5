//! Async event loop wiring the session to the transport and the tickers.
//!
//! All session mutation happens on this one task. The two periodic tasks of
//! live mode (1 s playhead, 20 s segment generation) never touch state
//! directly: they send epoch-tagged tick messages back into the loop, and the
//! session discards any tick whose epoch is stale. Leaving live mode aborts
//! both tasks and bumps the epoch, so cancellation is deterministic even if a
//! tick was already in flight.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::session::{CallSession, SessionSnapshot};
use crate::wire::{TransportCommand, TransportEvent};

/// Playhead advance cadence while live.
pub const PLAYHEAD_TICK: Duration = Duration::from_secs(1);

/// Segment emission cadence while live.
pub const GENERATION_TICK: Duration = Duration::from_secs(20);

/// UI-facing control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    StartRecording,
    StopRecording,
    StaticPreview,
    ClearHistory,
}

#[derive(Debug)]
enum Tick {
    Playhead { epoch: u64 },
    Generation { epoch: u64 },
}

/// The two interval tasks of one live run, tied to the epoch they serve.
struct LiveTickers {
    epoch: u64,
    playhead: JoinHandle<()>,
    generation: JoinHandle<()>,
}

impl LiveTickers {
    fn spawn(epoch: u64, tick_tx: &mpsc::UnboundedSender<Tick>) -> Self {
        let playhead = spawn_ticker(PLAYHEAD_TICK, tick_tx.clone(), move || Tick::Playhead {
            epoch,
        });
        let generation = spawn_ticker(GENERATION_TICK, tick_tx.clone(), move || {
            Tick::Generation { epoch }
        });
        Self {
            epoch,
            playhead,
            generation,
        }
    }

    fn abort(self) {
        self.playhead.abort();
        self.generation.abort();
    }
}

fn spawn_ticker(
    period: Duration,
    tx: mpsc::UnboundedSender<Tick>,
    make: impl Fn() -> Tick + Send + 'static,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // the first tick completes immediately; the cadence starts after it
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if tx.send(make()).is_err() {
                break;
            }
        }
    })
}

fn start_tickers(
    tickers: &mut Option<LiveTickers>,
    epoch: u64,
    tick_tx: &mpsc::UnboundedSender<Tick>,
) {
    // check-before-create: never a second ticker pair for the same epoch
    if let Some(existing) = tickers {
        if existing.epoch == epoch {
            warn!(epoch, "live tickers already running");
            return;
        }
    }
    if let Some(stale) = tickers.take() {
        stale.abort();
    }
    *tickers = Some(LiveTickers::spawn(epoch, tick_tx));
    debug!(epoch, "live tickers started");
}

fn stop_tickers(tickers: &mut Option<LiveTickers>) {
    if let Some(live) = tickers.take() {
        debug!(epoch = live.epoch, "live tickers cancelled");
        live.abort();
    }
}

fn send_command(tx: &mpsc::UnboundedSender<TransportCommand>, command: TransportCommand) {
    if tx.send(command).is_err() {
        error!("transport command channel closed");
    }
}

/// Run one session until both input channels close.
///
/// A fresh [`SessionSnapshot`] is published on `snapshot_tx` after every
/// state-changing event. Teardown aborts the tickers and drops all state;
/// there is no partial-teardown state.
pub async fn run(
    mut transport_rx: mpsc::UnboundedReceiver<TransportEvent>,
    mut control_rx: mpsc::UnboundedReceiver<ControlMessage>,
    command_tx: mpsc::UnboundedSender<TransportCommand>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    mut session: CallSession,
) {
    let (tick_tx, mut tick_rx) = mpsc::unbounded_channel();
    let mut tickers: Option<LiveTickers> = None;

    info!("session runner started");
    loop {
        tokio::select! {
            event = transport_rx.recv() => {
                let Some(event) = event else { break };
                let was_recording = session.is_recording();
                session.apply_transport(event);
                if was_recording && !session.is_recording() {
                    stop_tickers(&mut tickers);
                }
            }
            message = control_rx.recv() => {
                let Some(message) = message else { break };
                match message {
                    ControlMessage::StartRecording => match session.start_recording() {
                        Ok(Some(command)) => {
                            send_command(&command_tx, command);
                            start_tickers(&mut tickers, session.epoch(), &tick_tx);
                        }
                        Ok(None) => debug!("already recording"),
                        Err(e) => warn!("start_recording rejected: {e}"),
                    },
                    ControlMessage::StopRecording => match session.stop_recording() {
                        Ok(Some(command)) => {
                            send_command(&command_tx, command);
                            stop_tickers(&mut tickers);
                        }
                        Ok(None) => debug!("already stopped"),
                        Err(e) => warn!("stop_recording rejected: {e}"),
                    },
                    ControlMessage::StaticPreview => {
                        if let Some(command) = session.static_preview() {
                            send_command(&command_tx, command);
                        }
                        stop_tickers(&mut tickers);
                    }
                    ControlMessage::ClearHistory => session.clear_history(),
                }
            }
            Some(tick) = tick_rx.recv() => {
                match tick {
                    Tick::Playhead { epoch } => session.playhead_tick(epoch),
                    Tick::Generation { epoch } => session.generation_tick(epoch),
                }
            }
        }
        snapshot_tx.send_replace(session.snapshot());
    }

    stop_tickers(&mut tickers);
    info!("session runner shut down");
}
