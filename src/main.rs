//! VoicePulse - live call voice-metric and emotion timeline core
//!
//! Ingests per-second voice-metric samples and discrete emotion events from
//! an external analysis transport, keeps bounded rolling history for the
//! rendering layer, and maintains a scrolling emotion timeline with a
//! playhead-driven active-segment lookup. Running the binary starts a demo
//! session against a simulated transport.

#![forbid(unsafe_code)]

/// Bounded rolling buffers for metric and emotion history
pub mod history;
/// Connection and recording state arbitration
pub mod lifecycle;
/// Async event loop and live-mode tickers
pub mod runner;
/// Emotion segment generation (static replay and live emission)
pub mod segment;
/// Composed per-call state and its snapshot view
pub mod session;
/// Scrolling time window and active-segment lookup
pub mod timeline;
/// Transport message shapes and decoding
pub mod wire;

use std::time::Duration;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{mpsc, watch};
use tokio::time::interval;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::runner::ControlMessage;
use crate::session::CallSession;
use crate::wire::{MetricChannel, MetricSample, Speaker, TransportEvent};

const DEMO_EMOTIONS: [&str; 4] = ["neutral", "happy", "frustrated", "calm"];

fn simulated_sample(rng: &mut StdRng, tick: u64) -> MetricSample {
    let is_speech = rng.random_bool(0.85);
    let mut channel = |scale: f64| {
        let value = if is_speech {
            rng.random_range(0.05..1.0)
        } else {
            0.001
        };
        MetricChannel {
            value,
            raw: value * scale,
        }
    };
    MetricSample {
        time: tick.to_string(),
        pitch: channel(100.0),
        energy: channel(0.1),
        speaking_rate: channel(4.0),
        emotion: None,
        is_speech,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    info!("starting voicepulse demo session");

    let (transport_tx, transport_rx) = mpsc::unbounded_channel();
    let (control_tx, control_rx) = mpsc::unbounded_channel();
    let (command_tx, mut command_rx) = mpsc::unbounded_channel();
    let session = CallSession::new(Speaker::Agent);
    let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot());

    tokio::spawn(runner::run(
        transport_rx,
        control_rx,
        command_tx,
        snapshot_tx,
        session,
    ));

    // Echo the commands the real socket layer would forward to the backend.
    tokio::spawn(async move {
        while let Some(command) = command_rx.recv().await {
            info!("transport command: {}", command.as_str());
        }
    });

    transport_tx.send(TransportEvent::Connected)?;
    control_tx.send(ControlMessage::StartRecording)?;

    // Simulated analysis backend: one metric sample per second, an emotion
    // reading every five.
    let feeder_tx = transport_tx.clone();
    let feeder = tokio::spawn(async move {
        let mut rng = StdRng::from_os_rng();
        let mut ticker = interval(Duration::from_secs(1));
        let mut tick = 0u64;
        loop {
            ticker.tick().await;
            let sample = simulated_sample(&mut rng, tick);
            if feeder_tx.send(TransportEvent::GraphData(sample)).is_err() {
                break;
            }
            if tick % 5 == 4 {
                let emotion = DEMO_EMOTIONS[rng.random_range(0..DEMO_EMOTIONS.len())];
                let event = TransportEvent::EmotionData {
                    emotion: emotion.to_string(),
                    prob: rng.random_range(0.5..1.0),
                };
                if feeder_tx.send(event).is_err() {
                    break;
                }
            }
            tick += 1;
        }
    });

    // Poll the read view the way a rendering layer would.
    let printer = tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(5));
        loop {
            ticker.tick().await;
            let snap = snapshot_rx.borrow().clone();
            let active = snap
                .timeline
                .active_segment
                .as_ref()
                .map(|s| s.emotion.as_str())
                .unwrap_or("-");
            info!(
                time = snap.timeline.current_time,
                offset = snap.timeline.offset,
                segments = snap.timeline.segments.len(),
                emotion = %snap.current_emotion,
                active,
                points = snap.pitch.len(),
                events = snap.emotion_events.len(),
                "session"
            );
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    transport_tx.send(TransportEvent::Disconnected)?;
    feeder.abort();
    printer.abort();
    Ok(())
}
