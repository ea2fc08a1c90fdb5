//! One call session: the composed state the rendering layer reads.
//!
//! A `CallSession` exclusively owns the lifecycle, the rolling histories, the
//! segment generator and the timeline window for a single call. All mutation
//! happens on one event loop; the two live-mode tickers only deliver
//! epoch-tagged messages, and a tick whose epoch is stale is a logged no-op.
//! That makes cancellation deterministic: leaving live mode bumps the epoch,
//! so a callback already scheduled can never fire into the new mode's state.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use crate::history::{EmotionEventLog, MetricHistory, MetricPoint, EMOTION_LOG_CAPACITY};
use crate::lifecycle::{CommandError, ConnectionLifecycle};
use crate::segment::{EmotionSegment, SegmentGenerator};
use crate::timeline::TimelineWindow;
use crate::wire::{EmotionEvent, MetricSample, Speaker, TransportCommand, TransportEvent};

/// Headline emotion before any reading has arrived.
pub const DEFAULT_EMOTION: &str = "Neutral";

pub struct CallSession {
    lifecycle: ConnectionLifecycle,
    metrics: MetricHistory,
    emotion_log: EmotionEventLog,
    latest_sample: Option<MetricSample>,
    current_emotion: String,
    generator: SegmentGenerator,
    timeline: TimelineWindow,
    epoch: u64,
}

impl CallSession {
    /// A fresh session showing the static preview until recording starts.
    pub fn new(speaker: Speaker) -> Self {
        Self::from_generator(SegmentGenerator::new(speaker))
    }

    /// Deterministic session for tests and replays.
    pub fn seeded(speaker: Speaker, seed: u64) -> Self {
        Self::from_generator(SegmentGenerator::seeded(speaker, seed))
    }

    fn from_generator(mut generator: SegmentGenerator) -> Self {
        generator.start_static();
        let mut timeline = TimelineWindow::new();
        timeline.segments_changed(generator.total_duration());
        Self {
            lifecycle: ConnectionLifecycle::new(),
            metrics: MetricHistory::new(),
            emotion_log: EmotionEventLog::new(EMOTION_LOG_CAPACITY),
            latest_sample: None,
            current_emotion: DEFAULT_EMOTION.to_string(),
            generator,
            timeline,
            epoch: 0,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.lifecycle.is_connected()
    }

    pub fn is_recording(&self) -> bool {
        self.lifecycle.is_recording()
    }

    /// Current live-mode epoch. Ticks carrying any other value are stale.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Apply one event from the transport collaborator.
    pub fn apply_transport(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected => self.lifecycle.on_connected(),
            TransportEvent::Disconnected => {
                // Expected transition, not a fault: recording is forced off,
                // buffered history and segments are retained.
                if self.lifecycle.on_disconnected() {
                    self.epoch += 1;
                }
            }
            TransportEvent::GraphData(sample) => self.apply_metric_sample(sample),
            TransportEvent::EmotionData { emotion, prob } => {
                self.apply_emotion_event(emotion, prob)
            }
        }
    }

    /// Arbitrated start. On the idle→recording transition the generator
    /// enters live mode with a fresh initial segment and the playhead
    /// rewinds.
    pub fn start_recording(&mut self) -> Result<Option<TransportCommand>, CommandError> {
        let command = self.lifecycle.start()?;
        if command.is_some() {
            self.epoch += 1;
            self.generator.start_live();
            self.timeline.reset();
            self.timeline.segments_changed(self.generator.total_duration());
            info!(epoch = self.epoch, "live segment generation started");
        }
        Ok(command)
    }

    /// Arbitrated stop. Leaving live mode bumps the epoch so in-flight ticks
    /// go stale; the timeline freezes where it is.
    pub fn stop_recording(&mut self) -> Result<Option<TransportCommand>, CommandError> {
        let command = self.lifecycle.stop()?;
        if command.is_some() {
            self.epoch += 1;
        }
        Ok(command)
    }

    /// Switch to the fixed static replay. Stops an active recording first and
    /// returns the stop command when one was emitted.
    pub fn static_preview(&mut self) -> Option<TransportCommand> {
        // recording implies connected, so this stop cannot be rejected
        let command = if self.lifecycle.is_recording() {
            self.lifecycle.stop().ok().flatten()
        } else {
            None
        };
        self.epoch += 1;
        self.generator.start_static();
        self.timeline.reset();
        self.timeline.segments_changed(self.generator.total_duration());
        info!("switched to static preview");
        command
    }

    fn apply_metric_sample(&mut self, sample: MetricSample) {
        if !self.lifecycle.is_recording() {
            debug!("dropping metric sample while not recording");
            return;
        }
        self.metrics.ingest(&sample);
        self.latest_sample = Some(sample);
    }

    fn apply_emotion_event(&mut self, emotion: String, prob: f32) {
        if !self.lifecycle.is_recording() {
            debug!("dropping emotion event while not recording");
            return;
        }
        self.current_emotion = emotion.clone();
        self.emotion_log.push(EmotionEvent {
            emotion,
            probability: prob,
            timestamp: Utc::now(),
            speaker: Speaker::Agent,
        });
    }

    /// One-second playhead tick, valid only for the current epoch.
    pub fn playhead_tick(&mut self, epoch: u64) {
        if epoch != self.epoch {
            debug!(epoch, current = self.epoch, "discarding stale playhead tick");
            return;
        }
        if !self.lifecycle.is_recording() {
            return;
        }
        self.timeline.playhead_tick();
    }

    /// Twenty-second segment emission tick, valid only for the current epoch.
    pub fn generation_tick(&mut self, epoch: u64) {
        if epoch != self.epoch {
            debug!(epoch, current = self.epoch, "discarding stale generation tick");
            return;
        }
        if !self.lifecycle.is_recording() {
            return;
        }
        self.generator.generation_tick();
        self.timeline.segments_changed(self.generator.total_duration());
    }

    /// Drop the rolling histories. The segment sequence is untouched.
    pub fn clear_history(&mut self) {
        self.metrics.clear();
        self.emotion_log.clear();
        self.latest_sample = None;
        self.current_emotion = DEFAULT_EMOTION.to_string();
        info!("history cleared");
    }

    /// Immutable read view for the rendering layer.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            is_connected: self.lifecycle.is_connected(),
            is_recording: self.lifecycle.is_recording(),
            latest_sample: self.latest_sample.clone(),
            current_emotion: self.current_emotion.clone(),
            pitch: self.metrics.pitch.snapshot(),
            energy: self.metrics.energy.snapshot(),
            speaking_rate: self.metrics.speaking_rate.snapshot(),
            emotion_events: self.emotion_log.snapshot(),
            timeline: TimelineSnapshot {
                current_time: self.timeline.current_time(),
                offset: self.timeline.offset(),
                visible_duration: self.timeline.visible_duration(),
                active_segment: self
                    .timeline
                    .active_segment(self.generator.segments())
                    .cloned(),
                segments: self.generator.segments().to_vec(),
            },
        }
    }
}

/// Point-in-time view of the session, recomputed after every state change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub is_connected: bool,
    pub is_recording: bool,
    pub latest_sample: Option<MetricSample>,
    pub current_emotion: String,
    pub pitch: Vec<MetricPoint>,
    pub energy: Vec<MetricPoint>,
    pub speaking_rate: Vec<MetricPoint>,
    pub emotion_events: Vec<EmotionEvent>,
    pub timeline: TimelineSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineSnapshot {
    pub current_time: u32,
    pub offset: u32,
    pub visible_duration: u32,
    pub active_segment: Option<EmotionSegment>,
    pub segments: Vec<EmotionSegment>,
}
