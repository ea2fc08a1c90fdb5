//! Wire shapes for the voice-analysis transport.
//!
//! The transport itself (a socket.io-style bidirectional event channel) lives
//! outside this crate. This module only names the two message kinds it
//! delivers, the two commands we send back, and a lossy decoder that drops
//! malformed payloads with a diagnostic instead of failing the session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Normalized score plus the raw reading for one metric channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricChannel {
    pub value: f64,
    pub raw: f64,
}

/// One per-second voice-metric sample from the analysis backend.
///
/// Consumed then discarded; only the derived per-channel chart points
/// persist in the rolling histories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub time: String,
    pub pitch: MetricChannel,
    pub energy: MetricChannel,
    #[serde(rename = "speakingRate")]
    pub speaking_rate: MetricChannel,
    /// Headline emotion; the backend sends null outside speech.
    pub emotion: Option<String>,
    pub is_speech: bool,
}

/// Which side of the call an emotion reading is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Agent,
    Customer,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::Agent => "agent",
            Speaker::Customer => "customer",
        }
    }
}

/// A discrete emotion reading attributed to one side of the call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmotionEvent {
    pub emotion: String,
    pub probability: f32,
    pub timestamp: DateTime<Utc>,
    pub speaker: Speaker,
}

/// Events delivered by the transport collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connected,
    Disconnected,
    /// `graph_data`: one sample per second or so while recording.
    GraphData(MetricSample),
    /// `emotion_data`: attributed to the agent unless the caller says
    /// otherwise.
    EmotionData { emotion: String, prob: f32 },
}

/// Commands we emit back over the transport, only while connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCommand {
    StartRecording,
    StopRecording,
}

impl TransportCommand {
    /// Wire-level event name, no payload.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportCommand::StartRecording => "start_recording",
            TransportCommand::StopRecording => "stop_recording",
        }
    }
}

#[derive(Deserialize)]
struct EmotionPayload {
    emotion: String,
    prob: f32,
}

/// Decode one transport message into a typed event.
///
/// Malformed or incomplete payloads yield `None`; the caller treats that as
/// "nothing happened" and no buffer invariant is touched.
pub fn decode(kind: &str, payload: &serde_json::Value) -> Option<TransportEvent> {
    match kind {
        "connected" => Some(TransportEvent::Connected),
        "disconnected" => Some(TransportEvent::Disconnected),
        "graph_data" => match serde_json::from_value::<MetricSample>(payload.clone()) {
            Ok(sample) => Some(TransportEvent::GraphData(sample)),
            Err(e) => {
                debug!("dropping malformed graph_data payload: {e}");
                None
            }
        },
        "emotion_data" => match serde_json::from_value::<EmotionPayload>(payload.clone()) {
            Ok(p) => Some(TransportEvent::EmotionData {
                emotion: p.emotion,
                prob: p.prob,
            }),
            Err(e) => {
                debug!("dropping malformed emotion_data payload: {e}");
                None
            }
        },
        other => {
            debug!("ignoring unknown transport event kind {other:?}");
            None
        }
    }
}
