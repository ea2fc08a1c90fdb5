//! Emotion segment generation for the conversation timeline.
//!
//! A generator either replays a fixed preview sequence (static mode) or grows
//! a live sequence one 20-second segment at a time. Emotions come from a
//! weighted draw and every segment carries a conversation snippet matched to
//! the speaker and emotion. The RNG is injectable so tests can pin exact
//! sequences.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use smallvec::SmallVec;
use tracing::debug;

use crate::wire::Speaker;

/// Duration of every live-generated segment. The emission cadence matches,
/// so the sequence stays gap-free between ticks.
pub const LIVE_SEGMENT_SECS: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Positive,
    Negative,
    Neutral,
    Silence,
}

impl Emotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Positive => "positive",
            Emotion::Negative => "negative",
            Emotion::Neutral => "neutral",
            Emotion::Silence => "silence",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Draw table: positive 3, negative 2, neutral 4, silence 1 out of 10.
const EMOTION_WEIGHTS: [Emotion; 10] = [
    Emotion::Positive,
    Emotion::Positive,
    Emotion::Positive,
    Emotion::Negative,
    Emotion::Negative,
    Emotion::Neutral,
    Emotion::Neutral,
    Emotion::Neutral,
    Emotion::Neutral,
    Emotion::Silence,
];

/// One weighted emotion draw.
pub fn weighted_emotion(rng: &mut impl Rng) -> Emotion {
    EMOTION_WEIGHTS[rng.random_range(0..EMOTION_WEIGHTS.len())]
}

/// Uniform pick from the fixed (speaker, emotion) snippet pool.
pub fn sample_text(rng: &mut impl Rng, speaker: Speaker, emotion: Emotion) -> &'static str {
    let pool = sample_pool(speaker, emotion);
    pool[rng.random_range(0..pool.len())]
}

/// A contiguous fixed-emotion interval of the timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmotionSegment {
    pub emotion: Emotion,
    pub duration_secs: u32,
    pub start_secs: u32,
    /// "MM:SS" of the segment start.
    pub label: String,
    pub text: Option<String>,
}

impl EmotionSegment {
    /// Whether `time` falls inside `[start, start + duration)`.
    pub fn contains(&self, time: u32) -> bool {
        time >= self.start_secs && time < self.start_secs + self.duration_secs
    }

    pub fn end_secs(&self) -> u32 {
        self.start_secs + self.duration_secs
    }
}

/// "MM:SS" label for a second offset.
pub fn format_label(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Static,
    Live,
}

/// Produces the contiguous emotion-segment sequence for one speaker.
///
/// The speaker is fixed at construction and only selects the snippet pool;
/// it has no effect on the emotion weighting.
#[derive(Debug)]
pub struct SegmentGenerator {
    speaker: Speaker,
    mode: Mode,
    segments: SmallVec<[EmotionSegment; 8]>,
    rng: StdRng,
}

impl SegmentGenerator {
    pub fn new(speaker: Speaker) -> Self {
        Self::with_rng(speaker, StdRng::from_os_rng())
    }

    /// Deterministic generator for tests and replays.
    pub fn seeded(speaker: Speaker, seed: u64) -> Self {
        Self::with_rng(speaker, StdRng::seed_from_u64(seed))
    }

    fn with_rng(speaker: Speaker, rng: StdRng) -> Self {
        Self {
            speaker,
            mode: Mode::Static,
            segments: SmallVec::new(),
            rng,
        }
    }

    pub fn speaker(&self) -> Speaker {
        self.speaker
    }

    pub fn is_live(&self) -> bool {
        self.mode == Mode::Live
    }

    pub fn segments(&self) -> &[EmotionSegment] {
        &self.segments
    }

    /// Sum of all segment durations; also the next live start offset.
    pub fn total_duration(&self) -> u32 {
        self.segments.iter().map(|s| s.duration_secs).sum()
    }

    /// Replace the sequence with the fixed five-segment preview replay.
    pub fn start_static(&mut self) {
        const STATIC_PLAN: [(Emotion, u32); 5] = [
            (Emotion::Positive, 15),
            (Emotion::Negative, 20),
            (Emotion::Neutral, 25),
            (Emotion::Silence, 10),
            (Emotion::Positive, 15),
        ];

        self.mode = Mode::Static;
        self.segments.clear();
        let mut start = 0;
        for (emotion, duration_secs) in STATIC_PLAN {
            let text = sample_text(&mut self.rng, self.speaker, emotion).to_string();
            self.segments.push(EmotionSegment {
                emotion,
                duration_secs,
                start_secs: start,
                label: format_label(start),
                text: Some(text),
            });
            start += duration_secs;
        }
    }

    /// Begin a live run: one freshly drawn 20-second segment at t=0.
    pub fn start_live(&mut self) {
        self.mode = Mode::Live;
        self.segments.clear();
        self.push_live_segment(0);
    }

    /// Append the next contiguous live segment. Ignored outside live mode so
    /// a stale emission can never corrupt a static sequence.
    pub fn generation_tick(&mut self) {
        if self.mode != Mode::Live {
            debug!("generation tick ignored outside live mode");
            return;
        }
        let start = self.total_duration();
        self.push_live_segment(start);
    }

    fn push_live_segment(&mut self, start: u32) {
        let emotion = weighted_emotion(&mut self.rng);
        let text = sample_text(&mut self.rng, self.speaker, emotion).to_string();
        debug!(start, %emotion, "emitting live segment");
        self.segments.push(EmotionSegment {
            emotion,
            duration_secs: LIVE_SEGMENT_SECS,
            start_secs: start,
            label: format_label(start),
            text: Some(text),
        });
    }
}

const AGENT_POSITIVE: [&str; 5] = [
    "Great! I can definitely help you with that.",
    "Perfect! That solution should work perfectly.",
    "Excellent choice! You'll love this feature.",
    "Wonderful! I'm glad we could resolve this.",
    "That's fantastic! Everything looks good now.",
];

const AGENT_NEGATIVE: [&str; 5] = [
    "I understand your frustration with this issue.",
    "I'm sorry to hear you're experiencing problems.",
    "That's definitely concerning, let me investigate.",
    "I apologize for the inconvenience this has caused.",
    "This is clearly not working as expected.",
];

const AGENT_NEUTRAL: [&str; 5] = [
    "Let me check the system for you.",
    "I'll need to verify a few details first.",
    "Please hold while I look into this.",
    "Let me transfer you to the right department.",
    "I'm reviewing your account information now.",
];

const AGENT_SILENCE: [&str; 5] = [
    "Um... let me think about this...",
    "Uh, please hold on a moment...",
    "...",
    "Let me... uh... check that for you.",
    "Hold on... I'm looking...",
];

const CUSTOMER_POSITIVE: [&str; 5] = [
    "Thank you so much! This is exactly what I needed.",
    "Perfect! You've been incredibly helpful.",
    "Great service! I really appreciate your help.",
    "Wonderful! That worked perfectly.",
    "Excellent! I'm very satisfied with this solution.",
];

const CUSTOMER_NEGATIVE: [&str; 5] = [
    "This is really frustrating, nothing seems to work.",
    "I'm very disappointed with this service.",
    "This problem has been going on for weeks now.",
    "I'm getting really annoyed with these issues.",
    "This is unacceptable, I need this fixed now.",
];

const CUSTOMER_NEUTRAL: [&str; 5] = [
    "I need help with my account settings.",
    "Can you explain how this feature works?",
    "I have a question about my billing.",
    "I'd like to update my information.",
    "Could you help me understand this process?",
];

const CUSTOMER_SILENCE: [&str; 5] = [
    "Um... let me see...",
    "Uh, I'm not sure about this...",
    "...",
    "Hold on... I'm thinking...",
    "Let me... uh... check something...",
];

fn sample_pool(speaker: Speaker, emotion: Emotion) -> &'static [&'static str] {
    match (speaker, emotion) {
        (Speaker::Agent, Emotion::Positive) => &AGENT_POSITIVE,
        (Speaker::Agent, Emotion::Negative) => &AGENT_NEGATIVE,
        (Speaker::Agent, Emotion::Neutral) => &AGENT_NEUTRAL,
        (Speaker::Agent, Emotion::Silence) => &AGENT_SILENCE,
        (Speaker::Customer, Emotion::Positive) => &CUSTOMER_POSITIVE,
        (Speaker::Customer, Emotion::Negative) => &CUSTOMER_NEGATIVE,
        (Speaker::Customer, Emotion::Neutral) => &CUSTOMER_NEUTRAL,
        (Speaker::Customer, Emotion::Silence) => &CUSTOMER_SILENCE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_contiguous(segments: &[EmotionSegment]) {
        for pair in segments.windows(2) {
            assert_eq!(
                pair[1].start_secs,
                pair[0].start_secs + pair[0].duration_secs,
                "segments must be contiguous"
            );
        }
    }

    #[test]
    fn static_mode_replays_the_fixed_sequence() {
        let mut generator = SegmentGenerator::seeded(Speaker::Agent, 1);
        generator.start_static();
        let segments = generator.segments();

        assert_eq!(segments.len(), 5);
        let starts: Vec<u32> = segments.iter().map(|s| s.start_secs).collect();
        let durations: Vec<u32> = segments.iter().map(|s| s.duration_secs).collect();
        assert_eq!(starts, vec![0, 15, 35, 60, 70]);
        assert_eq!(durations, vec![15, 20, 25, 10, 15]);
        let emotions: Vec<Emotion> = segments.iter().map(|s| s.emotion).collect();
        assert_eq!(
            emotions,
            vec![
                Emotion::Positive,
                Emotion::Negative,
                Emotion::Neutral,
                Emotion::Silence,
                Emotion::Positive,
            ]
        );
        assert_contiguous(segments);
    }

    #[test]
    fn static_segments_draw_text_from_the_matching_pool() {
        let mut generator = SegmentGenerator::seeded(Speaker::Customer, 2);
        generator.start_static();
        for segment in generator.segments() {
            let pool = sample_pool(Speaker::Customer, segment.emotion);
            let text = segment.text.as_deref().unwrap();
            assert!(pool.contains(&text), "{text:?} not in pool");
        }
    }

    #[test]
    fn live_mode_starts_with_one_segment_at_zero() {
        let mut generator = SegmentGenerator::seeded(Speaker::Agent, 3);
        generator.start_live();
        let segments = generator.segments();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start_secs, 0);
        assert_eq!(segments[0].duration_secs, LIVE_SEGMENT_SECS);
    }

    #[test]
    fn generation_tick_appends_one_contiguous_segment() {
        let mut generator = SegmentGenerator::seeded(Speaker::Agent, 4);
        generator.start_live();
        generator.generation_tick();
        let segments = generator.segments();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].start_secs, 20);
        assert_contiguous(segments);
    }

    #[test]
    fn long_live_runs_stay_contiguous() {
        let mut generator = SegmentGenerator::seeded(Speaker::Customer, 5);
        generator.start_live();
        for _ in 0..50 {
            generator.generation_tick();
        }
        assert_eq!(generator.segments().len(), 51);
        assert_contiguous(generator.segments());
        assert_eq!(generator.total_duration(), 51 * LIVE_SEGMENT_SECS);
    }

    #[test]
    fn generation_tick_outside_live_mode_is_a_no_op() {
        let mut generator = SegmentGenerator::seeded(Speaker::Agent, 6);
        generator.start_static();
        generator.generation_tick();
        assert_eq!(generator.segments().len(), 5);
    }

    #[test]
    fn seeded_generators_are_deterministic() {
        let mut a = SegmentGenerator::seeded(Speaker::Agent, 7);
        let mut b = SegmentGenerator::seeded(Speaker::Agent, 7);
        a.start_live();
        b.start_live();
        for _ in 0..10 {
            a.generation_tick();
            b.generation_tick();
        }
        assert_eq!(a.segments(), b.segments());
    }

    #[test]
    fn weighted_draw_matches_expected_proportions() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut counts = [0usize; 4];
        let draws = 10_000;
        for _ in 0..draws {
            match weighted_emotion(&mut rng) {
                Emotion::Positive => counts[0] += 1,
                Emotion::Negative => counts[1] += 1,
                Emotion::Neutral => counts[2] += 1,
                Emotion::Silence => counts[3] += 1,
            }
        }
        let expected = [0.30, 0.20, 0.40, 0.10];
        for (count, expected) in counts.iter().zip(expected) {
            let observed = *count as f64 / draws as f64;
            assert!(
                (observed - expected).abs() < 0.03,
                "observed {observed:.3}, expected {expected:.3}"
            );
        }
    }

    #[test]
    fn labels_are_minutes_and_seconds() {
        assert_eq!(format_label(0), "00:00");
        assert_eq!(format_label(35), "00:35");
        assert_eq!(format_label(70), "01:10");
        assert_eq!(format_label(615), "10:15");
    }

    #[test]
    fn contains_is_half_open() {
        let segment = EmotionSegment {
            emotion: Emotion::Neutral,
            duration_secs: 20,
            start_secs: 20,
            label: format_label(20),
            text: None,
        };
        assert!(!segment.contains(19));
        assert!(segment.contains(20));
        assert!(segment.contains(39));
        assert!(!segment.contains(40));
        assert_eq!(segment.end_secs(), 40);
    }
}
