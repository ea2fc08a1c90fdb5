//! Scrolling time window over the segment sequence.
//!
//! The playhead advances one second per tick while a live run is active. Once
//! it passes the base visible span the window auto-scrolls; the offset is
//! rederived from the clock on every tick rather than incremented, so missed
//! or duplicated ticks cannot accumulate drift.

use serde::Serialize;

use crate::segment::EmotionSegment;

/// Base visible span of the window in seconds.
pub const BASE_VISIBLE_SECS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimelineWindow {
    current_time: u32,
    offset: u32,
    visible_duration: u32,
}

impl Default for TimelineWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl TimelineWindow {
    pub fn new() -> Self {
        Self {
            current_time: 0,
            offset: 0,
            visible_duration: BASE_VISIBLE_SECS,
        }
    }

    /// Seconds since the live run started.
    pub fn current_time(&self) -> u32 {
        self.current_time
    }

    /// Auto-scroll offset, always `max(0, current_time - 100)`.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// `max(100, total segment duration)`.
    pub fn visible_duration(&self) -> u32 {
        self.visible_duration
    }

    /// Advance the playhead by one second and rederive the scroll offset.
    pub fn playhead_tick(&mut self) {
        self.current_time += 1;
        self.offset = self.current_time.saturating_sub(BASE_VISIBLE_SECS);
    }

    /// Recompute the visible span after the segment sequence changed.
    pub fn segments_changed(&mut self, total_duration_secs: u32) {
        self.visible_duration = total_duration_secs.max(BASE_VISIBLE_SECS);
    }

    /// The unique segment the playhead currently sits in, if any.
    ///
    /// `None` is a valid between-emissions state (the playhead ran past the
    /// last segment's end before the next generation tick), not corruption.
    pub fn active_segment<'a>(&self, segments: &'a [EmotionSegment]) -> Option<&'a EmotionSegment> {
        segments.iter().find(|s| s.contains(self.current_time))
    }

    /// Rewind the clock for a fresh live run.
    pub fn reset(&mut self) {
        self.current_time = 0;
        self.offset = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::{format_label, Emotion};

    fn segment(emotion: Emotion, start: u32, duration: u32) -> EmotionSegment {
        EmotionSegment {
            emotion,
            duration_secs: duration,
            start_secs: start,
            label: format_label(start),
            text: None,
        }
    }

    #[test]
    fn playhead_counts_seconds() {
        let mut window = TimelineWindow::new();
        for _ in 0..7 {
            window.playhead_tick();
        }
        assert_eq!(window.current_time(), 7);
    }

    #[test]
    fn offset_stays_zero_within_the_base_span() {
        let mut window = TimelineWindow::new();
        for _ in 0..100 {
            window.playhead_tick();
        }
        assert_eq!(window.current_time(), 100);
        assert_eq!(window.offset(), 0);
    }

    #[test]
    fn offset_tracks_the_clock_past_the_base_span() {
        let mut window = TimelineWindow::new();
        let mut last_offset = 0;
        for _ in 0..250 {
            window.playhead_tick();
            let expected = window.current_time().saturating_sub(BASE_VISIBLE_SECS);
            assert_eq!(window.offset(), expected);
            assert!(window.offset() >= last_offset, "offset must not regress");
            last_offset = window.offset();
        }
        assert_eq!(window.offset(), 150);
    }

    #[test]
    fn visible_duration_is_at_least_the_base_span() {
        let mut window = TimelineWindow::new();
        window.segments_changed(40);
        assert_eq!(window.visible_duration(), BASE_VISIBLE_SECS);
        window.segments_changed(260);
        assert_eq!(window.visible_duration(), 260);
        window.segments_changed(0);
        assert_eq!(window.visible_duration(), BASE_VISIBLE_SECS);
    }

    #[test]
    fn active_segment_is_unique_over_a_contiguous_sequence() {
        let segments = vec![
            segment(Emotion::Positive, 0, 15),
            segment(Emotion::Negative, 15, 20),
            segment(Emotion::Neutral, 35, 25),
        ];
        let mut window = TimelineWindow::new();
        for t in 0..60 {
            let matching = segments.iter().filter(|s| s.contains(t)).count();
            assert!(matching <= 1, "at most one active segment at t={t}");
            let active = window.active_segment(&segments);
            assert_eq!(active, segments.iter().find(|s| s.contains(window.current_time())));
            window.playhead_tick();
        }
    }

    #[test]
    fn playhead_past_the_last_segment_has_no_active_segment() {
        let segments = vec![segment(Emotion::Neutral, 0, 20)];
        let mut window = TimelineWindow::new();
        for _ in 0..25 {
            window.playhead_tick();
        }
        assert_eq!(window.active_segment(&segments), None);
    }

    #[test]
    fn reset_rewinds_clock_and_offset() {
        let mut window = TimelineWindow::new();
        for _ in 0..180 {
            window.playhead_tick();
        }
        window.reset();
        assert_eq!(window.current_time(), 0);
        assert_eq!(window.offset(), 0);
    }
}
