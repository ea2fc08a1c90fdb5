/// Emotion timeline demo - prints the static replay, then walks a seeded
/// live run to show segment emission and playhead auto-scroll
use voicepulse::segment::{SegmentGenerator, LIVE_SEGMENT_SECS};
use voicepulse::timeline::TimelineWindow;
use voicepulse::wire::Speaker;

fn print_segments(generator: &SegmentGenerator) {
    for segment in generator.segments() {
        println!(
            "  {}  {:<8}  {:>3}s  {}",
            segment.label,
            segment.emotion.as_str(),
            segment.duration_secs,
            segment.text.as_deref().unwrap_or("")
        );
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("📼 Emotion Timeline Demo");
    println!();

    let mut generator = SegmentGenerator::seeded(Speaker::Customer, 42);
    generator.start_static();
    println!("Static preview replay:");
    print_segments(&generator);
    println!();

    println!("Simulated live run (2 minutes, seeded):");
    let mut timeline = TimelineWindow::new();
    generator.start_live();
    timeline.segments_changed(generator.total_duration());

    for _ in 0..120 {
        timeline.playhead_tick();
        if timeline.current_time() % LIVE_SEGMENT_SECS == 0 {
            generator.generation_tick();
            timeline.segments_changed(generator.total_duration());
        }
        if timeline.current_time() % 10 == 0 {
            let active = timeline
                .active_segment(generator.segments())
                .map(|s| s.emotion.as_str())
                .unwrap_or("-");
            println!(
                "  t={:>3}s  offset={:>3}s  visible={:>3}s  segments={}  active={}",
                timeline.current_time(),
                timeline.offset(),
                timeline.visible_duration(),
                generator.segments().len(),
                active
            );
        }
    }

    println!();
    println!("Final live sequence:");
    print_segments(&generator);
}
