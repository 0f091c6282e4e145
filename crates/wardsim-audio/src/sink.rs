use crate::output::PlaybackClock;
use ringbuf::traits::Producer;
use ringbuf::HeapProd;
use std::sync::{Arc, Mutex};

/// The [start, end) interval a scheduled chunk owns on the audio clock.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChunkTiming {
    pub start: f64,
    pub end: f64,
}

impl ChunkTiming {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Minimal playback seam the sync engine schedules against. `last_end` is
/// the single serialization point for all scheduling decisions: every
/// `schedule_chunk` call reads it to place the chunk and then advances it.
pub trait AudioSink: Send {
    /// Queue decoded samples for gapless sequential playback. The chunk
    /// starts at `max(now, last_end)` so it neither starts in the past nor
    /// overlaps a previously scheduled chunk.
    fn schedule_chunk(&mut self, samples: &[f32]) -> ChunkTiming;

    /// Current position on the audio clock, in seconds.
    fn now(&self) -> f64;

    /// End time of the last scheduled chunk.
    fn last_end(&self) -> f64;

    /// Forget all timing state for a new session. The clock itself keeps
    /// running; only the scheduling horizon is cleared.
    fn reset(&mut self);
}

fn place_chunk(now: f64, last_end: &mut f64, sample_count: usize, sample_rate: u32) -> ChunkTiming {
    let start = now.max(*last_end);
    let end = start + sample_count as f64 / sample_rate as f64;
    *last_end = end;
    ChunkTiming { start, end }
}

// ── DeviceSink ────────────────────────────────────────────────

/// Real playback: feeds the cpal output ring buffer and tracks the
/// timeline via the frames-rendered clock.
pub struct DeviceSink {
    producer: HeapProd<f32>,
    clock: PlaybackClock,
    sample_rate: u32,
    last_end: f64,
}

impl DeviceSink {
    pub fn new(producer: HeapProd<f32>, clock: PlaybackClock, sample_rate: u32) -> Self {
        Self {
            producer,
            clock,
            sample_rate,
            last_end: 0.0,
        }
    }
}

impl AudioSink for DeviceSink {
    fn schedule_chunk(&mut self, samples: &[f32]) -> ChunkTiming {
        let pushed = self.producer.push_slice(samples);
        if pushed < samples.len() {
            tracing::warn!(
                dropped = samples.len() - pushed,
                "playback queue full, dropping samples"
            );
        }
        place_chunk(
            self.clock.now(),
            &mut self.last_end,
            samples.len(),
            self.sample_rate,
        )
    }

    fn now(&self) -> f64 {
        self.clock.now()
    }

    fn last_end(&self) -> f64 {
        self.last_end
    }

    fn reset(&mut self) {
        self.last_end = 0.0;
    }
}

// ── NullSink ──────────────────────────────────────────────────

/// Degraded mode for when no output device is available: scheduling is a
/// no-op returning {0, 0}, so transcripts fall through to immediate
/// display and the rest of the engine keeps working.
#[derive(Debug, Default)]
pub struct NullSink;

impl NullSink {
    pub fn new() -> Self {
        Self
    }
}

impl AudioSink for NullSink {
    fn schedule_chunk(&mut self, _samples: &[f32]) -> ChunkTiming {
        ChunkTiming::default()
    }

    fn now(&self) -> f64 {
        0.0
    }

    fn last_end(&self) -> f64 {
        0.0
    }

    fn reset(&mut self) {}
}

// ── ManualSink ────────────────────────────────────────────────

#[derive(Debug)]
struct ManualState {
    now: f64,
    last_end: f64,
    scheduled: Vec<ChunkTiming>,
}

/// Deterministic sink for tests: the clock only moves when told to, and
/// every scheduled chunk is recorded. Clones share state, so a test can
/// keep one handle while the engine owns another.
#[derive(Debug, Clone)]
pub struct ManualSink {
    state: Arc<Mutex<ManualState>>,
    sample_rate: u32,
}

impl ManualSink {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(ManualState {
                now: 0.0,
                last_end: 0.0,
                scheduled: Vec::new(),
            })),
            sample_rate,
        }
    }

    pub fn set_now(&self, now: f64) {
        self.state.lock().unwrap().now = now;
    }

    pub fn advance(&self, secs: f64) {
        self.state.lock().unwrap().now += secs;
    }

    pub fn scheduled(&self) -> Vec<ChunkTiming> {
        self.state.lock().unwrap().scheduled.clone()
    }
}

impl AudioSink for ManualSink {
    fn schedule_chunk(&mut self, samples: &[f32]) -> ChunkTiming {
        let mut state = self.state.lock().unwrap();
        let now = state.now;
        let timing = place_chunk(now, &mut state.last_end, samples.len(), self.sample_rate);
        state.scheduled.push(timing);
        timing
    }

    fn now(&self) -> f64 {
        self.state.lock().unwrap().now
    }

    fn last_end(&self) -> f64 {
        self.state.lock().unwrap().last_end
    }

    fn reset(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.last_end = 0.0;
        state.scheduled.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunks_never_overlap() {
        let mut sink = ManualSink::new(24000);
        let a = sink.schedule_chunk(&vec![0.0; 24000]); // 1.0s
        let b = sink.schedule_chunk(&vec![0.0; 12000]); // 0.5s
        assert_eq!(a.start, 0.0);
        assert_eq!(a.end, 1.0);
        assert_eq!(b.start, 1.0);
        assert_eq!(b.end, 1.5);
        assert!(b.start >= a.end);
    }

    #[test]
    fn test_chunk_after_gap_starts_at_clock_now() {
        let mut sink = ManualSink::new(24000);
        let a = sink.schedule_chunk(&vec![0.0; 24000]);
        assert_eq!(a.end, 1.0);
        // Clock runs past the end of all scheduled audio
        sink.set_now(3.0);
        let b = sink.schedule_chunk(&vec![0.0; 24000]);
        assert_eq!(b.start, 3.0);
        assert_eq!(b.end, 4.0);
    }

    #[test]
    fn test_timing_monotonic_over_sequence() {
        let mut sink = ManualSink::new(24000);
        let mut previous_end = 0.0;
        for len in [100, 2400, 1, 24000, 777] {
            let t = sink.schedule_chunk(&vec![0.0; len]);
            assert!(t.end >= t.start);
            assert!(t.start >= previous_end);
            previous_end = t.end;
        }
    }

    #[test]
    fn test_last_end_updates_unconditionally() {
        let mut sink = ManualSink::new(24000);
        sink.schedule_chunk(&vec![0.0; 12000]);
        assert_eq!(sink.last_end(), 0.5);
        sink.schedule_chunk(&vec![0.0; 12000]);
        assert_eq!(sink.last_end(), 1.0);
    }

    #[test]
    fn test_reset_clears_horizon_but_not_clock() {
        let mut sink = ManualSink::new(24000);
        sink.schedule_chunk(&vec![0.0; 24000]);
        sink.set_now(0.4);
        sink.reset();
        assert_eq!(sink.last_end(), 0.0);
        assert_eq!(sink.now(), 0.4);
        let t = sink.schedule_chunk(&vec![0.0; 2400]);
        assert_eq!(t.start, 0.4);
    }

    #[test]
    fn test_null_sink_is_noop() {
        let mut sink = NullSink::new();
        let t = sink.schedule_chunk(&vec![0.5; 24000]);
        assert_eq!(t, ChunkTiming::default());
        assert_eq!(sink.now(), 0.0);
        assert_eq!(sink.last_end(), 0.0);
    }

    #[test]
    fn test_empty_chunk_has_zero_duration() {
        let mut sink = ManualSink::new(24000);
        let t = sink.schedule_chunk(&[]);
        assert_eq!(t.duration(), 0.0);
    }
}
