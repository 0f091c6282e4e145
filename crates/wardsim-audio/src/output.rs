use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, SampleRate, Stream, StreamConfig};
use ringbuf::traits::Consumer;
use ringbuf::HeapCons;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use wardsim_core::AudioError;

const STATUS_OK: u8 = 0;
const STATUS_ERROR: u8 = 1;

// ── PlaybackClock ─────────────────────────────────────────────

/// Read-only handle on the playback timeline. Time is frames rendered by
/// the output callback divided by the sample rate, so it advances only
/// while the device is live and never goes backwards.
#[derive(Clone)]
pub struct PlaybackClock {
    frames: Arc<AtomicU64>,
    sample_rate: u32,
    status: Arc<AtomicU8>,
}

impl PlaybackClock {
    pub fn now(&self) -> f64 {
        self.frames.load(Ordering::Relaxed) as f64 / self.sample_rate as f64
    }

    pub fn is_healthy(&self) -> bool {
        self.status.load(Ordering::Relaxed) == STATUS_OK
    }
}

// ── PlaybackNode ──────────────────────────────────────────────

/// Owns the cpal output stream. Must be kept alive by the caller for as
/// long as playback is wanted; the stream itself is not Send, so it stays
/// on the thread that built it while the clock handle travels freely.
pub struct PlaybackNode {
    _stream: Stream,
}

impl PlaybackNode {
    pub fn new(
        device: &Device,
        consumer: HeapCons<f32>,
        sample_rate: u32,
        buffer_size: u32,
    ) -> Result<(Self, PlaybackClock), AudioError> {
        let config = StreamConfig {
            channels: 1,
            sample_rate: SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Fixed(buffer_size),
        };

        let consumer = Arc::new(Mutex::new(consumer));
        let frames = Arc::new(AtomicU64::new(0));
        let frames_counter = Arc::clone(&frames);
        let status = Arc::new(AtomicU8::new(STATUS_OK));
        let status_flag = Arc::clone(&status);

        let err_callback = move |err: cpal::StreamError| {
            tracing::error!("output stream error: {}", err);
            status_flag.store(STATUS_ERROR, Ordering::Relaxed);
        };

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if let Ok(mut cons) = consumer.lock() {
                        for sample in data.iter_mut() {
                            *sample = cons.try_pop().unwrap_or(0.0);
                        }
                    } else {
                        // Mutex poisoned, fill with silence
                        data.fill(0.0);
                    }
                    // The clock keeps running through silence so the
                    // timeline tracks real elapsed device time.
                    frames_counter.fetch_add(data.len() as u64, Ordering::Relaxed);
                },
                err_callback,
                None,
            )
            .map_err(|e| AudioError::StreamBuild(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioError::StreamError(e.to_string()))?;

        let clock = PlaybackClock {
            frames,
            sample_rate,
            status,
        };
        Ok((Self { _stream: stream }, clock))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_clock(frames: u64, sample_rate: u32) -> PlaybackClock {
        PlaybackClock {
            frames: Arc::new(AtomicU64::new(frames)),
            sample_rate,
            status: Arc::new(AtomicU8::new(STATUS_OK)),
        }
    }

    #[test]
    fn test_clock_starts_at_zero() {
        let clock = make_clock(0, 24000);
        assert_eq!(clock.now(), 0.0);
    }

    #[test]
    fn test_clock_converts_frames_to_seconds() {
        let clock = make_clock(48000, 24000);
        assert_eq!(clock.now(), 2.0);
    }

    #[test]
    fn test_clock_clone_shares_state() {
        let clock = make_clock(0, 24000);
        let other = clock.clone();
        clock.frames.store(24000, Ordering::Relaxed);
        assert_eq!(other.now(), 1.0);
    }

    #[test]
    fn test_clock_default_healthy() {
        let clock = make_clock(0, 24000);
        assert!(clock.is_healthy());
    }

    #[test]
    fn test_stream_error_flips_health_on_all_handles() {
        let clock = make_clock(0, 24000);
        let other = clock.clone();
        clock.status.store(STATUS_ERROR, Ordering::Relaxed);
        assert!(!other.is_healthy());
    }
}
