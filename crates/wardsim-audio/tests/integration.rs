use ringbuf::traits::Consumer;
use wardsim_audio::sink::AudioSink;
use wardsim_audio::{decode_base64_pcm, ManualSink};

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;

fn encode_pcm(samples: &[i16]) -> String {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for s in samples {
        bytes.extend_from_slice(&s.to_le_bytes());
    }
    BASE64_STANDARD.encode(&bytes)
}

#[test]
fn test_decode_then_schedule_pipeline() {
    // A full utterance of 0.5s at 24kHz, delivered base64-wrapped
    let pcm: Vec<i16> = (0..12000).map(|i| ((i % 100) * 300) as i16).collect();
    let payload = encode_pcm(&pcm);

    let samples = decode_base64_pcm(&payload).unwrap();
    assert_eq!(samples.len(), 12000);
    assert!(samples.iter().all(|s| (-1.0..=1.0).contains(s)));

    let mut sink = ManualSink::new(24000);
    let timing = sink.schedule_chunk(&samples);
    assert_eq!(timing.start, 0.0);
    assert!((timing.duration() - 0.5).abs() < 1e-9);
}

#[test]
fn test_multi_chunk_utterance_is_gapless() {
    let mut sink = ManualSink::new(24000);
    // Three chunks of one utterance arriving back to back
    let t1 = sink.schedule_chunk(&vec![0.0; 4800]);
    let t2 = sink.schedule_chunk(&vec![0.0; 4800]);
    let t3 = sink.schedule_chunk(&vec![0.0; 4800]);
    assert_eq!(t1.end, t2.start);
    assert_eq!(t2.end, t3.start);
    assert!((t3.end - 0.6).abs() < 1e-9);
}

#[test]
fn test_playback_continues_while_clock_runs() {
    let mut sink = ManualSink::new(24000);
    let t1 = sink.schedule_chunk(&vec![0.0; 24000]);
    // Clock mid-chunk: next chunk still queues after the first
    sink.set_now(0.5);
    let t2 = sink.schedule_chunk(&vec![0.0; 24000]);
    assert_eq!(t2.start, t1.end);
    // Clock past everything: next chunk starts fresh at now
    sink.set_now(5.0);
    let t3 = sink.schedule_chunk(&vec![0.0; 24000]);
    assert_eq!(t3.start, 5.0);
}

#[test]
fn test_ring_buffer_receives_device_sink_samples() {
    use wardsim_audio::create_ring_buffer;
    // DeviceSink itself needs a live clock, but the ring plumbing it uses
    // is observable directly.
    let (mut prod, mut cons) = create_ring_buffer(8192);
    use ringbuf::traits::Producer;
    let samples: Vec<f32> = decode_base64_pcm(&encode_pcm(&[16384, -16384])).unwrap();
    prod.push_slice(&samples);
    let mut out = vec![0.0f32; 2];
    cons.pop_slice(&mut out);
    assert!((out[0] - 0.5).abs() < 1e-6);
    assert!((out[1] + 0.5).abs() < 1e-6);
}
