pub mod decode;
pub mod device;
pub mod output;
pub mod sink;

pub use decode::{decode_base64_pcm, decode_pcm16le};
pub use device::open_output_device;
pub use output::{PlaybackClock, PlaybackNode};
pub use sink::{AudioSink, ChunkTiming, DeviceSink, ManualSink, NullSink};

use ringbuf::traits::Split;
use ringbuf::{HeapCons, HeapProd, HeapRb};

/// Create a ring buffer split into producer and consumer halves.
pub fn create_ring_buffer(capacity: usize) -> (HeapProd<f32>, HeapCons<f32>) {
    HeapRb::<f32>::new(capacity).split()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringbuf::traits::{Consumer, Producer};

    #[test]
    fn test_ring_buffer_push_pop() {
        let (mut prod, mut cons) = create_ring_buffer(1024);
        let data = vec![0.1, 0.2, 0.3, 0.4, 0.5];
        prod.push_slice(&data);

        let mut output = vec![0.0f32; 5];
        cons.pop_slice(&mut output);
        assert_eq!(output, data);
    }

    #[test]
    fn test_ring_buffer_empty_returns_none() {
        let (_prod, mut cons) = create_ring_buffer(1024);
        assert!(cons.try_pop().is_none());
    }

    #[test]
    fn test_ring_buffer_overflow_behavior() {
        let (mut prod, _cons) = create_ring_buffer(4);
        let data = vec![1.0, 2.0, 3.0, 4.0];
        let pushed = prod.push_slice(&data);
        assert_eq!(pushed, 4);
        // Buffer is full, additional push should be rejected
        let overflow_data = vec![5.0, 6.0];
        let pushed = prod.push_slice(&overflow_data);
        assert_eq!(pushed, 0);
    }
}
