use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use wardsim_core::AudioError;

/// Decode PCM16LE bytes into f32 samples normalized to [-1.0, 1.0].
/// A trailing odd byte is dropped.
pub fn decode_pcm16le(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect()
}

/// Decode a base64-wrapped PCM16LE payload as sent by the backend.
pub fn decode_base64_pcm(data: &str) -> Result<Vec<f32>, AudioError> {
    let bytes = BASE64_STANDARD
        .decode(data)
        .map_err(|e| AudioError::BadPayload(e.to_string()))?;
    Ok(decode_pcm16le(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_pcm16le_known_values() {
        // 0, max positive, min negative
        let bytes = [0x00, 0x00, 0xFF, 0x7F, 0x00, 0x80];
        let samples = decode_pcm16le(&bytes);
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0], 0.0);
        assert!((samples[1] - (32767.0 / 32768.0)).abs() < 1e-6);
        assert_eq!(samples[2], -1.0);
    }

    #[test]
    fn test_decode_pcm16le_is_little_endian() {
        // 0x0100 = 256
        let samples = decode_pcm16le(&[0x00, 0x01]);
        assert!((samples[0] - 256.0 / 32768.0).abs() < 1e-6);
    }

    #[test]
    fn test_decode_pcm16le_drops_trailing_byte() {
        let samples = decode_pcm16le(&[0x00, 0x00, 0x42]);
        assert_eq!(samples.len(), 1);
    }

    #[test]
    fn test_decode_pcm16le_empty() {
        assert!(decode_pcm16le(&[]).is_empty());
    }

    #[test]
    fn test_decode_base64_pcm_roundtrip() {
        use base64::Engine;
        let pcm: Vec<u8> = vec![0x00, 0x40, 0x00, 0xC0]; // +0.5, -0.5
        let encoded = BASE64_STANDARD.encode(&pcm);
        let samples = decode_base64_pcm(&encoded).unwrap();
        assert_eq!(samples.len(), 2);
        assert!((samples[0] - 0.5).abs() < 1e-6);
        assert!((samples[1] + 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_decode_base64_pcm_rejects_garbage() {
        assert!(matches!(
            decode_base64_pcm("!!not-base64!!"),
            Err(AudioError::BadPayload(_))
        ));
    }
}
