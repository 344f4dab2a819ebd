//! Uncompressed waveform container encoding
//!
//! The analysis service expects a standard RIFF/WAVE file: a fixed
//! 44-byte header followed by 16-bit signed little-endian samples. The
//! byte layout here is load-bearing and must not drift — the header is
//! read by third parties, not just by us.
//!
//! Encoding is deterministic: identical sample input always produces
//! byte-identical output.

use crate::{Error, Result};

/// Fixed header length of the canonical PCM WAVE layout
pub const HEADER_LEN: usize = 44;

/// Bits per sample in the encoded container
pub const BITS_PER_SAMPLE: u16 = 16;

/// Encode interleaved f32 samples into a complete WAVE file
///
/// Each sample is clamped to [-1, 1] and scaled by 32767. `samples.len()`
/// counts individual samples across all channels (interleaved).
pub fn encode(samples: &[f32], channels: u16, sample_rate: u32) -> Vec<u8> {
    let data_len = samples.len() * 2;
    let mut out = Vec::with_capacity(HEADER_LEN + data_len);

    write_header(&mut out, channels, sample_rate, data_len as u32, (36 + data_len) as u32);

    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * 32767.0) as i16;
        out.extend_from_slice(&value.to_le_bytes());
    }

    out
}

/// Header for a capture stream whose final length is not yet known
///
/// RIFF and data sizes are written as the 0xFFFFFFFF placeholder; readers
/// (including our own decode stage) treat end-of-stream as the true end.
pub fn streaming_header(channels: u16, sample_rate: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN);
    write_header(&mut out, channels, sample_rate, u32::MAX, u32::MAX);
    out
}

fn write_header(out: &mut Vec<u8>, channels: u16, sample_rate: u32, data_len: u32, riff_len: u32) {
    let block_align = channels * (BITS_PER_SAMPLE / 8);
    let byte_rate = sample_rate * block_align as u32;

    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&riff_len.to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes()); // fmt chunk length
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM format tag
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
}

/// Parsed WAVE header fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavHeader {
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_len: u32,
}

/// Read back the 44-byte header of an encoded waveform
pub fn read_header(bytes: &[u8]) -> Result<WavHeader> {
    if bytes.len() < HEADER_LEN {
        return Err(Error::Decode(format!(
            "waveform too short for header: {} bytes",
            bytes.len()
        )));
    }
    if &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(Error::Decode("not a RIFF/WAVE container".to_string()));
    }
    if &bytes[12..16] != b"fmt " || &bytes[36..40] != b"data" {
        return Err(Error::Decode("unexpected chunk layout".to_string()));
    }
    let format_tag = u16::from_le_bytes([bytes[20], bytes[21]]);
    if format_tag != 1 {
        return Err(Error::Decode(format!(
            "unsupported format tag {} (expected PCM)",
            format_tag
        )));
    }

    Ok(WavHeader {
        channels: u16::from_le_bytes([bytes[22], bytes[23]]),
        sample_rate: u32::from_le_bytes([bytes[24], bytes[25], bytes[26], bytes[27]]),
        byte_rate: u32::from_le_bytes([bytes[28], bytes[29], bytes[30], bytes[31]]),
        block_align: u16::from_le_bytes([bytes[32], bytes[33]]),
        bits_per_sample: u16::from_le_bytes([bytes[34], bytes[35]]),
        data_len: u32::from_le_bytes([bytes[40], bytes[41], bytes[42], bytes[43]]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let samples = vec![0.0f32; 100];
        let bytes = encode(&samples, 1, 44_100);
        assert_eq!(bytes.len(), HEADER_LEN + 200);

        let header = read_header(&bytes).unwrap();
        assert_eq!(header.channels, 1);
        assert_eq!(header.sample_rate, 44_100);
        assert_eq!(header.byte_rate, 88_200);
        assert_eq!(header.block_align, 2);
        assert_eq!(header.bits_per_sample, 16);
        assert_eq!(header.data_len, 200);
    }

    #[test]
    fn test_clamp_and_scale() {
        let bytes = encode(&[1.0, -1.0, 2.0, -2.0, 0.0], 1, 8_000);
        let data = &bytes[HEADER_LEN..];
        let sample = |i: usize| i16::from_le_bytes([data[i * 2], data[i * 2 + 1]]);
        assert_eq!(sample(0), 32767);
        assert_eq!(sample(1), -32767);
        assert_eq!(sample(2), 32767); // clamped
        assert_eq!(sample(3), -32767); // clamped
        assert_eq!(sample(4), 0);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let samples: Vec<f32> = (0..4096).map(|i| ((i as f32) * 0.001).sin()).collect();
        let a = encode(&samples, 1, 44_100);
        let b = encode(&samples, 1, 44_100);
        assert_eq!(a, b);
    }

    #[test]
    fn test_streaming_header_placeholder_sizes() {
        let header = streaming_header(1, 44_100);
        assert_eq!(header.len(), HEADER_LEN);
        let parsed = read_header(&header).unwrap();
        assert_eq!(parsed.data_len, u32::MAX);
        assert_eq!(parsed.sample_rate, 44_100);
    }

    #[test]
    fn test_read_header_rejects_garbage() {
        assert!(read_header(&[0u8; 10]).is_err());
        assert!(read_header(&[0u8; 64]).is_err());
    }
}
