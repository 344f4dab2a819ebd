//! Decode a captured audio blob into raw PCM samples
//!
//! The capture device hands us one encoded blob (whatever container the
//! platform codec emits — WAV from the native path, but probing keeps
//! this agnostic). Output is interleaved f32 at the blob's native sample
//! rate and channel count, ready for the waveform encoder.

use crate::{Error, Result};
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

/// Decoded interleaved PCM audio
#[derive(Debug)]
pub struct DecodedAudio {
    /// Interleaved f32 samples across all channels
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Decode an encoded audio blob to interleaved f32 PCM
pub fn decode_blob(blob: Vec<u8>) -> Result<DecodedAudio> {
    if blob.is_empty() {
        return Err(Error::Decode("captured blob is empty".to_string()));
    }

    let mss = MediaSourceStream::new(Box::new(Cursor::new(blob)), Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| Error::Decode(format!("unrecognized audio container: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| Error::Decode("no audio track in captured blob".to_string()))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| Error::Decode("captured audio has no sample rate".to_string()))?;
    let channels = codec_params
        .channels
        .map(|c| c.count() as u16)
        .unwrap_or(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| Error::Decode(format!("unsupported codec: {}", e)))?;

    let mut samples = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            // A streaming capture header over-states its data length;
            // end of stream is the true end.
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(Error::Decode(format!("packet read failed: {}", e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                // Skip a corrupt packet rather than losing the clip
                debug!("skipping undecodable packet: {}", e);
                continue;
            }
            Err(e) => return Err(Error::Decode(format!("decode failed: {}", e))),
        };

        let buf = sample_buf.get_or_insert_with(|| {
            SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec())
        });
        buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buf.samples());
    }

    if samples.is_empty() {
        return Err(Error::Decode("captured blob contained no samples".to_string()));
    }

    debug!(
        sample_rate,
        channels,
        count = samples.len(),
        "decoded captured audio"
    );

    Ok(DecodedAudio {
        samples,
        sample_rate,
        channels,
    })
}
