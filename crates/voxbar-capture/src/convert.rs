//! Sample format conversion: downmix, resample, quantize, level metering.
//!
//! Devices hand us whatever they natively produce (often stereo f32 at
//! 44.1kHz or 48kHz); the streaming endpoint wants mono PCM16 at one fixed
//! rate. Everything here operates on f32 in [-1, 1] until the final
//! quantize step so the level meter sees the signal before rounding.

use cpal::{FromSample, Sample};
use voxbar_core::{Bytes, SILENCE_FLOOR_DBFS};

/// Collapse interleaved frames to mono by summing channels, clamping the
/// sum back into [-1, 1].
pub(crate) fn downmix_to_mono<T>(input: &[T], channels: u16, out: &mut Vec<f32>)
where
    T: Sample,
    f32: FromSample<T>,
{
    let channels = channels.max(1) as usize;
    out.reserve(input.len() / channels);
    for frame in input.chunks_exact(channels) {
        let sum: f32 = frame.iter().map(|&s| f32::from_sample(s)).sum();
        out.push(sum.clamp(-1.0, 1.0));
    }
}

/// Streaming linear-interpolation resampler.
///
/// Keeps one sample of history so interpolation is continuous across
/// block boundaries. Good enough for speech headed into a recognizer;
/// not meant for music.
pub(crate) struct LinearResampler {
    /// Source samples advanced per output sample.
    step: f64,
    /// Fractional read position relative to the current block start.
    pos: f64,
    /// Last sample of the previous block, at relative position -1.
    prev: f32,
    identity: bool,
}

impl LinearResampler {
    pub(crate) fn new(source_rate: u32, target_rate: u32) -> Self {
        Self {
            step: source_rate as f64 / target_rate as f64,
            pos: 0.0,
            prev: 0.0,
            identity: source_rate == target_rate,
        }
    }

    /// Resample one block of mono samples, appending to `out`.
    pub(crate) fn process(&mut self, input: &[f32], out: &mut Vec<f32>) {
        if input.is_empty() {
            return;
        }
        if self.identity {
            out.extend_from_slice(input);
            return;
        }

        let len = input.len() as f64;
        while self.pos < len {
            let idx = self.pos.floor();
            let frac = (self.pos - idx) as f32;
            let i = idx as isize;

            let s0 = if i < 0 { self.prev } else { input[i as usize] };
            let next = i + 1;
            if next >= input.len() as isize {
                // Needs a sample from the next block; pick it up there.
                break;
            }
            let s1 = input[next as usize];

            out.push(s0 + (s1 - s0) * frac);
            self.pos += self.step;
        }

        self.prev = input[input.len() - 1];
        self.pos -= len;
    }
}

/// Quantize f32 samples to little-endian PCM16 bytes.
pub(crate) fn pcm16_bytes(samples: &[f32]) -> Bytes {
    let encoded: Vec<u8> = samples
        .iter()
        .flat_map(|&s| {
            let quantized = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            quantized.to_le_bytes()
        })
        .collect();
    Bytes::from(encoded)
}

/// Convert a slice of f32 samples to peak dBFS.
pub(crate) fn db_fs(data: &[f32]) -> f32 {
    let max_sample = data
        .iter()
        .fold(0.0f32, |max, &sample| sample.abs().max(max));

    (20.0 * max_sample.log10()).clamp(SILENCE_FLOOR_DBFS, 0.0)
}
