//! System microphone capture via cpal.
//!
//! cpal streams are not `Send`, so each acquisition spawns a dedicated
//! thread that owns the stream for its whole life. The audio callback
//! converts and chunks samples in place and hands finished chunks to an
//! async channel; the thread itself just parks until asked to stop.

use anyhow::anyhow;
use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, trace};
use voxbar_core::AudioChunk;

use crate::convert::{LinearResampler, db_fs, downmix_to_mono, pcm16_bytes};
use crate::{AudioSource, CHUNK_QUEUE_DEPTH, CaptureConfig, CaptureError, CaptureStream, Result};

/// The default system input device.
#[derive(Debug, Clone)]
pub struct Microphone {
    config: CaptureConfig,
}

impl Microphone {
    pub fn new(config: CaptureConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl AudioSource for Microphone {
    async fn acquire(&self) -> Result<CaptureStream> {
        let (chunk_tx, chunk_rx) = mpsc::channel(CHUNK_QUEUE_DEPTH);
        let (ready_tx, ready_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = std::sync::mpsc::channel();

        let config = self.config.clone();
        let stop_on_error = stop_tx.clone();
        let thread = std::thread::Builder::new()
            .name("voxbar-capture".to_string())
            .spawn(move || run_capture(config, chunk_tx, ready_tx, stop_rx, stop_on_error))
            .map_err(|e| anyhow!("failed to spawn capture thread: {e}"))?;

        match ready_rx.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                thread.join().ok();
                return Err(e);
            }
            Err(_) => {
                thread.join().ok();
                return Err(CaptureError::Anyhow(anyhow!(
                    "capture thread exited before reporting readiness"
                )));
            }
        }

        Ok(CaptureStream::with_release(chunk_rx, move || {
            stop_tx.send(()).ok();
            thread.join().ok();
        }))
    }

    fn name(&self) -> &str {
        "microphone"
    }
}

/// Body of the capture thread. Builds the stream, reports readiness, then
/// blocks until the stream owner asks it to stop or the stream errors.
fn run_capture(
    config: CaptureConfig,
    chunks: mpsc::Sender<AudioChunk>,
    ready: oneshot::Sender<Result<()>>,
    stop: std::sync::mpsc::Receiver<()>,
    stop_on_error: std::sync::mpsc::Sender<()>,
) {
    let stream = match build_stream(&config, chunks, stop_on_error) {
        Ok(stream) => stream,
        Err(e) => {
            ready.send(Err(e)).ok();
            return;
        }
    };

    if let Err(e) = stream.play() {
        ready
            .send(Err(CaptureError::Anyhow(anyhow!(
                "failed to start input stream: {e}"
            ))))
            .ok();
        return;
    }

    ready.send(Ok(())).ok();

    let _ = stop.recv();
    drop(stream);
    debug!("capture thread exiting");
}

fn build_stream(
    config: &CaptureConfig,
    chunks: mpsc::Sender<AudioChunk>,
    stop_on_error: std::sync::mpsc::Sender<()>,
) -> Result<cpal::Stream> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or(CaptureError::NoInputDevice)?;
    let device_config = device
        .default_input_config()
        .map_err(|_| CaptureError::NoInputDevice)?;

    info!(
        device_name = %device.name().unwrap_or_else(|_| "unknown".to_string()),
        source_rate = device_config.sample_rate().0,
        channels = device_config.channels(),
        target_rate = config.sample_rate,
        "Capturing from device"
    );

    let err_fn = move |err| {
        error!("an error occurred on stream: {}", err);
        // Wake the capture thread so the stream tears down and the chunk
        // channel closes.
        stop_on_error.send(()).ok();
    };

    let mut chunker = Chunker::new(
        device_config.channels(),
        device_config.sample_rate().0,
        config.sample_rate,
        config.chunk_samples(),
        chunks,
    );

    let stream = match device_config.sample_format() {
        cpal::SampleFormat::I8 => device.build_input_stream(
            &device_config.into(),
            move |data: &[i8], _: &_| chunker.feed(data),
            err_fn,
            None,
        )?,
        cpal::SampleFormat::I16 => device.build_input_stream(
            &device_config.into(),
            move |data: &[i16], _: &_| chunker.feed(data),
            err_fn,
            None,
        )?,
        cpal::SampleFormat::I32 => device.build_input_stream(
            &device_config.into(),
            move |data: &[i32], _: &_| chunker.feed(data),
            err_fn,
            None,
        )?,
        cpal::SampleFormat::F32 => device.build_input_stream(
            &device_config.into(),
            move |data: &[f32], _: &_| chunker.feed(data),
            err_fn,
            None,
        )?,
        sample_format => {
            return Err(CaptureError::SampleFormatNotSupported(format!(
                "{:?}",
                sample_format
            )));
        }
    };

    Ok(stream)
}

/// Accumulates converted samples inside the audio callback and cuts them
/// into fixed-size chunks.
struct Chunker {
    channels: u16,
    resampler: LinearResampler,
    chunk_samples: usize,
    seq: u64,
    dropped: u64,
    /// Scratch for the downmixed callback input.
    mono: Vec<f32>,
    /// Resampled samples waiting to fill a chunk.
    pending: Vec<f32>,
    tx: mpsc::Sender<AudioChunk>,
}

impl Chunker {
    fn new(
        channels: u16,
        source_rate: u32,
        target_rate: u32,
        chunk_samples: usize,
        tx: mpsc::Sender<AudioChunk>,
    ) -> Self {
        Self {
            channels,
            resampler: LinearResampler::new(source_rate, target_rate),
            chunk_samples,
            seq: 0,
            dropped: 0,
            mono: Vec::new(),
            pending: Vec::new(),
            tx,
        }
    }

    fn feed<T>(&mut self, input: &[T])
    where
        T: Sample,
        f32: FromSample<T>,
    {
        self.mono.clear();
        downmix_to_mono(input, self.channels, &mut self.mono);
        self.resampler.process(&self.mono, &mut self.pending);

        while self.pending.len() >= self.chunk_samples {
            let frame: Vec<f32> = self.pending.drain(..self.chunk_samples).collect();
            let chunk = AudioChunk::new(self.seq, pcm16_bytes(&frame), db_fs(&frame));
            self.seq += 1;

            match self.tx.try_send(chunk) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    // The consumer is behind; dropping is better than
                    // blocking the audio callback.
                    self.dropped += 1;
                    trace!(dropped = self.dropped, "chunk queue full, dropping audio");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_chunker_cuts_fixed_chunks() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut chunker = Chunker::new(1, 16_000, 16_000, 4, tx);

        chunker.feed(&[0.5f32; 10]);

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.seq, 0);
        assert_eq!(second.seq, 1);
        assert_eq!(first.sample_count(), 4);
        assert_eq!(second.sample_count(), 4);
        // Two trailing samples stay pending until the next callback.
        assert!(rx.try_recv().is_err());

        chunker.feed(&[0.5f32; 2]);
        let third = rx.recv().await.unwrap();
        assert_eq!(third.seq, 2);
    }

    #[tokio::test]
    async fn test_chunker_downmixes_and_measures_level() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut chunker = Chunker::new(2, 16_000, 16_000, 2, tx);

        // Two stereo frames of silence.
        chunker.feed(&[0.0f32; 4]);
        let chunk = rx.recv().await.unwrap();
        assert!(chunk.is_silent());

        // Two stereo frames at half scale per channel, summed to full.
        chunker.feed(&[0.5f32; 4]);
        let chunk = rx.recv().await.unwrap();
        assert_eq!(chunk.level_dbfs, 0.0);
        assert_eq!(&chunk.data[..], &[0xff, 0x7f, 0xff, 0x7f]);
    }

    #[tokio::test]
    async fn test_chunker_drops_when_queue_full() {
        let (tx, mut rx) = mpsc::channel(1);
        let mut chunker = Chunker::new(1, 16_000, 16_000, 1, tx);

        chunker.feed(&[0.1f32, 0.2, 0.3]);

        // Queue depth one: first chunk queued, rest dropped.
        assert_eq!(chunker.dropped, 2);
        assert_eq!(rx.recv().await.unwrap().seq, 0);
        assert!(rx.try_recv().is_err());
    }
}
