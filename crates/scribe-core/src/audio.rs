//! Microphone capture using CPAL.
//!
//! Captures mono 16 kHz input in fixed 1024-sample chunks and hands each
//! chunk to the pipeline as a 16-bit PCM frame. The returned `cpal::Stream`
//! handle keeps the device open; dropping it stops and releases capture.

use crate::error::{ScribeError, ScribeResult};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Capture format shared with the transcription service.
#[derive(Debug, Clone)]
pub struct AudioConfig {
    /// Sample rate in Hz (default: 16000).
    pub sample_rate: u32,

    /// Number of channels (default: 1 for mono).
    pub channels: u16,

    /// Samples per frame (default: 1024, one capture chunk).
    pub chunk_size: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
            chunk_size: 1024,
        }
    }
}

/// One capture chunk as 16-bit little-endian PCM bytes.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    pub bytes: Vec<u8>,
}

impl AudioFrame {
    /// Convert captured f32 samples (-1.0..1.0) to 16-bit PCM.
    pub fn from_samples(samples: &[f32]) -> Self {
        let mut bytes = Vec::with_capacity(samples.len() * 2);
        for &sample in samples {
            let clamped = sample.clamp(-1.0, 1.0);
            let quantized = (clamped * 32767.0).round() as i16;
            bytes.extend_from_slice(&quantized.to_le_bytes());
        }
        Self { bytes }
    }

    pub fn sample_count(&self) -> usize {
        self.bytes.len() / 2
    }
}

/// Audio capture system using CPAL.
pub struct AudioCapture {
    config: AudioConfig,
    device: Device,
    stream_config: StreamConfig,
}

impl AudioCapture {
    /// Resolve the default input device. No device is a setup failure: the
    /// meeting cannot run without an audio source.
    pub fn new(config: AudioConfig) -> ScribeResult<Self> {
        info!(
            "Initializing audio capture ({} Hz, {} channel)",
            config.sample_rate, config.channels
        );

        let device = cpal::default_host()
            .default_input_device()
            .ok_or_else(|| ScribeError::AudioDevice("no input device available".to_string()))?;

        info!(
            "Using input device: {}",
            device.name().unwrap_or_else(|_| "unknown".to_string())
        );

        let default_config = device.default_input_config()?;
        info!("Default input config: {:?}", default_config);

        let stream_config = StreamConfig {
            channels: config.channels,
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(config.chunk_size as u32),
        };

        Ok(Self {
            config,
            device,
            stream_config,
        })
    }

    /// Start capturing and send one `AudioFrame` per full chunk.
    ///
    /// Device overruns and per-callback errors are logged and skipped; the
    /// callback never panics. Keep the returned stream alive for the life of
    /// the session.
    pub fn start_capture(
        self,
        frame_tx: mpsc::UnboundedSender<AudioFrame>,
    ) -> ScribeResult<Stream> {
        let chunk_size = self.config.chunk_size;
        let mut sample_buffer: Vec<f32> = Vec::with_capacity(chunk_size);

        let stream = self.device.build_input_stream(
            &self.stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                for &sample in data {
                    sample_buffer.push(sample);

                    if sample_buffer.len() >= chunk_size {
                        let frame = AudioFrame::from_samples(&sample_buffer);
                        if let Err(e) = frame_tx.send(frame) {
                            warn!("failed to hand off audio frame: {}", e);
                        }
                        sample_buffer.clear();
                    }
                }
            },
            move |err| {
                warn!("audio stream error: {}", err);
            },
            None,
        )?;

        stream.play()?;

        info!("Audio capture started");

        Ok(stream)
    }

    /// List available input devices.
    pub fn list_input_devices() -> ScribeResult<Vec<String>> {
        let host = cpal::default_host();
        let devices = host.input_devices()?;

        let mut device_names = Vec::new();
        for device in devices {
            if let Ok(name) = device.name() {
                device_names.push(name);
            }
        }

        Ok(device_names)
    }
}
