//! Live input capture feeding the stereo field engine.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream};

use super::CaptureError;
use super::devices::create_stream_config;
use crate::analysis::{AudioFeed, SignalPath};

/// A running input stream. Dropping it stops capture.
pub struct InputCapture {
    _stream: Stream,
    device_name: String,
    sample_rate: u32,
    channels: u16,
}

impl InputCapture {
    /// Open `device` and push every callback buffer into `feed` on the post
    /// path. The callback does nothing but the lock-free push.
    pub fn start(device: &Device, mut feed: AudioFeed) -> Result<Self, CaptureError> {
        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());

        let input_config = device
            .default_input_config()
            .map_err(|e| CaptureError::ConfigError(e.to_string()))?;

        if input_config.sample_format() != SampleFormat::F32 {
            return Err(CaptureError::UnsupportedFormat(format!(
                "{:?}",
                input_config.sample_format()
            )));
        }

        let sample_rate = input_config.sample_rate();
        let channels = input_config.channels();
        let stream_config = create_stream_config(channels, sample_rate);
        let callback_channels = channels as usize;

        log::info!(
            "Opening input '{}' at {} Hz, {} channel(s)",
            device_name,
            sample_rate.0,
            channels
        );

        let stream = device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    feed.push_interleaved(data, callback_channels, SignalPath::Post);
                },
                |err| log::error!("Input stream error: {}", err),
                None,
            )
            .map_err(|e| CaptureError::StreamError(e.to_string()))?;

        stream
            .play()
            .map_err(|e| CaptureError::PlayError(e.to_string()))?;

        Ok(Self {
            _stream: stream,
            device_name,
            sample_rate: sample_rate.0,
            channels,
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}

impl Drop for InputCapture {
    fn drop(&mut self) {
        log::info!("Input capture stopped: {}", self.device_name);
    }
}
