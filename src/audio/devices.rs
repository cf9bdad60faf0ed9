use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{BufferSize, Device, Host, StreamConfig};

use super::CaptureError;
use crate::config::BUFFER_SIZE;

/// Names of all input devices and the index of the default one.
pub fn init_devices(host: &Host) -> (Vec<String>, usize) {
    let mut devices = Vec::new();

    match host.input_devices() {
        Ok(input_devices) => {
            for device in input_devices {
                if let Ok(name) = device.name() {
                    devices.push(name);
                }
            }
        }
        Err(e) => log::warn!("Failed to enumerate input devices: {}", e),
    }

    let default_index = host
        .default_input_device()
        .and_then(|device| device.name().ok())
        .and_then(|name| devices.iter().position(|d| *d == name))
        .unwrap_or(0);

    (devices, default_index)
}

pub fn get_input_device(host: &Host, devices: &[String], index: usize) -> Result<Device, CaptureError> {
    let device_name = devices.get(index).ok_or(CaptureError::NoInputDevice)?;

    let input_devices = host
        .input_devices()
        .map_err(|e| CaptureError::EnumerationError(e.to_string()))?;

    for device in input_devices {
        if device.name().is_ok_and(|name| name == *device_name) {
            return Ok(device);
        }
    }

    Err(CaptureError::DeviceNotFound(device_name.clone()))
}

pub fn create_stream_config(channels: u16, sample_rate: cpal::SampleRate) -> StreamConfig {
    StreamConfig {
        channels,
        sample_rate,
        buffer_size: BufferSize::Fixed(BUFFER_SIZE as u32),
    }
}
