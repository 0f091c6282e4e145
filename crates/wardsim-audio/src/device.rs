use cpal::traits::{DeviceTrait, HostTrait};
use cpal::Device;
use wardsim_core::AudioError;

/// Resolve an output device by name; `"default"` selects the host default.
pub fn open_output_device(name: &str) -> Result<Device, AudioError> {
    let host = cpal::default_host();

    if name == "default" {
        return host
            .default_output_device()
            .ok_or_else(|| AudioError::DeviceNotFound("no default output device".to_string()));
    }

    let mut devices = host
        .output_devices()
        .map_err(|e| AudioError::DeviceEnumeration(e.to_string()))?;
    devices
        .find(|d| d.name().map(|n| n == name).unwrap_or(false))
        .ok_or_else(|| AudioError::DeviceNotFound(format!("output device not found: {name}")))
}
