// cpal implementation of the audio backend
//
// Every call opens its own host and lets it go before returning, so no native
// context is ever shared between enumeration calls or streams. cpal has no
// portable device id, so the device name's UTF-8 bytes stand in for one.

use anyhow::{anyhow, Context};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, error, info, warn};

use super::backend::{AudioBackend, AudioStream, CaptureCallback, FillCallback};
use super::types::{
    Device, DeviceId, DeviceKind, DeviceSelector, SampleFormat, StreamSpec, DEVICE_ID_CAPACITY,
};
use crate::error::Result;

#[derive(Debug, Default, Clone, Copy)]
pub struct CpalBackend;

impl CpalBackend {
    pub fn new() -> Self {
        Self
    }

    fn host() -> cpal::Host {
        let host = cpal::default_host();
        debug!("Using audio host: {:?}", host.id());
        host
    }

    fn devices_of(host: &cpal::Host, kind: DeviceKind) -> anyhow::Result<Vec<cpal::Device>> {
        let devices = match kind {
            DeviceKind::Capture => host
                .input_devices()
                .context("Failed to enumerate input devices")?
                .collect(),
            DeviceKind::Playback => host
                .output_devices()
                .context("Failed to enumerate output devices")?
                .collect(),
        };
        Ok(devices)
    }

    fn find_device(host: &cpal::Host, selector: &DeviceSelector) -> anyhow::Result<cpal::Device> {
        let Some(id) = &selector.id else {
            let device = match selector.kind {
                DeviceKind::Capture => host.default_input_device(),
                DeviceKind::Playback => host.default_output_device(),
            };
            return device.ok_or_else(|| anyhow!("No default {:?} device", selector.kind));
        };

        Self::devices_of(host, selector.kind)?
            .into_iter()
            .find(|device| {
                device
                    .name()
                    .map(|name| name.as_bytes() == id.as_bytes())
                    .unwrap_or(false)
            })
            .ok_or_else(|| anyhow!("{:?} device {} not found", selector.kind, id))
    }
}

fn cpal_stream_config(spec: &StreamSpec) -> cpal::StreamConfig {
    cpal::StreamConfig {
        channels: spec.format.channels,
        sample_rate: cpal::SampleRate(spec.format.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    }
}

/// cpal 0.15 has no packed 24-bit format; S24 streams are opened as I32
fn cpal_sample_format(format: SampleFormat) -> cpal::SampleFormat {
    match format {
        SampleFormat::U8 => cpal::SampleFormat::U8,
        SampleFormat::S16 => cpal::SampleFormat::I16,
        SampleFormat::S24 | SampleFormat::S32 => cpal::SampleFormat::I32,
        SampleFormat::F32 => cpal::SampleFormat::F32,
    }
}

/// Adapt a packed 24-bit source to a 32-bit device buffer
fn widen_s24(mut fill: FillCallback) -> FillCallback {
    let mut packed = Vec::new();
    Box::new(move |out: &mut [u8]| {
        let samples = out.len() / 4;
        packed.resize(samples * 3, 0);
        let written = fill(&mut packed);

        for (dst, src) in out
            .chunks_exact_mut(4)
            .zip(packed.chunks_exact(3))
            .take(written / 3)
        {
            let sample = i32::from_le_bytes([0, src[0], src[1], src[2]]);
            dst.copy_from_slice(&sample.to_ne_bytes());
        }

        written / 3 * 4
    })
}

fn log_stream_error(err: cpal::StreamError) {
    error!("Audio stream error: {}", err);
}

struct CpalStream {
    stream: cpal::Stream,
    label: String,
}

impl AudioStream for CpalStream {
    fn start(&mut self) -> Result<()> {
        self.stream
            .play()
            .with_context(|| format!("Failed to start {}", self.label))?;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.stream
            .pause()
            .with_context(|| format!("Failed to stop {}", self.label))?;
        Ok(())
    }
}

impl AudioBackend for CpalBackend {
    fn list_devices(&self, kind: DeviceKind) -> Result<Vec<Device>> {
        let host = Self::host();
        let native = Self::devices_of(&host, kind)?;

        let mut devices = Vec::new();
        for device in native {
            let name = match device.name() {
                Ok(name) => name,
                Err(e) => {
                    warn!("Skipping {:?} device without a name: {}", kind, e);
                    continue;
                }
            };

            if name.len() > DEVICE_ID_CAPACITY {
                warn!("Skipping {:?} device with oversized name: {}", kind, name);
                continue;
            }

            devices.push(Device {
                id: DeviceId::from_bytes(name.as_bytes())?,
                kind,
                name,
            });
        }

        debug!("Found {} {:?} devices", devices.len(), kind);
        Ok(devices)
    }

    fn open_playback(&self, spec: &StreamSpec, fill: FillCallback) -> Result<Box<dyn AudioStream>> {
        let host = Self::host();
        let device = Self::find_device(&host, &spec.device)?;
        let label = format!("playback on {}", device.name().unwrap_or_default());

        let mut fill = match spec.format.sample_format {
            SampleFormat::S24 => widen_s24(fill),
            _ => fill,
        };

        let stream = device
            .build_output_stream_raw(
                &cpal_stream_config(spec),
                cpal_sample_format(spec.format.sample_format),
                move |data: &mut cpal::Data, _: &cpal::OutputCallbackInfo| {
                    fill(data.bytes_mut());
                },
                log_stream_error,
                None,
            )
            .with_context(|| format!("Failed to build {} ({:?})", label, spec.format))?;

        info!("🔊 Opened {} ({:?})", label, spec.format);
        Ok(Box::new(CpalStream { stream, label }))
    }

    fn open_capture(
        &self,
        spec: &StreamSpec,
        mut on_data: CaptureCallback,
    ) -> Result<Box<dyn AudioStream>> {
        let host = Self::host();
        let device = Self::find_device(&host, &spec.device)?;
        let label = format!("capture on {}", device.name().unwrap_or_default());

        let stream = device
            .build_input_stream_raw(
                &cpal_stream_config(spec),
                cpal_sample_format(spec.format.sample_format),
                move |data: &cpal::Data, _: &cpal::InputCallbackInfo| {
                    on_data(data.bytes());
                },
                log_stream_error,
                None,
            )
            .with_context(|| format!("Failed to build {} ({:?})", label, spec.format))?;

        info!("🎤 Opened {} ({:?})", label, spec.format);
        Ok(Box::new(CpalStream { stream, label }))
    }
}
