use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{EngineError, Result};

/// Largest native device identifier we can hold, in bytes
pub const DEVICE_ID_CAPACITY: usize = 256;

/// Loopback runs mono 16-bit at a fixed rate on both ends
pub const LOOPBACK_SAMPLE_RATE: u32 = 44_100;
pub const LOOPBACK_CHANNELS: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Capture,
    Playback,
}

impl DeviceKind {
    /// The `kind` string the frontend expects (mirrors the web MediaDeviceInfo API)
    pub fn media_kind(&self) -> &'static str {
        match self {
            DeviceKind::Capture => "audioinput",
            DeviceKind::Playback => "audiooutput",
        }
    }
}

/// Raw hardware identifier stored in a fixed-capacity buffer.
///
/// Only the first `len` bytes are meaningful, so an id round-trips through hex
/// exactly, including the empty id.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DeviceId {
    bytes: [u8; DEVICE_ID_CAPACITY],
    len: usize,
}

impl DeviceId {
    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        if raw.len() > DEVICE_ID_CAPACITY {
            return Err(EngineError::InvalidInput(format!(
                "device id is {} bytes, capacity is {}",
                raw.len(),
                DEVICE_ID_CAPACITY
            )));
        }

        let mut bytes = [0u8; DEVICE_ID_CAPACITY];
        bytes[..raw.len()].copy_from_slice(raw);
        Ok(Self {
            bytes,
            len: raw.len(),
        })
    }

    pub fn from_hex(text: &str) -> Result<Self> {
        let raw = hex::decode(text)
            .map_err(|e| EngineError::InvalidInput(format!("device id is not hex: {}", e)))?;
        Self::from_bytes(&raw)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Lower-case hex, the persisted form
    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DeviceId").field(&self.to_hex()).finish()
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A device as reported by one enumeration call. Never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub id: DeviceId,
    pub kind: DeviceKind,
    pub name: String,
}

/// Which device a stream should open; `id: None` means the system default
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSelector {
    pub kind: DeviceKind,
    pub id: Option<DeviceId>,
}

impl DeviceSelector {
    pub fn system_default(kind: DeviceKind) -> Self {
        Self { kind, id: None }
    }

    pub fn is_default(&self) -> bool {
        self.id.is_none()
    }
}

/// PCM sample encodings a stream can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleFormat {
    U8,
    S16,
    /// Packed little-endian, three bytes per sample
    S24,
    S32,
    F32,
}

/// Format descriptor shared by decoders and stream configs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamFormat {
    pub sample_format: SampleFormat,
    pub channels: u16,
    pub sample_rate: u32,
}

impl StreamFormat {
    pub fn loopback() -> Self {
        Self {
            sample_format: SampleFormat::S16,
            channels: LOOPBACK_CHANNELS,
            sample_rate: LOOPBACK_SAMPLE_RATE,
        }
    }
}

/// Everything a backend needs to open one stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSpec {
    pub format: StreamFormat,
    pub device: DeviceSelector,
}

/// Device shape handed to the frontend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDeviceInfo {
    pub device_id: String,
    pub group_id: String,
    pub kind: String,
    pub label: String,
}

impl From<&Device> for MediaDeviceInfo {
    fn from(device: &Device) -> Self {
        Self {
            device_id: device.id.to_hex(),
            group_id: String::new(),
            kind: device.kind.media_kind().to_string(),
            label: device.name.clone(),
        }
    }
}
