// Device discovery and id resolution
//
// Device lists are never cached: hardware comes and goes, so every call goes back
// to the backend for a fresh enumeration.

use std::sync::Arc;
use tracing::debug;

use super::backend::AudioBackend;
use super::types::{Device, DeviceId, DeviceKind, DeviceSelector, MediaDeviceInfo};
use crate::error::Result;

#[derive(Clone)]
pub struct DeviceCatalog {
    backend: Arc<dyn AudioBackend>,
}

impl DeviceCatalog {
    pub fn new(backend: Arc<dyn AudioBackend>) -> Self {
        Self { backend }
    }

    pub fn list_devices(&self, kind: DeviceKind) -> Result<Vec<Device>> {
        let devices = self.backend.list_devices(kind)?;
        debug!("Enumerated {} {:?} devices", devices.len(), kind);
        Ok(devices)
    }

    /// Same list in the shape the frontend consumes
    pub fn list_media_devices(&self, kind: DeviceKind) -> Result<Vec<MediaDeviceInfo>> {
        Ok(self
            .list_devices(kind)?
            .iter()
            .map(Self::to_media_device_info)
            .collect())
    }

    pub fn to_media_device_info(device: &Device) -> MediaDeviceInfo {
        MediaDeviceInfo::from(device)
    }

    /// Turn a persisted hex id into a selector. Empty text selects the system default.
    pub fn resolve_device_id(kind: DeviceKind, id_text: &str) -> Result<DeviceSelector> {
        if id_text.is_empty() {
            return Ok(DeviceSelector::system_default(kind));
        }

        Ok(DeviceSelector {
            kind,
            id: Some(DeviceId::from_hex(id_text)?),
        })
    }
}

impl std::fmt::Debug for DeviceCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceCatalog")
            .field("backend", &"<AudioBackend>")
            .finish()
    }
}
