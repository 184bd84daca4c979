// Seam between the engine and the native audio subsystem
//
// Callbacks handed to a backend run on the host's real-time thread. They only
// move bytes: copy into/out of the device buffer and do bounded channel
// operations. All fallible setup and teardown happens on the owning worker thread.

use super::types::{Device, DeviceKind, StreamSpec};
use crate::error::Result;

/// Playback fill callback: write PCM into the device buffer, return bytes written
pub type FillCallback = Box<dyn FnMut(&mut [u8]) -> usize + Send + 'static>;

/// Capture data callback: receives the captured PCM for one device period
pub type CaptureCallback = Box<dyn FnMut(&[u8]) + Send + 'static>;

/// A native stream owned by the thread that opened it.
///
/// Dropping the stream releases the device. Native streams are generally not
/// `Send`, so neither is this.
pub trait AudioStream {
    fn start(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
}

pub trait AudioBackend: Send + Sync {
    /// Fresh enumeration; implementations must not cache across calls
    fn list_devices(&self, kind: DeviceKind) -> Result<Vec<Device>>;

    /// Open (but do not start) a playback stream
    fn open_playback(&self, spec: &StreamSpec, fill: FillCallback) -> Result<Box<dyn AudioStream>>;

    /// Open (but do not start) a capture stream
    fn open_capture(
        &self,
        spec: &StreamSpec,
        on_data: CaptureCallback,
    ) -> Result<Box<dyn AudioStream>>;
}
