// Audio module - device access, clip playback and the loopback relay for Loopboard
//
// Broken down into:
// - types: device identifiers, stream formats and the frontend device shape
// - backend: the trait seam to the native audio subsystem, plus the cpal implementation
// - catalog: device enumeration and persisted-id resolution
// - decoder: WAV / MP3 clip decoding to raw PCM
// - clip_player: one playback stream per clip path
// - loopback: capture-to-playback relay and its controller
// - cancel: stop handles shared by every stream owner

pub mod backend;
pub mod cancel;
pub mod catalog;
pub mod clip_player;
pub mod cpal_backend;
pub mod decoder;
pub mod loopback;
pub mod types;

// Re-export commonly used types for easier imports
pub use backend::{AudioBackend, AudioStream, CaptureCallback, FillCallback};
pub use cancel::{stop_pair, StopHandle, StopSignal};
pub use catalog::DeviceCatalog;
pub use clip_player::ClipPlayer;
pub use cpal_backend::CpalBackend;
pub use decoder::{read_full, ClipContainer, ClipDecoder};
pub use loopback::{ActiveLoopback, LoopbackController, LoopbackPipeline, HANDOFF_TIMEOUT};
pub use types::{
    Device, DeviceId, DeviceKind, DeviceSelector, MediaDeviceInfo, SampleFormat, StreamFormat,
    StreamSpec, DEVICE_ID_CAPACITY, LOOPBACK_CHANNELS, LOOPBACK_SAMPLE_RATE,
};
