// Persistent configuration
//
// - store: the file-backed key/value record with its reader/writer lock
// - settings: typed accessors for the engine's persisted keys
// - paths: where the record lives on disk

pub mod paths;
pub mod settings;
pub mod store;

pub use paths::{data_dir, data_file_path};
pub use settings::{
    Keybindings, Settings, AUDIO_FILES_KEY, AUDIO_FILE_KEYBINDINGS_KEY, CAPTURE_DEVICE_ID_KEY,
    PLAYBACK_DEVICE_ID_KEY,
};
pub use store::ConfigStore;
