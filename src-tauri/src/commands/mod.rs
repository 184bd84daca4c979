// Command modules for better organization
pub mod audio_devices;
pub mod audio_files;
pub mod keybindings;

use crate::Engine;
use std::sync::Arc;

// Re-export all command functions for easy access
pub use audio_devices::*;
pub use audio_files::*;
pub use keybindings::*;

/// Engine handle managed by Tauri
pub struct EngineState(pub Arc<Engine>);
