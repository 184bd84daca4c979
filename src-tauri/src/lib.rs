pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod hotkeys;
pub mod log;

#[cfg(feature = "desktop")]
pub mod commands;

// Re-export engine types for testing and external use
pub use audio::{
    AudioBackend, AudioStream, ClipPlayer, CpalBackend, Device, DeviceCatalog, DeviceId,
    DeviceKind, LoopbackController, LoopbackPipeline, MediaDeviceInfo, StreamFormat, StreamSpec,
};
pub use config::{ConfigStore, Keybindings, Settings};
pub use engine::Engine;
pub use error::{EngineError, Result};
pub use hotkeys::{Chord, HotkeyRouter};

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use commands::*;
    use std::sync::Arc;

    log::init_tracing();

    let engine = match Engine::open_default() {
        Ok(engine) => Arc::new(engine),
        Err(e) => {
            eprintln!("Failed to initialize engine: {}", e);
            std::process::exit(1);
        }
    };

    let startup_engine = engine.clone();

    tauri::Builder::default()
        .manage(EngineState(engine))
        .setup(move |_app| {
            tauri::async_runtime::spawn(async move {
                if let Err(e) = startup_engine.startup().await {
                    tracing::error!("Engine startup incomplete: {}", e);
                }
            });
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            list_capture_devices,
            list_playback_devices,
            get_capture_device_id,
            set_capture_device_id,
            get_playback_device_id,
            set_playback_device_id,
            list_audio_files,
            add_audio_file,
            remove_audio_file,
            play_audio_file,
            stop_audio_file,
            list_audio_file_keybindings,
            set_audio_file_keybinding,
            remove_audio_file_keybinding,
            dispatch_chord
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
