use super::EngineState;
use crate::audio::MediaDeviceInfo;
use tauri::State;

#[tauri::command]
pub async fn list_capture_devices(
    engine_state: State<'_, EngineState>,
) -> Result<Vec<MediaDeviceInfo>, String> {
    engine_state.0.list_capture_devices().map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn list_playback_devices(
    engine_state: State<'_, EngineState>,
) -> Result<Vec<MediaDeviceInfo>, String> {
    engine_state.0.list_playback_devices().map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn get_capture_device_id(engine_state: State<'_, EngineState>) -> Result<String, String> {
    engine_state.0.get_capture_device_id().map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn set_capture_device_id(
    engine_state: State<'_, EngineState>,
    device_id: String,
) -> Result<(), String> {
    println!("🎤 Switching capture device to {:?}", device_id);

    engine_state
        .0
        .set_capture_device_id(&device_id)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn get_playback_device_id(
    engine_state: State<'_, EngineState>,
) -> Result<String, String> {
    engine_state.0.get_playback_device_id().map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn set_playback_device_id(
    engine_state: State<'_, EngineState>,
    device_id: String,
) -> Result<(), String> {
    println!("🔊 Switching playback device to {:?}", device_id);

    engine_state
        .0
        .set_playback_device_id(&device_id)
        .await
        .map_err(|e| e.to_string())
}
