use super::EngineState;
use tauri::State;

#[tauri::command]
pub async fn list_audio_files(engine_state: State<'_, EngineState>) -> Result<Vec<String>, String> {
    engine_state.0.list_audio_files().map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn add_audio_file(
    engine_state: State<'_, EngineState>,
    audio_file: String,
) -> Result<(), String> {
    println!("➕ Adding audio file: {}", audio_file);
    engine_state.0.add_audio_file(&audio_file).map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn remove_audio_file(
    engine_state: State<'_, EngineState>,
    audio_file: String,
) -> Result<(), String> {
    println!("🗑️ Removing audio file: {}", audio_file);
    engine_state.0.remove_audio_file(&audio_file).map_err(|e| e.to_string())
}

// Playback waits on the clip worker, so it runs on the blocking pool
#[tauri::command]
pub async fn play_audio_file(
    engine_state: State<'_, EngineState>,
    audio_file: String,
) -> Result<(), String> {
    let engine = engine_state.0.clone();
    tokio::task::spawn_blocking(move || engine.play_audio_file(&audio_file))
        .await
        .map_err(|e| e.to_string())?
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn stop_audio_file(
    engine_state: State<'_, EngineState>,
    audio_file: String,
) -> Result<(), String> {
    engine_state.0.stop_audio_file(&audio_file).map_err(|e| e.to_string())
}
