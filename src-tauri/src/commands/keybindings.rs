use super::EngineState;
use crate::config::Keybindings;
use tauri::State;

#[tauri::command]
pub async fn list_audio_file_keybindings(
    engine_state: State<'_, EngineState>,
) -> Result<Keybindings, String> {
    engine_state.0.list_audio_file_keybindings().map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn set_audio_file_keybinding(
    engine_state: State<'_, EngineState>,
    audio_file: String,
    keybinding: String,
) -> Result<(), String> {
    println!("⌨️ Binding {} to {}", keybinding, audio_file);

    engine_state
        .0
        .set_audio_file_keybinding(&audio_file, &keybinding)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn remove_audio_file_keybinding(
    engine_state: State<'_, EngineState>,
    audio_file: String,
) -> Result<(), String> {
    engine_state
        .0
        .remove_audio_file_keybinding(&audio_file)
        .await
        .map_err(|e| e.to_string())
}

/// Entry point for the frontend's global-shortcut hook
#[tauri::command]
pub async fn dispatch_chord(
    engine_state: State<'_, EngineState>,
    keys: Vec<String>,
) -> Result<usize, String> {
    Ok(engine_state.0.dispatch_chord(keys))
}
