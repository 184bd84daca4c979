// Typed view over the config store
//
// The store only knows strings. Each engine key holds a JSON document encoded as a
// string inside the outer JSON object, so every value here goes through serde_json
// twice on its way to disk.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

use super::store::ConfigStore;
use crate::error::Result;
use crate::hotkeys::normalize_binding;

pub const CAPTURE_DEVICE_ID_KEY: &str = "captureDeviceID";
pub const PLAYBACK_DEVICE_ID_KEY: &str = "playbackDeviceID";
pub const AUDIO_FILES_KEY: &str = "audioFiles";
pub const AUDIO_FILE_KEYBINDINGS_KEY: &str = "audioFileKeybindings";

/// Clip path to normalized chord string
pub type Keybindings = BTreeMap<String, String>;

#[derive(Debug)]
pub struct Settings {
    store: ConfigStore,
}

impl Settings {
    pub fn new(store: ConfigStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    // Device selection (hex-encoded native ids, empty = system default)

    pub fn capture_device_id(&self) -> Result<String> {
        Ok(self.get_json(CAPTURE_DEVICE_ID_KEY)?.unwrap_or_default())
    }

    pub fn set_capture_device_id(&self, device_id: &str) -> Result<()> {
        self.set_json(CAPTURE_DEVICE_ID_KEY, &device_id)
    }

    pub fn playback_device_id(&self) -> Result<String> {
        Ok(self.get_json(PLAYBACK_DEVICE_ID_KEY)?.unwrap_or_default())
    }

    pub fn set_playback_device_id(&self, device_id: &str) -> Result<()> {
        self.set_json(PLAYBACK_DEVICE_ID_KEY, &device_id)
    }

    // Clip list

    pub fn audio_files(&self) -> Result<Vec<String>> {
        Ok(self.get_json(AUDIO_FILES_KEY)?.unwrap_or_default())
    }

    /// Appends without checking for duplicates; callers own uniqueness
    pub fn add_audio_file(&self, audio_file: &str) -> Result<()> {
        self.update_json(AUDIO_FILES_KEY, |files: &mut Vec<String>| {
            files.push(audio_file.to_string());
        })
    }

    /// Removes the first matching entry; absent paths leave the list as is
    pub fn remove_audio_file(&self, audio_file: &str) -> Result<()> {
        self.update_json(AUDIO_FILES_KEY, |files: &mut Vec<String>| {
            if let Some(index) = files.iter().position(|f| f == audio_file) {
                files.remove(index);
            }
        })
    }

    // Keybindings

    pub fn audio_file_keybindings(&self) -> Result<Keybindings> {
        Ok(self.get_json(AUDIO_FILE_KEYBINDINGS_KEY)?.unwrap_or_default())
    }

    /// Stores the lower-cased chord; an existing binding for the clip is overwritten
    pub fn set_audio_file_keybinding(&self, audio_file: &str, keybinding: &str) -> Result<()> {
        let keybinding = normalize_binding(keybinding);
        self.update_json(AUDIO_FILE_KEYBINDINGS_KEY, |bindings: &mut Keybindings| {
            bindings.insert(audio_file.to_string(), keybinding);
        })
    }

    pub fn remove_audio_file_keybinding(&self, audio_file: &str) -> Result<()> {
        self.update_json(AUDIO_FILE_KEYBINDINGS_KEY, |bindings: &mut Keybindings| {
            bindings.remove(audio_file);
        })
    }

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.store.get_item(key)? {
            Some(serialized) if !serialized.is_empty() => {
                Ok(Some(serde_json::from_str(&serialized)?))
            }
            _ => Ok(None),
        }
    }

    fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let serialized = serde_json::to_string(value)?;
        self.store.set_item(key, serialized)
    }

    fn update_json<T, F>(&self, key: &str, apply: F) -> Result<()>
    where
        T: DeserializeOwned + Serialize + Default,
        F: FnOnce(&mut T),
    {
        self.store.update_item(key, |current| {
            let mut value: T = if current.is_empty() {
                T::default()
            } else {
                serde_json::from_str(current)?
            };
            apply(&mut value);
            Ok(serde_json::to_string(&value)?)
        })
    }
}
