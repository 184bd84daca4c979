// Engine facade
//
// Owns every long-lived piece (settings, clip player, loopback controller,
// hotkey router) and exposes the operations the frontend calls. Operations that
// wait on audio workers hop onto the blocking pool when called from async code.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};

use crate::audio::{
    AudioBackend, ClipPlayer, CpalBackend, DeviceCatalog, DeviceKind, LoopbackController,
    LoopbackPipeline, MediaDeviceInfo,
};
use crate::config::{self, ConfigStore, Keybindings, Settings};
use crate::error::{EngineError, Result};
use crate::hotkeys::{Chord, HotkeyRouter, HOTKEY_EVENT_CAPACITY};

pub struct Engine {
    settings: Arc<Settings>,
    catalog: DeviceCatalog,
    player: Arc<ClipPlayer>,
    loopback: Arc<LoopbackController>,
    hotkeys: HotkeyRouter,
    hotkey_events: broadcast::Sender<Chord>,
}

impl Engine {
    pub fn new(store: ConfigStore, backend: Arc<dyn AudioBackend>) -> Self {
        let settings = Arc::new(Settings::new(store));
        let player = Arc::new(ClipPlayer::new(backend.clone(), settings.clone()));
        let loopback = Arc::new(LoopbackController::new(LoopbackPipeline::new(
            backend.clone(),
            settings.clone(),
        )));
        let (hotkey_events, _) = broadcast::channel(HOTKEY_EVENT_CAPACITY);
        let hotkeys = HotkeyRouter::new(settings.clone(), player.clone(), hotkey_events.clone());

        Self {
            settings,
            catalog: DeviceCatalog::new(backend),
            player,
            loopback,
            hotkeys,
            hotkey_events,
        }
    }

    /// Engine over the system audio host and the per-user data file
    pub fn open_default() -> Result<Self> {
        Self::open_at(config::data_file_path())
    }

    pub fn open_at(store_path: impl Into<PathBuf>) -> Result<Self> {
        let store = ConfigStore::open(store_path)?;
        info!("📁 Using data file {}", store.path().display());
        Ok(Self::new(store, Arc::new(CpalBackend::new())))
    }

    /// Bring up the loopback and the hotkey listener.
    ///
    /// A loopback failure does not keep the hotkeys from being installed; it is
    /// still returned once they are.
    pub async fn startup(&self) -> Result<()> {
        let loopback = self.restart_loopback().await;
        if let Err(e) = &loopback {
            error!("Loopback did not start: {}", e);
        }
        self.hotkeys.rebuild().await?;
        loopback
    }

    /// Stop the hotkey listener, the loopback and every clip, waiting for all of them
    pub async fn shutdown(&self) -> Result<()> {
        self.hotkeys.shutdown().await;

        let loopback = self.loopback.clone();
        let player = self.player.clone();
        tokio::task::spawn_blocking(move || {
            loopback.stop();
            player.stop_all();
        })
        .await
        .map_err(|e| EngineError::WorkerLost(format!("shutdown: {}", e)))?;

        info!("👋 Engine shut down");
        Ok(())
    }

    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    pub fn player(&self) -> &Arc<ClipPlayer> {
        &self.player
    }

    pub fn loopback(&self) -> &Arc<LoopbackController> {
        &self.loopback
    }

    pub fn hotkeys(&self) -> &HotkeyRouter {
        &self.hotkeys
    }

    // Devices

    pub fn list_capture_devices(&self) -> Result<Vec<MediaDeviceInfo>> {
        self.catalog.list_media_devices(DeviceKind::Capture)
    }

    pub fn list_playback_devices(&self) -> Result<Vec<MediaDeviceInfo>> {
        self.catalog.list_media_devices(DeviceKind::Playback)
    }

    pub fn get_capture_device_id(&self) -> Result<String> {
        self.settings.capture_device_id()
    }

    pub fn get_playback_device_id(&self) -> Result<String> {
        self.settings.playback_device_id()
    }

    /// Persist the selection, then restart the loopback against it
    pub async fn set_capture_device_id(&self, device_id: &str) -> Result<()> {
        DeviceCatalog::resolve_device_id(DeviceKind::Capture, device_id)?;
        self.settings.set_capture_device_id(device_id)?;
        info!("🎤 Capture device set to {:?}", device_id);
        self.restart_loopback().await
    }

    pub async fn set_playback_device_id(&self, device_id: &str) -> Result<()> {
        DeviceCatalog::resolve_device_id(DeviceKind::Playback, device_id)?;
        self.settings.set_playback_device_id(device_id)?;
        info!("🔊 Playback device set to {:?}", device_id);
        self.restart_loopback().await
    }

    pub async fn restart_loopback(&self) -> Result<()> {
        let loopback = self.loopback.clone();
        tokio::task::spawn_blocking(move || loopback.restart())
            .await
            .map_err(|e| EngineError::WorkerLost(format!("loopback restart: {}", e)))?
    }

    // Clips

    pub fn list_audio_files(&self) -> Result<Vec<String>> {
        self.settings.audio_files()
    }

    pub fn add_audio_file(&self, audio_file: &str) -> Result<()> {
        self.settings.add_audio_file(audio_file)
    }

    pub fn remove_audio_file(&self, audio_file: &str) -> Result<()> {
        self.settings.remove_audio_file(audio_file)
    }

    /// Blocks until the clip's stream is running or failed to start
    pub fn play_audio_file(&self, audio_file: &str) -> Result<()> {
        self.player.play(audio_file)
    }

    pub fn stop_audio_file(&self, audio_file: &str) -> Result<()> {
        self.player.stop(audio_file)
    }

    // Keybindings

    pub fn list_audio_file_keybindings(&self) -> Result<Keybindings> {
        self.settings.audio_file_keybindings()
    }

    pub async fn set_audio_file_keybinding(&self, audio_file: &str, keybinding: &str) -> Result<()> {
        self.settings
            .set_audio_file_keybinding(audio_file, keybinding)?;
        self.hotkeys.rebuild().await?;
        Ok(())
    }

    pub async fn remove_audio_file_keybinding(&self, audio_file: &str) -> Result<()> {
        self.settings.remove_audio_file_keybinding(audio_file)?;
        self.hotkeys.rebuild().await?;
        Ok(())
    }

    // Hotkey events

    /// Inject a chord-down event. Returns how many listeners received it.
    pub fn dispatch_chord<I, S>(&self, keys: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let chord = Chord::from_keys(keys);
        self.hotkey_events.send(chord).unwrap_or(0)
    }
}
