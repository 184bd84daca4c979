use std::sync::Arc;
use tokio::sync::{broadcast, oneshot, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::chord::Chord;
use crate::audio::ClipPlayer;
use crate::config::Settings;
use crate::error::Result;

/// Chord events buffered per subscriber before the slowest one starts lagging
pub const HOTKEY_EVENT_CAPACITY: usize = 64;

/// One bound chord and the clip it triggers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub chord: Chord,
    pub clip_path: String,
}

struct ListenerTask {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl ListenerTask {
    async fn teardown(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.handle.await {
            warn!("Hotkey listener ended abnormally: {}", e);
        }
    }
}

/// Turns chord-down events into clip playback
pub struct HotkeyRouter {
    settings: Arc<Settings>,
    player: Arc<ClipPlayer>,
    events: broadcast::Sender<Chord>,
    listener: AsyncMutex<Option<ListenerTask>>,
}

impl HotkeyRouter {
    pub fn new(
        settings: Arc<Settings>,
        player: Arc<ClipPlayer>,
        events: broadcast::Sender<Chord>,
    ) -> Self {
        Self {
            settings,
            player,
            events,
            listener: AsyncMutex::new(None),
        }
    }

    /// Current registrations, one per non-empty persisted binding
    pub fn registrations(settings: &Settings) -> Result<Vec<Registration>> {
        let bindings = settings.audio_file_keybindings()?;
        Ok(bindings
            .into_iter()
            .filter_map(|(clip_path, binding)| match Chord::parse(&binding) {
                Some(chord) => Some(Registration { chord, clip_path }),
                None => {
                    debug!("Skipping empty binding for {}", clip_path);
                    None
                }
            })
            .collect())
    }

    /// Stop the current listener (waiting for it), then start one over the
    /// bindings as they are persisted right now. Returns the number registered.
    pub async fn rebuild(&self) -> Result<usize> {
        let mut listener = self.listener.lock().await;

        if let Some(task) = listener.take() {
            task.teardown().await;
        }

        let registrations = Self::registrations(&self.settings)?;
        let count = registrations.len();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(listen(
            registrations,
            self.events.subscribe(),
            shutdown_rx,
            self.player.clone(),
        ));

        *listener = Some(ListenerTask {
            shutdown: shutdown_tx,
            handle,
        });

        info!("⌨️ Hotkey router listening for {} bindings", count);
        Ok(count)
    }

    pub async fn shutdown(&self) {
        if let Some(task) = self.listener.lock().await.take() {
            task.teardown().await;
            info!("⌨️ Hotkey router stopped");
        }
    }

    pub async fn is_listening(&self) -> bool {
        self.listener
            .lock()
            .await
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }
}

async fn listen(
    registrations: Vec<Registration>,
    mut events: broadcast::Receiver<Chord>,
    mut shutdown: oneshot::Receiver<()>,
    player: Arc<ClipPlayer>,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            event = events.recv() => match event {
                Ok(chord) => dispatch(&registrations, &chord, &player).await,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!("Hotkey router fell behind, {} chord events dropped", missed);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
    debug!("Hotkey listener exiting");
}

async fn dispatch(registrations: &[Registration], chord: &Chord, player: &Arc<ClipPlayer>) {
    for registration in registrations.iter().filter(|r| r.chord.matches(chord)) {
        let clip_path = registration.clip_path.clone();
        debug!("Chord {} triggers {}", chord, clip_path);

        let player = player.clone();
        let target = clip_path.clone();
        match tokio::task::spawn_blocking(move || player.play(&target)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Failed to play {} for chord {}: {}", clip_path, chord, e),
            Err(e) => error!("Playback task for {} panicked: {}", clip_path, e),
        }
    }
}
