// Per-clip playback
//
// Each playing clip owns one worker thread and one playback stream. The session
// map holds the only stop handle for each clip path, so there is never more than
// one live stream per path: `play` always tears the previous one down (and waits
// for it) before opening the next. The map lock is only taken to look up, remove
// or insert a session. Setup for one clip runs under that clip's own start gate,
// so a slow device open never holds up stopping or starting other clips.

use crossbeam::channel::{self, Sender};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

use super::backend::{AudioBackend, AudioStream, FillCallback};
use super::cancel::{stop_pair, StopHandle, StopSignal};
use super::catalog::DeviceCatalog;
use super::decoder::{read_full, ClipContainer, ClipDecoder};
use super::types::{DeviceKind, StreamSpec};
use crate::config::Settings;
use crate::error::{EngineError, Result};

struct ClipSession {
    stop: StopHandle,
    worker: JoinHandle<()>,
}

impl ClipSession {
    /// Signal and wait until the worker has released its stream
    fn shutdown(self, clip_path: &str) {
        self.stop.signal();
        if self.worker.join().is_err() {
            warn!("Clip worker for {} panicked during teardown", clip_path);
        }
    }
}

pub struct ClipPlayer {
    backend: Arc<dyn AudioBackend>,
    settings: Arc<Settings>,
    sessions: Mutex<HashMap<String, ClipSession>>,
    start_gates: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ClipPlayer {
    pub fn new(backend: Arc<dyn AudioBackend>, settings: Arc<Settings>) -> Self {
        Self {
            backend,
            settings,
            sessions: Mutex::new(HashMap::new()),
            start_gates: Mutex::new(HashMap::new()),
        }
    }

    /// Serializes `play` calls for one path without blocking other paths
    fn start_gate(&self, clip_path: &str) -> Arc<Mutex<()>> {
        self.start_gates
            .lock()
            .entry(clip_path.to_string())
            .or_default()
            .clone()
    }

    /// Start (or restart) playback of one clip.
    ///
    /// Returns once the stream is running, or with the setup error if it could not
    /// be started. An unsupported extension is rejected before the current stream
    /// for this clip is touched.
    pub fn play(&self, clip_path: &str) -> Result<()> {
        let container = ClipContainer::from_path(Path::new(clip_path))?;

        let gate = self.start_gate(clip_path);
        let _starting = gate.lock();

        let previous = self.sessions.lock().remove(clip_path);
        if let Some(previous) = previous {
            debug!("Replacing running stream for {}", clip_path);
            previous.shutdown(clip_path);
        }

        let (stop, signal) = stop_pair();
        let (ready_tx, ready_rx) = channel::bounded(1);
        let job = ClipJob {
            path: PathBuf::from(clip_path),
            container,
            backend: self.backend.clone(),
            settings: self.settings.clone(),
        };

        let worker = thread::Builder::new()
            .name(format!("clip:{}", clip_label(clip_path)))
            .spawn(move || job.run(signal, ready_tx))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                info!("▶️ Playing {}", clip_path);
                let displaced = self
                    .sessions
                    .lock()
                    .insert(clip_path.to_string(), ClipSession { stop, worker });
                if let Some(displaced) = displaced {
                    warn!("Another stream for {} appeared during setup", clip_path);
                    displaced.shutdown(clip_path);
                }
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = worker.join();
                Err(e)
            }
            Err(_) => {
                let _ = worker.join();
                Err(EngineError::WorkerLost(clip_path.to_string()))
            }
        }
    }

    /// Cancel a clip's stream without waiting for the device to be released.
    /// A no-op when the clip is not playing.
    pub fn stop(&self, clip_path: &str) -> Result<()> {
        if let Some(session) = self.sessions.lock().remove(clip_path) {
            session.stop.signal();
            info!("⏹️ Stopped {}", clip_path);
        }
        Ok(())
    }

    /// Cancel everything and wait for every worker to finish
    pub fn stop_all(&self) {
        let sessions: Vec<_> = self.sessions.lock().drain().collect();
        for (clip_path, session) in sessions {
            session.shutdown(&clip_path);
        }
    }

    /// `false` once the clip was stopped or its stream died
    pub fn is_playing(&self, clip_path: &str) -> bool {
        self.sessions
            .lock()
            .get(clip_path)
            .is_some_and(|session| !session.worker.is_finished())
    }

    pub fn active_clips(&self) -> Vec<String> {
        let mut clips: Vec<_> = self
            .sessions
            .lock()
            .iter()
            .filter(|(_, session)| !session.worker.is_finished())
            .map(|(path, _)| path.clone())
            .collect();
        clips.sort();
        clips
    }
}

impl Drop for ClipPlayer {
    fn drop(&mut self) {
        self.stop_all();
    }
}

fn clip_label(clip_path: &str) -> String {
    Path::new(clip_path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| clip_path.to_string())
}

/// Everything one worker thread needs; moved onto the thread
struct ClipJob {
    path: PathBuf,
    container: ClipContainer,
    backend: Arc<dyn AudioBackend>,
    settings: Arc<Settings>,
}

impl ClipJob {
    fn run(self, stop: StopSignal, ready: Sender<Result<()>>) {
        let (fault_tx, fault_rx) = channel::bounded::<String>(1);

        let mut stream = match self.open(fault_tx).and_then(|mut stream| {
            stream.start()?;
            Ok(stream)
        }) {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Could not start {}: {}", self.path.display(), e);
                let _ = ready.send(Err(e));
                return;
            }
        };

        let _ = ready.send(Ok(()));

        crossbeam::select! {
            recv(stop.receiver()) -> _ => {
                debug!("Stop requested for {}", self.path.display());
            }
            recv(fault_rx) -> fault => {
                if let Ok(fault) = fault {
                    error!("Stream for {} ended: {}", self.path.display(), fault);
                }
            }
        }

        if let Err(e) = stream.stop() {
            warn!("Failed to stop stream for {}: {}", self.path.display(), e);
        }
        drop(stream);
        debug!("Released stream for {}", self.path.display());
    }

    fn open(&self, faults: Sender<String>) -> Result<Box<dyn AudioStream>> {
        let decoder = self.container.open(&self.path)?;
        let format = decoder.format();

        let device = DeviceCatalog::resolve_device_id(
            DeviceKind::Playback,
            &self.settings.playback_device_id()?,
        )?;

        debug!(
            "Opening {} as {:?} on {:?}",
            self.path.display(),
            format,
            device
        );

        let spec = StreamSpec { format, device };
        self.backend.open_playback(&spec, clip_fill(decoder, faults))
    }
}

/// Fill callback that pulls straight from the decoder.
///
/// Whatever the decoder yields is copied in; a short read leaves the rest of the
/// buffer as the device handed it over. After a decode error the callback goes
/// quiet and reports once through `faults`.
fn clip_fill(mut decoder: Box<dyn ClipDecoder>, faults: Sender<String>) -> FillCallback {
    let mut failed = false;
    Box::new(move |out: &mut [u8]| {
        if failed {
            return 0;
        }
        match read_full(decoder.as_mut(), out) {
            Ok(n) => n,
            Err(e) => {
                failed = true;
                let _ = faults.try_send(e.to_string());
                0
            }
        }
    })
}
