// Microphone-to-speaker relay
//
// One capture stream and one playback stream joined by a rendezvous channel: the
// capture callback hands each frame over and the playback callback takes it, so
// at most one frame is ever in flight. A late playback side stalls capture
// instead of losing frames; capture only gives up once playback is gone. A
// playback period with no frame plays silence. Spent frames travel back to
// capture so the device callbacks reuse buffers instead of allocating.
//
// The pipeline runs on a dedicated worker thread owned by the controller, which
// keeps at most one pipeline alive and restarts it on device changes.

use crossbeam::channel::{self, Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::backend::{AudioBackend, AudioStream, CaptureCallback, FillCallback};
use super::cancel::{stop_pair, StopHandle, StopSignal};
use super::catalog::DeviceCatalog;
use super::types::{DeviceKind, StreamFormat, StreamSpec};
use crate::audio_debug;
use crate::config::Settings;
use crate::error::{EngineError, Result};

/// How long playback waits for a frame, and how often a stalled capture wakes up
pub const HANDOFF_TIMEOUT: Duration = Duration::from_millis(100);

/// Spent frame buffers kept around for capture to refill
const RECYCLED_FRAMES: usize = 4;

pub struct LoopbackPipeline {
    backend: Arc<dyn AudioBackend>,
    settings: Arc<Settings>,
}

/// Both streams of a running relay. Owned by the thread that opened them.
pub struct ActiveLoopback {
    capture: Box<dyn AudioStream>,
    playback: Box<dyn AudioStream>,
}

impl LoopbackPipeline {
    pub fn new(backend: Arc<dyn AudioBackend>, settings: Arc<Settings>) -> Self {
        Self { backend, settings }
    }

    /// Open and start both streams from the persisted device selection
    pub fn open(&self) -> Result<ActiveLoopback> {
        let format = StreamFormat::loopback();
        let capture_spec = StreamSpec {
            format,
            device: DeviceCatalog::resolve_device_id(
                DeviceKind::Capture,
                &self.settings.capture_device_id()?,
            )?,
        };
        let playback_spec = StreamSpec {
            format,
            device: DeviceCatalog::resolve_device_id(
                DeviceKind::Playback,
                &self.settings.playback_device_id()?,
            )?,
        };

        let (frames_tx, frames_rx) = channel::bounded::<Vec<u8>>(0);
        let (spent_tx, spent_rx) = channel::bounded::<Vec<u8>>(RECYCLED_FRAMES);

        let mut capture = self
            .backend
            .open_capture(&capture_spec, capture_handoff(frames_tx, spent_rx))?;
        capture.start()?;

        // A playback stream that fails here is dropped before capture is stopped,
        // which disconnects the handoff and releases a stalled capture callback.
        let mut playback = match self
            .backend
            .open_playback(&playback_spec, playback_handoff(frames_rx, spent_tx))
        {
            Ok(playback) => playback,
            Err(e) => {
                let _ = capture.stop();
                return Err(e);
            }
        };
        if let Err(e) = playback.start() {
            drop(playback);
            let _ = capture.stop();
            return Err(e);
        }

        info!(
            "🔁 Loopback running: {:?} -> {:?}",
            capture_spec.device, playback_spec.device
        );
        Ok(ActiveLoopback { capture, playback })
    }

    /// Run the relay on the calling thread until `stop` fires
    pub fn start(&self, stop: &StopSignal) -> Result<()> {
        self.open()?.run_until(stop)
    }
}

impl ActiveLoopback {
    /// Block until `stop` fires, then tear down capture first and playback second
    pub fn run_until(self, stop: &StopSignal) -> Result<()> {
        stop.wait();
        self.teardown()
    }

    fn teardown(mut self) -> Result<()> {
        let capture_result = self.capture.stop();
        if let Err(e) = &capture_result {
            warn!("Failed to stop loopback capture: {}", e);
        }
        let playback_result = self.playback.stop();
        if let Err(e) = &playback_result {
            warn!("Failed to stop loopback playback: {}", e);
        }

        let ActiveLoopback { capture, playback } = self;
        drop(capture);
        drop(playback);
        info!("🔁 Loopback stopped");

        capture_result.and(playback_result)
    }
}

/// Capture side: hand each frame over, holding the device until playback takes
/// it. The timeout only wakes the loop up; the frame is kept and offered again.
fn capture_handoff(frames: Sender<Vec<u8>>, spent: Receiver<Vec<u8>>) -> CaptureCallback {
    Box::new(move |data: &[u8]| {
        let mut frame = spent.try_recv().unwrap_or_default();
        frame.clear();
        frame.extend_from_slice(data);

        loop {
            match frames.send_timeout(frame, HANDOFF_TIMEOUT) {
                Ok(()) => return,
                Err(SendTimeoutError::Timeout(pending)) => {
                    audio_debug!("Loopback playback late, holding {} bytes", pending.len());
                    frame = pending;
                }
                Err(SendTimeoutError::Disconnected(_)) => return,
            }
        }
    })
}

/// Playback side: copy one frame in, or fill the period with silence
fn playback_handoff(frames: Receiver<Vec<u8>>, spent: Sender<Vec<u8>>) -> FillCallback {
    Box::new(move |out: &mut [u8]| match frames.recv_timeout(HANDOFF_TIMEOUT) {
        Ok(frame) => {
            let n = frame.len().min(out.len());
            out[..n].copy_from_slice(&frame[..n]);
            let _ = spent.try_send(frame);
            n
        }
        Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
            audio_debug!("Loopback underrun, playing {} bytes of silence", out.len());
            out.fill(0);
            out.len()
        }
    })
}

struct LoopbackSession {
    stop: StopHandle,
    worker: JoinHandle<()>,
}

impl LoopbackSession {
    fn shutdown(self) {
        self.stop.signal();
        if self.worker.join().is_err() {
            warn!("Loopback worker panicked during teardown");
        }
    }
}

/// Owns the single running loopback, if any
pub struct LoopbackController {
    pipeline: Arc<LoopbackPipeline>,
    session: Mutex<Option<LoopbackSession>>,
}

impl LoopbackController {
    pub fn new(pipeline: LoopbackPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            session: Mutex::new(None),
        }
    }

    pub fn start(&self) -> Result<()> {
        self.restart()
    }

    /// Tear down the current loopback (waiting for its streams to close), then
    /// bring up a new one from the persisted devices.
    pub fn restart(&self) -> Result<()> {
        let mut session = self.session.lock();

        if let Some(previous) = session.take() {
            debug!("Tearing down loopback before restart");
            previous.shutdown();
        }

        let (stop, signal) = stop_pair();
        let (ready_tx, ready_rx) = channel::bounded::<Result<()>>(1);
        let pipeline = self.pipeline.clone();

        let worker = thread::Builder::new()
            .name("loopback".to_string())
            .spawn(move || match pipeline.open() {
                Ok(active) => {
                    let _ = ready_tx.send(Ok(()));
                    if let Err(e) = active.run_until(&signal) {
                        error!("Loopback teardown failed: {}", e);
                    }
                }
                Err(e) => {
                    error!("Loopback failed to start: {}", e);
                    let _ = ready_tx.send(Err(e));
                }
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                *session = Some(LoopbackSession { stop, worker });
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = worker.join();
                Err(e)
            }
            Err(_) => {
                let _ = worker.join();
                Err(EngineError::WorkerLost("loopback".to_string()))
            }
        }
    }

    /// Tear down and wait; a no-op when nothing is running
    pub fn stop(&self) {
        if let Some(session) = self.session.lock().take() {
            session.shutdown();
        }
    }

    pub fn is_running(&self) -> bool {
        self.session
            .lock()
            .as_ref()
            .is_some_and(|session| !session.worker.is_finished())
    }
}

impl Drop for LoopbackController {
    fn drop(&mut self) {
        self.stop();
    }
}
