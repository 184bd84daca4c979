#![allow(dead_code)]

// In-process stand-in for the native audio host.
//
// Every started stream gets a driver thread that keeps calling its callback, the
// way a device would, until the stream is stopped. Counters track how many
// streams of each role are open at once so tests can check exclusivity.

use loopboard_lib::audio::{
    AudioBackend, AudioStream, CaptureCallback, Device, DeviceId, DeviceKind, FillCallback,
    StreamSpec,
};
use loopboard_lib::{EngineError, Result};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Bytes per fake device period, for both capture and playback
pub const PERIOD_BYTES: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Capture,
    Playback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEvent {
    Opened(Role),
    Started(Role),
    Stopped(Role),
    Released(Role),
}

#[derive(Default)]
struct RoleCounter {
    open: AtomicUsize,
    peak: AtomicUsize,
    total: AtomicUsize,
}

impl RoleCounter {
    fn opened(&self) {
        let now = self.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.total.fetch_add(1, Ordering::SeqCst);
    }

    fn released(&self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct FakeState {
    capture: RoleCounter,
    playback: RoleCounter,
    specs: Mutex<Vec<(Role, StreamSpec)>>,
    events: Mutex<Vec<StreamEvent>>,
    played: Mutex<Vec<u8>>,
    next_frame: AtomicU16,
    pub fail_capture_open: AtomicBool,
    pub fail_playback_open: AtomicBool,
    playback_open_delay_ms: AtomicU64,
    playback_period_ms: AtomicU64,
}

impl FakeState {
    fn counter(&self, role: Role) -> &RoleCounter {
        match role {
            Role::Capture => &self.capture,
            Role::Playback => &self.playback,
        }
    }

    fn record(&self, event: StreamEvent) {
        self.events.lock().push(event);
    }
}

pub struct FakeBackend {
    devices: Vec<Device>,
    pub state: Arc<FakeState>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            devices: vec![
                device(DeviceKind::Capture, "mic-a", "Built-in Microphone"),
                device(DeviceKind::Capture, "mic-b", "USB Microphone"),
                device(DeviceKind::Playback, "speakers", "Built-in Speakers"),
                device(DeviceKind::Playback, "virtual-cable", "Virtual Cable"),
            ],
            state: Arc::new(FakeState::default()),
        }
    }

    pub fn open_streams(&self, role: Role) -> usize {
        self.state.counter(role).open.load(Ordering::SeqCst)
    }

    pub fn peak_streams(&self, role: Role) -> usize {
        self.state.counter(role).peak.load(Ordering::SeqCst)
    }

    pub fn total_streams(&self, role: Role) -> usize {
        self.state.counter(role).total.load(Ordering::SeqCst)
    }

    pub fn specs(&self, role: Role) -> Vec<StreamSpec> {
        self.state
            .specs
            .lock()
            .iter()
            .filter(|(r, _)| *r == role)
            .map(|(_, spec)| spec.clone())
            .collect()
    }

    pub fn events(&self) -> Vec<StreamEvent> {
        self.state.events.lock().clone()
    }

    pub fn played(&self) -> Vec<u8> {
        self.state.played.lock().clone()
    }

    pub fn fail_capture_open(&self, fail: bool) {
        self.state.fail_capture_open.store(fail, Ordering::SeqCst);
    }

    pub fn fail_playback_open(&self, fail: bool) {
        self.state.fail_playback_open.store(fail, Ordering::SeqCst);
    }

    /// Make every later playback open take this long, like a slow device driver
    pub fn delay_playback_open(&self, delay: Duration) {
        self.state
            .playback_open_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Stretch each playback period so the device pulls slower than capture pushes
    pub fn slow_playback_periods(&self, period: Duration) {
        self.state
            .playback_period_ms
            .store(period.as_millis() as u64, Ordering::SeqCst);
    }

    fn open(&self, role: Role, spec: &StreamSpec, callback: Callback) -> Result<Box<dyn AudioStream>> {
        if role == Role::Playback {
            let delay = self.state.playback_open_delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                thread::sleep(Duration::from_millis(delay));
            }
        }

        let fail = match role {
            Role::Capture => &self.state.fail_capture_open,
            Role::Playback => &self.state.fail_playback_open,
        };
        if fail.load(Ordering::SeqCst) {
            return Err(EngineError::Device(anyhow::anyhow!(
                "fake {:?} device unavailable",
                role
            )));
        }

        self.state.specs.lock().push((role, spec.clone()));
        self.state.counter(role).opened();
        self.state.record(StreamEvent::Opened(role));

        Ok(Box::new(FakeStream {
            role,
            state: self.state.clone(),
            callback: Some(callback),
            running: Arc::new(AtomicBool::new(false)),
            driver: None,
        }))
    }
}

impl AudioBackend for FakeBackend {
    fn list_devices(&self, kind: DeviceKind) -> Result<Vec<Device>> {
        Ok(self
            .devices
            .iter()
            .filter(|d| d.kind == kind)
            .cloned()
            .collect())
    }

    fn open_playback(&self, spec: &StreamSpec, fill: FillCallback) -> Result<Box<dyn AudioStream>> {
        self.open(Role::Playback, spec, Callback::Fill(fill))
    }

    fn open_capture(
        &self,
        spec: &StreamSpec,
        on_data: CaptureCallback,
    ) -> Result<Box<dyn AudioStream>> {
        self.open(Role::Capture, spec, Callback::Capture(on_data))
    }
}

enum Callback {
    Fill(FillCallback),
    Capture(CaptureCallback),
}

struct FakeStream {
    role: Role,
    state: Arc<FakeState>,
    callback: Option<Callback>,
    running: Arc<AtomicBool>,
    driver: Option<JoinHandle<Callback>>,
}

impl AudioStream for FakeStream {
    fn start(&mut self) -> Result<()> {
        let Some(mut callback) = self.callback.take() else {
            return Ok(());
        };

        self.running.store(true, Ordering::SeqCst);
        self.state.record(StreamEvent::Started(self.role));

        let running = self.running.clone();
        let state = self.state.clone();
        self.driver = Some(thread::spawn(move || {
            let mut period = vec![0u8; PERIOD_BYTES];
            while running.load(Ordering::SeqCst) {
                let mut pause = Duration::from_millis(1);
                match &mut callback {
                    Callback::Fill(fill) => {
                        let n = fill(&mut period);
                        state.played.lock().extend_from_slice(&period[..n]);
                        pause = pause.max(Duration::from_millis(
                            state.playback_period_ms.load(Ordering::SeqCst),
                        ));
                    }
                    Callback::Capture(on_data) => {
                        let seq = state.next_frame.fetch_add(1, Ordering::SeqCst) + 1;
                        on_data(&capture_frame(seq));
                    }
                }
                thread::sleep(pause);
            }
            callback
        }));
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);
        if let Some(driver) = self.driver.take() {
            let callback = driver
                .join()
                .map_err(|_| EngineError::WorkerLost("fake driver".to_string()))?;
            self.callback = Some(callback);
            self.state.record(StreamEvent::Stopped(self.role));
        }
        Ok(())
    }
}

impl Drop for FakeStream {
    fn drop(&mut self) {
        let _ = self.stop();
        self.state.counter(self.role).released();
        self.state.record(StreamEvent::Released(self.role));
    }
}

/// One capture period: every sample carries the frame's sequence number
pub fn capture_frame(seq: u16) -> Vec<u8> {
    std::iter::repeat(seq.to_ne_bytes())
        .take(PERIOD_BYTES / 2)
        .flatten()
        .collect()
}

/// Sequence numbers of the non-silent periods in a loopback recording
pub fn relayed_sequence(played: &[u8]) -> Vec<u16> {
    played
        .chunks_exact(PERIOD_BYTES)
        .map(|period| u16::from_ne_bytes([period[0], period[1]]))
        .filter(|seq| *seq != 0)
        .collect()
}

pub fn device(kind: DeviceKind, native_id: &str, name: &str) -> Device {
    Device {
        id: DeviceId::from_bytes(native_id.as_bytes()).unwrap(),
        kind,
        name: name.to_string(),
    }
}

/// Write a 16-bit PCM WAV fixture and return its path
pub fn write_wav(dir: &Path, name: &str, channels: u16, sample_rate: u32, samples: &[i16]) -> PathBuf {
    let path = dir.join(name);
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for sample in samples {
        writer.write_sample(*sample).unwrap();
    }
    writer.finalize().unwrap();
    path
}

pub fn pcm_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_ne_bytes()).collect()
}

/// Poll `condition` until it holds or `timeout` passes
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

/// Async flavour of `wait_until` that yields to the runtime between polls
pub async fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
