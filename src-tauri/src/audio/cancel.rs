use crossbeam::channel::{self, Receiver, Sender};

/// Owner side of a cancellation pair. Signalling consumes the handle, so a
/// stream can only ever be cancelled through the one place that owns it.
#[derive(Debug)]
pub struct StopHandle {
    tx: Sender<()>,
}

/// Worker side: blocks until the matching handle is signalled or dropped
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: Receiver<()>,
}

pub fn stop_pair() -> (StopHandle, StopSignal) {
    // Nothing is ever sent; dropping the sender disconnects the receiver
    let (tx, rx) = channel::bounded(0);
    (StopHandle { tx }, StopSignal { rx })
}

impl StopHandle {
    pub fn signal(self) {
        drop(self.tx);
    }
}

impl StopSignal {
    pub fn wait(&self) {
        let _ = self.rx.recv();
    }

    /// For `crossbeam::select!` alongside other channels
    pub fn receiver(&self) -> &Receiver<()> {
        &self.rx
    }
}
