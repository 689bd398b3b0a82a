use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use tokio_util::sync::CancellationToken;

use crate::{
    upload_pipeline, BatchRunner, ChannelEventSink, CompletionStore, EngineConfig, EngineEvent,
    SequenceController, SourceItem, StartError, StopAck, SurfaceResolver, UploadProbes,
};

enum EngineCommand {
    Start { items: Vec<SourceItem> },
}

/// Owns the batch worker: a dedicated thread with its own tokio runtime,
/// fed over a command channel, reporting over an event channel. At most one
/// batch is active at a time; the `running` flag is the single-writer
/// discipline for the shared surface.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    running: Arc<AtomicBool>,
    cancel: Arc<Mutex<CancellationToken>>,
}

impl EngineHandle {
    pub fn new(
        config: EngineConfig,
        probes: UploadProbes,
        resolver: Arc<dyn SurfaceResolver>,
        store: Arc<dyn CompletionStore>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let running = Arc::new(AtomicBool::new(false));
        let cancel = Arc::new(Mutex::new(CancellationToken::new()));

        let steps = upload_pipeline(probes, &config.timing);
        let sequence = SequenceController::new(steps, config.error_preview_len);
        let runner = BatchRunner::new(
            sequence,
            resolver,
            store,
            config.timing.clone(),
            config.url_preview_len,
        );

        let worker_running = running.clone();
        let worker_cancel = cancel.clone();
        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Start { items } => {
                        let token = worker_cancel
                            .lock()
                            .expect("lock cancel token")
                            .clone();
                        let sink = ChannelEventSink::new(event_tx.clone());
                        runtime.block_on(runner.run(&items, &sink, &token));
                        worker_running.store(false, Ordering::SeqCst);
                    }
                }
            }
        });

        Self {
            cmd_tx,
            event_rx,
            running,
            cancel,
        }
    }

    /// Accepts a batch or rejects it synchronously; progress arrives as
    /// events. A second start while a run is active is rejected, not queued.
    pub fn start(&self, items: Vec<SourceItem>) -> Result<(), StartError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(StartError::AlreadyRunning);
        }

        // Fresh token per run: a stale stop request must not cancel this one.
        *self.cancel.lock().expect("lock cancel token") = CancellationToken::new();

        if self.cmd_tx.send(EngineCommand::Start { items }).is_err() {
            self.running.store(false, Ordering::SeqCst);
            return Err(StartError::Unavailable);
        }
        Ok(())
    }

    /// Requests a cooperative stop. The in-flight item still completes; the
    /// run ends at the next item boundary.
    pub fn stop(&self) -> StopAck {
        if self.running.load(Ordering::SeqCst) {
            self.cancel.lock().expect("lock cancel token").cancel();
            StopAck::Stopping
        } else {
            StopAck::NotRunning
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }
}
