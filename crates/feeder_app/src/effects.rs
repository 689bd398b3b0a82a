use feeder_core::{Effect, Msg, QueuedItem};
use feeder_engine::{EngineEvent, EngineHandle, SourceItem, StopAck};
use feeder_logging::{feeder_info, feeder_warn};

/// Bridges the pure core to the engine: effects become engine calls, engine
/// events come back out as messages for the next update cycle.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    /// Applies effects; failures surface as messages, never as panics.
    pub fn enqueue(&self, effects: Vec<Effect>) -> Vec<Msg> {
        let mut msgs = Vec::new();
        for effect in effects {
            match effect {
                Effect::StartBatch { items } => {
                    feeder_info!("StartBatch with {} items", items.len());
                    let items = items.into_iter().map(to_source_item).collect();
                    if let Err(err) = self.engine.start(items) {
                        feeder_warn!("Batch rejected: {}", err);
                        msgs.push(Msg::StatusUpdate {
                            text: format!("Error: {err}"),
                            is_error: true,
                        });
                        msgs.push(Msg::BatchFinished {
                            succeeded: 0,
                            failed: 0,
                            stopped_early: false,
                        });
                    }
                }
                Effect::RequestStop => {
                    if self.engine.stop() == StopAck::NotRunning {
                        feeder_warn!("Stop requested with no batch running");
                    }
                }
            }
        }
        msgs
    }

    pub fn is_running(&self) -> bool {
        self.engine.is_running()
    }

    /// Drains pending engine events into core messages.
    pub fn poll(&self) -> Vec<Msg> {
        let mut msgs = Vec::new();
        while let Some(event) = self.engine.try_recv() {
            match event {
                EngineEvent::Status(status) => msgs.push(Msg::StatusUpdate {
                    text: status.text,
                    is_error: status.is_error,
                }),
                EngineEvent::ItemSucceeded { key } => msgs.push(Msg::ItemSucceeded { key }),
                EngineEvent::RunCompleted { summary } => {
                    let setup_error = summary.setup_error.clone();
                    msgs.push(Msg::BatchFinished {
                        succeeded: summary.succeeded,
                        failed: summary.failed,
                        stopped_early: summary.stopped_early,
                    });
                    // A run that never started overrides the count summary
                    // with its reason.
                    if setup_error.is_some() {
                        msgs.push(Msg::StatusUpdate {
                            text: summary.to_string(),
                            is_error: true,
                        });
                    }
                }
            }
        }
        msgs
    }
}

fn to_source_item(item: QueuedItem) -> SourceItem {
    SourceItem {
        key: item.key,
        url: item.url,
    }
}
