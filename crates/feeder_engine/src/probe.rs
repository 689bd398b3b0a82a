use std::sync::mpsc;

use crate::{EngineEvent, ItemKey, ProbeError};

/// Handle to the one live automatable tab the probes act against. The batch
/// loop is the single writer; no lock is needed because only one run is ever
/// active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSurface {
    pub id: String,
}

/// One opaque UI-driving operation. A probe either reports result text (which
/// the sequence controller classifies) or fails outright. Probes are called
/// exactly once per item attempt: repeating a click can double-submit.
#[async_trait::async_trait]
pub trait ActionProbe: Send + Sync {
    async fn invoke(
        &self,
        surface: &TargetSurface,
        url_arg: Option<&str>,
    ) -> Result<String, ProbeError>;
}

/// Supplies the current automatable surface. Resolution failure is the one
/// fatal setup condition for a batch.
#[async_trait::async_trait]
pub trait SurfaceResolver: Send + Sync {
    async fn resolve(&self) -> Result<TargetSurface, ProbeError>;
}

/// Best-effort publish of batch events to zero or more observers. Delivery
/// failure must never fail the caller.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        // The receiver may be gone (observer closed); that never aborts a run.
        let _ = self.tx.send(event);
    }
}

/// Per-item completion markers persisted between runs. Implementations own
/// their I/O errors: they log and carry on rather than failing the batch.
pub trait CompletionStore: Send + Sync {
    fn is_completed(&self, key: ItemKey) -> bool;
    fn mark_completed(&self, key: ItemKey, url: &str);
}

/// Store for unkeyed runs: remembers nothing, skips nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCompletionStore;

impl CompletionStore for NoopCompletionStore {
    fn is_completed(&self, _key: ItemKey) -> bool {
        false
    }

    fn mark_completed(&self, _key: ItemKey, _url: &str) {}
}
