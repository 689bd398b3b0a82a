//! Feeder engine: probe-driven upload pipeline and batch execution.
mod bridge;
mod config;
mod engine;
mod persist;
mod probe;
mod runner;
mod sequence;
mod types;

pub use bridge::{bridge_probes, BridgeSettings, HttpBridge};
pub use config::{EngineConfig, PipelineTiming};
pub use engine::EngineHandle;
pub use persist::{ensure_state_dir, AtomicFileWriter, PersistError};
pub use probe::{
    ActionProbe, ChannelEventSink, CompletionStore, EventSink, NoopCompletionStore,
    SurfaceResolver, TargetSurface,
};
pub use runner::BatchRunner;
pub use sequence::{
    upload_pipeline, SequenceController, StepDefinition, UploadProbes, STEP_FILL_URL,
    STEP_OPEN_ADD_SOURCE, STEP_PICK_WEBSITE, STEP_SUBMIT,
};
pub use tokio_util::sync::CancellationToken;
pub use types::{
    EngineEvent, ItemKey, ItemOutcome, ProbeError, RunSummary, SourceItem, StartError, StatusUpdate,
    StopAck,
};
