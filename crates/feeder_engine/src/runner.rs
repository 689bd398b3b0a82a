use std::sync::Arc;

use feeder_logging::{feeder_error, feeder_info};
use tokio_util::sync::CancellationToken;

use crate::sequence::truncate_preview;
use crate::{
    CompletionStore, EngineEvent, EventSink, ItemOutcome, PipelineTiming, RunSummary,
    SequenceController, SourceItem, StatusUpdate, SurfaceResolver,
};

/// Drives the sequence controller across all items of one batch, in caller
/// order, with cancellation polled at item boundaries only: an item already
/// in flight always reaches its own terminal outcome before a stop request
/// is honored, so the surface is never abandoned mid-interaction.
pub struct BatchRunner {
    sequence: SequenceController,
    resolver: Arc<dyn SurfaceResolver>,
    store: Arc<dyn CompletionStore>,
    timing: PipelineTiming,
    url_preview_len: usize,
}

impl BatchRunner {
    pub fn new(
        sequence: SequenceController,
        resolver: Arc<dyn SurfaceResolver>,
        store: Arc<dyn CompletionStore>,
        timing: PipelineTiming,
        url_preview_len: usize,
    ) -> Self {
        Self {
            sequence,
            resolver,
            store,
            timing,
            url_preview_len,
        }
    }

    /// Runs one batch to its terminal summary. Exactly one `RunCompleted`
    /// event is emitted on every exit path, including setup failure.
    pub async fn run(
        &self,
        items: &[SourceItem],
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> RunSummary {
        let total = items.len();

        let surface = match self.resolver.resolve().await {
            Ok(surface) => surface,
            Err(err) => {
                feeder_error!("No target surface: {}", err);
                let summary = RunSummary {
                    total,
                    setup_error: Some(format!("no target surface found ({err})")),
                    ..RunSummary::default()
                };
                sink.emit(EngineEvent::RunCompleted {
                    summary: summary.clone(),
                });
                return summary;
            }
        };
        feeder_info!("Batch of {} items against surface {}", total, surface.id);

        let mut skipped = 0;
        let remaining: Vec<&SourceItem> = items
            .iter()
            .filter(|item| match item.key {
                Some(key) if self.store.is_completed(key) => {
                    feeder_info!("Skipping already-completed item {}", key);
                    skipped += 1;
                    false
                }
                _ => true,
            })
            .collect();

        let run_total = remaining.len();
        let mut succeeded = 0;
        let mut failed = 0;
        let mut stopped_early = false;

        for (index, item) in remaining.iter().copied().enumerate() {
            if cancel.is_cancelled() {
                stopped_early = true;
                break;
            }

            let position = index + 1;
            sink.emit(EngineEvent::Status(StatusUpdate {
                text: format!(
                    "Processing {position}/{run_total}: {}",
                    truncate_preview(&item.url, self.url_preview_len)
                ),
                is_error: false,
            }));

            match self.sequence.run_item(&surface, item).await {
                ItemOutcome::Succeeded => {
                    succeeded += 1;
                    if let Some(key) = item.key {
                        // Marker first, so a consumer reacting to the event
                        // already sees the item as completed.
                        self.store.mark_completed(key, &item.url);
                        sink.emit(EngineEvent::ItemSucceeded { key });
                    }
                }
                ItemOutcome::Failed { message } => {
                    failed += 1;
                    sink.emit(EngineEvent::Status(StatusUpdate {
                        text: format!("Failed {position}/{run_total}. Err: {message}"),
                        is_error: true,
                    }));
                    tokio::time::sleep(self.timing.failure_cooldown).await;
                }
            }

            if position < run_total && !cancel.is_cancelled() {
                tokio::time::sleep(self.timing.between_items).await;
            }
        }

        let summary = RunSummary {
            succeeded,
            failed,
            skipped,
            total,
            stopped_early,
            setup_error: None,
        };
        feeder_info!("Batch done: {}", summary);
        sink.emit(EngineEvent::RunCompleted {
            summary: summary.clone(),
        });
        summary
    }
}
