use std::sync::Arc;
use std::time::Duration;

use feeder_logging::feeder_warn;

use crate::{ActionProbe, ItemOutcome, PipelineTiming, SourceItem, TargetSurface};

pub const STEP_OPEN_ADD_SOURCE: &str = "open-add-source";
pub const STEP_PICK_WEBSITE: &str = "pick-website";
pub const STEP_FILL_URL: &str = "fill-url";
pub const STEP_SUBMIT: &str = "submit";

/// Result text beginning with this token marks a failed step, matching the
/// convention the page-side scripts report errors with.
const ERROR_MARKER: &str = "Error:";

/// One entry of the fixed upload pipeline. Built once at startup; never
/// mutated at runtime.
pub struct StepDefinition {
    pub name: &'static str,
    pub probe: Arc<dyn ActionProbe>,
    /// Mandatory wait after the step succeeds, covering the page's own
    /// render transition before the next step can act.
    pub delay_after: Duration,
    /// Only the URL-fill step receives the item's URL.
    pub takes_url: bool,
}

/// The probes backing the four canonical upload steps.
pub struct UploadProbes {
    pub open_dialog: Arc<dyn ActionProbe>,
    pub pick_website: Arc<dyn ActionProbe>,
    pub fill_url: Arc<dyn ActionProbe>,
    pub submit: Arc<dyn ActionProbe>,
}

/// Canonical pipeline: open upload dialog, pick the "website" option, fill
/// the URL field, submit.
pub fn upload_pipeline(probes: UploadProbes, timing: &PipelineTiming) -> Vec<StepDefinition> {
    vec![
        StepDefinition {
            name: STEP_OPEN_ADD_SOURCE,
            probe: probes.open_dialog,
            delay_after: timing.after_open_dialog,
            takes_url: false,
        },
        StepDefinition {
            name: STEP_PICK_WEBSITE,
            probe: probes.pick_website,
            delay_after: timing.after_pick_website,
            takes_url: false,
        },
        StepDefinition {
            name: STEP_FILL_URL,
            probe: probes.fill_url,
            delay_after: timing.after_fill_url,
            takes_url: true,
        },
        StepDefinition {
            name: STEP_SUBMIT,
            probe: probes.submit,
            delay_after: timing.after_submit,
            takes_url: false,
        },
    ]
}

/// Executes the fixed step pipeline for one item, stopping at the first
/// failure. Probe faults are folded into the item outcome; nothing escapes
/// to the batch loop.
pub struct SequenceController {
    steps: Vec<StepDefinition>,
    error_preview_len: usize,
}

impl SequenceController {
    pub fn new(steps: Vec<StepDefinition>, error_preview_len: usize) -> Self {
        Self {
            steps,
            error_preview_len,
        }
    }

    pub async fn run_item(&self, surface: &TargetSurface, item: &SourceItem) -> ItemOutcome {
        for step in &self.steps {
            let url_arg = step.takes_url.then_some(item.url.as_str());
            let message = match step.probe.invoke(surface, url_arg).await {
                Ok(message) => message,
                Err(err) => {
                    feeder_warn!("Step '{}' faulted: {}", step.name, err);
                    return self.failed(format!("step '{}' failed: {err}", step.name));
                }
            };

            if let Some(reason) = classify_failure(step.name, &message) {
                feeder_warn!("Step '{}' failed: {}", step.name, reason);
                return self.failed(reason);
            }

            tokio::time::sleep(step.delay_after).await;
        }

        ItemOutcome::Succeeded
    }

    fn failed(&self, message: String) -> ItemOutcome {
        ItemOutcome::Failed {
            message: truncate_preview(&message, self.error_preview_len),
        }
    }
}

/// A probe's result text is a failure when it is empty or carries the error
/// marker; any other text is success.
fn classify_failure(step_name: &str, message: &str) -> Option<String> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Some(format!("step '{step_name}' returned no result"));
    }
    if trimmed.starts_with(ERROR_MARKER) {
        return Some(trimmed.to_string());
    }
    None
}

/// Bounds display text to `max` characters, marking the cut with an ellipsis.
pub(crate) fn truncate_preview(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut preview: String = text.chars().take(max).collect();
    preview.push_str("...");
    preview
}
