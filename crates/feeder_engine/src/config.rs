use std::time::Duration;

use crate::bridge::BridgeSettings;

/// Fixed waits around the upload sequence. These model the host page's own
/// render latency (a submit button only enables after its debounce), so the
/// per-step delays are mandatory even on the success path. The exact values
/// are tuning parameters, not contracts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineTiming {
    pub after_open_dialog: Duration,
    pub after_pick_website: Duration,
    pub after_fill_url: Duration,
    pub after_submit: Duration,
    /// Pause between consecutive items.
    pub between_items: Duration,
    /// Extra pause after a failed item, before the normal inter-item pause,
    /// so a surface that just rejected a submission is not hammered.
    pub failure_cooldown: Duration,
}

impl Default for PipelineTiming {
    fn default() -> Self {
        Self {
            after_open_dialog: Duration::from_millis(1000),
            after_pick_website: Duration::from_millis(500),
            after_fill_url: Duration::from_millis(1500),
            after_submit: Duration::from_millis(2000),
            between_items: Duration::from_millis(2500),
            failure_cooldown: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub timing: PipelineTiming,
    pub bridge: BridgeSettings,
    /// Display bound for the URL in progress lines.
    pub url_preview_len: usize,
    /// Display bound for per-step failure messages.
    pub error_preview_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timing: PipelineTiming::default(),
            bridge: BridgeSettings::default(),
            url_preview_len: 40,
            error_preview_len: 60,
        }
    }
}
