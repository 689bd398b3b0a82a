//! Configuration loaded from `feeder.toml`.
//!
//! Values missing from the file fall back to defaults; a missing file means
//! an all-default configuration. Command-line flags override the file.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use feeder_engine::{BridgeSettings, EngineConfig, PipelineTiming};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct FeederConfig {
    /// Base URL of the local automation bridge.
    #[serde(default = "default_bridge_url")]
    pub bridge_url: String,

    /// Directory holding the completion-marker state file.
    #[serde(default = "default_state_dir")]
    pub state_dir: String,

    /// CSV column holding the URLs.
    #[serde(default = "default_url_column")]
    pub url_column: String,

    /// Millisecond overrides for the pipeline delays.
    #[serde(default)]
    pub delays: DelayOverrides,
}

/// Per-delay overrides in milliseconds; unset fields keep the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DelayOverrides {
    pub after_open_dialog_ms: Option<u64>,
    pub after_pick_website_ms: Option<u64>,
    pub after_fill_url_ms: Option<u64>,
    pub after_submit_ms: Option<u64>,
    pub between_items_ms: Option<u64>,
    pub failure_cooldown_ms: Option<u64>,
}

fn default_bridge_url() -> String {
    BridgeSettings::default().base_url
}

fn default_state_dir() -> String {
    ".".to_string()
}

fn default_url_column() -> String {
    "URL".to_string()
}

impl Default for FeederConfig {
    fn default() -> Self {
        Self {
            bridge_url: default_bridge_url(),
            state_dir: default_state_dir(),
            url_column: default_url_column(),
            delays: DelayOverrides::default(),
        }
    }
}

impl FeederConfig {
    /// Loads the configuration from `path`; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Engine configuration with the delay overrides applied.
    pub fn engine_config(&self) -> EngineConfig {
        let defaults = PipelineTiming::default();
        let pick = |override_ms: Option<u64>, default: Duration| {
            override_ms.map_or(default, Duration::from_millis)
        };
        EngineConfig {
            timing: PipelineTiming {
                after_open_dialog: pick(self.delays.after_open_dialog_ms, defaults.after_open_dialog),
                after_pick_website: pick(
                    self.delays.after_pick_website_ms,
                    defaults.after_pick_website,
                ),
                after_fill_url: pick(self.delays.after_fill_url_ms, defaults.after_fill_url),
                after_submit: pick(self.delays.after_submit_ms, defaults.after_submit),
                between_items: pick(self.delays.between_items_ms, defaults.between_items),
                failure_cooldown: pick(
                    self.delays.failure_cooldown_ms,
                    defaults.failure_cooldown,
                ),
            },
            bridge: BridgeSettings {
                base_url: self.bridge_url.clone(),
                ..BridgeSettings::default()
            },
            ..EngineConfig::default()
        }
    }
}
