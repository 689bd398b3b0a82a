use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use crate::{
    ActionProbe, ProbeError, SurfaceResolver, TargetSurface, UploadProbes, STEP_FILL_URL,
    STEP_OPEN_ADD_SOURCE, STEP_PICK_WEBSITE, STEP_SUBMIT,
};

/// Connection settings for the local automation bridge that executes probe
/// actions inside the live browser tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8765".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// JSON-over-HTTP client for the automation bridge. `POST /surface` resolves
/// the automatable tab; `POST /probe` runs one named action in it and returns
/// the page-side result text verbatim (failures arrive as `Error:`-prefixed
/// text and are classified by the sequence controller, not here).
#[derive(Debug, Clone)]
pub struct HttpBridge {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBridge {
    pub fn new(settings: &BridgeSettings) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ProbeError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ProbeError> {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Protocol(format!("bridge returned {status}")));
        }

        response
            .json()
            .await
            .map_err(|err| ProbeError::Protocol(err.to_string()))
    }
}

#[async_trait::async_trait]
impl SurfaceResolver for HttpBridge {
    async fn resolve(&self) -> Result<TargetSurface, ProbeError> {
        let value = self.post_json("/surface", &json!({})).await?;
        let id = value
            .get("surface")
            .and_then(Value::as_str)
            .ok_or_else(|| ProbeError::Protocol("missing 'surface' field".to_string()))?;
        Ok(TargetSurface { id: id.to_string() })
    }
}

/// One named bridge action exposed as a probe.
pub struct BridgeProbe {
    bridge: Arc<HttpBridge>,
    action: &'static str,
}

#[async_trait::async_trait]
impl ActionProbe for BridgeProbe {
    async fn invoke(
        &self,
        surface: &TargetSurface,
        url_arg: Option<&str>,
    ) -> Result<String, ProbeError> {
        let mut body = json!({
            "surface": surface.id,
            "action": self.action,
        });
        if let Some(url) = url_arg {
            body["url"] = json!(url);
        }

        let value = self.bridge.post_json("/probe", &body).await?;
        let result = value
            .get("result")
            .and_then(Value::as_str)
            .ok_or_else(|| ProbeError::Protocol("missing 'result' field".to_string()))?;
        Ok(result.to_string())
    }
}

/// The four canonical upload probes, all backed by the same bridge.
pub fn bridge_probes(bridge: Arc<HttpBridge>) -> UploadProbes {
    UploadProbes {
        open_dialog: Arc::new(BridgeProbe {
            bridge: bridge.clone(),
            action: STEP_OPEN_ADD_SOURCE,
        }),
        pick_website: Arc::new(BridgeProbe {
            bridge: bridge.clone(),
            action: STEP_PICK_WEBSITE,
        }),
        fill_url: Arc::new(BridgeProbe {
            bridge: bridge.clone(),
            action: STEP_FILL_URL,
        }),
        submit: Arc::new(BridgeProbe {
            bridge,
            action: STEP_SUBMIT,
        }),
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ProbeError {
    if err.is_timeout() {
        return ProbeError::Transport(format!("timeout: {err}"));
    }
    if err.is_connect() {
        return ProbeError::Transport(format!("bridge unreachable: {err}"));
    }
    ProbeError::Transport(err.to_string())
}
