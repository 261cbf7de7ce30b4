use crate::error::{CaptureError, CaptureResult};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

/// Minimal blocking W3C WebDriver wire client.
///
/// Speaks to a driver process (geckodriver, chromedriver) over HTTP. Any
/// transport failure or WebDriver error payload surfaces as a session error;
/// whether that aborts the run depends on where in the job lifecycle it
/// happens.
pub struct WireClient {
    agent: ureq::Agent,
    base: String,
}

/// One raw entry from the JSON-wire `log` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct WireLogEntry {
    pub level: String,
    pub message: String,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl WireClient {
    pub fn new(base_url: &str) -> Self {
        // Error statuses carry a WebDriver error payload we want to read, so
        // they must not short-circuit into a transport error.
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build();
        Self {
            agent: config.into(),
            base: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn unwrap_value(path: &str, status: u16, body: Value) -> CaptureResult<Value> {
        if status >= 400 {
            let error = body
                .pointer("/value/error")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            let message = body
                .pointer("/value/message")
                .and_then(Value::as_str)
                .unwrap_or("");
            return Err(CaptureError::Session(format!("{path}: {error}: {message}")));
        }
        Ok(body.get("value").cloned().unwrap_or(Value::Null))
    }

    fn get(&self, path: &str) -> CaptureResult<Value> {
        debug!("webdriver GET {path}");
        let mut response = self
            .agent
            .get(self.url(path))
            .call()
            .map_err(|e| CaptureError::Session(format!("{path}: {e}")))?;
        let status = response.status().as_u16();
        let body: Value = response
            .body_mut()
            .read_json()
            .map_err(|e| CaptureError::Session(format!("{path}: invalid driver response: {e}")))?;
        Self::unwrap_value(path, status, body)
    }

    fn post(&self, path: &str, payload: &Value) -> CaptureResult<Value> {
        debug!("webdriver POST {path}");
        let mut response = self
            .agent
            .post(self.url(path))
            .send_json(payload)
            .map_err(|e| CaptureError::Session(format!("{path}: {e}")))?;
        let status = response.status().as_u16();
        let body: Value = response
            .body_mut()
            .read_json()
            .map_err(|e| CaptureError::Session(format!("{path}: invalid driver response: {e}")))?;
        Self::unwrap_value(path, status, body)
    }

    fn delete(&self, path: &str) -> CaptureResult<Value> {
        debug!("webdriver DELETE {path}");
        let mut response = self
            .agent
            .delete(self.url(path))
            .call()
            .map_err(|e| CaptureError::Session(format!("{path}: {e}")))?;
        let status = response.status().as_u16();
        let body: Value = response
            .body_mut()
            .read_json()
            .map_err(|e| CaptureError::Session(format!("{path}: invalid driver response: {e}")))?;
        Self::unwrap_value(path, status, body)
    }

    /// True once the driver reports itself ready for a new session.
    pub fn status_ready(&self) -> bool {
        self.get("/status")
            .ok()
            .and_then(|value| value.get("ready").and_then(Value::as_bool))
            .unwrap_or(false)
    }

    pub fn new_session(&self, capabilities: &Value) -> CaptureResult<String> {
        let value = self.post("/session", &json!({ "capabilities": capabilities }))?;
        value
            .get("sessionId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| CaptureError::Session("driver did not return a session id".into()))
    }

    pub fn navigate(&self, session_id: &str, url: &str) -> CaptureResult<()> {
        self.post(&format!("/session/{session_id}/url"), &json!({ "url": url }))?;
        Ok(())
    }

    pub fn set_window_rect(&self, session_id: &str, width: u32, height: u32) -> CaptureResult<()> {
        self.post(
            &format!("/session/{session_id}/window/rect"),
            &json!({ "width": width, "height": height }),
        )?;
        Ok(())
    }

    /// Fetch a screenshot of the current page, decoded from base64 to PNG
    /// bytes.
    pub fn screenshot(&self, session_id: &str) -> CaptureResult<Vec<u8>> {
        let value = self.get(&format!("/session/{session_id}/screenshot"))?;
        let encoded = value
            .as_str()
            .ok_or_else(|| CaptureError::Session("screenshot response is not a string".into()))?;
        BASE64
            .decode(encoded)
            .map_err(|e| CaptureError::Session(format!("invalid screenshot payload: {e}")))
    }

    /// Drain a log buffer over the JSON-wire `log` endpoint (chromedriver
    /// only; geckodriver does not implement it).
    pub fn get_log(&self, session_id: &str, log_type: &str) -> CaptureResult<Vec<WireLogEntry>> {
        let value = self.post(
            &format!("/session/{session_id}/log"),
            &json!({ "type": log_type }),
        )?;
        serde_json::from_value(value)
            .map_err(|e| CaptureError::Session(format!("invalid log entries from driver: {e}")))
    }

    pub fn delete_session(&self, session_id: &str) -> CaptureResult<()> {
        self.delete(&format!("/session/{session_id}"))?;
        Ok(())
    }
}
