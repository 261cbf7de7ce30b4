pub mod browser;
pub mod dummy;
pub mod wire;

use crate::error::CaptureResult;
use crate::jobs::JobConfig;
use crate::processors::ProcessorRegistry;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::time::Duration;

pub use browser::{BrowserFamily, WebDriverBackend};
pub use dummy::{DummyBackend, DummySession};

/// Outcome of loading a page into a session, shared by every task of the job.
#[derive(Debug, Clone)]
pub struct LoadResponse {
    pub elapsed: Duration,
}

impl LoadResponse {
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

/// Backend-specific session construction parameters.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub headless: bool,
    /// Diagnostic log file the driver process writes during the session,
    /// already namespaced under the job's size directory.
    pub driver_log_path: Option<PathBuf>,
}

/// Diagnostics reported by [`Backend::doctor`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendDiag {
    pub interface: String,
    pub ok: bool,
    #[serde(default)]
    pub driver: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Capability surface a browser-automation backend must provide.
///
/// A session is owned by exactly one job: constructed fresh, never reused,
/// and torn down exactly once whatever the job's outcome. The three task
/// hooks default to inert placeholders so the orchestration layer can be
/// exercised without a real browser; real backends override them.
pub trait Backend {
    type Session;

    /// Display name used in reports, logging and the `{interface}` filename
    /// placeholder.
    fn label(&self) -> &'static str;

    /// Filename stem template for this backend's artifacts. Accepts the
    /// `{name}`, `{interface}` and `{size}` placeholders.
    fn filename_template(&self) -> &'static str {
        "{name}_base"
    }

    fn doctor(&self) -> CaptureResult<BackendDiag>;

    fn session_options(&self, job: &JobConfig) -> SessionOptions;

    fn new_session(&self, options: &SessionOptions, job: &JobConfig)
    -> CaptureResult<Self::Session>;

    /// Best-effort viewport resize; a no-op is valid for backends without a
    /// visible viewport.
    fn resize_session(&self, _session: &mut Self::Session, _job: &JobConfig) -> CaptureResult<()> {
        Ok(())
    }

    /// Navigate the session to the job's URL, reporting elapsed time.
    fn load_page(&self, session: &mut Self::Session, job: &JobConfig)
    -> CaptureResult<LoadResponse>;

    /// Release the session. Called exactly once per job, on every exit path.
    fn teardown_session(&self, session: Self::Session, job: &JobConfig) -> CaptureResult<()>;

    fn task_screenshot(
        &self,
        _session: &mut Self::Session,
        job: &JobConfig,
        _response: &LoadResponse,
    ) -> CaptureResult<Value> {
        Ok(json!(job.screenshot_path))
    }

    fn task_report(
        &self,
        _session: &mut Self::Session,
        _job: &JobConfig,
        _response: &LoadResponse,
    ) -> CaptureResult<Value> {
        Ok(json!({}))
    }

    fn task_processing(
        &self,
        session: &mut Self::Session,
        job: &JobConfig,
        response: &LoadResponse,
    ) -> CaptureResult<Value> {
        ProcessorRegistry::builtin().run_all(&job.processors, session, job, response)
    }
}
