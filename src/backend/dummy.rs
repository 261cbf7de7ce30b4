use super::{Backend, BackendDiag, LoadResponse, SessionOptions};
use crate::error::CaptureResult;
use crate::jobs::JobConfig;
use std::time::Duration;
use tracing::debug;

/// Fake session that records what it was asked to do and touches nothing.
#[derive(Debug, Default)]
pub struct DummySession {
    pub visited: Option<String>,
}

impl DummySession {
    pub fn visit(&mut self, url: &str) -> String {
        self.visited = Some(url.to_string());
        format!("pretending to visit url: {url}")
    }
}

/// Backend without a real driver: performs the whole job lifecycle with
/// canned results. Used to exercise the orchestration layer in isolation
/// from any browser dependency.
pub struct DummyBackend {
    headless: bool,
}

impl DummyBackend {
    pub fn new(headless: bool) -> Self {
        Self { headless }
    }
}

impl Backend for DummyBackend {
    type Session = DummySession;

    fn label(&self) -> &'static str {
        "Dummy"
    }

    fn doctor(&self) -> CaptureResult<BackendDiag> {
        Ok(BackendDiag {
            interface: self.label().to_string(),
            ok: true,
            driver: None,
            version: None,
            error: None,
        })
    }

    fn session_options(&self, job: &JobConfig) -> SessionOptions {
        SessionOptions {
            headless: self.headless,
            driver_log_path: Some(job.driver_log_path.clone()),
        }
    }

    fn new_session(&self, _options: &SessionOptions, _job: &JobConfig) -> CaptureResult<DummySession> {
        Ok(DummySession::default())
    }

    fn load_page(&self, session: &mut DummySession, job: &JobConfig) -> CaptureResult<LoadResponse> {
        debug!("{}", session.visit(&job.url));
        Ok(LoadResponse {
            elapsed: Duration::ZERO,
        })
    }

    fn teardown_session(&self, _session: DummySession, _job: &JobConfig) -> CaptureResult<()> {
        debug!("closing dummy session");
        Ok(())
    }
}
