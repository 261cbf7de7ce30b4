use thiserror::Error;

pub type CaptureResult<T> = Result<T, CaptureError>;

/// Error taxonomy for a capture run.
///
/// `Session` is the only recoverable kind: the job runner converts it into an
/// error record and the run moves on to the next job. Every other kind aborts
/// the whole run.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("invalid settings: {0}")]
    Settings(String),
    #[error("invalid page size value, it should be a pair of exactly two integers (width, height): {0}")]
    InvalidPageSize(String),
    #[error("invalid page configuration: {0}")]
    PageConfig(String),
    #[error("{0}")]
    ProcessorImport(String),
    #[error("session error: {0}")]
    Session(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CaptureError {
    /// True for driver/session-level failures that must not abort the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CaptureError::Session(_))
    }
}
