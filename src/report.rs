use crate::error::CaptureResult;
use crate::size::Size;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Normalized browser log entry: a `(severity, message)` pair.
pub type LogPair = (String, String);

/// Structured report written by the `report` task, one file per job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageReport {
    pub name: String,
    pub url: String,
    pub size: Size,
    pub interface: String,
    pub elapsed_time: f64,
    pub logs: Vec<LogPair>,
}

impl PageReport {
    pub fn write(&self, path: &Path) -> CaptureResult<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
