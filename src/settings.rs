use crate::error::{CaptureError, CaptureResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Project configuration, loaded from a JSON file.
///
/// Only `output_dir` and `pages` are required; everything else falls back to
/// defaults. Page entries are kept loose on purpose: `name`/`url` presence is
/// checked when a job config is built, and `sizes` entries are validated by
/// the size resolver, so a bad page does not break loading the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub output_dir: PathBuf,
    pub pages: Vec<Page>,
    #[serde(default = "default_true")]
    pub size_dir: bool,
    #[serde(default = "default_true")]
    pub headless: bool,
    #[serde(default)]
    pub flush_logs: bool,
    #[serde(default)]
    pub webdriver: WebDriver,
    #[serde(default)]
    pub logging: Logging,
}

impl Settings {
    pub fn load(path: &Path) -> CaptureResult<Self> {
        debug!("loading configuration file: {}", path.display());
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> CaptureResult<Self> {
        let value: Value = serde_json::from_str(raw)?;

        if value.get("output_dir").is_none() {
            return Err(CaptureError::Settings(
                "configuration must contain a directory path where to create files \
                 in an 'output_dir' item"
                    .into(),
            ));
        }
        if value.get("pages").is_none() {
            return Err(CaptureError::Settings(
                "configuration must contain a list of pages in a 'pages' item".into(),
            ));
        }

        Ok(serde_json::from_value(value)?)
    }
}

/// A page descriptor as supplied by the configuration file.
///
/// `sizes` stays raw JSON here; entries are turned into [`crate::size::Size`]
/// values by the resolver so malformed entries fail with a dedicated error.
/// Unknown fields are carried through into the job config untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub processors: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebDriver {
    #[serde(default)]
    pub firefox: Driver,
    #[serde(default)]
    pub chrome: Driver,
    /// Seconds to wait for a freshly spawned driver to accept connections.
    #[serde(default = "default_ready_timeout")]
    pub ready_timeout_seconds: u64,
}

impl Default for WebDriver {
    fn default() -> Self {
        Self {
            firefox: Driver::default(),
            chrome: Driver::default(),
            ready_timeout_seconds: 15,
        }
    }
}

/// Per-family driver process settings. Empty `binary` means the family's
/// conventional binary name, port 0 means the family's conventional port.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Driver {
    #[serde(default)]
    pub binary: String,
    #[serde(default)]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logging {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub write_to_file: bool,
    #[serde(default)]
    pub file_path: String,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            write_to_file: false,
            file_path: String::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_ready_timeout() -> u64 {
    15
}

fn default_log_level() -> String {
    "info".into()
}
