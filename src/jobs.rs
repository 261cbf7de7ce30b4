use crate::error::{CaptureError, CaptureResult};
use crate::settings::{Page, Settings};
use crate::size::Size;
use crate::tasks::TaskKind;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Where run artifacts land on disk.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    pub basedir: PathBuf,
    pub size_dir: bool,
}

impl OutputLayout {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            basedir: settings.output_dir.clone(),
            size_dir: settings.size_dir,
        }
    }

    /// Destination directory for one size: the flat base directory when size
    /// namespacing is disabled, else a subdirectory named after the size.
    pub fn destination_dir(&self, size: Size) -> PathBuf {
        if self.size_dir {
            self.basedir.join(size.label())
        } else {
            self.basedir.clone()
        }
    }
}

/// Fully resolved configuration for one page-at-a-size job.
///
/// Built fresh for every (page, size) pair and never mutated afterwards. The
/// `destination` is a filename stem; each task artifact is a fixed-suffix
/// sibling of it.
#[derive(Debug, Clone, PartialEq)]
pub struct JobConfig {
    pub name: String,
    pub url: String,
    pub size: Size,
    pub tasks: Vec<String>,
    pub processors: Vec<String>,
    pub destination: PathBuf,
    pub screenshot_path: PathBuf,
    pub driver_log_path: PathBuf,
    pub report_path: PathBuf,
    pub extra: Map<String, Value>,
}

impl JobConfig {
    /// Validate a page descriptor and expand it for one concrete size.
    ///
    /// `interface` is the backend's display name and `template` its filename
    /// stem template; a per-page `filename` entry overrides the template.
    /// Both accept `{name}`, `{interface}` and `{size}` placeholders.
    pub fn build(
        page: &Page,
        size: Size,
        interface: &str,
        template: &str,
        layout: &OutputLayout,
    ) -> CaptureResult<Self> {
        if page.name.is_empty() {
            return Err(CaptureError::PageConfig(
                "page configuration must have a 'name' value".into(),
            ));
        }
        if page.url.is_empty() {
            return Err(CaptureError::PageConfig(
                "page configuration must have an 'url' value".into(),
            ));
        }

        let stem_template = page.filename.as_deref().unwrap_or(template);
        let stem = format_stem(stem_template, &page.name, interface, &size.label());
        let destination = layout.destination_dir(size).join(stem);

        Ok(Self {
            name: page.name.clone(),
            url: page.url.clone(),
            size,
            tasks: page.tasks.clone(),
            processors: page.processors.clone(),
            screenshot_path: sibling(&destination, ".png"),
            driver_log_path: sibling(&destination, ".driver.log"),
            report_path: sibling(&destination, ".report.json"),
            destination,
            extra: page.extra.clone(),
        })
    }
}

fn format_stem(template: &str, name: &str, interface: &str, size_label: &str) -> String {
    template
        .replace("{name}", name)
        .replace("{interface}", interface)
        .replace("{size}", size_label)
}

fn sibling(stem: &Path, suffix: &str) -> PathBuf {
    let mut path = stem.as_os_str().to_os_string();
    path.push(suffix);
    PathBuf::from(path)
}

/// Result payload of one successful job: page identity plus one entry per
/// executed task, keyed by task name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payload {
    pub name: String,
    pub url: String,
    pub size: Size,
    #[serde(flatten)]
    pub results: Map<String, Value>,
}

impl Payload {
    pub fn seed(job: &JobConfig) -> Self {
        Self {
            name: job.name.clone(),
            url: job.url.clone(),
            size: job.size,
            results: Map::new(),
        }
    }

    pub fn record(&mut self, task: TaskKind, value: Value) {
        self.results.insert(task.name().to_string(), value);
    }

    pub fn result(&self, task: TaskKind) -> Option<&Value> {
        self.results.get(task.name())
    }
}

/// Structured record of a job that failed with a recoverable session error.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub name: String,
    pub url: String,
    pub size: Size,
    pub msg: String,
    pub error: String,
}

/// Terminal state of one job. Fatal failures are not represented here; they
/// propagate as `Err` and abort the run.
#[derive(Debug)]
pub enum JobOutcome {
    /// Tasks ran and produced a payload.
    Built(Payload),
    /// No recognized task was requested; neither a success nor a failure.
    Skipped,
    /// A recoverable session error; the run continues.
    Failed(ErrorRecord),
}

/// Aggregate result of a whole run.
#[derive(Debug, Default, Serialize)]
pub struct RunOutcome {
    pub built: Vec<Payload>,
    pub error_logs: Vec<ErrorRecord>,
}

impl RunOutcome {
    pub fn absorb(&mut self, outcome: JobOutcome) {
        match outcome {
            JobOutcome::Built(payload) => self.built.push(payload),
            JobOutcome::Skipped => {}
            JobOutcome::Failed(record) => self.error_logs.push(record),
        }
    }

    pub fn extend(&mut self, other: RunOutcome) {
        self.built.extend(other.built);
        self.error_logs.extend(other.error_logs);
    }
}
