use super::wire::{WireClient, WireLogEntry};
use super::{Backend, BackendDiag, LoadResponse, SessionOptions};
use crate::error::{CaptureError, CaptureResult};
use crate::jobs::JobConfig;
use crate::report::{LogPair, PageReport};
use crate::settings::Settings;
use crate::util::find_in_path;
use regex::Regex;
use serde_json::{Value, json};
use std::fs::File;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Where a family's browser console output is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSource {
    /// The driver process log file written during the session.
    DriverFile,
    /// The JSON-wire `log` endpoint, queried through the session.
    BrowserApi,
}

/// The two supported browser families. Both speak the same wire protocol;
/// a family only decides binary name, capabilities, filename template and
/// how console logs are extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserFamily {
    Firefox,
    Chrome,
}

impl BrowserFamily {
    pub fn label(&self) -> &'static str {
        match self {
            BrowserFamily::Firefox => "FirefoxWebDriver",
            BrowserFamily::Chrome => "ChromeWebDriver",
        }
    }

    pub fn driver_binary(&self) -> &'static str {
        match self {
            BrowserFamily::Firefox => "geckodriver",
            BrowserFamily::Chrome => "chromedriver",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            BrowserFamily::Firefox => 4444,
            BrowserFamily::Chrome => 9515,
        }
    }

    pub fn filename_template(&self) -> &'static str {
        match self {
            BrowserFamily::Firefox => "{name}_firefox",
            BrowserFamily::Chrome => "{name}_chrome",
        }
    }

    pub fn log_source(&self) -> LogSource {
        match self {
            BrowserFamily::Firefox => LogSource::DriverFile,
            BrowserFamily::Chrome => LogSource::BrowserApi,
        }
    }

    /// W3C capabilities for a new session.
    pub fn capabilities(&self, headless: bool) -> Value {
        match self {
            BrowserFamily::Firefox => {
                let args: Vec<&str> = if headless { vec!["-headless"] } else { vec![] };
                json!({
                    "alwaysMatch": {
                        "browserName": "firefox",
                        "moz:firefoxOptions": { "args": args },
                    }
                })
            }
            BrowserFamily::Chrome => {
                let mut args = vec!["--disable-gpu"];
                if headless {
                    args.push("--headless=new");
                }
                json!({
                    "alwaysMatch": {
                        "browserName": "chrome",
                        "goog:chromeOptions": { "args": args },
                        "goog:loggingPrefs": { "browser": "ALL" },
                    }
                })
            }
        }
    }

    /// Normalize raw console output into `(severity, message)` pairs.
    pub fn parse_logs(&self, raw: &RawLogs) -> Vec<LogPair> {
        match (self, raw) {
            (BrowserFamily::Firefox, RawLogs::DriverFile(content)) => {
                parse_gecko_driver_log(content)
            }
            (BrowserFamily::Chrome, RawLogs::BrowserApi(entries)) => {
                parse_chrome_browser_logs(entries)
            }
            _ => Vec::new(),
        }
    }
}

/// Raw console output before normalization, one variant per [`LogSource`].
pub enum RawLogs {
    DriverFile(String),
    BrowserApi(Vec<WireLogEntry>),
}

/// Extract `(severity, message)` pairs from a geckodriver log file.
///
/// Console lines look like `console.error: "boom"`, script errors like
/// `JavaScript error: http://host/page.html, line 37: ReferenceError: ...`.
/// The source URL prefix is stripped; everything else in the file is driver
/// noise and is dropped.
pub fn parse_gecko_driver_log(content: &str) -> Vec<LogPair> {
    let js_error = Regex::new(r"^JavaScript error: (?:[^,]*, )?(.+)$").unwrap();
    let console = Regex::new(r"^console\.(log|info|warn|error|debug): (.*)$").unwrap();

    let mut pairs = Vec::new();
    for line in content.lines() {
        if let Some(caps) = js_error.captures(line) {
            pairs.push(("error".to_string(), caps[1].to_string()));
        } else if let Some(caps) = console.captures(line) {
            let severity = match &caps[1] {
                "log" => "info",
                other => other,
            };
            pairs.push((severity.to_string(), caps[2].to_string()));
        }
    }
    pairs
}

/// Normalize entries from chromedriver's `browser` log endpoint.
///
/// Messages carry a leading source URL token (`http://host/p.html 35:16
/// "text"`); the source is dropped, location and text are kept.
pub fn parse_chrome_browser_logs(entries: &[WireLogEntry]) -> Vec<LogPair> {
    let mut pairs = Vec::new();
    for entry in entries {
        let severity = match entry.level.as_str() {
            "SEVERE" => "error".to_string(),
            "WARNING" => "warn".to_string(),
            other => other.to_ascii_lowercase(),
        };
        let message = match entry.message.split_once(' ') {
            Some((source, rest)) if source.contains("://") => rest,
            _ => entry.message.as_str(),
        };
        pairs.push((severity, message.to_string()));
    }
    pairs
}

#[derive(Debug, Clone)]
struct DriverSettings {
    binary: PathBuf,
    port: u16,
    ready_timeout: Duration,
    headless: bool,
    flush_logs: bool,
}

/// Live WebDriver session: the spawned driver process plus one wire session
/// opened against it. Owned by exactly one job.
pub struct WebDriverSession {
    child: Child,
    client: WireClient,
    session_id: String,
    log_path: PathBuf,
    log_consumed: bool,
}

/// Real browser backend. Spawns the family's driver binary per job with its
/// output redirected to the job's driver log file, opens a wire session, and
/// performs the capture tasks against it.
pub struct WebDriverBackend {
    family: BrowserFamily,
    driver: DriverSettings,
}

impl WebDriverBackend {
    pub fn new(family: BrowserFamily, settings: &Settings) -> Self {
        let configured = match family {
            BrowserFamily::Firefox => &settings.webdriver.firefox,
            BrowserFamily::Chrome => &settings.webdriver.chrome,
        };
        let binary = if configured.binary.is_empty() {
            PathBuf::from(family.driver_binary())
        } else {
            PathBuf::from(&configured.binary)
        };
        let port = if configured.port == 0 {
            family.default_port()
        } else {
            configured.port
        };

        Self {
            family,
            driver: DriverSettings {
                binary,
                port,
                ready_timeout: Duration::from_secs(settings.webdriver.ready_timeout_seconds),
                headless: settings.headless,
                flush_logs: settings.flush_logs,
            },
        }
    }

    pub fn firefox(settings: &Settings) -> Self {
        Self::new(BrowserFamily::Firefox, settings)
    }

    pub fn chrome(settings: &Settings) -> Self {
        Self::new(BrowserFamily::Chrome, settings)
    }

    pub fn family(&self) -> BrowserFamily {
        self.family
    }

    fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.driver.port)
    }

    /// Wait for the spawned driver to accept connections, then open a
    /// session with the family's capabilities.
    fn open_session(&self, client: &WireClient) -> CaptureResult<String> {
        let deadline = Instant::now() + self.driver.ready_timeout;
        while !client.status_ready() {
            if Instant::now() > deadline {
                return Err(CaptureError::Session(format!(
                    "driver '{}' did not become ready within {:?}",
                    self.driver.binary.display(),
                    self.driver.ready_timeout,
                )));
            }
            std::thread::sleep(Duration::from_millis(100));
        }
        client.new_session(&self.family.capabilities(self.driver.headless))
    }

    fn collect_logs(&self, session: &mut WebDriverSession) -> CaptureResult<Vec<LogPair>> {
        let raw = match self.family.log_source() {
            LogSource::DriverFile => {
                RawLogs::DriverFile(std::fs::read_to_string(&session.log_path)?)
            }
            // One read per report task; the endpoint drains its buffer, so a
            // second read would double the entries.
            LogSource::BrowserApi => {
                RawLogs::BrowserApi(session.client.get_log(&session.session_id, "browser")?)
            }
        };
        session.log_consumed = true;
        Ok(self.family.parse_logs(&raw))
    }
}

impl Backend for WebDriverBackend {
    type Session = WebDriverSession;

    fn label(&self) -> &'static str {
        self.family.label()
    }

    fn filename_template(&self) -> &'static str {
        self.family.filename_template()
    }

    fn doctor(&self) -> CaptureResult<BackendDiag> {
        let mut diag = BackendDiag {
            interface: self.label().to_string(),
            ok: false,
            driver: None,
            version: None,
            error: None,
        };

        let resolved = if self.driver.binary.components().count() > 1 {
            self.driver.binary.is_file().then(|| self.driver.binary.clone())
        } else {
            find_in_path(&self.driver.binary.to_string_lossy())
        };

        match resolved {
            Some(path) => {
                diag.driver = Some(path.display().to_string());
                match Command::new(&path).arg("--version").output() {
                    Ok(output) if output.status.success() => {
                        diag.ok = true;
                        diag.version = String::from_utf8_lossy(&output.stdout)
                            .lines()
                            .next()
                            .map(str::to_string);
                    }
                    Ok(output) => {
                        diag.error = Some(format!("driver exited with {}", output.status));
                    }
                    Err(e) => diag.error = Some(format!("running driver: {e}")),
                }
            }
            None => {
                diag.error = Some(format!(
                    "driver binary '{}' not found",
                    self.driver.binary.display()
                ));
            }
        }

        Ok(diag)
    }

    fn session_options(&self, job: &JobConfig) -> SessionOptions {
        SessionOptions {
            headless: self.driver.headless,
            driver_log_path: Some(job.driver_log_path.clone()),
        }
    }

    fn new_session(
        &self,
        options: &SessionOptions,
        job: &JobConfig,
    ) -> CaptureResult<WebDriverSession> {
        let log_path = options
            .driver_log_path
            .clone()
            .unwrap_or_else(|| job.driver_log_path.clone());
        let log_file = File::create(&log_path)?;

        debug!(
            "spawning driver '{}' on port {}",
            self.driver.binary.display(),
            self.driver.port
        );
        let mut child = Command::new(&self.driver.binary)
            .arg(format!("--port={}", self.driver.port))
            .stdin(Stdio::null())
            .stdout(Stdio::from(log_file.try_clone()?))
            .stderr(Stdio::from(log_file))
            .spawn()?;

        let client = WireClient::new(&self.base_url());
        match self.open_session(&client) {
            Ok(session_id) => Ok(WebDriverSession {
                child,
                client,
                session_id,
                log_path,
                log_consumed: false,
            }),
            Err(err) => {
                let _ = child.kill();
                let _ = child.wait();
                Err(err)
            }
        }
    }

    fn resize_session(&self, session: &mut WebDriverSession, job: &JobConfig) -> CaptureResult<()> {
        session
            .client
            .set_window_rect(&session.session_id, job.size.width, job.size.height)
    }

    fn load_page(
        &self,
        session: &mut WebDriverSession,
        job: &JobConfig,
    ) -> CaptureResult<LoadResponse> {
        let started = Instant::now();
        session.client.navigate(&session.session_id, &job.url)?;
        Ok(LoadResponse {
            elapsed: started.elapsed(),
        })
    }

    fn teardown_session(&self, mut session: WebDriverSession, _job: &JobConfig) -> CaptureResult<()> {
        debug!("closing driver session");
        if let Err(err) = session.client.delete_session(&session.session_id) {
            warn!("deleting driver session failed: {err}");
        }
        let _ = session.child.kill();
        let _ = session.child.wait();

        if self.driver.flush_logs && session.log_consumed && session.log_path.exists() {
            std::fs::remove_file(&session.log_path)?;
        }
        Ok(())
    }

    fn task_screenshot(
        &self,
        session: &mut WebDriverSession,
        job: &JobConfig,
        _response: &LoadResponse,
    ) -> CaptureResult<Value> {
        let bytes = session.client.screenshot(&session.session_id)?;
        std::fs::write(&job.screenshot_path, bytes)?;
        Ok(json!(job.screenshot_path))
    }

    fn task_report(
        &self,
        session: &mut WebDriverSession,
        job: &JobConfig,
        response: &LoadResponse,
    ) -> CaptureResult<Value> {
        let logs = self.collect_logs(session)?;
        let report = PageReport {
            name: job.name.clone(),
            url: job.url.clone(),
            size: job.size,
            interface: self.label().to_string(),
            elapsed_time: response.elapsed_seconds(),
            logs,
        };
        report.write(&job.report_path)?;
        Ok(json!(job.report_path))
    }
}
