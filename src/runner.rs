use crate::backend::Backend;
use crate::error::CaptureResult;
use crate::jobs::{ErrorRecord, JobConfig, JobOutcome, OutputLayout, Payload, RunOutcome};
use crate::settings::{Page, Settings};
use crate::size::{self, Size};
use crate::tasks::{self, TaskKind};
use crate::util::ensure_dir;
use tracing::{debug, error, info, warn};

/// A page together with its resolved size set. Pages with no explicit sizes
/// are captured once at the default size.
struct ResolvedPage {
    page: Page,
    sizes: Vec<Size>,
}

/// Sequential task runner: drives one backend through every (size, page)
/// job and aggregates payloads and error records across the whole run.
pub struct Runner<B: Backend> {
    backend: B,
    layout: OutputLayout,
}

impl<B: Backend> Runner<B> {
    pub fn new(settings: &Settings, backend: B) -> Self {
        Self {
            backend,
            layout: OutputLayout::from_settings(settings),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Proceed with capture for every page at every size it requires.
    ///
    /// Recoverable per-job failures land in the outcome's `error_logs`;
    /// configuration errors and fatal job failures abort the run.
    pub fn run(&self, pages: &[Page]) -> CaptureResult<RunOutcome> {
        let available = size::available_sizes(pages)?;
        let resolved = pages
            .iter()
            .map(|page| {
                Ok(ResolvedPage {
                    sizes: size::page_sizes(page)?,
                    page: page.clone(),
                })
            })
            .collect::<CaptureResult<Vec<_>>>()?;

        debug!(
            "available sizes: [{}]",
            available
                .iter()
                .map(Size::label)
                .collect::<Vec<_>>()
                .join(", ")
        );

        let mut outcome = RunOutcome::default();
        for size in available {
            debug!("size: {}", size.label());
            self.perform_size_pages(size, &resolved, &mut outcome)?;
        }

        Ok(outcome)
    }

    /// Run the job for every page whose size set contains `size`. The size's
    /// destination directory is created first, whether or not any page ends
    /// up captured at this size.
    fn perform_size_pages(
        &self,
        size: Size,
        pages: &[ResolvedPage],
        outcome: &mut RunOutcome,
    ) -> CaptureResult<()> {
        ensure_dir(&self.layout.destination_dir(size))?;

        for resolved in pages {
            if resolved.sizes.contains(&size) {
                let job_outcome = self.page_job(size, &resolved.page)?;
                outcome.absorb(job_outcome);
            }
        }

        Ok(())
    }

    /// One page-at-a-size job: build the config, acquire a session, resize
    /// unless the size is the default sentinel, dispatch tasks, and tear the
    /// session down exactly once whatever happened.
    ///
    /// Session-level failures inside the guarded region become
    /// [`JobOutcome::Failed`]; anything else propagates and aborts the run.
    pub fn page_job(&self, size: Size, page: &Page) -> CaptureResult<JobOutcome> {
        let job = JobConfig::build(
            page,
            size,
            self.backend.label(),
            self.backend.filename_template(),
            &self.layout,
        )?;
        let options = self.backend.session_options(&job);
        let mut session = self.backend.new_session(&options, &job)?;

        let captured = (|| {
            if !size.is_default() {
                self.backend.resize_session(&mut session, &job)?;
            }
            self.capture(&mut session, &job)
        })();
        let teardown = self.backend.teardown_session(session, &job);

        match captured {
            Ok(Some(payload)) => {
                teardown?;
                if payload.result(TaskKind::Screenshot).is_some() {
                    debug!("saved screenshot to: {}", job.screenshot_path.display());
                }
                if payload.result(TaskKind::Report).is_some() {
                    debug!("saved report to: {}", job.report_path.display());
                }
                Ok(JobOutcome::Built(payload))
            }
            Ok(None) => {
                teardown?;
                Ok(JobOutcome::Skipped)
            }
            Err(err) if err.is_recoverable() => {
                if let Err(td) = teardown {
                    warn!("session teardown failed after job error: {td}");
                }
                let msg = format!("unable to reach page or unexpected driver error with: {}", job.url);
                error!("{msg}");
                error!("{err}");
                Ok(JobOutcome::Failed(ErrorRecord {
                    name: job.name.clone(),
                    url: job.url.clone(),
                    size,
                    msg,
                    error: err.to_string(),
                }))
            }
            Err(err) => {
                if let Err(td) = teardown {
                    warn!("session teardown failed after job error: {td}");
                }
                Err(err)
            }
        }
    }

    /// Task dispatcher: run the job's recognized tasks, in declaration
    /// order, against one shared page load. Returns `None` when the job has
    /// no recognized task at all.
    pub fn capture(
        &self,
        session: &mut B::Session,
        job: &JobConfig,
    ) -> CaptureResult<Option<Payload>> {
        let requested = tasks::recognized(&job.tasks);
        if requested.is_empty() {
            warn!(
                "no enabled tasks for page: {} ({})",
                job.name,
                job.size.label()
            );
            return Ok(None);
        }

        info!("getting page for: {} ({})", job.name, job.size.label());
        let response = self.backend.load_page(session, job)?;

        let mut payload = Payload::seed(job);
        for task in requested {
            let value = match task {
                TaskKind::Screenshot => self.backend.task_screenshot(session, job, &response)?,
                TaskKind::Report => self.backend.task_report(session, job, &response)?,
                TaskKind::Processing => self.backend.task_processing(session, job, &response)?,
            };
            payload.record(task, value);
        }

        Ok(Some(payload))
    }
}
