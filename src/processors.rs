use crate::backend::LoadResponse;
use crate::error::{CaptureError, CaptureResult};
use crate::jobs::JobConfig;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use tracing::debug;

/// Module path under which the built-in processors are registered.
pub const BUILTIN_MODULE: &str = "site_snap.processors";

/// A post-capture plugin invoked during the `processing` task.
///
/// Generic over the backend session type so a processor can poke at the live
/// session when it needs to; the built-ins never do.
pub trait Processor<S> {
    /// Unique name used to key this processor's report entry.
    fn name(&self) -> &str;

    fn run(
        &self,
        session: &mut S,
        job: &JobConfig,
        response: &LoadResponse,
    ) -> CaptureResult<Option<Value>>;
}

/// Inert processor exposing the required surface and nothing else.
pub struct BasicProcessor;

impl<S> Processor<S> for BasicProcessor {
    fn name(&self) -> &str {
        "basic"
    }

    fn run(&self, _: &mut S, _: &JobConfig, _: &LoadResponse) -> CaptureResult<Option<Value>> {
        Ok(None)
    }
}

/// Canned processor for tests.
pub struct DummyProcessor;

impl<S> Processor<S> for DummyProcessor {
    fn name(&self) -> &str {
        "dummy"
    }

    fn run(&self, _: &mut S, _: &JobConfig, _: &LoadResponse) -> CaptureResult<Option<Value>> {
        Ok(Some(Value::String("Dummy report".into())))
    }
}

impl<S> std::fmt::Debug for dyn Processor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Processor")
            .field("name", &self.name())
            .finish()
    }
}

type Factory<S> = fn() -> Box<dyn Processor<S>>;

/// Name-based processor lookup.
///
/// Processors are addressed by dotted `"<module>.<Object>"` paths, the same
/// shape the configuration file uses. Registration happens at build time;
/// resolution happens when a `processing` task runs, and failures there are
/// configuration errors that abort the run.
pub struct ProcessorRegistry<S> {
    modules: BTreeMap<String, BTreeMap<String, Factory<S>>>,
}

impl<S> ProcessorRegistry<S> {
    pub fn empty() -> Self {
        Self {
            modules: BTreeMap::new(),
        }
    }

    /// Registry holding the built-in processors.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(BUILTIN_MODULE, "Basic", || Box::new(BasicProcessor));
        registry.register(BUILTIN_MODULE, "Dummy", || Box::new(DummyProcessor));
        registry
    }

    pub fn register(&mut self, module: &str, object: &str, factory: Factory<S>) {
        self.modules
            .entry(module.to_string())
            .or_default()
            .insert(object.to_string(), factory);
    }

    pub fn resolve(&self, path: &str) -> CaptureResult<Box<dyn Processor<S>>> {
        let (module, object) = split_processor_path(path)?;

        let entries = self.modules.get(module).ok_or_else(|| {
            CaptureError::ProcessorImport(format!("unable to import module '{module}'"))
        })?;
        let factory = entries.get(object).ok_or_else(|| {
            CaptureError::ProcessorImport(format!(
                "unable to get object '{object}' from module '{module}'"
            ))
        })?;

        Ok(factory())
    }

    /// Resolve and run every processor in the given order, collecting
    /// `(name, result)` pairs.
    pub fn run_all(
        &self,
        paths: &[String],
        session: &mut S,
        job: &JobConfig,
        response: &LoadResponse,
    ) -> CaptureResult<Value> {
        let mut reports = Vec::with_capacity(paths.len());

        for path in paths {
            let processor = self.resolve(path)?;
            debug!("running processor '{}' for: {}", processor.name(), job.name);
            let result = processor.run(session, job, response)?;
            reports.push(json!([processor.name(), result]));
        }

        Ok(Value::Array(reports))
    }
}

impl<S> Default for ProcessorRegistry<S> {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Split a dotted processor path into its module and object parts.
pub fn split_processor_path(path: &str) -> CaptureResult<(&str, &str)> {
    match path.rsplit_once('.') {
        Some((module, object)) if !module.is_empty() && !object.is_empty() => Ok((module, object)),
        _ => Err(CaptureError::ProcessorImport(format!(
            "invalid processor path: {path}"
        ))),
    }
}
