use serde_json::{Value, json};
use site_snap::backend::LoadResponse;
use site_snap::error::{CaptureError, CaptureResult};
use site_snap::jobs::{JobConfig, OutputLayout};
use site_snap::processors::{Processor, ProcessorRegistry, split_processor_path};
use site_snap::settings::Page;
use site_snap::size::Size;
use std::path::PathBuf;
use std::time::Duration;

fn job() -> JobConfig {
    let page = Page {
        name: "foo".into(),
        url: "some_url".into(),
        ..Default::default()
    };
    let layout = OutputLayout {
        basedir: PathBuf::from("/basedir"),
        size_dir: true,
    };
    JobConfig::build(&page, Size::new(1, 42), "Test", "{name}_test", &layout).unwrap()
}

fn response() -> LoadResponse {
    LoadResponse {
        elapsed: Duration::ZERO,
    }
}

#[test]
fn split_path_separates_module_and_object() {
    assert_eq!(
        split_processor_path("module.object").unwrap(),
        ("module", "object")
    );
    assert_eq!(
        split_processor_path("module.submodule.object").unwrap(),
        ("module.submodule", "object")
    );
    assert_eq!(
        split_processor_path("foo.bar.ping.Pong").unwrap(),
        ("foo.bar.ping", "Pong")
    );
}

#[test]
fn single_segment_path_is_invalid() {
    for path in ["foo", "foobar", "", ".leading", "trailing."] {
        let err = split_processor_path(path).unwrap_err();
        assert!(matches!(err, CaptureError::ProcessorImport(_)), "{path}");
    }
}

#[test]
fn unknown_module_or_object_fails_resolution() {
    let registry = ProcessorRegistry::<()>::builtin();

    let err = registry.resolve("foo.bar.ping").unwrap_err();
    assert!(err.to_string().contains("unable to import module 'foo.bar'"));

    let err = registry.resolve("site_snap.processors.Nope").unwrap_err();
    assert!(
        err.to_string()
            .contains("unable to get object 'Nope' from module 'site_snap.processors'")
    );
}

#[test]
fn builtin_processors_resolve() {
    let registry = ProcessorRegistry::<()>::builtin();
    assert_eq!(
        registry.resolve("site_snap.processors.Basic").unwrap().name(),
        "basic"
    );
    assert_eq!(
        registry.resolve("site_snap.processors.Dummy").unwrap().name(),
        "dummy"
    );
}

#[test]
fn processors_run_in_declared_order() {
    let registry = ProcessorRegistry::<()>::builtin();
    let paths = vec![
        "site_snap.processors.Dummy".to_string(),
        "site_snap.processors.Basic".to_string(),
    ];

    let report = registry
        .run_all(&paths, &mut (), &job(), &response())
        .unwrap();

    assert_eq!(
        report,
        json!([["dummy", "Dummy report"], ["basic", null]])
    );
}

#[test]
fn custom_processors_can_be_registered() {
    struct Marker;

    impl Processor<()> for Marker {
        fn name(&self) -> &str {
            "marker"
        }

        fn run(
            &self,
            _session: &mut (),
            job: &JobConfig,
            _response: &LoadResponse,
        ) -> CaptureResult<Option<Value>> {
            Ok(Some(json!({ "seen": job.name })))
        }
    }

    let mut registry = ProcessorRegistry::<()>::builtin();
    registry.register("acme.plugins", "Marker", || Box::new(Marker));

    let report = registry
        .run_all(
            &["acme.plugins.Marker".to_string()],
            &mut (),
            &job(),
            &response(),
        )
        .unwrap();

    assert_eq!(report, json!([["marker", { "seen": "foo" }]]));
}
