use serde_json::json;
use site_snap::error::CaptureError;
use site_snap::jobs::{JobConfig, OutputLayout};
use site_snap::settings::Page;
use site_snap::size::Size;
use std::path::{Path, PathBuf};

fn layout(size_dir: bool) -> OutputLayout {
    OutputLayout {
        basedir: PathBuf::from("/basedir"),
        size_dir,
    }
}

fn page(name: &str, url: &str) -> Page {
    Page {
        name: name.into(),
        url: url.into(),
        ..Default::default()
    }
}

#[test]
fn destination_dir_is_namespaced_by_size() {
    assert_eq!(
        layout(true).destination_dir(Size::DEFAULT),
        Path::new("/basedir/Default")
    );
    assert_eq!(
        layout(true).destination_dir(Size::new(1, 42)),
        Path::new("/basedir/1x42")
    );
    assert_eq!(
        layout(false).destination_dir(Size::new(1, 42)),
        Path::new("/basedir")
    );
}

#[test]
fn artifact_paths_derive_from_the_stem() {
    let job = JobConfig::build(
        &page("foo", "some_url"),
        Size::new(1, 42),
        "Test",
        "{name}_test",
        &layout(true),
    )
    .unwrap();

    assert_eq!(job.destination, Path::new("/basedir/1x42/foo_test"));
    assert_eq!(job.screenshot_path, Path::new("/basedir/1x42/foo_test.png"));
    assert_eq!(
        job.driver_log_path,
        Path::new("/basedir/1x42/foo_test.driver.log")
    );
    assert_eq!(
        job.report_path,
        Path::new("/basedir/1x42/foo_test.report.json")
    );
    assert_eq!(job.name, "foo");
    assert_eq!(job.url, "some_url");
    assert_eq!(job.size, Size::new(1, 42));
}

#[test]
fn template_placeholders_are_substituted() {
    let job = JobConfig::build(
        &page("foo", "some_url"),
        Size::new(1, 42),
        "Dummy",
        "{name}_{interface}_{size}",
        &layout(true),
    )
    .unwrap();

    assert_eq!(job.destination, Path::new("/basedir/1x42/foo_Dummy_1x42"));
}

#[test]
fn page_filename_overrides_the_template() {
    let mut p = page("foo", "some_url");
    p.filename = Some("bar".into());

    let job =
        JobConfig::build(&p, Size::new(1, 42), "Test", "{name}_test", &layout(true)).unwrap();

    assert_eq!(job.destination, Path::new("/basedir/1x42/bar"));
    assert_eq!(job.screenshot_path, Path::new("/basedir/1x42/bar.png"));
}

#[test]
fn missing_name_or_url_is_a_config_error() {
    for p in [
        Page::default(),
        page("", "bar"),
        page("bar", ""),
    ] {
        let err = JobConfig::build(&p, Size::new(1, 42), "Test", "{name}", &layout(true))
            .unwrap_err();
        assert!(matches!(err, CaptureError::PageConfig(_)));
    }
}

#[test]
fn extra_page_fields_pass_through() {
    let mut p = page("foo", "some_url");
    p.extra.insert("ping".into(), json!("pong"));

    let job =
        JobConfig::build(&p, Size::new(1, 42), "Test", "{name}_test", &layout(true)).unwrap();

    assert_eq!(job.extra.get("ping"), Some(&json!("pong")));
    // The input page is untouched.
    assert_eq!(p.extra.get("ping"), Some(&json!("pong")));
    assert_eq!(p.name, "foo");
}

#[test]
fn building_twice_yields_identical_configs() {
    let p = page("foo", "some_url");
    let a = JobConfig::build(&p, Size::new(1, 42), "Test", "{name}_test", &layout(true)).unwrap();
    let b = JobConfig::build(&p, Size::new(1, 42), "Test", "{name}_test", &layout(true)).unwrap();
    assert_eq!(a, b);
}
