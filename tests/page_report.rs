use serde_json::{Value, json};
use site_snap::report::PageReport;
use site_snap::size::Size;

#[test]
fn report_file_shape() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("every-logs_firefox.report.json");

    let report = PageReport {
        name: "every-logs".into(),
        url: "http://localhost:8001/every-logs.basic.html".into(),
        size: Size::new(1440, 768),
        interface: "FirefoxWebDriver".into(),
        elapsed_time: 0.42,
        logs: vec![(
            "error".into(),
            "line 37: ReferenceError: bar is not defined".into(),
        )],
    };
    report.write(&path).unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    let value: Value = serde_json::from_str(&raw).unwrap();

    assert_eq!(value["name"], json!("every-logs"));
    assert_eq!(value["size"], json!([1440, 768]));
    assert_eq!(value["interface"], json!("FirefoxWebDriver"));
    assert_eq!(
        value["logs"],
        json!([["error", "line 37: ReferenceError: bar is not defined"]])
    );

    let parsed: PageReport = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed.size, Size::new(1440, 768));
    assert_eq!(parsed.logs.len(), 1);
}
