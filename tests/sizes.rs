use serde_json::json;
use site_snap::error::CaptureError;
use site_snap::settings::Page;
use site_snap::size::{Size, available_sizes, page_sizes};

fn page_with_sizes(sizes: Vec<serde_json::Value>) -> Page {
    Page {
        sizes: Some(sizes),
        ..Default::default()
    }
}

#[test]
fn default_size_always_present() {
    let sizes = available_sizes(&[]).unwrap();
    assert_eq!(sizes, vec![Size::DEFAULT]);

    let sizes = available_sizes(&[page_with_sizes(vec![])]).unwrap();
    assert_eq!(sizes, vec![Size::DEFAULT]);

    let sizes = available_sizes(&[Page::default()]).unwrap();
    assert_eq!(sizes, vec![Size::DEFAULT]);
}

#[test]
fn duplicate_sizes_collapse() {
    let pages = vec![
        page_with_sizes(vec![json!([1, 42])]),
        page_with_sizes(vec![json!([1, 42])]),
        page_with_sizes(vec![json!([1, 42])]),
    ];
    let sizes = available_sizes(&pages).unwrap();
    assert_eq!(sizes, vec![Size::DEFAULT, Size::new(1, 42)]);
}

#[test]
fn sizes_sorted_ascending_by_width_then_height() {
    let pages = vec![
        page_with_sizes(vec![json!([42, 42])]),
        page_with_sizes(vec![json!([1, 42]), json!([300, 1444])]),
        page_with_sizes(vec![json!([1, 42])]),
        page_with_sizes(vec![
            json!([42, 42]),
            json!([300, 1444]),
            json!([1397, 22]),
            json!([1, 42]),
        ]),
    ];
    let sizes = available_sizes(&pages).unwrap();
    assert_eq!(
        sizes,
        vec![
            Size::DEFAULT,
            Size::new(1, 42),
            Size::new(42, 42),
            Size::new(300, 1444),
            Size::new(1397, 22),
        ]
    );
}

#[test]
fn invalid_size_entries_are_rejected() {
    let invalid = [
        json!("nope"),
        json!("20x42"),
        json!([1, 42, 41]),
        json!([7]),
        json!([1, "x"]),
        json!([-3, 10]),
    ];

    for entry in invalid {
        let err = available_sizes(&[page_with_sizes(vec![entry.clone()])]).unwrap_err();
        assert!(matches!(err, CaptureError::InvalidPageSize(_)), "{entry}");
        assert!(err.to_string().contains(&entry.to_string()));
    }

    // One bad entry poisons the whole resolution even next to valid ones.
    let err = available_sizes(&[page_with_sizes(vec![json!([1, 42]), json!("20x42")])]);
    assert!(err.is_err());
}

#[test]
fn size_label_round_trip() {
    assert_eq!(Size::DEFAULT.label(), "Default");
    assert_eq!(Size::new(1, 42).label(), "1x42");
    assert_eq!(Size::new(10, 42).label(), "10x42");
    assert_eq!(Size::new(1200, 420).label(), "1200x420");
}

#[test]
fn pages_without_sizes_resolve_to_default() {
    assert_eq!(page_sizes(&Page::default()).unwrap(), vec![Size::DEFAULT]);
    assert_eq!(
        page_sizes(&page_with_sizes(vec![])).unwrap(),
        vec![Size::DEFAULT]
    );
    assert_eq!(
        page_sizes(&page_with_sizes(vec![json!([30, 30]), json!([1, 42])])).unwrap(),
        vec![Size::new(30, 30), Size::new(1, 42)]
    );
}
