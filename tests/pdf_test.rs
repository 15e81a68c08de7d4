//! Integration tests over real PDF bytes.

mod common;

use docsift::{parse_bytes, Error, LopdfBackend, PageSource};

#[test]
fn test_headings_from_font_sizes() {
    let bytes = common::travel_guide(None);
    let parsed = parse_bytes("guide.pdf", &bytes).unwrap();

    assert_eq!(parsed.id, "guide.pdf");
    assert_eq!(parsed.page_count, 2);

    let headings: Vec<_> = parsed
        .sections
        .iter()
        .map(|s| (s.heading.as_str(), s.level, s.page))
        .collect();
    assert_eq!(
        headings,
        vec![
            ("Travel Guide", 1, 1),
            ("Coastal Towns", 2, 1),
            ("Food and Wine", 2, 2),
        ]
    );

    // Without metadata the first top-level heading names the document.
    assert_eq!(parsed.title, "Travel Guide");

    let coastal = &parsed.sections[1];
    assert_eq!(coastal.parent, Some(0));
    assert!(coastal.body.contains("sandy beaches"));
    assert!(coastal.body.contains("festival season"));
    assert!(!coastal.body.contains("bouillabaisse"));
}

#[test]
fn test_outline_json_shape() {
    let bytes = common::travel_guide(None);
    let outline = parse_bytes("guide.pdf", &bytes).unwrap().outline();
    let json: serde_json::Value = serde_json::to_value(&outline).unwrap();

    assert_eq!(json["title"], "Travel Guide");
    let entries = json["outline"].as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[1]["level"], "H2");
    assert_eq!(entries[1]["text"], "Coastal Towns");
    assert_eq!(entries[2]["page"], 2);
}

#[test]
fn test_metadata_title_wins() {
    let bytes = common::travel_guide(Some("Riviera Handbook"));

    let backend = LopdfBackend::load_bytes("guide.pdf", &bytes).unwrap();
    assert_eq!(backend.title().as_deref(), Some("Riviera Handbook"));
    assert_eq!(backend.page_count(), 2);
    assert_eq!(backend.version(), "1.5");

    let parsed = parse_bytes("guide.pdf", &bytes).unwrap();
    assert_eq!(parsed.title, "Riviera Handbook");
}

#[test]
fn test_pages_decode_in_reading_order() {
    let bytes = common::travel_guide(None);
    let backend = LopdfBackend::load_bytes("guide.pdf", &bytes).unwrap();

    let page = backend.read_page(1).unwrap();
    let texts: Vec<_> = page.runs.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts[0], "Travel Guide");
    assert_eq!(texts[1], "Coastal Towns");
    assert_eq!(page.runs.len(), 5);
    assert!(page.runs[0].bold);
    assert!(!page.runs[2].bold);
    assert!((page.runs[0].font_size - 24.0).abs() < 0.01);

    assert!(matches!(
        backend.read_page(3),
        Err(Error::PageOutOfRange(3, 2))
    ));
}

#[test]
fn test_broken_and_foreign_bytes() {
    assert!(parse_bytes("broken.pdf", &common::broken_pdf()).is_err());
    assert!(matches!(
        parse_bytes("notes.txt", b"plain text, not a pdf"),
        Err(Error::UnknownFormat)
    ));
}

#[test]
fn test_page_without_text_is_empty_document() {
    let bytes = common::build_pdf(None, &[Vec::new()]);
    assert!(matches!(
        parse_bytes("blank.pdf", &bytes),
        Err(Error::EmptyDocument)
    ));
}
