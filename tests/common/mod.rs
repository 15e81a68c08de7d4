//! Shared fixtures: small PDFs built in memory with lopdf.

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

/// One line of text placed on a page.
pub struct Line {
    pub text: &'static str,
    pub size: i64,
    pub bold: bool,
    pub y: i64,
}

pub fn heading(text: &'static str, size: i64, y: i64) -> Line {
    Line {
        text,
        size,
        bold: true,
        y,
    }
}

pub fn body(text: &'static str, y: i64) -> Line {
    Line {
        text,
        size: 11,
        bold: false,
        y,
    }
}

/// Build a PDF with one Helvetica and one Helvetica-Bold font. Each page
/// holds the given lines, left-aligned at x = 72.
pub fn build_pdf(title: Option<&str>, pages: &[Vec<Line>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let resources = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => bold,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in pages {
        let mut operations = Vec::new();
        for line in lines {
            let font = if line.bold { "F2" } else { "F1" };
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec![font.into(), line.size.into()]));
            operations.push(Operation::new("Td", vec![72.into(), line.y.into()]));
            operations.push(Operation::new(
                "Tj",
                vec![Object::string_literal(line.text)],
            ));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("content encodes"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    if let Some(title) = title {
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(title),
        });
        doc.trailer.set("Info", info_id);
    }

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("pdf saves");
    bytes
}

/// A two-page travel guide: one title, two chapters.
pub fn travel_guide(title: Option<&str>) -> Vec<u8> {
    build_pdf(
        title,
        &[
            vec![
                heading("Travel Guide", 24, 720),
                heading("Coastal Towns", 16, 680),
                body("Nice and Cannes offer sandy beaches and lively harbours.", 660),
                body("Trains along the coast connect every town in under an hour.", 646),
                body("Book rooms early during the summer festival season.", 632),
            ],
            vec![
                heading("Food and Wine", 16, 720),
                body("Try bouillabaisse in Marseille and rose wine from Provence.", 700),
                body("Markets open early and close by lunchtime most days.", 686),
            ],
        ],
    )
}

/// A garbage file with a valid header.
pub fn broken_pdf() -> Vec<u8> {
    b"%PDF-1.4\nthis is not a cross-reference table\n%%EOF".to_vec()
}
