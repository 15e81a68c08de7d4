//! End-to-end persona-mode runs over PDFs on disk.

mod common;

use std::fs;

use common::{body, build_pdf, heading};
use docsift::{analyze, EngineOptions, Error, JobSpec, JsonFormat, PersonaEngine};

fn hiking_pdf() -> Vec<u8> {
    build_pdf(
        None,
        &[vec![
            heading("Alpine Hiking", 24, 720),
            heading("Trail Safety", 16, 680),
            body("Carry water, a map and sturdy boots on every ascent.", 660),
            body("Weather changes quickly above the tree line.", 646),
        ]],
    )
}

fn workspace() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("guide.pdf"), common::travel_guide(None)).unwrap();
    fs::write(dir.path().join("hiking.pdf"), hiking_pdf()).unwrap();
    fs::write(dir.path().join("broken.pdf"), common::broken_pdf()).unwrap();
    dir
}

#[test]
fn test_failed_document_is_skipped() {
    let dir = workspace();
    let spec = JobSpec::new(
        ["guide.pdf", "broken.pdf", "hiking.pdf"],
        "Food Critic",
        "Find food markets",
    );

    let digest = analyze(&spec, dir.path()).unwrap();

    assert_eq!(digest.skipped_documents.len(), 1);
    assert_eq!(digest.skipped_documents[0].document, "broken.pdf");
    assert_eq!(
        digest.metadata.input_documents,
        vec!["guide.pdf", "broken.pdf", "hiking.pdf"]
    );
    assert!(digest
        .extracted_sections
        .iter()
        .all(|s| s.document == "guide.pdf" || s.document == "hiking.pdf"));
}

#[test]
fn test_same_file_name_in_two_directories() {
    let dir = tempfile::tempdir().unwrap();
    for (sub, bytes) in [("a", common::travel_guide(None)), ("b", common::broken_pdf())] {
        fs::create_dir(dir.path().join(sub)).unwrap();
        fs::write(dir.path().join(sub).join("x.pdf"), bytes).unwrap();
    }
    let spec = JobSpec::new(["a/x.pdf", "b/x.pdf"], "Food Critic", "Find food markets");

    let digest = analyze(&spec, dir.path()).unwrap();

    assert_eq!(digest.skipped_documents.len(), 1);
    assert_eq!(digest.skipped_documents[0].document, "b/x.pdf");
    assert!(!digest.extracted_sections.is_empty());
    assert!(digest
        .extracted_sections
        .iter()
        .all(|s| s.document == "a/x.pdf"));
}

#[test]
fn test_most_relevant_section_first() {
    let dir = workspace();
    let spec = JobSpec::new(["hiking.pdf", "guide.pdf"], "Food Critic", "Find food markets");

    let digest = analyze(&spec, dir.path()).unwrap();

    let top = &digest.extracted_sections[0];
    assert_eq!(top.document, "guide.pdf");
    assert_eq!(top.section_title, "Food and Wine");
    assert_eq!(top.importance_rank, 1);
    assert_eq!(top.page_number, 2);

    let ranks: Vec<_> = digest
        .extracted_sections
        .iter()
        .map(|s| s.importance_rank)
        .collect();
    let expected: Vec<_> = (1..=ranks.len()).collect();
    assert_eq!(ranks, expected);

    let refined = &digest.subsection_analysis[0];
    assert_eq!(refined.document, "guide.pdf");
    assert_eq!(refined.importance_rank, 1);
    assert!(refined.refined_text.contains("Markets open early"));
}

#[test]
fn test_top_k_bounds_output() {
    let dir = workspace();
    let spec = JobSpec::new(["guide.pdf", "hiking.pdf"], "Food Critic", "Find food markets");

    let digest = PersonaEngine::new(EngineOptions::new().with_top_k(2))
        .analyze(&spec, dir.path())
        .unwrap();

    assert_eq!(digest.extracted_sections.len(), 2);
    assert_eq!(digest.subsection_analysis.len(), 2);
}

#[test]
fn test_repeated_runs_agree() {
    let dir = workspace();
    let spec = JobSpec::new(["guide.pdf", "hiking.pdf"], "Food Critic", "Find food markets");

    let first = analyze(&spec, dir.path()).unwrap();
    let second = analyze(&spec, dir.path()).unwrap();
    assert_eq!(
        serde_json::to_value(&first.extracted_sections).unwrap(),
        serde_json::to_value(&second.extracted_sections).unwrap()
    );
}

#[test]
fn test_digest_json() {
    let dir = workspace();
    let spec = JobSpec::from_json(
        r#"{
            "documents": [{"filename": "guide.pdf", "title": "Guide"}, "missing.pdf"],
            "persona": {"role": "Food Critic"},
            "job_to_be_done": {"task": "Find food markets"}
        }"#,
    )
    .unwrap();

    let digest = analyze(&spec, dir.path()).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&digest.to_json(JsonFormat::Compact).unwrap()).unwrap();

    assert_eq!(json["metadata"]["persona"], "Food Critic");
    assert_eq!(json["metadata"]["job_to_be_done"], "Find food markets");
    assert!(json["metadata"]["processing_timestamp"].is_string());
    assert_eq!(json["extracted_sections"][0]["section_title"], "Food and Wine");
    assert_eq!(json["skipped_documents"][0]["document"], "missing.pdf");
}

#[test]
fn test_nothing_usable() {
    let dir = workspace();
    let spec = JobSpec::new(["broken.pdf"], "Food Critic", "Find food markets");
    assert!(matches!(
        analyze(&spec, dir.path()),
        Err(Error::NoValidDocuments)
    ));
}
