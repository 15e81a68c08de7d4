//! Serializable run artifacts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::rank::RankedSection;
use crate::refine::SubsectionResult;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Serialize any run artifact to JSON.
pub fn to_json<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
        JsonFormat::Compact => serde_json::to_string(value),
    };

    result.map_err(|e| Error::Serialization(format!("JSON serialization error: {}", e)))
}

/// The persona-mode result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Digest {
    pub metadata: DigestMetadata,
    pub extracted_sections: Vec<ExtractedSection>,
    pub subsection_analysis: Vec<SubsectionAnalysis>,
    pub skipped_documents: Vec<SkippedDocument>,
}

impl Digest {
    /// Assemble a digest from ranking and refinement results.
    pub fn new(
        metadata: DigestMetadata,
        top_sections: &[RankedSection],
        subsections: &[SubsectionResult],
        skipped_documents: Vec<SkippedDocument>,
    ) -> Self {
        Self {
            metadata,
            extracted_sections: top_sections.iter().map(ExtractedSection::from).collect(),
            subsection_analysis: subsections.iter().map(SubsectionAnalysis::from).collect(),
            skipped_documents,
        }
    }

    /// Serialize to JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        to_json(self, format)
    }
}

/// Inputs echoed back with the processing time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestMetadata {
    pub input_documents: Vec<String>,
    pub persona: String,
    pub job_to_be_done: String,
    pub processing_timestamp: DateTime<Utc>,
}

impl DigestMetadata {
    /// Metadata stamped with the current time.
    pub fn now(input_documents: Vec<String>, persona: &str, job_to_be_done: &str) -> Self {
        Self {
            input_documents,
            persona: persona.to_string(),
            job_to_be_done: job_to_be_done.to_string(),
            processing_timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedSection {
    pub document: String,
    pub section_title: String,
    pub importance_rank: usize,
    pub page_number: u32,
}

impl From<&RankedSection> for ExtractedSection {
    fn from(r: &RankedSection) -> Self {
        Self {
            document: r.document_id.clone(),
            section_title: r.heading.clone(),
            importance_rank: r.rank,
            page_number: r.page,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsectionAnalysis {
    pub document: String,
    pub refined_text: String,
    pub page_number: u32,
    pub importance_rank: usize,
}

impl From<&SubsectionResult> for SubsectionAnalysis {
    fn from(s: &SubsectionResult) -> Self {
        Self {
            document: s.document_id.clone(),
            refined_text: s.text.clone(),
            page_number: s.page,
            importance_rank: s.rank,
        }
    }
}

/// A document left out of the digest, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedDocument {
    pub document: String,
    pub reason: String,
}

impl SkippedDocument {
    pub fn new(document: impl Into<String>, reason: &Error) -> Self {
        Self {
            document: document.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest() -> Digest {
        let ranked = vec![RankedSection {
            document_id: "a.pdf".to_string(),
            heading: "Method".to_string(),
            page: 2,
            score: 2.5,
            rank: 1,
            document_index: 0,
            section_index: 1,
        }];
        let refined = vec![SubsectionResult {
            document_id: "a.pdf".to_string(),
            page: 2,
            text: "Samples were taken weekly.".to_string(),
            rank: 1,
        }];
        Digest::new(
            DigestMetadata::now(vec!["a.pdf".into(), "b.pdf".into()], "Researcher", "method"),
            &ranked,
            &refined,
            vec![SkippedDocument::new("b.pdf", &Error::EmptyDocument)],
        )
    }

    #[test]
    fn test_digest_field_names() {
        let json = digest().to_json(JsonFormat::Compact).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["metadata"]["persona"], "Researcher");
        assert!(value["metadata"]["processing_timestamp"].is_string());
        assert_eq!(value["extracted_sections"][0]["section_title"], "Method");
        assert_eq!(value["extracted_sections"][0]["importance_rank"], 1);
        assert_eq!(value["extracted_sections"][0]["page_number"], 2);
        assert_eq!(
            value["subsection_analysis"][0]["refined_text"],
            "Samples were taken weekly."
        );
        assert_eq!(value["skipped_documents"][0]["document"], "b.pdf");
    }

    #[test]
    fn test_pretty_and_compact() {
        let d = digest();
        assert!(to_json(&d, JsonFormat::Pretty).unwrap().contains('\n'));
        assert!(!to_json(&d, JsonFormat::Compact).unwrap().contains('\n'));
    }
}
