//! Job specification loading and document-reference validation.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// A validated persona-mode job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSpec {
    /// Referenced documents, in input order
    pub documents: Vec<DocumentRef>,

    /// Persona description
    pub persona: String,

    /// Task the persona wants to accomplish
    pub job_to_be_done: String,
}

/// A document named by a job specification.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRef {
    pub filename: String,
    pub title: Option<String>,
}

/// A readable document together with the name it is reported under.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDocument {
    /// Reference as written in the job, relative to the base directory
    pub name: String,
    pub path: PathBuf,
}

impl ResolvedDocument {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

#[derive(Deserialize)]
struct RawSpec {
    documents: Option<Vec<RawDocument>>,
    persona: Option<RawText>,
    job_to_be_done: Option<RawText>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDocument {
    Path(String),
    Entry {
        filename: String,
        #[serde(default)]
        title: Option<String>,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawText {
    Plain(String),
    Role { role: String },
    Task { task: String },
}

impl RawText {
    fn into_string(self) -> String {
        match self {
            RawText::Plain(s) | RawText::Role { role: s } | RawText::Task { task: s } => s,
        }
    }
}

impl JobSpec {
    /// Create a job directly.
    pub fn new(
        documents: impl IntoIterator<Item = impl Into<String>>,
        persona: impl Into<String>,
        job_to_be_done: impl Into<String>,
    ) -> Self {
        Self {
            documents: documents
                .into_iter()
                .map(|d| DocumentRef {
                    filename: d.into(),
                    title: None,
                })
                .collect(),
            persona: persona.into(),
            job_to_be_done: job_to_be_done.into(),
        }
    }

    /// Parse and validate a JSON job specification.
    ///
    /// Accepts plain strings (`"documents": ["a.pdf"]`, `"persona": "..."`)
    /// as well as the object form (`{"filename": ...}`, `{"role": ...}`,
    /// `{"task": ...}`).
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawSpec = serde_json::from_str(json)
            .map_err(|e| Error::Specification(format!("invalid job specification: {}", e)))?;

        let documents = raw
            .documents
            .ok_or_else(|| Error::Specification("missing field `documents`".to_string()))?;
        let persona = raw
            .persona
            .ok_or_else(|| Error::Specification("missing field `persona`".to_string()))?;
        let job = raw
            .job_to_be_done
            .ok_or_else(|| Error::Specification("missing field `job_to_be_done`".to_string()))?;

        let documents: Vec<DocumentRef> = documents
            .into_iter()
            .map(|d| match d {
                RawDocument::Path(filename) => DocumentRef {
                    filename,
                    title: None,
                },
                RawDocument::Entry { filename, title } => DocumentRef { filename, title },
            })
            .collect();

        let spec = Self {
            documents,
            persona: persona.into_string(),
            job_to_be_done: job.into_string(),
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Load and validate a job specification file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::Specification(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Check required fields.
    pub fn validate(&self) -> Result<()> {
        if self.documents.is_empty() {
            return Err(Error::Specification("no documents listed".to_string()));
        }
        if let Some(i) = self
            .documents
            .iter()
            .position(|d| d.filename.trim().is_empty())
        {
            return Err(Error::Specification(format!(
                "document entry {} has an empty filename",
                i
            )));
        }
        Ok(())
    }

    /// Resolve document references against `base_dir`.
    ///
    /// Returns the readable documents in input order, and every reference
    /// that cannot be opened together with its access error. Documents keep
    /// the reference as written, so `a/x.pdf` and `b/x.pdf` stay distinct.
    pub fn resolve_documents(
        &self,
        base_dir: &Path,
    ) -> (Vec<ResolvedDocument>, Vec<(String, Error)>) {
        let mut valid = Vec::new();
        let mut missing = Vec::new();
        for doc in &self.documents {
            let path = base_dir.join(&doc.filename);
            match check_readable(&path) {
                Ok(()) => valid.push(ResolvedDocument::new(doc.filename.trim(), path)),
                Err(e) => missing.push((doc.filename.clone(), e)),
            }
        }
        (valid, missing)
    }
}

/// Whether `path` names a readable regular file.
pub fn check_readable(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(Error::DocumentAccess {
            path: path.to_path_buf(),
            reason: "not found".to_string(),
        });
    }
    File::open(path).map_err(|e| Error::DocumentAccess {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(())
}

/// PDF files directly inside `dir`, sorted by file name.
pub fn pdf_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    files.sort();
    Ok(files)
}
