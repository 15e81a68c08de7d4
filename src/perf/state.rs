//! Per-document lifecycle.

use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

/// Where a document is in its performance-mode lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentState {
    Pending,
    Opening,
    StreamingPages,
    Finalized,
    Failed,
}

impl DocumentState {
    /// Stable lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            DocumentState::Pending => "pending",
            DocumentState::Opening => "opening",
            DocumentState::StreamingPages => "streaming_pages",
            DocumentState::Finalized => "finalized",
            DocumentState::Failed => "failed",
        }
    }

    /// Whether `self -> to` is a legal step.
    pub fn can_transition_to(self, to: DocumentState) -> bool {
        use DocumentState::*;
        matches!(
            (self, to),
            (Pending, Opening)
                | (Opening, StreamingPages)
                | (Opening, Failed)
                | (StreamingPages, Finalized)
                | (StreamingPages, Failed)
        )
    }

    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, DocumentState::Finalized | DocumentState::Failed)
    }
}

impl fmt::Display for DocumentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A document's state together with the path it took.
#[derive(Debug, Clone)]
pub struct DocumentRun {
    state: DocumentState,
    history: Vec<DocumentState>,
}

impl DocumentRun {
    /// Start in `Pending`.
    pub fn new() -> Self {
        Self {
            state: DocumentState::Pending,
            history: vec![DocumentState::Pending],
        }
    }

    /// Current state.
    pub fn state(&self) -> DocumentState {
        self.state
    }

    /// Every state visited, in order.
    pub fn history(&self) -> &[DocumentState] {
        &self.history
    }

    /// Move to `to`, rejecting illegal steps.
    pub fn transition(&mut self, to: DocumentState) -> Result<()> {
        if !self.state.can_transition_to(to) {
            return Err(Error::InvalidTransition {
                from: self.state.name(),
                to: to.name(),
            });
        }
        self.state = to;
        self.history.push(to);
        Ok(())
    }

    /// Move to `Failed`.
    pub fn fail(&mut self) -> Result<()> {
        self.transition(DocumentState::Failed)
    }
}

impl Default for DocumentRun {
    fn default() -> Self {
        Self::new()
    }
}
