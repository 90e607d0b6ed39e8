pub mod types;

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::DocumentError;
pub use types::{Cell, CellKind};

/// An ordered sequence of cells plus whatever top-level fields the file
/// carried. Mutable only through [`Notebook::replace_reasoning`]; every
/// other field survives a round trip untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    pub cells: Vec<Cell>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbformat: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbformat_minor: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Notebook {
    /// Parse raw notebook JSON. Cell kinds are decided here, once.
    pub fn parse(raw: &str) -> Result<Notebook, DocumentError> {
        let mut nb: Notebook =
            serde_json::from_str(raw).map_err(|e| DocumentError::Malformed(e.to_string()))?;
        for cell in &mut nb.cells {
            cell.kind = CellKind::classify(&cell.text());
        }
        Ok(nb)
    }

    /// Render back to the on-disk form: 2-space-indented JSON, exactly as
    /// the tooling that produces these notebooks writes them.
    pub fn serialize(&self) -> Result<String, DocumentError> {
        serde_json::to_string_pretty(self).map_err(|e| DocumentError::Malformed(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Notebook, DocumentError> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    /// Persist with replace-on-success semantics: write a sibling temp
    /// file, then rename over the original. A failure at any point leaves
    /// the original bytes in place.
    pub fn save(&self, path: &Path) -> Result<(), DocumentError> {
        let raw = self.serialize()?;
        let tmp = path.with_extension("ipynb.tmp");
        std::fs::write(&tmp, &raw)?;
        std::fs::rename(&tmp, path)?;
        debug!(doc = %path.display(), bytes = raw.len(), "notebook saved");
        Ok(())
    }

    /// Replace the text of one reasoning cell, returning a new notebook.
    /// The receiver is never modified; kind, metadata, and position of the
    /// cell are preserved.
    pub fn replace_reasoning(
        &self,
        cell_index: usize,
        new_text: &str,
    ) -> Result<Notebook, DocumentError> {
        let cell = self
            .cells
            .get(cell_index)
            .ok_or(DocumentError::CellOutOfRange(cell_index))?;
        if cell.kind != CellKind::Reasoning {
            return Err(DocumentError::NotReasoningCell(cell_index));
        }
        let mut next = self.clone();
        next.cells[cell_index].source =
            vec![format!("{}\n\n{}", types::MARKER_ASSISTANT, new_text)];
        Ok(next)
    }
}
