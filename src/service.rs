//! Embed-then-index service shared by the HTTP server and the REPL.
//!
//! Owns one embedder and one [`VectorIndex`] behind a `RwLock`. Inserts take
//! the write lock for the append only; embedding happens before any lock is
//! held, so a slow model never blocks readers.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::embedding::Embedder;
use crate::error::{IndexError, Result};
use crate::index::{DocumentId, DocumentRecord, SearchHit, VectorIndex};

/// A document as submitted by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<DocumentId>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into() }
    }
}

pub struct SearchService {
    embedder: Box<dyn Embedder>,
    index: RwLock<VectorIndex>,
}

impl SearchService {
    /// Creates a service with an empty index sized to the embedder's output.
    pub fn new(embedder: Box<dyn Embedder>) -> Self {
        let index = VectorIndex::new(embedder.dimension());
        Self { embedder, index: RwLock::new(index) }
    }

    /// Embeds `document.text` and appends it to the index.
    ///
    /// Returns the slot assigned to the document.
    pub fn ingest(&self, document: Document) -> Result<usize> {
        let embedding = self.embedder.embed(&document.text)?;
        let slot = self.index.write().insert(document.id.clone(), document.text, &embedding)?;
        debug!(id = %document.id, slot, "Document ingested");
        Ok(slot)
    }

    /// Embeds `text` and returns up to `top_k` nearest documents, best first.
    pub fn query(&self, text: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        if top_k == 0 {
            return Err(IndexError::InvalidTopK(top_k).into());
        }
        let embedding = self.embedder.embed(text)?;
        let hits = self.index.read().search(&embedding, top_k)?;
        debug!(top_k, hits = hits.len(), "Query served");
        Ok(hits)
    }

    /// Ingests every document in order, stopping at the first failure.
    ///
    /// Returns how many documents were added.
    pub fn load_documents(&self, documents: impl IntoIterator<Item = Document>) -> Result<usize> {
        let mut count = 0;
        for document in documents {
            self.ingest(document)?;
            count += 1;
        }
        info!(count, total = self.len(), "Documents loaded");
        Ok(count)
    }

    /// Returns a copy of the record at `slot`.
    pub fn document(&self, slot: usize) -> Option<DocumentRecord> {
        self.index.read().get(slot).cloned()
    }

    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.read().is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }
}
