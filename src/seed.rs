//! Seed documents loaded at startup.

use std::path::Path;

use crate::error::Result;
use crate::service::Document;

const BUILTIN: &[(i64, &str)] = &[
    (1, "The Honda Civic is a compact car."),
    (2, "California is a US state."),
    (3, "California has many cities."),
    (4, "The Toyota Corolla is a reliable sedan."),
    (5, "Rust is a systems programming language."),
    (6, "The Pacific Ocean is the largest ocean."),
    (7, "Mount Everest is the tallest mountain on Earth."),
];

/// The built-in sample set.
pub fn builtin_documents() -> Vec<Document> {
    BUILTIN
        .iter()
        .map(|(id, text)| Document::new(*id, *text))
        .collect()
}

/// Reads a JSON array of `{"id": ..., "text": ...}` objects.
pub fn load_seed_file(path: &Path) -> Result<Vec<Document>> {
    let content = std::fs::read_to_string(path)?;
    let documents: Vec<Document> = serde_json::from_str(&content)?;
    tracing::info!(path = %path.display(), count = documents.len(), "Seed file read");
    Ok(documents)
}
