//! # KVSearch - In-Memory Vector Similarity Search
//!
//! KVSearch turns text documents into fixed-size embeddings, stores them in an
//! append-only index and answers exact nearest-neighbor queries. Ranking uses
//! squared Euclidean distance over every stored vector; each hit is scored as
//! `1 / (1 + distance)`.
//!
//! ## Example
//!
//! ```
//! use kvsearch::VectorIndex;
//!
//! let mut index = VectorIndex::new(3);
//!
//! // Insert vectors; each gets the next slot
//! index.insert(1, "x axis", &[1.0, 0.0, 0.0]).unwrap();
//! index.insert(2, "y axis", &[0.0, 1.0, 0.0]).unwrap();
//! index.insert(3, "diagonal", &[0.7, 0.7, 0.0]).unwrap();
//!
//! // Search for the nearest vectors
//! let results = index.search(&[1.0, 0.0, 0.0], 2).unwrap();
//! assert_eq!(results[0].text, "x axis"); // Exact match, score 1.0
//! ```
//!
//! With an embedder in front:
//!
//! ```
//! use kvsearch::{Document, HashingEmbedder, SearchService};
//!
//! let service = SearchService::new(Box::new(HashingEmbedder::new(384)));
//! service.ingest(Document::new(1, "California is a US state.")).unwrap();
//! service.ingest(Document::new(2, "The Honda Civic is a compact car.")).unwrap();
//!
//! let hits = service.query("California", 1).unwrap();
//! assert_eq!(hits[0].text, "California is a US state.");
//! ```

pub mod config;
pub mod embedding;
pub mod error;
mod index;
pub mod seed;
pub mod server;
mod service;
pub mod vector;

pub use embedding::{build_embedder, Embedder, HashingEmbedder};
pub use error::{Error, IndexError, Result};
pub use index::{DocumentId, DocumentRecord, SearchHit, VectorIndex};
pub use service::{Document, SearchService};
