//! REST API for kvsearch.
//!
//! Wraps a shared [`SearchService`] in JSON endpoints. The service is
//! registered as `web::Data` by the caller; embedding and index work runs on
//! actix's blocking pool.
//!
//! ## Endpoints
//!
//! - `GET /` - Banner message
//! - `POST /ingest` - Embed and store one document
//! - `GET /query?text=...&top_k=N` - Nearest documents to a text (`top_k` defaults to 1)
//! - `GET /stats` - Document count and embedding dimension
//!
//! ## Usage
//!
//! ```rust,no_run
//! use actix_web::{web, App, HttpServer};
//! use kvsearch::{HashingEmbedder, SearchService};
//!
//! #[actix_web::main]
//! async fn main() -> std::io::Result<()> {
//!     let service = web::Data::new(SearchService::new(Box::new(HashingEmbedder::new(384))));
//!     HttpServer::new(move || App::new().app_data(service.clone()).configure(kvsearch::server::config))
//!         .bind("127.0.0.1:8000")?
//!         .run()
//!         .await
//! }
//! ```

use actix_web::error::BlockingError;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, IndexError};
use crate::index::{DocumentId, SearchHit};
use crate::service::{Document, SearchService};

// --- Request structs ---

#[derive(Deserialize)]
struct QueryParams {
    text: String,
    #[serde(default = "default_top_k")]
    top_k: usize,
}

fn default_top_k() -> usize {
    1
}

// --- Response structs ---

#[derive(Serialize)]
struct IngestResponse {
    status: String,
    message: String,
    slot: usize,
}

#[derive(Serialize)]
struct MatchResult {
    id: DocumentId,
    text: String,
    score: f32,
}

impl From<SearchHit> for MatchResult {
    fn from(hit: SearchHit) -> Self {
        MatchResult { id: hit.id, text: hit.text, score: hit.score }
    }
}

#[derive(Serialize)]
struct StatsResponse {
    documents: usize,
    dimension: usize,
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

// --- Errors ---

/// Handler error. Rendered as `{"detail": "..."}`.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] Error);

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            Error::Index(IndexError::InvalidTopK(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse { detail: self.0.to_string() })
    }
}

impl From<BlockingError> for ApiError {
    fn from(err: BlockingError) -> Self {
        ApiError(Error::Task(err.to_string()))
    }
}

// --- Handlers ---

async fn root_handler() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({"message": "kvsearch vector similarity search"}))
}

async fn ingest_handler(
    service: web::Data<SearchService>,
    body: web::Json<Document>,
) -> Result<HttpResponse, ApiError> {
    let document = body.into_inner();
    let id = document.id.clone();

    let slot = web::block(move || service.ingest(document))
        .await?
        .inspect_err(|e| warn!(id = %id, error = %e, "Ingest failed"))?;

    info!(id = %id, slot, "Document added");
    Ok(HttpResponse::Ok().json(IngestResponse {
        status: "success".to_string(),
        message: format!("Document {} added", id),
        slot,
    }))
}

async fn query_handler(
    service: web::Data<SearchService>,
    params: web::Query<QueryParams>,
) -> Result<HttpResponse, ApiError> {
    let QueryParams { text, top_k } = params.into_inner();

    let hits = web::block(move || service.query(&text, top_k))
        .await?
        .inspect_err(|e| warn!(top_k, error = %e, "Query failed"))?;

    let results: Vec<MatchResult> = hits.into_iter().map(MatchResult::from).collect();
    Ok(HttpResponse::Ok().json(results))
}

async fn stats_handler(service: web::Data<SearchService>) -> impl Responder {
    HttpResponse::Ok().json(StatsResponse {
        documents: service.len(),
        dimension: service.dimension(),
    })
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(root_handler)))
       .service(web::resource("/ingest").route(web::post().to(ingest_handler)))
       .service(web::resource("/query").route(web::get().to(query_handler)))
       .service(web::resource("/stats").route(web::get().to(stats_handler)));
}
