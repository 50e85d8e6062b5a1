//! HTTP query endpoints (feature `http`).
//!
//! | Route | Method | Answers with |
//! |-------|--------|--------------|
//! | `/api/similarity` | GET | `{nodes, links}` co-occurrence graph |
//! | `/api/shared-asvs` | GET | `[{neighbor, sequences}]` |
//! | `/api/nearby` | GET | samples within the radius |
//! | `/api/nearby/profile` | GET | aggregated ASV profile + taxonomy |
//! | `/api/samples` | GET | newest samples |
//! | `/api/categories` | GET | distinct biome / env_feature values |
//! | `/api/asv-profile` | POST | taxonomy for `{"asvSeqs": [...]}` |
//! | `/api/taxonomy` | GET | lookup by `asvSeq` or search by `query` |
//!
//! Errors come back as `{"error": message}` with 400 for bad input, 404 for
//! unknown ids, 504 for store timeouts and 500 otherwise.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use tracing::{error, info};

use crate::export::ForceGraph;
use crate::model::*;
use crate::query::*;
use crate::storage::SampleStore;
use crate::taxonomy::TaxonomyStore;
use crate::{Engine, Error, NearbyProfile, Result};

type SharedEngine<B, T> = Arc<Engine<B, T>>;

/// Build the API router over a shared engine.
pub fn router<B: SampleStore, T: TaxonomyStore>(engine: SharedEngine<B, T>) -> Router {
    Router::new()
        .route("/api/similarity", get(similarity_handler::<B, T>))
        .route("/api/shared-asvs", get(shared_asvs_handler::<B, T>))
        .route("/api/nearby", get(nearby_handler::<B, T>))
        .route("/api/nearby/profile", get(nearby_profile_handler::<B, T>))
        .route("/api/samples", get(samples_handler::<B, T>))
        .route("/api/categories", get(categories_handler::<B, T>))
        .route("/api/asv-profile", post(asv_profile_handler::<B, T>))
        .route("/api/taxonomy", get(taxonomy_handler::<B, T>))
        .with_state(engine)
}

/// Bind `addr` and serve until the listener fails.
pub async fn serve<B: SampleStore, T: TaxonomyStore>(
    engine: SharedEngine<B, T>,
    addr: &str,
) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "similarity API listening");
    axum::serve(listener, router(engine)).await?;
    Ok(())
}

// ============================================================================
// Errors
// ============================================================================

/// An engine error on its way out as an HTTP response.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::UnknownIdentifier(_) => StatusCode::NOT_FOUND,
            Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Error::StorageError(_) | Error::Serialization(_) | Error::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

// ============================================================================
// Handlers
// ============================================================================

async fn similarity_handler<B: SampleStore, T: TaxonomyStore>(
    State(engine): State<SharedEngine<B, T>>,
    Query(params): Query<QueryParams>,
) -> ApiResult<ForceGraph> {
    let query = GraphQuery::from_params(&params, engine.config())?;
    let graph = engine.similarity_graph(&query).await?;
    Ok(Json(ForceGraph::from(&graph)))
}

async fn shared_asvs_handler<B: SampleStore, T: TaxonomyStore>(
    State(engine): State<SharedEngine<B, T>>,
    Query(params): Query<QueryParams>,
) -> ApiResult<Vec<NeighborShare>> {
    let query = NeighborQuery::from_params(&params)?;
    Ok(Json(engine.neighbor_shares(&query).await?))
}

async fn nearby_handler<B: SampleStore, T: TaxonomyStore>(
    State(engine): State<SharedEngine<B, T>>,
    Query(params): Query<QueryParams>,
) -> ApiResult<Vec<Sample>> {
    let query = ProximityQuery::from_params(&params, engine.config())?;
    Ok(Json(engine.nearby(&query).await?))
}

async fn nearby_profile_handler<B: SampleStore, T: TaxonomyStore>(
    State(engine): State<SharedEngine<B, T>>,
    Query(params): Query<QueryParams>,
) -> ApiResult<NearbyProfile> {
    let query = ProximityQuery::from_params(&params, engine.config())?;
    Ok(Json(engine.nearby_profile(&query).await?))
}

async fn samples_handler<B: SampleStore, T: TaxonomyStore>(
    State(engine): State<SharedEngine<B, T>>,
    Query(params): Query<QueryParams>,
) -> ApiResult<Vec<Sample>> {
    let limit = params.get("limit").and_then(|v| v.trim().parse().ok());
    Ok(Json(engine.recent_samples(limit).await?))
}

async fn categories_handler<B: SampleStore, T: TaxonomyStore>(
    State(engine): State<SharedEngine<B, T>>,
    Query(params): Query<QueryParams>,
) -> ApiResult<Vec<String>> {
    let field = match params.get("field").map(|v| v.trim()) {
        None | Some("") | Some("biome") => CategoryField::Biome,
        Some("env_feature") | Some("feature") => CategoryField::EnvFeature,
        Some(other) => {
            return Err(Error::InvalidInput(format!("unknown category field {other:?}")).into());
        }
    };
    Ok(Json(engine.categories(field).await?))
}

async fn asv_profile_handler<B: SampleStore, T: TaxonomyStore>(
    State(engine): State<SharedEngine<B, T>>,
    Json(query): Json<TaxonomyQuery>,
) -> ApiResult<BTreeMap<FeatureId, Option<TaxonomyRecord>>> {
    Ok(Json(engine.resolve_taxonomy(&query).await?))
}

async fn taxonomy_handler<B: SampleStore, T: TaxonomyStore>(
    State(engine): State<SharedEngine<B, T>>,
    Query(params): Query<QueryParams>,
) -> ApiResult<serde_json::Value> {
    if let Some(seq) = params.get("asvSeq").map(|v| v.trim()).filter(|v| !v.is_empty()) {
        let record = engine.taxonomy_of(&FeatureId::from(seq)).await?;
        return Ok(Json(serde_json::to_value(record).map_err(Error::from)?));
    }
    if let Some(text) = params.get("query") {
        let hits = engine.search_taxonomy(text).await?;
        return Ok(Json(serde_json::to_value(hits).map_err(Error::from)?));
    }
    Err(Error::InvalidInput("expected 'asvSeq' or 'query'".into()).into())
}
