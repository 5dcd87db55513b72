//! Retrieval and answering endpoints.

use crate::error::ApiResult;
use crate::types::{
    ChunkResult, DebugChunk, DebugQueryResponse, QueryRequest, QueryResponse, RetrieveResponse,
};
use crate::AppState;
use axum::{extract::rejection::JsonRejection, extract::State, Json};

pub async fn retrieve_handler(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> ApiResult<Json<RetrieveResponse>> {
    let Json(req) = payload?;
    let result = state.service.retrieve(&req.query, req.top_k).await?;

    Ok(Json(RetrieveResponse {
        results: result.chunks.iter().map(ChunkResult::from).collect(),
    }))
}

pub async fn query_handler(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> ApiResult<Json<QueryResponse>> {
    let Json(req) = payload?;
    let answer = state.service.query(&req.query, req.top_k).await?;

    Ok(Json(QueryResponse::from(answer)))
}

/// Retrieval diagnostics: chunk id, section, position, score and preview.
pub async fn debug_query_handler(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> ApiResult<Json<DebugQueryResponse>> {
    let Json(req) = payload?;
    let hits = state.service.debug_retrieve(&req.query, req.top_k).await?;

    Ok(Json(DebugQueryResponse {
        query: req.query,
        results: hits.into_iter().map(DebugChunk::from).collect(),
    }))
}
