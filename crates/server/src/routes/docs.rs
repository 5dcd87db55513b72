//! Raw markdown access for the frontend.

use crate::error::ApiResult;
use crate::types::DocumentResponse;
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};

pub async fn list_docs_handler(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(state.service.list_documents()?))
}

pub async fn get_doc_handler(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<Json<DocumentResponse>> {
    let document = state.service.document(&filename)?;

    Ok(Json(DocumentResponse {
        filename,
        content: document.body,
    }))
}
