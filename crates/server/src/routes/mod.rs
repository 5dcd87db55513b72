//! Route table.

pub(crate) mod docs;
pub(crate) mod health;
pub(crate) mod query;

use crate::rate_limit::{self, RateLimiter};
use crate::AppState;
use axum::{
    middleware,
    routing::{get, post, MethodRouter},
    Router,
};
use std::sync::Arc;

/// All API routes. `/retrieve`, `/debug-query` and `/query` carry the
/// state's rate limits when they are enabled.
pub fn api_routes(state: AppState) -> Router {
    let limits = state.limits.clone();
    let retrieve_limit = limits.as_ref().map(|l| l.retrieve.clone());
    let query_limit = limits.as_ref().map(|l| l.query.clone());

    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/retrieve",
            limited(post(query::retrieve_handler), retrieve_limit.clone()),
        )
        .route("/query", limited(post(query::query_handler), query_limit))
        .route(
            "/debug-query",
            limited(post(query::debug_query_handler), retrieve_limit),
        )
        .route("/api/docs", get(docs::list_docs_handler))
        .route("/api/docs/{filename}", get(docs::get_doc_handler))
        .with_state(state)
}

fn limited(
    route: MethodRouter<AppState>,
    limiter: Option<Arc<RateLimiter>>,
) -> MethodRouter<AppState> {
    match limiter {
        Some(limiter) => route.layer(middleware::from_fn_with_state(limiter, rate_limit::enforce)),
        None => route,
    }
}
