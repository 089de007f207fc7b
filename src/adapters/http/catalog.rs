//! HTTP adapter for the tree catalog.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::session::handle_engine_error;
use crate::application::Engine;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogVersionsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<String>,
    pub loaded: Vec<String>,
    pub available: Vec<String>,
}

/// GET /catalog/versions
pub async fn list_versions(State(engine): State<Engine>) -> Response {
    let available = match engine.catalog.available_versions().await {
        Ok(versions) => versions,
        Err(e) => return handle_engine_error(e),
    };
    let response = CatalogVersionsResponse {
        active: engine.catalog.active_version().await.map(|v| v.to_string()),
        loaded: engine
            .catalog
            .loaded_versions()
            .await
            .iter()
            .map(ToString::to_string)
            .collect(),
        available: available.iter().map(ToString::to_string).collect(),
    };
    (StatusCode::OK, Json(response)).into_response()
}

pub fn catalog_routes(engine: Engine) -> Router {
    Router::new()
        .route("/versions", get(list_versions))
        .with_state(engine)
}
