//! HTTP adapter - thin JSON binding of the engine handlers.
//!
//! No authentication or UI; the hosting layer sits in front of this.

pub mod catalog;
pub mod profile;
pub mod session;

pub use catalog::{catalog_routes, CatalogVersionsResponse};
pub use profile::profile_routes;
pub use session::session_routes;

use axum::Router;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::application::Engine;

/// Full API router with request tracing and a request timeout.
pub fn api_router(engine: Engine, request_timeout: Duration) -> Router {
    Router::new()
        .nest("/sessions", session_routes(engine.clone()))
        .nest("/users", profile_routes(engine.clone()))
        .nest("/catalog", catalog_routes(engine))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::Harness;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn send(router: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn router() -> (Harness, Router) {
        let h = Harness::new().await;
        let router = api_router(h.engine.clone(), Duration::from_secs(5));
        (h, router)
    }

    #[tokio::test]
    async fn start_without_plan_is_412_with_escalation_fallback() {
        let (_h, router) = router().await;
        let (status, body) = send(router, "POST", "/sessions", Some(json!({"user_id": "user-1"}))).await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
        assert_eq!(body["code"], "SAFETY_PLAN_MISSING");
        assert_eq!(body["fallback"], "show_escalation_path");
    }

    #[tokio::test]
    async fn full_flow_over_http() {
        let (h, router) = router().await;
        h.give_valid_plan().await;

        let (status, started) =
            send(router.clone(), "POST", "/sessions", Some(json!({"user_id": "user-1"}))).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = started["session"]["session_id"].as_str().unwrap().to_string();
        assert_eq!(started["prompt"], "What is happening right now?");

        let (status, stepped) = send(
            router.clone(),
            "POST",
            &format!("/sessions/{id}/inputs"),
            Some(json!({
                "input": {"intensity": "3", "tags": ["impulsive-urge", "time-available=short"]},
                "expected_node": "root"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stepped["outcome"]["status"], "recommended");
        assert_eq!(stepped["outcome"]["recommendation"]["skill_id"], "tipp");

        let (status, reported) = send(
            router.clone(),
            "POST",
            &format!("/sessions/{id}/outcome"),
            Some(json!({"helped": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reported["session"]["outcome"]["helped"], true);

        let (status, report) =
            send(router.clone(), "GET", &format!("/sessions/{id}/replay"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["reproduced"], true);

        let (status, view) = send(router, "GET", &format!("/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["state"], "completed");
        assert_eq!(view["trail"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn garbage_input_is_not_a_hard_failure() {
        let (h, router) = router().await;
        h.give_valid_plan().await;
        let (_, started) =
            send(router.clone(), "POST", "/sessions", Some(json!({"user_id": "user-1"}))).await;
        let id = started["session"]["session_id"].as_str().unwrap().to_string();

        let (status, stepped) = send(
            router,
            "POST",
            &format!("/sessions/{id}/inputs"),
            Some(json!({"input": ["not", "an", "object"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(stepped["outcome"]["status"].is_string());
    }

    #[tokio::test]
    async fn recorder_outage_is_503_try_again() {
        let (h, router) = router().await;
        h.give_valid_plan().await;
        let (_, started) =
            send(router.clone(), "POST", "/sessions", Some(json!({"user_id": "user-1"}))).await;
        let id = started["session"]["session_id"].as_str().unwrap().to_string();
        h.recorder.set_unavailable(true);

        let (status, body) = send(
            router,
            "POST",
            &format!("/sessions/{id}/inputs"),
            Some(json!({"input": {"intensity": 2, "tags": ["rumination"]}})),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["fallback"], "try_again");
        assert_eq!(body["retriable"], true);
    }

    #[tokio::test]
    async fn abort_without_body_uses_default_reason() {
        let (h, router) = router().await;
        h.give_valid_plan().await;
        let (_, started) =
            send(router.clone(), "POST", "/sessions", Some(json!({"user_id": "user-1"}))).await;
        let id = started["session"]["session_id"].as_str().unwrap().to_string();

        let (status, body) = send(router, "POST", &format!("/sessions/{id}/abort"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["applied"], true);
        assert_eq!(body["session"]["abort_reason"], "aborted by host");
    }

    #[tokio::test]
    async fn invalid_session_id_is_400() {
        let (_h, router) = router().await;
        let (status, body) = send(router, "GET", "/sessions/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_FAILED");
    }

    #[tokio::test]
    async fn onboarding_over_http_unblocks_sessions() {
        let (_h, router) = router().await;

        let (status, saved) = send(
            router.clone(),
            "PUT",
            "/users/user-1/safety-plan",
            Some(json!({"warning_signs": ["racing thoughts"], "coping_strategies": ["ice"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved["check"]["valid"], false);
        assert_eq!(saved["check"]["problem"]["kind"], "too_few_coping_strategies");
        let (status, _) =
            send(router.clone(), "POST", "/sessions", Some(json!({"user_id": "user-1"}))).await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);

        let (status, saved) = send(
            router.clone(),
            "PUT",
            "/users/user-1/safety-plan",
            Some(json!({
                "warning_signs": ["racing thoughts"],
                "coping_strategies": ["ice", "walk", "call Sam"],
                "support_contacts": [{"name": "Sam", "phone": "555-0100"}]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved["check"]["valid"], true);

        let (status, prefs) = send(
            router.clone(),
            "PUT",
            "/users/user-1/preferences",
            Some(json!({"accessibility": ["cardiac-condition"], "modality": "stillness"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(prefs["context_version"], 1);

        let (status, profile) = send(router.clone(), "GET", "/users/user-1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["preferences"]["accessibility"], json!(["cardiac-condition"]));
        assert_eq!(profile["safety_plan_check"]["valid"], true);
        assert_eq!(profile["safety_plan"]["support_contacts"][0]["name"], "Sam");

        let (status, _) = send(router, "POST", "/sessions", Some(json!({"user_id": "user-1"}))).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn unknown_accessibility_need_is_rejected() {
        let (h, router) = router().await;
        let (status, _) = send(
            router,
            "PUT",
            "/users/user-1/preferences",
            Some(json!({"accessibility": ["teleportation"]})),
        )
        .await;
        assert!(status.is_client_error());
        assert!(h.contexts.get(&crate::application::test_support::user()).await.is_none());
    }

    #[tokio::test]
    async fn catalog_versions_lists_active() {
        let (_h, router) = router().await;
        let (status, body) = send(router, "GET", "/catalog/versions", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["active"], "test-v1");
        assert_eq!(body["available"], json!(["test-v1"]));
    }
}
