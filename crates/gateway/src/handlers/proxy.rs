//! Webhook proxy handlers
//!
//! These routes answer with the proxy reply contract itself, not the
//! `AppError` envelope, once the session check has passed.

use axum::{body::Bytes, extract::State};
use serde_json::Value;

use crate::AppState;
use tenderlens_common::{
    auth::{SessionContext, SCOPE_STAFF},
    errors::Result,
    ProxyReply, WebhookForwarder,
};

/// Proxy A: contract award records
pub async fn search_first(
    State(state): State<AppState>,
    session: SessionContext,
    body: Bytes,
) -> Result<ProxyReply> {
    session.require_scope(SCOPE_STAFF)?;
    Ok(relay(&state.contracts, &body).await)
}

/// Proxy B: company research summaries
pub async fn search_second(
    State(state): State<AppState>,
    session: SessionContext,
    body: Bytes,
) -> Result<ProxyReply> {
    session.require_scope(SCOPE_STAFF)?;
    Ok(relay(&state.research, &body).await)
}

async fn relay(forwarder: &WebhookForwarder, body: &[u8]) -> ProxyReply {
    match serde_json::from_slice::<Value>(body) {
        Ok(value) => forwarder.forward(&value).await,
        // An unconfigured upstream is reported before the body matters
        Err(_) if !forwarder.is_configured() => forwarder.forward(&Value::Null).await,
        Err(e) => {
            tracing::warn!(upstream = forwarder.kind().as_str(), error = %e, "Request body is not JSON");
            ProxyReply::internal()
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};

    async fn webhook() -> String {
        let router = Router::new()
            .route(
                "/contracts",
                post(|Json(body): Json<Value>| async move {
                    Json(json!({ "value": [{ "ctrt_name": body["corporationName"] }], "Count": 1 }))
                }),
            )
            .route(
                "/research",
                post(|| async {
                    (
                        StatusCode::NOT_FOUND,
                        Json(json!({ "message": "No item to return got found" })),
                    )
                }),
            );
        serve(router).await
    }

    async fn configured_app() -> (Router, String) {
        let base = webhook().await;
        let mut config = config();
        config.upstream.contracts_url = Some(format!("{}/contracts", base));
        config.upstream.research_url = Some(format!("{}/research", base));
        let (router, state) = app(config);
        (router, token(&state, STAFF_PASSWORD))
    }

    #[tokio::test]
    async fn test_proxy_requires_session() {
        let (router, _) = configured_app().await;

        let response = send(
            &router,
            json_request("POST", "/api/search-first", None, Some(json!({}))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(
            &router,
            json_request("POST", "/api/search-first", Some("not-a-token"), Some(json!({}))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_enhanced_proxy_unwraps_envelope() {
        let (router, token) = configured_app().await;

        let response = send(
            &router,
            json_request(
                "POST",
                "/api/search-first",
                Some(&token),
                Some(json!({ "corporationName": "한빛건설", "representativeName": "", "corporationNumber": "" })),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!([{ "ctrt_name": "한빛건설" }]));
    }

    #[tokio::test]
    async fn test_sentinel_becomes_empty_list() {
        let (router, token) = configured_app().await;

        let response = send(
            &router,
            json_request("POST", "/api/search-second", Some(&token), Some(json!({}))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!([]));
    }

    #[tokio::test]
    async fn test_non_json_body_is_internal_error() {
        let (router, token) = configured_app().await;

        let request = Request::builder()
            .method("POST")
            .uri("/api/search-first")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::from("not json"))
            .unwrap();
        let response = send(&router, request).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "An internal server error occurred" })
        );
    }

    #[tokio::test]
    async fn test_unconfigured_upstream_is_reported() {
        let (router, state) = app(config());
        let token = token(&state, STAFF_PASSWORD);

        let response = send(
            &router,
            json_request("POST", "/api/search-second", Some(&token), Some(json!({}))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "Company research webhook URL is not configured" })
        );
    }
}
