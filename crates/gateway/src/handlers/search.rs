//! Integrated search handler

use axum::{extract::State, Json};
use std::sync::Arc;
use std::time::Instant;

use crate::AppState;
use tenderlens_common::{
    auth::{SessionContext, SCOPE_STAFF},
    errors::Result,
    metrics,
};
use tenderlens_search::{
    partition::today_local, ForwarderBackend, SearchController, SearchQuery, SearchSnapshot,
    SearchView,
};

/// Run one query against both upstreams and return the combined view
pub async fn search(
    State(state): State<AppState>,
    session: SessionContext,
    Json(query): Json<SearchQuery>,
) -> Result<Json<SearchSnapshot>> {
    session.require_scope(SCOPE_STAFF)?;
    let start = Instant::now();

    let backend = ForwarderBackend::new(state.contracts.clone(), state.research.clone());
    let controller = SearchController::new(Arc::new(backend), state.config.upstream_timeout());

    let view = controller.submit(&query).await.inspect_err(|_| {
        metrics::record_search(start.elapsed().as_secs_f64(), "invalid");
    })?;

    let outcome = outcome_label(&view);
    metrics::record_search(start.elapsed().as_secs_f64(), outcome);
    tracing::info!(
        session_id = %session.session_id,
        outcome,
        contracts = view.contracts.records().len(),
        research = view.research.records().len(),
        processing_time_ms = start.elapsed().as_millis() as u64,
        "Search completed"
    );

    Ok(Json(SearchSnapshot::from_view(&view, today_local())))
}

fn outcome_label(view: &SearchView) -> &'static str {
    match view.errors().len() {
        0 if view.is_empty() => "empty",
        0 => "success",
        1 => "partial",
        _ => "failed",
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::json;

    async fn configured_app(contracts_fail: bool) -> (Router, String) {
        let router = Router::new()
            .route(
                "/contracts",
                post(move || async move {
                    if contracts_fail {
                        return (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            Json(json!({ "message": "Workflow could not be started", "code": 0 })),
                        );
                    }
                    (
                        StatusCode::OK,
                        Json(json!({
                            "value": [
                                { "ctrt_name": "Old bridge", "end_date": "2001-01-01" },
                                { "contract_name": "New tunnel", "completion_date": "2999-12-31" }
                            ],
                            "Count": 2
                        })),
                    )
                }),
            )
            .route(
                "/research",
                post(|| async { Json(json!({ "content": "**Hanbit**\n- founded 1998" })) }),
            );
        let base = serve(router).await;

        let mut config = config();
        config.upstream.contracts_url = Some(format!("{}/contracts", base));
        config.upstream.research_url = Some(format!("{}/research", base));
        let (router, state) = app(config);
        (router, token(&state, STAFF_PASSWORD))
    }

    #[tokio::test]
    async fn test_integrated_search_combines_both_upstreams() {
        let (router, token) = configured_app(false).await;

        let response = send(
            &router,
            json_request("POST", "/api/search", Some(&token), Some(json!({ "corporationName": "(주)한빛" }))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["loading"], json!(false));
        assert_eq!(body["errors"], json!([]));
        assert_eq!(body["contracts"]["completed"][0]["contractName"], "Old bridge");
        assert_eq!(body["contracts"]["ongoing"][0]["contractName"], "New tunnel");
        assert_eq!(
            body["research"]["records"][0]["html"],
            "<p><strong>Hanbit</strong></p><ul><li>founded 1998</li></ul>"
        );
    }

    #[tokio::test]
    async fn test_one_upstream_failing_keeps_the_other() {
        let (router, token) = configured_app(true).await;

        let response = send(
            &router,
            json_request("POST", "/api/search", Some(&token), Some(json!({ "representativeName": "김철수" }))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["contracts"]["status"], "failed");
        assert_eq!(
            body["errors"],
            json!(["Contract search failed: Workflow could not be started"])
        );
        assert_eq!(body["research"]["status"], "success");
        assert_eq!(body["research"]["records"][0]["content"], "**Hanbit**\n- founded 1998");
    }

    #[tokio::test]
    async fn test_blank_query_is_400() {
        let (router, token) = configured_app(false).await;

        let response = send(
            &router,
            json_request(
                "POST",
                "/api/search",
                Some(&token),
                Some(json!({ "corporationName": " ", "representativeName": "" })),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["field"], "corporationName");
    }

    #[tokio::test]
    async fn test_search_requires_session() {
        let (router, _) = configured_app(false).await;
        let response = send(
            &router,
            json_request("POST", "/api/search", None, Some(json!({ "corporationName": "x" }))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
