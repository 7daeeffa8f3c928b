//! Health check handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub contracts: CheckResult,
    pub research: CheckResult,
    pub sessions: CheckResult,
    pub board: CheckResult,
}

#[derive(Serialize)]
pub struct CheckResult {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckResult {
    fn from_configured(configured: bool, missing: &str) -> Self {
        if configured {
            Self {
                status: "up".to_string(),
                error: None,
            }
        } else {
            Self {
                status: "down".to_string(),
                error: Some(format!("{} is not configured", missing)),
            }
        }
    }

    fn is_up(&self) -> bool {
        self.status == "up"
    }
}

/// Liveness probe - always returns healthy if server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: tenderlens_common::VERSION.to_string(),
    })
}

/// Readiness probe - checks that every collaborator is configured.
/// The board is reported but does not gate readiness.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let checks = HealthChecks {
        contracts: CheckResult::from_configured(state.contracts.is_configured(), "Contract search webhook"),
        research: CheckResult::from_configured(state.research.is_configured(), "Company research webhook"),
        sessions: CheckResult::from_configured(state.sessions.is_configured(), "Access password"),
        board: CheckResult::from_configured(state.board.is_some(), "Board backend"),
    };

    let ready = checks.contracts.is_up() && checks.research.is_up() && checks.sessions.is_up();
    let status = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        status,
        Json(ReadyResponse {
            status: if ready { "ready" } else { "not_ready" }.to_string(),
            checks,
        }),
    )
}
