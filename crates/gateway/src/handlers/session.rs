//! Session gate handler

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::AppState;
use tenderlens_common::{
    auth::IssuedSession,
    errors::{AppError, Result},
    metrics,
};

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub password: String,
}

/// Exchange the shared password for a session token
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<IssuedSession>)> {
    match state.sessions.login(&request.password) {
        Ok(session) => {
            metrics::record_session_attempt("success");
            tracing::info!(scopes = ?session.scopes, "Session issued");
            Ok((StatusCode::OK, Json(session)))
        }
        Err(e) => {
            let result = match &e {
                AppError::InvalidPassword => "invalid_password",
                _ => "error",
            };
            metrics::record_session_attempt(result);
            Err(e)
        }
    }
}
