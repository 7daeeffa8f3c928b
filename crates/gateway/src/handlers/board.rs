//! Feedback board handlers
//!
//! Reading, editing and deleting a post needs that post's password, checked
//! by the backend. Admin sessions skip the check.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{de::DeserializeOwned, Deserialize};
use validator::Validate;

use crate::AppState;
use tenderlens_common::{
    auth::SessionContext,
    board::{BoardClient, NewPost, Post, PostChanges, PostSummary},
    errors::{AppError, Result},
    metrics,
};

/// Body of view and delete requests
#[derive(Debug, Default, Deserialize)]
pub struct PasswordRequest {
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    /// Current password, not needed for admins
    pub password: Option<String>,
    /// Replaces the stored password when present
    pub new_password: Option<String>,
    pub name: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub affiliation: Option<String>,
    pub contact: Option<String>,
}

impl UpdatePostRequest {
    fn into_changes(self) -> PostChanges {
        PostChanges {
            name: self.name,
            title: self.title,
            content: self.content,
            affiliation: self.affiliation,
            contact: self.contact,
            password: self.new_password.filter(|p| !p.is_empty()),
        }
    }
}

/// List posts, newest first, without content
pub async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<PostSummary>>> {
    let board = board(&state)?;
    let posts = recorded("list", board.list_posts().await)?;
    Ok(Json(posts))
}

/// Create a post
pub async fn create_post(
    State(state): State<AppState>,
    Json(request): Json<NewPost>,
) -> Result<(StatusCode, Json<Post>)> {
    request.validate()?;
    let board = board(&state)?;

    let post = recorded("create", board.create_post(&request).await)?;
    tracing::info!(post_id = post.id, "Board post created");

    Ok((StatusCode::CREATED, Json(post)))
}

/// Unlock one post's content
pub async fn view_post(
    State(state): State<AppState>,
    session: Option<SessionContext>,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<Json<Post>> {
    let request: PasswordRequest = optional_body(&body)?;
    let board = board(&state)?;

    authorize(board, session.as_ref(), id, request.password.as_deref()).await?;
    let post = recorded("view", board.get_post(id).await)?;

    Ok(Json(post))
}

/// Edit a post
pub async fn update_post(
    State(state): State<AppState>,
    session: Option<SessionContext>,
    Path(id): Path<i64>,
    Json(request): Json<UpdatePostRequest>,
) -> Result<Json<Post>> {
    let board = board(&state)?;
    let password = request.password.clone();
    let changes = request.into_changes();
    changes.validate()?;
    if changes.is_empty() {
        return Err(AppError::Validation {
            message: "Nothing to update".to_string(),
            field: None,
        });
    }

    authorize(board, session.as_ref(), id, password.as_deref()).await?;
    let post = recorded("update", board.update_post(id, &changes).await)?;
    tracing::info!(post_id = id, password_changed = changes.password.is_some(), "Board post updated");

    Ok(Json(post))
}

/// Delete a post
pub async fn delete_post(
    State(state): State<AppState>,
    session: Option<SessionContext>,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<StatusCode> {
    let request: PasswordRequest = optional_body(&body)?;
    let board = board(&state)?;

    if session.as_ref().is_some_and(SessionContext::is_admin) {
        recorded("delete", board.delete_post(id).await)?;
    } else {
        let password = required_password(request.password.as_deref())?;
        if !recorded("delete", board.delete_with_password(id, password).await)? {
            return Err(wrong_password());
        }
    }

    tracing::info!(post_id = id, "Board post deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn board(state: &AppState) -> Result<&BoardClient> {
    state.board.as_deref().ok_or_else(|| AppError::Configuration {
        message: "Board backend is not configured".to_string(),
    })
}

/// Admins pass; everyone else needs the post's password
async fn authorize(
    board: &BoardClient,
    session: Option<&SessionContext>,
    id: i64,
    password: Option<&str>,
) -> Result<()> {
    if session.is_some_and(SessionContext::is_admin) {
        return Ok(());
    }

    let password = required_password(password)?;
    if recorded("check_password", board.check_password(id, password).await)? {
        Ok(())
    } else {
        Err(wrong_password())
    }
}

fn required_password(password: Option<&str>) -> Result<&str> {
    password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::MissingField {
            field: "password".to_string(),
        })
}

fn wrong_password() -> AppError {
    AppError::Forbidden {
        message: "Password does not match".to_string(),
    }
}

/// Parse a JSON body that may be absent entirely
fn optional_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::InvalidFormat {
        message: e.to_string(),
    })
}

fn recorded<T>(operation: &str, result: Result<T>) -> Result<T> {
    metrics::record_board_operation(operation, result.is_ok());
    result
}
