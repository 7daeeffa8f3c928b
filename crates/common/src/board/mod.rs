//! Feedback board backend client
//!
//! The board lives in a hosted PostgREST-style backend: one `posts` table
//! plus two stored procedures that check a post's password server side,
//! so the password never leaves the backend.

mod models;

pub use models::{NewPost, Post, PostChanges, PostSummary};

use crate::config::BoardConfig;
use crate::errors::{AppError, Result};
use reqwest::{Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use std::time::Duration;

const SUMMARY_COLUMNS: &str = "id,created_at,name,title,affiliation";
const POST_COLUMNS: &str = "id,created_at,name,title,content,affiliation,contact";

/// Client for the hosted board backend
pub struct BoardClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    table: String,
}

impl BoardClient {
    /// Create a client for `base_url` (without `/rest/v1`)
    pub fn new(base_url: &str, api_key: &str, table: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            client,
            base_url: format!("{}/rest/v1", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            table: table.to_string(),
        })
    }

    /// Build a client from configuration; `None` when the backend is not configured
    pub fn from_config(config: &BoardConfig) -> Result<Option<Self>> {
        match (config.url.as_deref(), config.api_key.as_deref()) {
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => {
                Self::new(url, key, &config.table).map(Some)
            }
            _ => Ok(None),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.base_url, path))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn execute<T: DeserializeOwned>(&self, operation: &str, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(|e| {
            tracing::error!(operation, error = %e, "Board backend request failed");
            AppError::BoardBackend {
                status: 0,
                message: "Board backend is unreachable".to_string(),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(operation, status = status.as_u16(), body = %body, "Board backend rejected request");
            return Err(AppError::BoardBackend {
                status: status.as_u16(),
                message: backend_message(&body),
            });
        }

        Ok(response.json().await?)
    }

    /// List posts, newest first, without their content
    pub async fn list_posts(&self) -> Result<Vec<PostSummary>> {
        let request = self
            .request(Method::GET, &self.table)
            .query(&[("select", SUMMARY_COLUMNS), ("order", "created_at.desc")]);

        self.execute("list_posts", request).await
    }

    /// Fetch one post with its content
    pub async fn get_post(&self, id: i64) -> Result<Post> {
        let request = self
            .request(Method::GET, &self.table)
            .query(&[("select", POST_COLUMNS.to_string()), ("id", format!("eq.{}", id))]);

        let rows: Vec<Post> = self.execute("get_post", request).await?;
        rows.into_iter().next().ok_or(AppError::PostNotFound { id })
    }

    /// Insert a post and return it
    pub async fn create_post(&self, post: &NewPost) -> Result<Post> {
        let request = self
            .request(Method::POST, &self.table)
            .query(&[("select", POST_COLUMNS)])
            .header("Prefer", "return=representation")
            .json(&[post]);

        let rows: Vec<Post> = self.execute("create_post", request).await?;
        rows.into_iter().next().ok_or_else(|| AppError::Internal {
            message: "Board backend returned no row for the new post".to_string(),
        })
    }

    /// Apply `changes` to a post and return the updated row
    pub async fn update_post(&self, id: i64, changes: &PostChanges) -> Result<Post> {
        let request = self
            .request(Method::PATCH, &self.table)
            .query(&[("select", POST_COLUMNS.to_string()), ("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(changes);

        let rows: Vec<Post> = self.execute("update_post", request).await?;
        rows.into_iter().next().ok_or(AppError::PostNotFound { id })
    }

    /// Delete a post unconditionally
    pub async fn delete_post(&self, id: i64) -> Result<()> {
        let request = self
            .request(Method::DELETE, &self.table)
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation");

        let rows: Vec<serde_json::Value> = self.execute("delete_post", request).await?;
        if rows.is_empty() {
            return Err(AppError::PostNotFound { id });
        }
        Ok(())
    }

    /// Ask the backend whether `password` matches the post's password
    pub async fn check_password(&self, id: i64, password: &str) -> Result<bool> {
        self.rpc(
            "check_post_password",
            &json!({ "post_id_to_check": id, "password_to_check": password }),
        )
        .await
    }

    /// Delete a post if `password` matches; `false` when it did not
    pub async fn delete_with_password(&self, id: i64, password: &str) -> Result<bool> {
        self.rpc(
            "delete_post_with_password",
            &json!({ "post_id_to_delete": id, "password_to_check": password }),
        )
        .await
    }

    async fn rpc<A: Serialize, T: DeserializeOwned>(&self, function: &str, args: &A) -> Result<T> {
        let request = self
            .request(Method::POST, &format!("rpc/{}", function))
            .json(args);

        self.execute(function, request).await
    }
}

/// Pull the human-readable message out of a backend error body
fn backend_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                "Board backend request failed".to_string()
            } else {
                body.to_string()
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, Query},
        http::{HeaderMap, StatusCode},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::Value;
    use std::collections::HashMap;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn row(id: i64) -> Value {
        json!({
            "id": id,
            "created_at": "2024-06-01T09:30:00+00:00",
            "name": "Park",
            "title": "Search is slow",
            "content": "It takes a minute",
            "affiliation": null,
            "contact": null
        })
    }

    #[test]
    fn test_from_config_requires_url_and_key() {
        let config = BoardConfig::default();
        assert!(BoardClient::from_config(&config).unwrap().is_none());

        let config = BoardConfig {
            url: Some("https://board.example".into()),
            api_key: Some("anon".into()),
            ..BoardConfig::default()
        };
        let client = BoardClient::from_config(&config).unwrap().unwrap();
        assert_eq!(client.base_url, "https://board.example/rest/v1");
    }

    #[tokio::test]
    async fn test_list_posts_sends_key_and_ordering() {
        let router = Router::new().route(
            "/rest/v1/posts",
            get(|headers: HeaderMap, Query(params): Query<HashMap<String, String>>| async move {
                assert_eq!(headers.get("apikey").unwrap(), "anon");
                assert_eq!(headers.get("authorization").unwrap(), "Bearer anon");
                assert_eq!(params.get("order").map(String::as_str), Some("created_at.desc"));
                assert!(!params["select"].contains("content"));
                Json(json!([
                    { "id": 2, "created_at": "2024-06-02T00:00:00Z", "name": "Kim", "title": "B", "affiliation": "Ops" },
                    { "id": 1, "created_at": "2024-06-01T00:00:00Z", "name": "Lee", "title": "A", "affiliation": null }
                ]))
            }),
        );
        let base = serve(router).await;
        let client = BoardClient::new(&base, "anon", "posts").unwrap();

        let posts = client.list_posts().await.unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, 2);
        assert_eq!(posts[1].affiliation, None);
    }

    #[tokio::test]
    async fn test_get_missing_post_is_not_found() {
        let router = Router::new().route("/rest/v1/posts", get(|| async { Json(json!([])) }));
        let base = serve(router).await;
        let client = BoardClient::new(&base, "anon", "posts").unwrap();

        let err = client.get_post(9).await.unwrap_err();
        assert!(matches!(err, AppError::PostNotFound { id: 9 }));
    }

    #[tokio::test]
    async fn test_rpc_password_checks() {
        let router = Router::new().route(
            "/rest/v1/rpc/{function}",
            post(|Path(function): Path<String>, Json(args): Json<Value>| async move {
                let ok = args["password_to_check"] == json!("1234");
                match function.as_str() {
                    "check_post_password" => assert_eq!(args["post_id_to_check"], json!(3)),
                    "delete_post_with_password" => assert_eq!(args["post_id_to_delete"], json!(3)),
                    other => panic!("unexpected rpc {}", other),
                }
                Json(json!(ok))
            }),
        );
        let base = serve(router).await;
        let client = BoardClient::new(&base, "anon", "posts").unwrap();

        assert!(client.check_password(3, "1234").await.unwrap());
        assert!(!client.check_password(3, "0000").await.unwrap());
        assert!(client.delete_with_password(3, "1234").await.unwrap());
    }

    #[tokio::test]
    async fn test_create_returns_representation() {
        let router = Router::new().route(
            "/rest/v1/posts",
            post(|headers: HeaderMap, Json(rows): Json<Vec<Value>>| async move {
                assert_eq!(headers.get("prefer").unwrap(), "return=representation");
                assert_eq!(rows[0]["password"], json!("1234"));
                (StatusCode::CREATED, Json(json!([row(5)])))
            }),
        );
        let base = serve(router).await;
        let client = BoardClient::new(&base, "anon", "posts").unwrap();

        let post = client
            .create_post(&NewPost {
                name: "Park".into(),
                title: "Search is slow".into(),
                content: "It takes a minute".into(),
                affiliation: None,
                contact: None,
                password: "1234".into(),
            })
            .await
            .unwrap();
        assert_eq!(post.id, 5);
    }

    #[tokio::test]
    async fn test_backend_error_message_is_surfaced() {
        let router = Router::new().route(
            "/rest/v1/posts",
            get(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "message": "Invalid API key" })),
                )
            }),
        );
        let base = serve(router).await;
        let client = BoardClient::new(&base, "wrong", "posts").unwrap();

        match client.list_posts().await.unwrap_err() {
            AppError::BoardBackend { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid API key");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_backend_message_fallbacks() {
        assert_eq!(backend_message(""), "Board backend request failed");
        assert_eq!(backend_message("gateway down"), "gateway down");
    }
}
