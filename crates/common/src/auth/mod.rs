//! Access gate and session tokens
//!
//! Provides:
//! - Password check against the shared staff secret and the board admin secret
//! - Signed, expiring session tokens (JWT)
//! - Session context extraction for handlers
//!
//! A session lives until its `exp` claim, `auth.session_ttl_secs` after it
//! was issued. When no signing secret is configured one is generated per
//! process, so all sessions end on restart.

use crate::config::AuthConfig;
use crate::errors::{AppError, Result};
use axum::{
    extract::{FromRef, FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

/// Scope granted by the staff password
pub const SCOPE_STAFF: &str = "staff";

/// Scope granted by the board admin password
pub const SCOPE_ADMIN: &str = "admin";

/// Authenticated session available to handlers
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Session ID
    pub session_id: String,

    /// Scopes/permissions
    pub scopes: Vec<String>,

    /// Expiration time
    pub expires_at: DateTime<Utc>,
}

impl SessionContext {
    /// Check if the session has a specific scope
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope || s == SCOPE_ADMIN)
    }

    /// Require a specific scope, returning error if not present
    pub fn require_scope(&self, scope: &str) -> Result<()> {
        if self.has_scope(scope) {
            Ok(())
        } else {
            Err(AppError::Forbidden {
                message: format!("Missing required scope: {}", scope),
            })
        }
    }

    pub fn is_admin(&self) -> bool {
        self.scopes.iter().any(|s| s == SCOPE_ADMIN)
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (session ID)
    pub sub: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Scopes
    #[serde(default)]
    pub scopes: Vec<String>,
}

/// Issued session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub scopes: Vec<String>,
}

/// Password gate and token manager
pub struct SessionManager {
    access_digest: Option<String>,
    admin_digest: Option<String>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: i64,
}

impl SessionManager {
    /// Build the manager from configuration
    pub fn from_config(config: &AuthConfig) -> Self {
        let secret = match config.session_secret.as_deref() {
            Some(secret) if !secret.is_empty() => secret.to_string(),
            _ => {
                tracing::warn!("No session secret configured, sessions will not survive restarts");
                generate_secret()
            }
        };

        Self {
            access_digest: config.access_password.as_deref().filter(|p| !p.is_empty()).map(digest),
            admin_digest: config.admin_password.as_deref().filter(|p| !p.is_empty()).map(digest),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs: config.session_ttl_secs as i64,
        }
    }

    /// Whether any password is configured at all
    pub fn is_configured(&self) -> bool {
        self.access_digest.is_some() || self.admin_digest.is_some()
    }

    /// Check `password` and issue a session for the scopes it unlocks
    pub fn login(&self, password: &str) -> Result<IssuedSession> {
        if !self.is_configured() {
            return Err(AppError::Configuration {
                message: "Access password is not configured".to_string(),
            });
        }

        let submitted = digest(password);
        let mut scopes = Vec::new();
        if self.access_digest.as_deref() == Some(submitted.as_str()) {
            scopes.push(SCOPE_STAFF.to_string());
        }
        if self.admin_digest.as_deref() == Some(submitted.as_str()) {
            scopes.push(SCOPE_ADMIN.to_string());
        }

        if scopes.is_empty() {
            return Err(AppError::InvalidPassword);
        }

        self.issue(scopes)
    }

    /// Generate a new token for `scopes`
    pub fn issue(&self, scopes: Vec<String>) -> Result<IssuedSession> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.ttl_secs);

        let claims = SessionClaims {
            sub: Uuid::new_v4().to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            scopes: scopes.clone(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal {
                message: format!("Failed to generate token: {}", e),
            })?;

        Ok(IssuedSession {
            token,
            expires_at: exp,
            scopes,
        })
    }

    /// Validate and decode a session token
    pub fn validate(&self, token: &str) -> Result<SessionContext> {
        let claims = decode::<SessionClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::ExpiredToken,
                _ => AppError::InvalidToken,
            })?;

        Ok(SessionContext {
            session_id: claims.sub,
            scopes: claims.scopes,
            expires_at: DateTime::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now),
        })
    }
}

/// Hash a password for comparison
fn digest(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn generate_secret() -> String {
    let random_bytes: [u8; 32] = rand::random();
    hex::encode(random_bytes)
}

/// Extract the token from an Authorization header
pub fn extract_bearer(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ").map(str::trim).filter(|t| !t.is_empty())
}

fn bearer_from_parts(parts: &Parts) -> Option<Result<&str>> {
    let header = parts.headers.get(axum::http::header::AUTHORIZATION)?;
    Some(
        header
            .to_str()
            .ok()
            .and_then(extract_bearer)
            .ok_or(AppError::InvalidToken),
    )
}

/// Axum extractor for a required session
impl<S> FromRequestParts<S> for SessionContext
where
    Arc<SessionManager>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let token = bearer_from_parts(parts).ok_or_else(|| AppError::Unauthorized {
            message: "Missing Authorization header".to_string(),
        })??;

        Arc::<SessionManager>::from_ref(state).validate(token)
    }
}

/// Axum extractor for an optional session; a present but bad token still fails
impl<S> OptionalFromRequestParts<S> for SessionContext
where
    Arc<SessionManager>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Option<Self>> {
        match bearer_from_parts(parts) {
            None => Ok(None),
            Some(token) => Arc::<SessionManager>::from_ref(state).validate(token?).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(ttl_secs: u64) -> SessionManager {
        SessionManager::from_config(&AuthConfig {
            access_password: Some("staff-secret".into()),
            admin_password: Some("admin-secret".into()),
            session_secret: Some("test_secret".into()),
            session_ttl_secs: ttl_secs,
        })
    }

    #[test]
    fn test_staff_login_roundtrip() {
        let manager = manager(3600);
        let session = manager.login("staff-secret").unwrap();
        assert_eq!(session.scopes, vec![SCOPE_STAFF.to_string()]);

        let context = manager.validate(&session.token).unwrap();
        assert!(context.has_scope(SCOPE_STAFF));
        assert!(!context.is_admin());
        tokio_test::assert_err!(context.require_scope(SCOPE_ADMIN));
        tokio_test::assert_ok!(context.require_scope(SCOPE_STAFF));
    }

    #[test]
    fn test_admin_implies_every_scope() {
        let manager = manager(3600);
        let session = manager.login("admin-secret").unwrap();
        let context = manager.validate(&session.token).unwrap();
        assert!(context.is_admin());
        assert!(context.has_scope(SCOPE_STAFF));
    }

    #[test]
    fn test_wrong_password_rejected() {
        let manager = manager(3600);
        assert!(matches!(manager.login("guess"), Err(AppError::InvalidPassword)));
        assert!(matches!(manager.login(""), Err(AppError::InvalidPassword)));
    }

    #[test]
    fn test_unconfigured_gate() {
        let manager = SessionManager::from_config(&AuthConfig::default());
        assert!(!manager.is_configured());
        assert!(matches!(
            manager.login("anything"),
            Err(AppError::Configuration { .. })
        ));
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let issued = manager(3600).login("staff-secret").unwrap();
        let other = SessionManager::from_config(&AuthConfig {
            access_password: Some("staff-secret".into()),
            session_secret: Some("another_secret".into()),
            ..AuthConfig::default()
        });
        assert!(matches!(other.validate(&issued.token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_expired_token() {
        let manager = manager(3600);
        let now = Utc::now();
        let claims = SessionClaims {
            sub: "old".into(),
            exp: (now - Duration::hours(2)).timestamp(),
            iat: (now - Duration::hours(3)).timestamp(),
            scopes: vec![SCOPE_STAFF.into()],
        };
        let token = encode(&Header::default(), &claims, &manager.encoding_key).unwrap();
        assert!(matches!(manager.validate(&token), Err(AppError::ExpiredToken)));
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer("Bearer "), None);
        assert_eq!(extract_bearer("Basic abc"), None);
    }
}
