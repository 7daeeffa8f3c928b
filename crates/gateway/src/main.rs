//! TenderLens API Gateway
//!
//! The single HTTP entry point of the dashboard.
//! Handles:
//! - The session gate for the shared staff password
//! - Webhook proxy routes for both search upstreams
//! - The integrated search returning one combined view
//! - The feedback board API over the hosted backend
//! - Observability (logging, metrics, request ids)

mod handlers;

use axum::{
    extract::FromRef,
    routing::{get, post, put},
    Router,
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tenderlens_common::{
    auth::SessionManager,
    board::BoardClient,
    config::{AppConfig, ObservabilityConfig},
    metrics, UpstreamKind, WebhookForwarder,
};
use tokio::{signal, sync::watch};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: Arc<SessionManager>,
    pub contracts: Arc<WebhookForwarder>,
    pub research: Arc<WebhookForwarder>,
    pub board: Option<Arc<BoardClient>>,
}

impl AppState {
    pub fn from_config(config: AppConfig) -> tenderlens_common::Result<Self> {
        let timeout = config.upstream_timeout();
        let contracts = WebhookForwarder::new(
            UpstreamKind::Contracts,
            config.upstream.contracts_url.clone(),
            timeout,
        )?;
        let research = WebhookForwarder::new(
            UpstreamKind::Research,
            config.upstream.research_url.clone(),
            timeout,
        )?;
        let board = BoardClient::from_config(&config.board)?.map(Arc::new);

        Ok(Self {
            sessions: Arc::new(SessionManager::from_config(&config.auth)),
            contracts: Arc::new(contracts),
            research: Arc::new(research),
            board,
            config: Arc::new(config),
        })
    }
}

impl FromRef<AppState> for Arc<SessionManager> {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = match std::env::var("APP_CONFIG_FILE") {
        Ok(path) => AppConfig::from_file(&path)?,
        Err(_) => AppConfig::load()?,
    };

    init_tracing(&config.observability);
    info!(
        service = %config.observability.service_name,
        "Starting TenderLens API Gateway v{}",
        tenderlens_common::VERSION
    );

    // Initialize metrics
    if config.observability.metrics_port != 0 {
        let metrics_addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                metrics::UPSTREAM_BUCKETS,
            )?
            .install()?;
        info!("Metrics exporter listening on {}", metrics_addr);
    }
    metrics::register_metrics();

    let state = AppState::from_config(config)?;
    log_configuration(&state);

    let config = state.config.clone();
    let app = create_router(state);

    // Start the server
    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    info!("Listening on {}", listener.local_addr()?);

    let (stop_tx, stop_rx) = watch::channel(false);
    let mut drain_rx = stop_rx.clone();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = drain_rx.wait_for(|stop| *stop).await;
    });

    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = stop_tx.send(true);
    });

    // Open connections get a bounded grace period once shutdown starts
    let grace = config.shutdown_timeout();
    let mut deadline_rx = stop_rx;
    tokio::select! {
        result = server.into_future() => result?,
        _ = async {
            let _ = deadline_rx.wait_for(|stop| *stop).await;
            tokio::time::sleep(grace).await;
        } => warn!(?grace, "Shutdown grace period elapsed, dropping open connections"),
    }

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(observability: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&observability.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if observability.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Warn about collaborators that will fail every request
fn log_configuration(state: &AppState) {
    for forwarder in [&state.contracts, &state.research] {
        if !forwarder.is_configured() {
            warn!(upstream = forwarder.kind().as_str(), "Webhook URL is not configured");
        }
    }
    if !state.sessions.is_configured() {
        warn!("No access password configured, sessions cannot be issued");
    }
    if state.board.is_none() {
        warn!("Board backend is not configured");
    }
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // API routes
    let api_routes = Router::new()
        // Session gate (no auth)
        .route("/session", post(handlers::session::create_session))

        // Webhook proxies
        .route("/search-first", post(handlers::proxy::search_first))
        .route("/search-second", post(handlers::proxy::search_second))

        // Integrated search
        .route("/search", post(handlers::search::search))

        // Feedback board
        .route(
            "/board/posts",
            get(handlers::board::list_posts).post(handlers::board::create_post),
        )
        .route(
            "/board/posts/{id}",
            put(handlers::board::update_post).delete(handlers::board::delete_post),
        )
        .route("/board/posts/{id}/view", post(handlers::board::view_post));

    // Compose the app; the request id is set before it is propagated
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, Response},
    };
    use serde_json::Value;
    use tenderlens_common::config::AuthConfig;
    use tower::ServiceExt;

    pub const STAFF_PASSWORD: &str = "staff-secret";
    pub const ADMIN_PASSWORD: &str = "admin-secret";

    /// Config with both passwords set and no upstreams or board
    pub fn config() -> AppConfig {
        AppConfig {
            auth: AuthConfig {
                access_password: Some(STAFF_PASSWORD.into()),
                admin_password: Some(ADMIN_PASSWORD.into()),
                session_secret: Some("test-secret".into()),
                ..AuthConfig::default()
            },
            ..AppConfig::default()
        }
    }

    pub fn app(config: AppConfig) -> (Router, AppState) {
        let state = AppState::from_config(config).unwrap();
        (create_router(state.clone()), state)
    }

    pub fn token(state: &AppState, password: &str) -> String {
        state.sessions.login(password).unwrap().token
    }

    /// Serve `router` on an ephemeral port and return its base URL
    pub async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
        router.clone().oneshot(request).await.unwrap()
    }

    pub async fn body_json(response: Response<Body>) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_health_sets_request_id() {
        let (router, _) = app(config());

        let response = send(&router, json_request("GET", "/health", None, None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));

        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_incoming_request_id_is_kept() {
        let (router, _) = app(config());

        let mut request = json_request("GET", "/health", None, None);
        request.headers_mut().insert("x-request-id", "abc-123".parse().unwrap());

        let response = send(&router, request).await;
        assert_eq!(response.headers().get("x-request-id").unwrap(), "abc-123");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let (router, _) = app(config());
        let response = send(&router, json_request("GET", "/api/nowhere", None, None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
