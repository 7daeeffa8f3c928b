//! TenderLens Common Library
//!
//! Shared code for the TenderLens services including:
//! - Error types and handling
//! - Configuration management
//! - Session gate for the shared access secret
//! - Webhook request proxy for the search upstreams
//! - Feedback board backend client
//! - Metrics and observability

pub mod auth;
pub mod board;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod upstream;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use upstream::{ProxyReply, UpstreamKind, WebhookForwarder};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Message the automation upstreams use to report zero results
pub const NO_RESULTS_SENTINEL: &str = "No item to return got found";
