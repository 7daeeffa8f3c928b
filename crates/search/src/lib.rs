//! TenderLens Search Orchestrator
//!
//! Accepts one staff query and fans it out to both search upstreams:
//! - Query validation and normalization shared by both calls
//! - Concurrent dispatch with independent per-upstream outcomes
//! - Normalization of drifting upstream payloads into fixed record shapes
//! - Ongoing/completed partitioning of contract records
//! - The restricted markdown subset used by research summaries

pub mod backend;
pub mod markdown;
pub mod orchestrator;
pub mod outcome;
pub mod partition;
pub mod query;
pub mod records;

mod errors;

pub use backend::{ForwarderBackend, HttpBackend, SearchBackend};
pub use errors::SearchError;
pub use orchestrator::{SearchController, SearchSnapshot, SearchView};
pub use outcome::Outcome;
pub use query::{SearchQuery, UpstreamQuery};
pub use records::{ContractRecord, ResearchRecord};
