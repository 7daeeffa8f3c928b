//! Dual-upstream search controller
//!
//! One submission fans out to both backends at once. Each completion writes
//! only its own outcome, and only while the submission's generation is still
//! current, so a slow answer from an earlier search can never overwrite a
//! newer one. Renderers follow progress through a `watch` channel.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tenderlens_common::upstream::{ProxyReply, UpstreamKind};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::backend::SearchBackend;
use crate::errors::SearchError;
use crate::markdown::Document;
use crate::outcome::{Outcome, OutcomeStatus};
use crate::partition::{partition, Partitioned};
use crate::query::{SearchQuery, UpstreamQuery};
use crate::records::{normalize_contracts, normalize_research, ContractRecord, ResearchRecord};

/// Combined state of the latest submission
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchView {
    /// Bumped on every submit and reset
    pub generation: u64,
    /// Whether a search was submitted since the last reset
    pub searched: bool,
    pub contracts: Outcome<ContractRecord>,
    pub research: Outcome<ResearchRecord>,
}

impl SearchView {
    /// True while either upstream is still working
    pub fn is_loading(&self) -> bool {
        self.contracts.is_loading() || self.research.is_loading()
    }

    pub fn contract_error(&self) -> Option<String> {
        attributed(UpstreamKind::Contracts, self.contracts.error())
    }

    pub fn research_error(&self) -> Option<String> {
        attributed(UpstreamKind::Research, self.research.error())
    }

    /// Failure messages, each prefixed with the upstream that failed
    pub fn errors(&self) -> Vec<String> {
        self.contract_error()
            .into_iter()
            .chain(self.research_error())
            .collect()
    }

    /// Both upstreams answered and neither found anything
    pub fn is_empty(&self) -> bool {
        matches!(
            (&self.contracts, &self.research),
            (Outcome::Success(a), Outcome::Success(b)) if a.is_empty() && b.is_empty()
        )
    }

    pub fn partitioned(&self, today: NaiveDate) -> Partitioned {
        partition(self.contracts.records(), today)
    }
}

fn attributed(kind: UpstreamKind, message: Option<&str>) -> Option<String> {
    message.map(|m| format!("{} failed: {}", kind.label(), m))
}

/// Runs searches against a [`SearchBackend`] and publishes their progress
pub struct SearchController {
    backend: Arc<dyn SearchBackend>,
    timeout: Duration,
    state: Arc<watch::Sender<SearchView>>,
}

impl SearchController {
    /// `timeout` bounds each upstream call; a call that exceeds it fails its outcome
    pub fn new(backend: Arc<dyn SearchBackend>, timeout: Duration) -> Self {
        let (state, _) = watch::channel(SearchView::default());
        Self {
            backend,
            timeout,
            state: Arc::new(state),
        }
    }

    /// Receiver that observes every state change, loading included
    pub fn subscribe(&self) -> watch::Receiver<SearchView> {
        self.state.subscribe()
    }

    /// Current state
    pub fn view(&self) -> SearchView {
        self.state.borrow().clone()
    }

    /// Submit `query` to both upstreams and wait until both settle.
    ///
    /// Fails without calling anything when the query is blank or a previous
    /// submission is still loading.
    pub async fn submit(&self, query: &SearchQuery) -> Result<SearchView, SearchError> {
        let upstream = query.normalize()?;
        let generation = self.begin()?;

        tracing::info!(
            generation,
            corporation = %upstream.corporation_name,
            representative = %upstream.representative_name,
            "Search submitted"
        );

        let contracts = self.dispatch(generation, UpstreamKind::Contracts, upstream.clone());
        let research = self.dispatch(generation, UpstreamKind::Research, upstream);

        let (contracts, research) = tokio::join!(contracts, research);
        for (kind, joined) in [(UpstreamKind::Contracts, contracts), (UpstreamKind::Research, research)] {
            if let Err(e) = joined {
                tracing::error!(upstream = kind.as_str(), error = %e, "Search task failed");
                settle(&self.state, generation, kind, &ProxyReply::internal());
            }
        }

        Ok(self.view())
    }

    /// Forget the current results; completions still in flight are discarded
    pub fn reset(&self) {
        self.state.send_modify(|view| {
            *view = SearchView {
                generation: view.generation + 1,
                ..SearchView::default()
            };
        });
    }

    /// Move both outcomes to loading under a fresh generation
    fn begin(&self) -> Result<u64, SearchError> {
        let mut started = None;
        self.state.send_if_modified(|view| {
            if view.is_loading() {
                return false;
            }
            view.generation += 1;
            view.searched = true;
            view.contracts = Outcome::Loading;
            view.research = Outcome::Loading;
            started = Some(view.generation);
            true
        });

        started.ok_or_else(|| {
            tracing::warn!("Search refused while another is in progress");
            SearchError::Busy
        })
    }

    fn dispatch(&self, generation: u64, kind: UpstreamKind, query: UpstreamQuery) -> JoinHandle<()> {
        let backend = self.backend.clone();
        let state = self.state.clone();
        let timeout = self.timeout;

        tokio::spawn(async move {
            let call = async {
                match kind {
                    UpstreamKind::Contracts => backend.contracts(&query).await,
                    UpstreamKind::Research => backend.research(&query).await,
                }
            };

            let reply = match tokio::time::timeout(timeout, call).await {
                Ok(reply) => reply,
                Err(_) => {
                    tracing::warn!(upstream = kind.as_str(), ?timeout, "Upstream call timed out");
                    ProxyReply::error(
                        reqwest::StatusCode::GATEWAY_TIMEOUT,
                        format!("No response within {:?}", timeout),
                    )
                }
            };

            settle(&state, generation, kind, &reply);
        })
    }
}

/// Write one upstream's outcome if `generation` is still current
fn settle(state: &watch::Sender<SearchView>, generation: u64, kind: UpstreamKind, reply: &ProxyReply) {
    state.send_if_modified(|view| {
        if view.generation != generation {
            tracing::debug!(
                upstream = kind.as_str(),
                generation,
                current = view.generation,
                "Discarding stale search completion"
            );
            return false;
        }

        match kind {
            UpstreamKind::Contracts => view.contracts = outcome(reply, normalize_contracts),
            UpstreamKind::Research => view.research = outcome(reply, normalize_research),
        }
        true
    });
}

fn outcome<T>(reply: &ProxyReply, normalize: fn(&Value) -> Vec<T>) -> Outcome<T> {
    if reply.is_success() {
        Outcome::Success(normalize(&reply.body))
    } else {
        Outcome::Failed(reply.error_message())
    }
}

/// Serializable form of a [`SearchView`] for renderers
#[derive(Debug, Clone, Serialize)]
pub struct SearchSnapshot {
    pub searched: bool,
    pub loading: bool,
    pub empty: bool,
    pub errors: Vec<String>,
    pub contracts: ContractsSnapshot,
    pub research: ResearchSnapshot,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContractsSnapshot {
    pub status: OutcomeStatus,
    pub error: Option<String>,
    pub ongoing: Vec<ContractRecord>,
    pub completed: Vec<ContractRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResearchSnapshot {
    pub status: OutcomeStatus,
    pub error: Option<String>,
    pub records: Vec<ResearchEntry>,
}

/// Research record with its content already parsed
#[derive(Debug, Clone, Serialize)]
pub struct ResearchEntry {
    #[serde(flatten)]
    pub record: ResearchRecord,
    pub document: Document,
    pub html: String,
}

impl SearchSnapshot {
    pub fn from_view(view: &SearchView, today: NaiveDate) -> Self {
        let Partitioned { ongoing, completed } = view.partitioned(today);

        let records = view
            .research
            .records()
            .iter()
            .map(|record| {
                let document = record.document();
                ResearchEntry {
                    html: document.to_html(),
                    document,
                    record: record.clone(),
                }
            })
            .collect();

        Self {
            searched: view.searched,
            loading: view.is_loading(),
            empty: view.is_empty(),
            errors: view.errors(),
            contracts: ContractsSnapshot {
                status: view.contracts.status(),
                error: view.contract_error(),
                ongoing,
                completed,
            },
            research: ResearchSnapshot {
                status: view.research.status(),
                error: view.research_error(),
                records,
            },
        }
    }
}
