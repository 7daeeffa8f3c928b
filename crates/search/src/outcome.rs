//! Per-upstream lifecycle of one search submission

use serde::Serialize;

/// `Idle -> Loading -> (Success | Failed)`, reset to `Loading` on every submit
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Idle,
    Loading,
    Success(Vec<T>),
    Failed(String),
}

/// Outcome state without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Idle,
    Loading,
    Success,
    Failed,
}

impl<T> Default for Outcome<T> {
    fn default() -> Self {
        Outcome::Idle
    }
}

impl<T> Outcome<T> {
    pub fn status(&self) -> OutcomeStatus {
        match self {
            Outcome::Idle => OutcomeStatus::Idle,
            Outcome::Loading => OutcomeStatus::Loading,
            Outcome::Success(_) => OutcomeStatus::Success,
            Outcome::Failed(_) => OutcomeStatus::Failed,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Outcome::Loading)
    }

    /// Records of a successful outcome, empty otherwise
    pub fn records(&self) -> &[T] {
        match self {
            Outcome::Success(records) => records,
            _ => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Outcome::Failed(message) => Some(message),
            _ => None,
        }
    }
}
