//! Errors raised before any upstream call is made

use tenderlens_common::errors::AppError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("{message}")]
    Validation { field: &'static str, message: String },

    #[error("A search is already in progress")]
    Busy,
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Validation { field, message } => AppError::Validation {
                message,
                field: Some(field.to_string()),
            },
            SearchError::Busy => AppError::SearchInProgress,
        }
    }
}
