//! Search query validation and normalization

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::errors::SearchError;

/// What staff type into the search form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    #[serde(default)]
    pub corporation_name: String,
    #[serde(default)]
    pub representative_name: String,
}

/// The body both upstreams receive for one submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamQuery {
    pub corporation_name: String,
    pub representative_name: String,
    pub corporation_number: String,
}

impl SearchQuery {
    pub fn new(corporation_name: impl Into<String>, representative_name: impl Into<String>) -> Self {
        Self {
            corporation_name: corporation_name.into(),
            representative_name: representative_name.into(),
        }
    }

    /// Validate and compute the body sent to both upstreams
    pub fn normalize(&self) -> Result<UpstreamQuery, SearchError> {
        let corporation = self.corporation_name.trim();
        let representative = self.representative_name.trim();

        if corporation.is_empty() && representative.is_empty() {
            return Err(SearchError::Validation {
                field: "corporationName",
                message: "Enter a corporation name or a representative name".to_string(),
            });
        }

        Ok(UpstreamQuery {
            corporation_name: clean_corporation_name(corporation),
            representative_name: representative.to_string(),
            corporation_number: String::new(),
        })
    }
}

impl UpstreamQuery {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "corporationName": self.corporation_name,
            "representativeName": self.representative_name,
            "corporationNumber": self.corporation_number,
        })
    }
}

fn designators() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\((?:주|유|사|재|합|株)\)|㈜|㈔|㈕|주식회사|유한회사|사단법인|재단법인|합자회사|합명회사")
            .expect("designator pattern is valid")
    })
}

/// Strip corporate designators and whitespace so `(주) 한빛 건설` matches `한빛건설`
pub fn clean_corporation_name(name: &str) -> String {
    designators()
        .replace_all(name, "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}
