//! Normalization of upstream payloads into fixed record shapes
//!
//! Upstream field names drifted over time (`ctrt_name` became
//! `contract_name`, `department` became `agency_name`, ...). Every record is
//! read through a fallback chain so old and new payloads produce the same
//! shape, and a missing or empty value is always `None`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::markdown::{self, Document};

/// One contract award record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractRecord {
    pub region_name: Option<String>,
    pub category: Option<String>,
    pub contract_name: Option<String>,
    pub agency_name: Option<String>,
    pub contract_amount: Option<String>,
    pub contractor: Option<String>,
    pub representative: Option<String>,
    pub contract_date: Option<String>,
    pub completion_date: Option<String>,
    pub province: Option<String>,
}

impl ContractRecord {
    /// Build a record from one raw upstream object
    pub fn from_raw(raw: &Map<String, Value>) -> Self {
        Self {
            region_name: first_of(raw, &["region_name", "region"], string_text),
            category: first_of(raw, &["category", "ctrt_type"], scalar_text),
            contract_name: first_of(raw, &["contract_name", "ctrt_name"], scalar_text),
            agency_name: first_of(raw, &["agency_name", "department"], scalar_text),
            contract_amount: first_of(raw, &["contract_amount", "ctrt_amt"], scalar_text),
            contractor: first_of(raw, &["contractor"], scalar_text),
            representative: first_of(raw, &["representative"], scalar_text),
            contract_date: first_of(raw, &["contract_date", "start_date"], scalar_text),
            completion_date: first_of(raw, &["completion_date", "end_date"], scalar_text),
            province: first_of(raw, &["province"], scalar_text),
        }
    }
}

/// First usable value among `keys`, current name first
fn first_of(
    raw: &Map<String, Value>,
    keys: &[&str],
    read: fn(&Value) -> Option<String>,
) -> Option<String> {
    keys.iter().find_map(|key| raw.get(*key).and_then(read))
}

/// One company research summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchRecord {
    /// Markdown-like prose, passed through unmodified
    pub content: Option<String>,

    /// Any other keys the upstream sent along
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResearchRecord {
    pub fn from_raw(raw: &Map<String, Value>) -> Self {
        let mut extra = raw.clone();
        let content = match extra.remove("content") {
            Some(Value::String(s)) => Some(s),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        };
        Self { content, extra }
    }

    /// Parsed form of `content` for rendering
    pub fn document(&self) -> Document {
        markdown::parse(self.content.as_deref().unwrap_or_default())
    }
}

/// Strings (non-blank), numbers and booleans as text
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(_) => string_text(value),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn string_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// The record objects a payload carries, whatever its shape
fn payload_objects(payload: &Value) -> Vec<&Map<String, Value>> {
    match payload {
        Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
        Value::Object(map) => match map.get("results") {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_object).collect(),
            _ if map.is_empty() => Vec::new(),
            _ => vec![map],
        },
        _ => Vec::new(),
    }
}

/// Normalize a contract search payload
pub fn normalize_contracts(payload: &Value) -> Vec<ContractRecord> {
    payload_objects(payload)
        .into_iter()
        .map(ContractRecord::from_raw)
        .collect()
}

/// Normalize a company research payload
pub fn normalize_research(payload: &Value) -> Vec<ResearchRecord> {
    payload_objects(payload)
        .into_iter()
        .map(ResearchRecord::from_raw)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_fields_fill_current_shape() {
        let records = normalize_contracts(&json!([{ "ctrt_name": "Road Work", "start_date": "2024-01-01" }]));
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.contract_name.as_deref(), Some("Road Work"));
        assert_eq!(record.contract_date.as_deref(), Some("2024-01-01"));
        assert_eq!(
            record,
            &ContractRecord {
                contract_name: Some("Road Work".into()),
                contract_date: Some("2024-01-01".into()),
                ..ContractRecord::default()
            }
        );

        let serialized = serde_json::to_value(record).unwrap();
        assert_eq!(serialized["agencyName"], Value::Null);
        assert_eq!(serialized["completionDate"], Value::Null);
        assert_eq!(serialized.as_object().unwrap().len(), 10);
    }

    #[test]
    fn test_current_name_wins_over_legacy() {
        let records = normalize_contracts(&json!({
            "contract_name": "New name",
            "ctrt_name": "Old name",
            "agency_name": "",
            "department": "Roads Division"
        }));
        let record = &records[0];
        assert_eq!(record.contract_name.as_deref(), Some("New name"));
        // Blank current value falls through to the legacy key
        assert_eq!(record.agency_name.as_deref(), Some("Roads Division"));
    }

    #[test]
    fn test_empty_and_odd_values_become_none() {
        let records = normalize_contracts(&json!([{
            "region_name": 11,
            "contractor": "   ",
            "representative": null,
            "province": ["Seoul"],
            "ctrt_amt": 125000000
        }]));
        let record = &records[0];
        assert_eq!(record.region_name, None);
        assert_eq!(record.contractor, None);
        assert_eq!(record.representative, None);
        assert_eq!(record.province, None);
        assert_eq!(record.contract_amount.as_deref(), Some("125000000"));
    }

    #[test]
    fn test_region_name_reads_string_only() {
        let records = normalize_contracts(&json!([{ "region_name": "Gyeonggi" }, { "region": "Seoul" }]));
        assert_eq!(records[0].region_name.as_deref(), Some("Gyeonggi"));
        assert_eq!(records[1].region_name.as_deref(), Some("Seoul"));
    }

    #[test]
    fn test_payload_shapes() {
        assert!(normalize_contracts(&json!([])).is_empty());
        assert!(normalize_contracts(&json!({})).is_empty());
        assert!(normalize_contracts(&Value::Null).is_empty());
        assert_eq!(normalize_contracts(&json!([{ "a": 1 }, "noise", 3])).len(), 1);
        assert_eq!(
            normalize_contracts(&json!({ "results": [{ "ctrt_name": "A" }, { "ctrt_name": "B" }] })).len(),
            2
        );
    }

    #[test]
    fn test_research_content_passes_through() {
        let records = normalize_research(&json!({ "content": "**Hanbit**\n- founded 1998", "source": "web" }));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content.as_deref(), Some("**Hanbit**\n- founded 1998"));
        assert_eq!(records[0].extra.get("source"), Some(&json!("web")));

        let serialized = serde_json::to_value(&records[0]).unwrap();
        assert_eq!(serialized, json!({ "content": "**Hanbit**\n- founded 1998", "source": "web" }));
    }

    #[test]
    fn test_research_array_is_kept_in_order() {
        let records = normalize_research(&json!([{ "content": "one" }, { "content": "two" }]));
        let contents: Vec<_> = records.iter().filter_map(|r| r.content.as_deref()).collect();
        assert_eq!(contents, vec!["one", "two"]);
    }
}
