//! Ongoing/completed split of contract records

use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::records::ContractRecord;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Partitioned {
    pub ongoing: Vec<ContractRecord>,
    pub completed: Vec<ContractRecord>,
}

/// Split `records` against `today`, keeping their order.
///
/// A record is completed only when its completion date parses and falls
/// strictly before `today`; missing or unparsable dates count as ongoing.
pub fn partition(records: &[ContractRecord], today: NaiveDate) -> Partitioned {
    let (completed, ongoing): (Vec<_>, Vec<_>) = records.iter().cloned().partition(|record| {
        record
            .completion_date
            .as_deref()
            .and_then(parse_date)
            .is_some_and(|date| date < today)
    });

    Partitioned { ongoing, completed }
}

/// Parse the calendar date at the start of `raw`, ignoring any time part
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date = raw
        .split(|c: char| c == 'T' || c == ' ')
        .next()
        .unwrap_or(raw);

    if date.len() == 8 && date.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDate::parse_from_str(date, "%Y%m%d").ok();
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date, format).ok())
}

/// Local date with the time of day dropped
pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}
