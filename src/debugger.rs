//! Data debugger — list any collection, public or private, and narrow the
//! result with `key:value` filters.
//!
//! Filter text is whitespace-separated `key:value` tokens. All tokens must
//! match. `rkey:<s>` matches against the record key; any other key matches
//! against the top-level field of the record value. Matching is substring.
//!
//! The record key is the last path segment of an `at://` URI that has one.
//! A repo-only URI (`at://did:plc:abc`) has no record key, so an `rkey`
//! filter never matches it.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::did::Did;
use crate::sdk::{ClientError, HabitatClient, ListParams, RecordEntry};

const RKEY_FILTER: &str = "rkey";

/// Parsed filters, key → required substring.
pub type FilterCriteria = BTreeMap<String, String>;

/// Parse `note:hello rkey:abc` into criteria. Tokens without a colon, or
/// with an empty key or value, are ignored; values may contain colons.
pub fn parse_filters(text: &str) -> FilterCriteria {
    text.split_whitespace()
        .filter_map(|part| part.split_once(':'))
        .filter(|(key, value)| !key.is_empty() && !value.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// String form used for matching. Strings are raw and arrays are their
/// elements joined by `,` (with `null` elements empty). Everything else is
/// JSON text.
fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => field_text(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

pub fn matches(record: &RecordEntry<Value>, filters: &FilterCriteria) -> bool {
    filters.iter().all(|(key, wanted)| {
        if key == RKEY_FILTER {
            return record.rkey().is_some_and(|rkey| rkey.contains(wanted.as_str()));
        }
        record
            .value
            .get(key)
            .is_some_and(|field| field_text(field).contains(wanted.as_str()))
    })
}

/// What the debugger shows: filtered records out of `total` fetched.
#[derive(Debug, Clone)]
pub struct DebugView {
    pub records: Vec<RecordEntry<Value>>,
    pub total: usize,
    pub filtered: bool,
    /// Server cursor for the next page, if any.
    pub cursor: Option<String>,
}

impl DebugView {
    pub fn build(records: Vec<RecordEntry<Value>>, filters: &FilterCriteria) -> Self {
        let total = records.len();
        let records = if filters.is_empty() {
            records
        } else {
            records.into_iter().filter(|r| matches(r, filters)).collect()
        };
        Self { records, total, filtered: !filters.is_empty(), cursor: None }
    }

    /// `"2 of 5 record(s) (filtered)"`
    pub fn summary(&self) -> String {
        let suffix = if self.filtered { " (filtered)" } else { "" };
        format!("{} of {} record(s){suffix}", self.records.len(), self.total)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DebugQuery {
    pub collection: String,
    pub private: bool,
    pub repo: Option<Did>,
    pub params: ListParams,
}

/// Fetch one page of `query.collection` and apply `filters`.
pub async fn run(
    client: &HabitatClient,
    query: &DebugQuery,
    filters: &FilterCriteria,
) -> Result<DebugView, ClientError> {
    if query.collection.trim().is_empty() {
        return Err(ClientError::InvalidInput("no collection selected".into()));
    }
    let page = client
        .list_any(&query.collection, query.private, &query.params, query.repo.as_ref())
        .await?;
    let mut view = DebugView::build(page.records, filters);
    view.cursor = page.cursor;
    Ok(view)
}
