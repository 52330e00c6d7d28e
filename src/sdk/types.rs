//! Record response types and list parameters.
//!
//! `T` is the record value type. It defaults to [`serde_json::Value`] for
//! callers (like the data debugger) that treat values as opaque.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::did::{AtUri, Cid};

/// Result of a create (public) or put (private) write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRecordResponse {
    pub uri: AtUri,
    pub cid: Cid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetRecordResponse<T = Value> {
    pub uri: AtUri,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cid: Option<Cid>,
    pub value: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordEntry<T = Value> {
    pub uri: AtUri,
    pub cid: Cid,
    pub value: T,
}

impl<T> RecordEntry<T> {
    /// Record key: last segment of the record URI. `None` for a repo-only URI.
    pub fn rkey(&self) -> Option<&str> {
        self.uri.rkey()
    }
}

/// One page of records. `cursor` is passed through from the server verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListRecordsResponse<T = Value> {
    pub records: Vec<RecordEntry<T>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// Paging options for list calls. Both fields are omitted from the query
/// when unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub limit: Option<u32>,
    pub cursor: Option<String>,
}

impl ListParams {
    pub fn new(limit: Option<u32>, cursor: Option<String>) -> Self {
        Self { limit, cursor }
    }

    pub(crate) fn push_query(&self, query: &mut Vec<(&'static str, String)>) {
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(cursor) = self.cursor.as_deref().filter(|c| !c.is_empty()) {
            query.push(("cursor", cursor.to_string()));
        }
    }
}
