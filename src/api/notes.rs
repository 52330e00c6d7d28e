//! Notes (`dev.eagraf.note`) — public and private.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::did::Did;
use crate::sdk::{
    ClientError, CreateRecordResponse, GetRecordResponse, HabitatClient, ListParams,
    ListRecordsResponse,
};

pub const NOTE_COLLECTION: &str = "dev.eagraf.note";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub note: String,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl NoteRecord {
    /// Trimmed note stamped with the current time. Empty text is rejected.
    pub fn new(text: &str) -> Result<Self, ClientError> {
        let note = text.trim();
        if note.is_empty() {
            return Err(ClientError::InvalidInput("note text is empty".into()));
        }
        Ok(Self {
            note: note.to_string(),
            created_at: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        })
    }
}

pub async fn create_note(client: &HabitatClient, text: &str) -> Result<CreateRecordResponse, ClientError> {
    let record = NoteRecord::new(text)?;
    client.create_record(NOTE_COLLECTION, &record, None).await
}

pub async fn list_notes(
    client: &HabitatClient,
    repo: Option<&Did>,
) -> Result<ListRecordsResponse<NoteRecord>, ClientError> {
    client.list_records(NOTE_COLLECTION, &ListParams::default(), repo).await
}

pub async fn put_private_note(
    client: &HabitatClient,
    text: &str,
    rkey: Option<&str>,
) -> Result<CreateRecordResponse, ClientError> {
    let record = NoteRecord::new(text)?;
    client.put_private_record(NOTE_COLLECTION, &record, rkey).await
}

pub async fn get_private_note(
    client: &HabitatClient,
    rkey: &str,
    repo: Option<&Did>,
) -> Result<GetRecordResponse<NoteRecord>, ClientError> {
    client.get_private_record(NOTE_COLLECTION, rkey, None, repo).await
}

pub async fn list_private_notes(
    client: &HabitatClient,
    repo: Option<&Did>,
) -> Result<ListRecordsResponse<NoteRecord>, ClientError> {
    client.list_private_records(NOTE_COLLECTION, &ListParams::default(), repo).await
}
