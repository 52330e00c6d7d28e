//! Integration tests for the notes helpers and the data debugger.
//!
//! Run with:
//!   cargo test --test test_notes

mod common;

use serde_json::json;

use habitat_client::api::notes::{self, NOTE_COLLECTION};
use habitat_client::debugger::{self, DebugQuery};
use habitat_client::did::Did;
use habitat_client::sdk::resolver::StaticResolver;
use habitat_client::sdk::{ClientError, ListParams};

use common::{OWN_DID, client, spawn_pds};

// ── notes ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn private_note_round_trip() {
    let (pds, host) = spawn_pds().await;
    let client = client(&host, StaticResolver::new());

    let put = notes::put_private_note(&client, "  buy milk  ", Some("n1")).await.unwrap();
    assert_eq!(put.uri.rkey(), Some("n1"));

    let got = notes::get_private_note(&client, "n1", None).await.unwrap();
    assert_eq!(got.value.note, "buy milk");
    assert!(got.value.created_at.is_some());

    let page = notes::list_private_notes(&client, None).await.unwrap();
    assert_eq!(page.records.len(), 1);
    assert_eq!(page.records[0].value.note, "buy milk");

    let body = pds.requests_to("/xrpc/com.habitat.putRecord")[0].body.clone().unwrap();
    assert_eq!(body["collection"], NOTE_COLLECTION);
    assert_eq!(body["record"]["note"], "buy milk");
    assert!(body["record"]["createdAt"].is_string());
}

#[tokio::test]
async fn public_note_is_created_in_own_repo() {
    let (pds, host) = spawn_pds().await;
    let client = client(&host, StaticResolver::new());

    let created = notes::create_note(&client, "hello").await.unwrap();
    assert_eq!(created.uri.authority(), OWN_DID);
    assert_eq!(created.uri.collection(), Some(NOTE_COLLECTION));

    let page = notes::list_notes(&client, None).await.unwrap();
    assert_eq!(page.records.len(), 1);
    assert_eq!(page.records[0].value.note, "hello");
    assert!(pds.requests_to("/xrpc/com.habitat.putRecord").is_empty());
}

#[tokio::test]
async fn blank_note_never_reaches_the_server() {
    let (pds, host) = spawn_pds().await;
    let client = client(&host, StaticResolver::new());

    let err = notes::put_private_note(&client, " \t ", None).await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidInput(_)));
    let err = notes::create_note(&client, "").await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidInput(_)));
    assert!(pds.requests().is_empty());
}

#[tokio::test]
async fn notes_without_timestamp_still_decode() {
    let (pds, host) = spawn_pds().await;
    pds.insert_private(OWN_DID, NOTE_COLLECTION, "old", json!({ "note": "legacy" }));
    let client = client(&host, StaticResolver::new());

    let page = notes::list_private_notes(&client, None).await.unwrap();
    assert_eq!(page.records[0].value.note, "legacy");
    assert!(page.records[0].value.created_at.is_none());
}

#[tokio::test]
async fn record_with_wrong_shape_fails_typed_listing() {
    let (pds, host) = spawn_pds().await;
    pds.insert_private(OWN_DID, NOTE_COLLECTION, "bad", json!({ "note": 42 }));
    let client = client(&host, StaticResolver::new());

    let err = notes::list_private_notes(&client, None).await.unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)), "{err}");
}

#[tokio::test]
async fn notes_from_another_repo() {
    let (_home, home_host) = spawn_pds().await;
    let (remote, remote_host) = spawn_pds().await;
    let other = Did::parse("did:plc:friend").unwrap();
    remote.insert_public(other.as_str(), NOTE_COLLECTION, "f1", json!({ "note": "hi from a friend" }));

    let resolver = StaticResolver::new().with_pds(&other, &format!("http://{remote_host}"));
    let client = client(&home_host, resolver);

    let page = notes::list_notes(&client, Some(&other)).await.unwrap();
    assert_eq!(page.records.len(), 1);
    assert_eq!(page.records[0].uri.authority(), "did:plc:friend");
}

// ── data debugger ─────────────────────────────────────────────────────────────

fn seed(pds: &common::MockPds) {
    pds.insert_private(OWN_DID, "dev.eagraf.note", "aaa1", json!({ "note": "groceries", "tags": ["home"] }));
    pds.insert_private(OWN_DID, "dev.eagraf.note", "bbb2", json!({ "note": "gym plan", "priority": 2 }));
    pds.insert_private(OWN_DID, "dev.eagraf.note", "ccc3", json!({ "note": "groceries again" }));
}

fn private_query() -> DebugQuery {
    DebugQuery { collection: "dev.eagraf.note".into(), private: true, ..Default::default() }
}

#[tokio::test]
async fn debugger_lists_everything_without_filters() {
    let (pds, host) = spawn_pds().await;
    seed(&pds);
    let client = client(&host, StaticResolver::new());

    let view = debugger::run(&client, &private_query(), &Default::default()).await.unwrap();
    assert_eq!(view.total, 3);
    assert_eq!(view.records.len(), 3);
    assert_eq!(view.summary(), "3 of 3 record(s)");
}

#[tokio::test]
async fn debugger_filters_by_field_and_rkey() {
    let (pds, host) = spawn_pds().await;
    seed(&pds);
    let client = client(&host, StaticResolver::new());

    let filters = debugger::parse_filters("note:groceries");
    let view = debugger::run(&client, &private_query(), &filters).await.unwrap();
    assert_eq!(view.records.len(), 2);
    assert_eq!(view.summary(), "2 of 3 record(s) (filtered)");

    let filters = debugger::parse_filters("note:groceries rkey:ccc");
    let view = debugger::run(&client, &private_query(), &filters).await.unwrap();
    assert_eq!(view.records.len(), 1);
    assert_eq!(view.records[0].rkey(), Some("ccc3"));

    // non-string fields match on their JSON text
    let filters = debugger::parse_filters("priority:2");
    let view = debugger::run(&client, &private_query(), &filters).await.unwrap();
    assert_eq!(view.records.len(), 1);
    assert_eq!(view.records[0].rkey(), Some("bbb2"));
}

#[tokio::test]
async fn debugger_public_mode_and_paging() {
    let (pds, host) = spawn_pds().await;
    for i in 0..3 {
        pds.insert_public(OWN_DID, "app.example.thing", &format!("t{i}"), json!({ "n": i }));
    }
    let client = client(&host, StaticResolver::new());

    let query = DebugQuery {
        collection: "app.example.thing".into(),
        private: false,
        repo: None,
        params: ListParams::new(Some(2), None),
    };
    let view = debugger::run(&client, &query, &Default::default()).await.unwrap();
    assert_eq!(view.records.len(), 2);
    assert_eq!(view.cursor.as_deref(), Some("t1"));
    assert_eq!(pds.requests_to("/xrpc/com.atproto.repo.listRecords").len(), 1);
    assert!(pds.requests_to("/xrpc/com.habitat.listRecords").is_empty());
}

#[tokio::test]
async fn debugger_requires_a_collection() {
    let (pds, host) = spawn_pds().await;
    let client = client(&host, StaticResolver::new());

    let err = debugger::run(&client, &DebugQuery::default(), &Default::default()).await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidInput(_)));
    assert!(pds.requests().is_empty());
}
