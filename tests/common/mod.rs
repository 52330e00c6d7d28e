//! In-process mock of a Habitat node: the public `com.atproto.repo` XRPC
//! methods, the private `com.habitat` endpoints, and a PLC-directory style
//! `GET /{did}` document lookup. Every request is recorded for assertions.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, RawQuery, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use habitat_client::did::Did;
use habitat_client::sdk::resolver::StaticResolver;
use habitat_client::sdk::{AgentFactory, DidResolver, HabitatClient};

pub const OWN_DID: &str = "did:plc:abc";

#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub path: String,
    pub query: HashMap<String, String>,
    pub raw_query: Option<String>,
    pub cookie: Option<String>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
struct StoredRecord {
    repo: String,
    collection: String,
    rkey: String,
    cid: String,
    value: Value,
}

impl StoredRecord {
    fn uri(&self) -> String {
        format!("at://{}/{}/{}", self.repo, self.collection, self.rkey)
    }

    fn to_json(&self) -> Value {
        json!({ "uri": self.uri(), "cid": self.cid, "value": self.value })
    }
}

#[derive(Default)]
struct MockState {
    public: Vec<StoredRecord>,
    private: Vec<StoredRecord>,
    did_docs: HashMap<String, Value>,
    requests: Vec<SeenRequest>,
    next_id: u64,
}

#[derive(Clone, Default)]
pub struct MockPds {
    state: Arc<Mutex<MockState>>,
}

impl MockPds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<SeenRequest> {
        self.requests().into_iter().filter(|r| r.path == path).collect()
    }

    pub fn insert_public(&self, repo: &str, collection: &str, rkey: &str, value: Value) {
        let mut s = self.state.lock().unwrap();
        s.public.push(StoredRecord {
            repo: repo.into(),
            collection: collection.into(),
            rkey: rkey.into(),
            cid: format!("bafy-pub-{rkey}"),
            value,
        });
    }

    pub fn insert_private(&self, repo: &str, collection: &str, rkey: &str, value: Value) {
        let mut s = self.state.lock().unwrap();
        s.private.push(StoredRecord {
            repo: repo.into(),
            collection: collection.into(),
            rkey: rkey.into(),
            cid: format!("bafy-priv-{rkey}"),
            value,
        });
    }

    pub fn insert_did_doc(&self, did: &str, doc: Value) {
        self.state.lock().unwrap().did_docs.insert(did.into(), doc);
    }

    fn record(&self, path: &str, query: HashMap<String, String>, raw_query: Option<String>, headers: &HeaderMap, body: Option<Value>) {
        let cookie = headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.state.lock().unwrap().requests.push(SeenRequest {
            path: path.into(),
            query,
            raw_query,
            cookie,
            body,
        });
    }

    fn write(&self, private: bool, body: &Value) -> Value {
        let mut s = self.state.lock().unwrap();
        s.next_id += 1;
        let id = s.next_id;
        let rkey = body["rkey"].as_str().map(str::to_string).unwrap_or_else(|| format!("3k{id:06}"));
        let rec = StoredRecord {
            repo: body["repo"].as_str().unwrap_or_default().into(),
            collection: body["collection"].as_str().unwrap_or_default().into(),
            rkey,
            cid: format!("bafy-{id}"),
            value: body["record"].clone(),
        };
        let out = json!({ "uri": rec.uri(), "cid": rec.cid });
        let store = if private { &mut s.private } else { &mut s.public };
        store.retain(|r| !(r.repo == rec.repo && r.collection == rec.collection && r.rkey == rec.rkey));
        store.push(rec);
        out
    }

    fn find(&self, private: bool, q: &HashMap<String, String>) -> Option<StoredRecord> {
        let s = self.state.lock().unwrap();
        let store = if private { &s.private } else { &s.public };
        store
            .iter()
            .find(|r| {
                Some(&r.repo) == q.get("repo")
                    && Some(&r.collection) == q.get("collection")
                    && Some(&r.rkey) == q.get("rkey")
            })
            .cloned()
    }

    fn list(&self, private: bool, q: &HashMap<String, String>) -> Value {
        let s = self.state.lock().unwrap();
        let store = if private { &s.private } else { &s.public };
        let mut matching: Vec<&StoredRecord> = store
            .iter()
            .filter(|r| Some(&r.repo) == q.get("repo") && Some(&r.collection) == q.get("collection"))
            .collect();
        if let Some(cursor) = q.get("cursor") {
            if let Some(pos) = matching.iter().position(|r| &r.rkey == cursor) {
                matching.drain(..=pos);
            }
        }
        let limit = q.get("limit").and_then(|l| l.parse::<usize>().ok()).unwrap_or(50);
        let more = matching.len() > limit;
        matching.truncate(limit);
        let records: Vec<Value> = matching.iter().map(|r| r.to_json()).collect();
        match (more, matching.last()) {
            (true, Some(last)) => json!({ "records": records, "cursor": last.rkey }),
            _ => json!({ "records": records }),
        }
    }
}

// ── handlers ──────────────────────────────────────────────────────────────────

type Q = Query<HashMap<String, String>>;

async fn create_record(State(pds): State<MockPds>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    pds.record("/xrpc/com.atproto.repo.createRecord", HashMap::new(), None, &headers, Some(body.clone()));
    Json(pds.write(false, &body))
}

async fn get_record(State(pds): State<MockPds>, headers: HeaderMap, Query(q): Q, RawQuery(raw): RawQuery) -> Response {
    pds.record("/xrpc/com.atproto.repo.getRecord", q.clone(), raw, &headers, None);
    match pds.find(false, &q) {
        Some(r) => Json(r.to_json()).into_response(),
        None => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "RecordNotFound", "message": "Could not locate record" })),
        )
            .into_response(),
    }
}

async fn list_records(State(pds): State<MockPds>, headers: HeaderMap, Query(q): Q, RawQuery(raw): RawQuery) -> Json<Value> {
    pds.record("/xrpc/com.atproto.repo.listRecords", q.clone(), raw, &headers, None);
    Json(pds.list(false, &q))
}

async fn put_private(State(pds): State<MockPds>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    pds.record("/xrpc/com.habitat.putRecord", HashMap::new(), None, &headers, Some(body.clone()));
    Json(pds.write(true, &body))
}

async fn get_private(State(pds): State<MockPds>, headers: HeaderMap, Query(q): Q, RawQuery(raw): RawQuery) -> Response {
    pds.record("/xrpc/com.habitat.getRecord", q.clone(), raw, &headers, None);
    match pds.find(true, &q) {
        Some(r) => Json(r.to_json()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn list_private(State(pds): State<MockPds>, headers: HeaderMap, Query(q): Q, RawQuery(raw): RawQuery) -> Json<Value> {
    pds.record("/xrpc/com.habitat.listRecords", q.clone(), raw, &headers, None);
    Json(pds.list(true, &q))
}

async fn did_doc(State(pds): State<MockPds>, headers: HeaderMap, Path(did): Path<String>) -> Response {
    pds.record(&format!("/{did}"), HashMap::new(), None, &headers, None);
    let doc = pds.state.lock().unwrap().did_docs.get(&did).cloned();
    match doc {
        Some(doc) => Json(doc).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub fn router(pds: MockPds) -> Router {
    Router::new()
        .route("/xrpc/com.atproto.repo.createRecord", post(create_record))
        .route("/xrpc/com.atproto.repo.getRecord", get(get_record))
        .route("/xrpc/com.atproto.repo.listRecords", get(list_records))
        .route("/xrpc/com.habitat.putRecord", post(put_private))
        .route("/xrpc/com.habitat.getRecord", get(get_private))
        .route("/xrpc/com.habitat.listRecords", get(list_private))
        .route("/{did}", get(did_doc))
        .with_state(pds)
}

/// Serve `app` on an ephemeral localhost port; returns `host:port`.
pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr.to_string()
}

pub async fn spawn_pds() -> (MockPds, String) {
    let pds = MockPds::new();
    let host = serve(router(pds.clone())).await;
    (pds, host)
}

pub fn own_did() -> Did {
    Did::parse(OWN_DID).unwrap()
}

/// Client for `OWN_DID` whose default agent talks plain HTTP to `host`.
pub fn client(host: &str, resolver: StaticResolver) -> HabitatClient {
    client_with_resolver(host, DidResolver::Static(resolver))
}

pub fn client_with_resolver(host: &str, resolver: DidResolver) -> HabitatClient {
    let factory = AgentFactory::new("http", 5).unwrap();
    let default_agent = factory.agent(host).with_session_cookie(format!("did={OWN_DID}"));
    HabitatClient::new(own_did(), default_agent, resolver, factory)
}
