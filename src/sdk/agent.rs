//! Agent handles — one per host, cheap to clone.
//!
//! An [`Agent`] is bound to exactly one host and issues every request as
//! `<scheme>://<host><path>`. All agents built by one [`AgentFactory`]
//! share its `reqwest::Client` (an `Arc` internally), so the connection
//! pool is shared too.
//!
//! Wire request types are private to this module; callers only see the
//! typed responses from [`super::types`].

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, header};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, error, trace};

use crate::did::Did;

use super::ClientError;
use super::types::{CreateRecordResponse, GetRecordResponse, ListParams, ListRecordsResponse};

const CREATE_RECORD: &str = "com.atproto.repo.createRecord";
const GET_RECORD: &str = "com.atproto.repo.getRecord";
const LIST_RECORDS: &str = "com.atproto.repo.listRecords";

const PUT_PRIVATE_RECORD: &str = "/xrpc/com.habitat.putRecord";
const GET_PRIVATE_RECORD: &str = "/xrpc/com.habitat.getRecord";
const LIST_PRIVATE_RECORDS: &str = "/xrpc/com.habitat.listRecords";

// ── Factory ───────────────────────────────────────────────────────────────────

/// Builds agents bound to a host. Constructed once per client.
#[derive(Debug, Clone)]
pub struct AgentFactory {
    http: Client,
    scheme: String,
}

impl AgentFactory {
    pub fn new(scheme: &str, timeout_seconds: u64) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| ClientError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, scheme: scheme.to_string() })
    }

    pub fn agent(&self, host: &str) -> Agent {
        Agent {
            http: self.http.clone(),
            host: host.to_string(),
            base_url: format!("{}://{}", self.scheme, host),
            session_cookie: None,
        }
    }
}

// ── Agent ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Agent {
    http: Client,
    host: String,
    base_url: String,
    /// `Cookie:` header sent with every request. Only the default agent has one.
    session_cookie: Option<String>,
}

impl Agent {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn with_session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.session_cookie = Some(cookie.into());
        self
    }

    pub fn has_session(&self) -> bool {
        self.session_cookie.is_some()
    }

    /// Start a request against this agent's host. `path` is absolute
    /// (`/xrpc/...`).
    pub fn fetch(&self, method: Method, path: &str) -> RequestBuilder {
        let mut req = self.http.request(method, format!("{}{}", self.base_url, path));
        if let Some(cookie) = &self.session_cookie {
            req = req.header(header::COOKIE, cookie);
        }
        req
    }

    async fn send(&self, req: RequestBuilder, what: &str) -> Result<Response, ClientError> {
        req.send().await.map_err(|e| {
            error!(host = %self.host, what, error = %e, "HTTP request failed (transport)");
            ClientError::Transport(e.to_string())
        })
    }

    // ── com.atproto.repo ──────────────────────────────────────────────────────

    pub async fn create_record<T: Serialize + ?Sized>(
        &self,
        repo: &Did,
        collection: &str,
        record: &T,
        rkey: Option<&str>,
    ) -> Result<CreateRecordResponse, ClientError> {
        let body = WriteRecordRequest { repo: repo.as_str(), collection, rkey, record };
        debug!(host = %self.host, %repo, collection, "createRecord");
        let req = self.fetch(Method::POST, &xrpc_path(CREATE_RECORD));
        let req = json_body(req, &body)?;
        let response = check_xrpc_status(self.send(req, CREATE_RECORD).await?, CREATE_RECORD).await?;
        decode(response).await
    }

    pub async fn get_record<T: DeserializeOwned>(
        &self,
        repo: &Did,
        collection: &str,
        rkey: &str,
        cid: Option<&str>,
    ) -> Result<GetRecordResponse<T>, ClientError> {
        let mut query = vec![
            ("repo", repo.to_string()),
            ("collection", collection.to_string()),
            ("rkey", rkey.to_string()),
        ];
        if let Some(cid) = cid.filter(|c| !c.is_empty()) {
            query.push(("cid", cid.to_string()));
        }
        debug!(host = %self.host, %repo, collection, rkey, "getRecord");
        let req = self.fetch(Method::GET, &xrpc_path(GET_RECORD)).query(&query);
        let response = check_xrpc_status(self.send(req, GET_RECORD).await?, GET_RECORD).await?;
        decode(response).await
    }

    pub async fn list_records<T: DeserializeOwned>(
        &self,
        repo: &Did,
        collection: &str,
        params: &ListParams,
    ) -> Result<ListRecordsResponse<T>, ClientError> {
        let mut query = vec![("repo", repo.to_string()), ("collection", collection.to_string())];
        params.push_query(&mut query);
        debug!(host = %self.host, %repo, collection, limit = ?params.limit, "listRecords");
        let req = self.fetch(Method::GET, &xrpc_path(LIST_RECORDS)).query(&query);
        let response = check_xrpc_status(self.send(req, LIST_RECORDS).await?, LIST_RECORDS).await?;
        decode(response).await
    }

    // ── com.habitat (private records) ─────────────────────────────────────────

    pub async fn put_private_record<T: Serialize + ?Sized>(
        &self,
        repo: &Did,
        collection: &str,
        record: &T,
        rkey: Option<&str>,
    ) -> Result<CreateRecordResponse, ClientError> {
        let body = WriteRecordRequest { repo: repo.as_str(), collection, rkey, record };
        debug!(host = %self.host, %repo, collection, "putPrivateRecord");
        let req = json_body(self.fetch(Method::POST, PUT_PRIVATE_RECORD), &body)?;
        let response =
            check_private_status(self.send(req, PUT_PRIVATE_RECORD).await?, "put private record")?;
        decode(response).await
    }

    pub async fn get_private_record<T: DeserializeOwned>(
        &self,
        repo: &Did,
        collection: &str,
        rkey: &str,
        cid: Option<&str>,
    ) -> Result<GetRecordResponse<T>, ClientError> {
        let mut query = vec![
            ("repo", repo.to_string()),
            ("collection", collection.to_string()),
            ("rkey", rkey.to_string()),
        ];
        if let Some(cid) = cid.filter(|c| !c.is_empty()) {
            query.push(("cid", cid.to_string()));
        }
        debug!(host = %self.host, %repo, collection, rkey, "getPrivateRecord");
        let req = self.fetch(Method::GET, GET_PRIVATE_RECORD).query(&query);
        let response =
            check_private_status(self.send(req, GET_PRIVATE_RECORD).await?, "get private record")?;
        decode(response).await
    }

    pub async fn list_private_records<T: DeserializeOwned>(
        &self,
        repo: &Did,
        collection: &str,
        params: &ListParams,
    ) -> Result<ListRecordsResponse<T>, ClientError> {
        let mut query = Vec::with_capacity(4);
        params.push_query(&mut query);
        query.push(("collection", collection.to_string()));
        query.push(("repo", repo.to_string()));
        debug!(host = %self.host, %repo, collection, limit = ?params.limit, "listPrivateRecords");
        let req = self.fetch(Method::GET, LIST_PRIVATE_RECORDS).query(&query);
        let response = check_private_status(
            self.send(req, LIST_PRIVATE_RECORDS).await?,
            "list private records",
        )?;
        decode(response).await
    }
}

fn xrpc_path(method: &str) -> String {
    format!("/xrpc/{method}")
}

/// Serialize `body` up front so an unserializable record is an encode
/// error rather than a failed send.
fn json_body<B: Serialize>(req: RequestBuilder, body: &B) -> Result<RequestBuilder, ClientError> {
    let bytes = serde_json::to_vec(body).map_err(|e| {
        error!(error = %e, "record could not be serialized");
        ClientError::Encode(e.to_string())
    })?;
    Ok(req.header(header::CONTENT_TYPE, "application/json").body(bytes))
}

// ── Private wire types ────────────────────────────────────────────────────────

/// Body for both `createRecord` and `com.habitat.putRecord`.
#[derive(Debug, Serialize)]
struct WriteRecordRequest<'a, T: ?Sized> {
    repo: &'a str,
    collection: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    rkey: Option<&'a str>,
    record: &'a T,
}

// Standard XRPC error envelope.
#[derive(Debug, serde::Deserialize)]
struct XrpcErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Return the response if successful, or the server's XRPC error as sent.
async fn check_xrpc_status(response: Response, method: &'static str) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let (code, message) = match serde_json::from_str::<XrpcErrorBody>(&body) {
        Ok(env) => (env.error, env.message),
        Err(_) => (None, Some(body).filter(|b| !b.is_empty())),
    };

    error!(%status, method, error = ?code, ?message, "XRPC request returned HTTP error");
    Err(ClientError::Xrpc { method, status: status.as_u16(), error: code, message })
}

/// Private endpoints only report status code and text.
fn check_private_status(response: Response, op: &'static str) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let status_text = status.canonical_reason().unwrap_or_default().to_string();
    error!(%status, op, "private record request returned HTTP error");
    Err(ClientError::Http { op, status: status.as_u16(), status_text })
}

async fn decode<R: DeserializeOwned>(response: Response) -> Result<R, ClientError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ClientError::Transport(format!("failed to read response body: {e}")))?;
    if tracing::enabled!(tracing::Level::TRACE) {
        trace!(body = %String::from_utf8_lossy(&bytes), "response body");
    }
    serde_json::from_slice(&bytes).map_err(|e| {
        error!(error = %e, "response body does not match the expected schema");
        ClientError::Decode(e.to_string())
    })
}
