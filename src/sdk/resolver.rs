//! DID resolution — DID → DID document → PDS host.
//!
//! `DidResolver` is an enum over concrete backends. Enum dispatch avoids
//! `dyn` trait objects and the `async-trait` dependency; adding a backend
//! means a new variant and a new `resolve` arm.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::{ResolverConfig, ResolverKind};
use crate::did::Did;

use super::ClientError;

/// Fragment identifying the atproto PDS entry in a DID document.
pub const PDS_SERVICE_ID: &str = "#atproto_pds";
/// Service type of the atproto PDS entry.
pub const PDS_SERVICE_TYPE: &str = "AtprotoPersonalDataServer";

// ── DID document ──────────────────────────────────────────────────────────────

/// The parts of a DID document the client reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    pub id: String,
    #[serde(default)]
    pub also_known_as: Vec<String>,
    #[serde(default)]
    pub service: Vec<ServiceEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEntry {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Usually a URL string. DID Core also allows maps and sets.
    pub service_endpoint: Value,
}

impl DidDocument {
    /// Document with a single atproto PDS service entry.
    pub fn with_pds(did: &Did, endpoint: &str) -> Self {
        Self {
            id: did.to_string(),
            also_known_as: Vec::new(),
            service: vec![ServiceEntry {
                id: PDS_SERVICE_ID.to_string(),
                kind: PDS_SERVICE_TYPE.to_string(),
                service_endpoint: Value::String(endpoint.to_string()),
            }],
        }
    }

    /// Service endpoint of the atproto PDS entry, matched by id or by type.
    pub fn pds_endpoint(&self) -> Option<&Value> {
        self.service
            .iter()
            .find(|s| {
                s.id == PDS_SERVICE_ID
                    || s.id.ends_with(PDS_SERVICE_ID)
                    || s.kind == PDS_SERVICE_TYPE
            })
            .map(|s| &s.service_endpoint)
    }
}

/// Normalize a service endpoint into the host an agent binds to.
///
/// Non-string values are coerced to their JSON text first (and then
/// usually fail to parse). A non-default port is kept as `host:port`.
pub fn endpoint_host(endpoint: &Value) -> Result<String, ClientError> {
    let raw = match endpoint {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let malformed = |reason: String| ClientError::MalformedEndpoint { endpoint: raw.clone(), reason };

    let url = Url::parse(raw.trim()).map_err(|e| malformed(e.to_string()))?;
    let host = url.host_str().ok_or_else(|| malformed("no host".into()))?;

    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

// ── Resolver enum ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum DidResolver {
    Plc(PlcResolver),
    Static(StaticResolver),
}

impl DidResolver {
    /// Resolve `did` to its document. `Ok(None)` means the DID has no document.
    pub async fn resolve(&self, did: &Did) -> Result<Option<DidDocument>, ClientError> {
        match self {
            DidResolver::Plc(r) => r.resolve(did).await,
            DidResolver::Static(r) => r.resolve(did).await,
        }
    }
}

/// Construct a `DidResolver` from config.
pub fn build(config: &ResolverConfig) -> Result<DidResolver, ClientError> {
    match config.kind {
        ResolverKind::Plc => Ok(DidResolver::Plc(PlcResolver::new(
            &config.plc_url,
            config.timeout_seconds,
        )?)),
        ResolverKind::Static => Ok(DidResolver::Static(StaticResolver::new())),
    }
}

// ── PLC directory + did:web ───────────────────────────────────────────────────

/// Resolves `did:plc` against a PLC directory and `did:web` against the
/// domain's `/.well-known/did.json`.
#[derive(Debug, Clone)]
pub struct PlcResolver {
    http: Client,
    plc_url: String,
}

impl PlcResolver {
    pub fn new(plc_url: &str, timeout_seconds: u64) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| ClientError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, plc_url: plc_url.trim_end_matches('/').to_string() })
    }

    /// Where the document for `did` lives.
    pub fn document_url(&self, did: &Did) -> Result<String, ClientError> {
        match did.method() {
            "plc" => Ok(format!("{}/{}", self.plc_url, did)),
            "web" => web_document_url(did),
            other => Err(ClientError::UnsupportedDidMethod(other.to_string())),
        }
    }

    pub async fn resolve(&self, did: &Did) -> Result<Option<DidDocument>, ClientError> {
        let url = self.document_url(did)?;
        debug!(%did, %url, "resolving did document");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Resolution(format!("{url}: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            debug!(%did, %status, "no did document");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ClientError::Resolution(format!("{url} returned {status}")));
        }

        let doc: DidDocument = response
            .json()
            .await
            .map_err(|e| ClientError::Resolution(format!("invalid did document from {url}: {e}")))?;

        if doc.id != did.as_str() {
            return Err(ClientError::Resolution(format!(
                "document id {} does not match {did}",
                doc.id
            )));
        }
        Ok(Some(doc))
    }
}

/// `did:web:example.com` → `https://example.com/.well-known/did.json`.
/// Path-based did:web is not used by atproto and is rejected.
fn web_document_url(did: &Did) -> Result<String, ClientError> {
    let id = did.identifier();
    if id.contains(':') {
        return Err(ClientError::UnsupportedDidMethod(format!("path-based did:web ({did})")));
    }
    let domain = id.replace("%3A", ":").replace("%3a", ":");
    let scheme = if domain == "localhost" || domain.starts_with("localhost:") {
        "http"
    } else {
        "https"
    };
    Ok(format!("{scheme}://{domain}/.well-known/did.json"))
}

// ── Static ────────────────────────────────────────────────────────────────────

/// In-memory resolver. Clones share the document map and the call counter.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    docs: Arc<HashMap<String, DidDocument>>,
    calls: Arc<AtomicUsize>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document keyed by its `id`. Call before cloning.
    pub fn with_document(mut self, doc: DidDocument) -> Self {
        Arc::make_mut(&mut self.docs).insert(doc.id.clone(), doc);
        self
    }

    pub fn with_pds(self, did: &Did, endpoint: &str) -> Self {
        self.with_document(DidDocument::with_pds(did, endpoint))
    }

    /// Number of `resolve` calls made so far, across all clones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn resolve(&self, did: &Did) -> Result<Option<DidDocument>, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.docs.get(did.as_str()).cloned())
    }
}
