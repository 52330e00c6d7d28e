//! Habitat client SDK.
//!
//! [`HabitatClient`] owns the local user's DID, a default [`Agent`] bound to
//! the local Habitat node, and a DID → agent cache. Reads against other
//! repos resolve the target DID to its PDS host once, then reuse the agent.
//!
//! Public records go through the standard `com.atproto.repo.*` XRPC
//! methods; private records go through the bespoke `com.habitat.*`
//! endpoints. Every response body is decoded into the typed structs in
//! [`types`] at the boundary. A body that does not match is a
//! [`ClientError::Decode`].

pub mod agent;
pub mod client;
pub mod resolver;
pub mod types;

pub use agent::{Agent, AgentFactory};
pub use client::HabitatClient;
pub use resolver::{DidDocument, DidResolver};
pub use types::{CreateRecordResponse, GetRecordResponse, ListParams, ListRecordsResponse, RecordEntry};

use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid did: {0}")]
    InvalidDid(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unsupported did method: {0}")]
    UnsupportedDidMethod(String),

    #[error("no did document found for {0}")]
    DidNotFound(String),

    #[error("did document for {0} has no atproto pds service")]
    NoPdsEndpoint(String),

    #[error("malformed pds endpoint {endpoint:?}: {reason}")]
    MalformedEndpoint { endpoint: String, reason: String },

    #[error("did resolution failed: {0}")]
    Resolution(String),

    #[error("request failed: {0}")]
    Transport(String),

    /// Non-success status from a private `com.habitat.*` endpoint.
    #[error("failed to {op}: {status} {status_text}")]
    Http {
        op: &'static str,
        status: u16,
        status_text: String,
    },

    /// Error envelope from a public `com.atproto.*` XRPC call, carried as sent.
    #[error("{method} failed: {status}{}", xrpc_detail(.error, .message))]
    Xrpc {
        method: &'static str,
        status: u16,
        error: Option<String>,
        message: Option<String>,
    },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("failed to encode request: {0}")]
    Encode(String),
}

fn xrpc_detail(error: &Option<String>, message: &Option<String>) -> String {
    match (error, message) {
        (Some(e), Some(m)) => format!(" {e}: {m}"),
        (Some(e), None) => format!(" {e}"),
        (None, Some(m)) => format!(": {m}"),
        (None, None) => String::new(),
    }
}
