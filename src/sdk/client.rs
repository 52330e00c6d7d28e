//! `HabitatClient` — DID → agent cache plus record CRUD dispatch.
//!
//! # Routing
//!
//! Writes (public and private) always target the client's own DID through
//! the default agent. Reads take an optional target repo; `None` means the
//! client's own repo. Any other DID goes through [`HabitatClient::agent_for_did`].
//!
//! # Cache
//!
//! The cache always holds `own did → default agent`. Other entries are added
//! lazily on first use and only removed by [`HabitatClient::reset`]. Two
//! concurrent misses for the same DID may both resolve; the first agent
//! stored wins and both callers get it back. The lock is never held across
//! an `.await`.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, info};

use crate::did::Did;

use super::agent::{Agent, AgentFactory};
use super::resolver::{self, DidResolver};
use super::types::{CreateRecordResponse, GetRecordResponse, ListParams, ListRecordsResponse};
use super::ClientError;

pub struct HabitatClient {
    did: Did,
    default_agent: Agent,
    resolver: DidResolver,
    factory: AgentFactory,
    agents: RwLock<HashMap<Did, Agent>>,
}

impl HabitatClient {
    pub fn new(did: Did, default_agent: Agent, resolver: DidResolver, factory: AgentFactory) -> Self {
        let agents = RwLock::new(HashMap::from([(did.clone(), default_agent.clone())]));
        Self { did, default_agent, resolver, factory, agents }
    }

    /// The local user's DID.
    pub fn did(&self) -> &Did {
        &self.did
    }

    pub fn default_agent(&self) -> &Agent {
        &self.default_agent
    }

    pub fn resolver(&self) -> &DidResolver {
        &self.resolver
    }

    pub fn cache_len(&self) -> usize {
        self.agents.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// DIDs currently cached, sorted.
    pub fn cached_dids(&self) -> Vec<Did> {
        let mut dids: Vec<Did> = self
            .agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        dids.sort();
        dids
    }

    /// Cached agent for `did`, if any. Never resolves.
    pub fn cached_agent(&self, did: &Did) -> Option<Agent> {
        self.agents.read().unwrap_or_else(PoisonError::into_inner).get(did).cloned()
    }

    /// Agent bound to `did`'s PDS, resolving and caching it on first use.
    pub async fn agent_for_did(&self, did: &Did) -> Result<Agent, ClientError> {
        if let Some(agent) = self.cached_agent(did) {
            debug!(%did, host = %agent.host(), "agent cache hit");
            return Ok(agent);
        }

        debug!(%did, "agent cache miss, resolving");
        let doc = self
            .resolver
            .resolve(did)
            .await?
            .ok_or_else(|| ClientError::DidNotFound(did.to_string()))?;
        let endpoint = doc
            .pds_endpoint()
            .ok_or_else(|| ClientError::NoPdsEndpoint(did.to_string()))?;
        let host = resolver::endpoint_host(endpoint)?;
        let agent = self.factory.agent(&host);

        let stored = self
            .agents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(did.clone())
            .or_insert(agent)
            .clone();
        info!(%did, host = %stored.host(), "agent cached");
        Ok(stored)
    }

    /// Drop every cached agent except `own did → default agent`.
    pub fn reset(&self) {
        let mut agents = self.agents.write().unwrap_or_else(PoisonError::into_inner);
        agents.clear();
        agents.insert(self.did.clone(), self.default_agent.clone());
        info!(did = %self.did, "agent cache reset");
    }

    async fn route(&self, repo: Option<&Did>) -> Result<(Agent, Did), ClientError> {
        match repo {
            None => Ok((self.default_agent.clone(), self.did.clone())),
            Some(did) => Ok((self.agent_for_did(did).await?, did.clone())),
        }
    }

    // ── Public records ────────────────────────────────────────────────────────

    /// Create a public record in the client's own repo.
    pub async fn create_record<T: Serialize + ?Sized>(
        &self,
        collection: &str,
        record: &T,
        rkey: Option<&str>,
    ) -> Result<CreateRecordResponse, ClientError> {
        self.default_agent.create_record(&self.did, collection, record, rkey).await
    }

    pub async fn get_record<T: DeserializeOwned>(
        &self,
        collection: &str,
        rkey: &str,
        cid: Option<&str>,
        repo: Option<&Did>,
    ) -> Result<GetRecordResponse<T>, ClientError> {
        let (agent, repo) = self.route(repo).await?;
        agent.get_record(&repo, collection, rkey, cid).await
    }

    pub async fn list_records<T: DeserializeOwned>(
        &self,
        collection: &str,
        params: &ListParams,
        repo: Option<&Did>,
    ) -> Result<ListRecordsResponse<T>, ClientError> {
        let (agent, repo) = self.route(repo).await?;
        agent.list_records(&repo, collection, params).await
    }

    // ── Private records ───────────────────────────────────────────────────────

    /// Create or overwrite a private record in the client's own repo.
    pub async fn put_private_record<T: Serialize + ?Sized>(
        &self,
        collection: &str,
        record: &T,
        rkey: Option<&str>,
    ) -> Result<CreateRecordResponse, ClientError> {
        self.default_agent.put_private_record(&self.did, collection, record, rkey).await
    }

    pub async fn get_private_record<T: DeserializeOwned>(
        &self,
        collection: &str,
        rkey: &str,
        cid: Option<&str>,
        repo: Option<&Did>,
    ) -> Result<GetRecordResponse<T>, ClientError> {
        let (agent, repo) = self.route(repo).await?;
        agent.get_private_record(&repo, collection, rkey, cid).await
    }

    pub async fn list_private_records<T: DeserializeOwned>(
        &self,
        collection: &str,
        params: &ListParams,
        repo: Option<&Did>,
    ) -> Result<ListRecordsResponse<T>, ClientError> {
        let (agent, repo) = self.route(repo).await?;
        agent.list_private_records(&repo, collection, params).await
    }

    /// Untyped listing used by the data debugger.
    pub async fn list_any(
        &self,
        collection: &str,
        private: bool,
        params: &ListParams,
        repo: Option<&Did>,
    ) -> Result<ListRecordsResponse<Value>, ClientError> {
        if private {
            self.list_private_records(collection, params, repo).await
        } else {
            self.list_records(collection, params, repo).await
        }
    }
}
