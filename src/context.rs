//! Client context — one `HabitatClient` per application session.
//!
//! Built once at startup and passed to whatever needs the client. If there
//! is no session yet the context still builds, just without a client;
//! [`ClientContext::client`] then reports the missing session.

use tracing::{error, info};

use crate::config::Config;
use crate::error::AppError;
use crate::sdk::{AgentFactory, HabitatClient, resolver};
use crate::session::Session;

pub struct ClientContext {
    client: Option<HabitatClient>,
}

impl ClientContext {
    /// Build the context from config. Failures are logged, not returned.
    pub fn init(config: &Config) -> Self {
        match build_client(config) {
            Ok(client) => {
                info!(did = %client.did(), host = %client.default_agent().host(), "habitat client ready");
                Self { client: Some(client) }
            }
            Err(e) => {
                error!(error = %e, "failed to initialise habitat client");
                Self { client: None }
            }
        }
    }

    pub fn client(&self) -> Result<&HabitatClient, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Session("no habitat client: not logged in".into()))
    }

    /// Clear the client's agent cache back to the default mapping
    /// (logout). No-op without a client.
    pub fn reset_client(&self) {
        if let Some(client) = &self.client {
            client.reset();
        }
    }
}

/// Session → factory → default agent (carrying the session cookie) → resolver.
pub fn build_client(config: &Config) -> Result<HabitatClient, AppError> {
    let session = Session::from_config(&config.session)?;
    let factory = AgentFactory::new(&config.client.scheme, config.client.timeout_seconds)?;
    let default_agent = factory
        .agent(&config.client.default_host)
        .with_session_cookie(session.cookie_header);
    let resolver = resolver::build(&config.resolver)?;
    Ok(HabitatClient::new(session.did, default_agent, resolver, factory))
}
