//! Session identity — the local user's DID, taken from the `did` cookie.
//!
//! The cookie header is whatever the Habitat web login left behind, e.g.
//! `did=did%3Aplc%3Aabc; theme=dark`. It is sourced from config (inline or a
//! file) or from `HABITAT_COOKIE`.

use std::fs;

use crate::config::SessionConfig;
use crate::did::Did;
use crate::error::AppError;

const DID_COOKIE: &str = "did";

/// Authenticated local session.
#[derive(Debug, Clone)]
pub struct Session {
    pub did: Did,
    /// Raw `Cookie:` header, forwarded to the default host only.
    pub cookie_header: String,
}

impl Session {
    pub fn from_cookie_header(cookie_header: &str) -> Result<Self, AppError> {
        let did = user_did(cookie_header)?;
        Ok(Self { did, cookie_header: cookie_header.trim().to_string() })
    }

    /// Build the session from `[session]` config: the inline `cookie` wins
    /// over `cookie_file`.
    pub fn from_config(config: &SessionConfig) -> Result<Self, AppError> {
        if let Some(cookie) = config.cookie.as_deref().filter(|c| !c.trim().is_empty()) {
            return Self::from_cookie_header(cookie);
        }
        if let Some(path) = &config.cookie_file {
            let raw = fs::read_to_string(path).map_err(|e| {
                AppError::Session(format!("cannot read cookie file {}: {e}", path.display()))
            })?;
            return Self::from_cookie_header(&raw);
        }
        Err(AppError::Session("no did cookie found".into()))
    }
}

/// Extract the `did` cookie from a `Cookie:` header.
pub fn user_did(cookie_header: &str) -> Result<Did, AppError> {
    let value = cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| name.trim() == DID_COOKIE)
        .map(|(_, value)| value.trim().trim_matches('"'))
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Session("no did cookie found".into()))?;

    let decoded = urlencoding::decode(value)
        .map_err(|e| AppError::Session(format!("did cookie is not valid UTF-8: {e}")))?;
    Did::parse(&decoded).map_err(|e| AppError::Session(format!("did cookie: {e}")))
}
