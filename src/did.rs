//! Identifier newtypes: [`Did`], [`AtUri`], [`Cid`].
//!
//! All three validate on construction and on deserialize, so a value of
//! one of these types that exists at all is well-formed.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sdk::ClientError;

// ── Did ───────────────────────────────────────────────────────────────────────

/// Decentralized identifier naming a repository owner (`did:<method>:<id>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did(String);

impl Did {
    pub fn parse(s: &str) -> Result<Self, ClientError> {
        let invalid = |reason: &str| ClientError::InvalidDid(format!("{s:?}: {reason}"));

        let rest = s.strip_prefix("did:").ok_or_else(|| invalid("missing did: prefix"))?;
        let (method, id) = rest.split_once(':').ok_or_else(|| invalid("missing method"))?;

        if method.is_empty()
            || !method.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        {
            return Err(invalid("method must be lowercase alphanumeric"));
        }
        if id.is_empty() {
            return Err(invalid("empty identifier"));
        }
        if !id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b':' | b'%' | b'-'))
        {
            return Err(invalid("identifier has illegal characters"));
        }
        if id.ends_with(':') || id.ends_with('%') {
            return Err(invalid("identifier must not end in ':' or '%'"));
        }

        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// DID method, e.g. `plc` or `web`.
    pub fn method(&self) -> &str {
        self.0[4..].split(':').next().unwrap_or_default()
    }

    /// Method-specific identifier (everything after `did:<method>:`).
    pub fn identifier(&self) -> &str {
        let after_method = 4 + self.method().len() + 1;
        &self.0[after_method..]
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Did {
    type Error = ClientError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Did::parse(&s)
    }
}

impl From<Did> for String {
    fn from(d: Did) -> Self {
        d.0
    }
}

impl std::str::FromStr for Did {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Did::parse(s)
    }
}

// ── AtUri ─────────────────────────────────────────────────────────────────────

/// `at://<authority>[/<collection>[/<rkey>]]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AtUri(String);

impl AtUri {
    pub fn parse(s: &str) -> Result<Self, ClientError> {
        let rest = s
            .strip_prefix("at://")
            .ok_or_else(|| ClientError::Decode(format!("not an at:// uri: {s:?}")))?;
        let authority = rest.split('/').next().unwrap_or_default();
        if authority.is_empty() {
            return Err(ClientError::Decode(format!("at:// uri has no authority: {s:?}")));
        }
        if rest.split('/').count() > 3 {
            return Err(ClientError::Decode(format!("at:// uri has too many segments: {s:?}")));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn segment(&self, n: usize) -> Option<&str> {
        self.0["at://".len()..].split('/').nth(n).filter(|s| !s.is_empty())
    }

    pub fn authority(&self) -> &str {
        self.segment(0).unwrap_or_default()
    }

    pub fn collection(&self) -> Option<&str> {
        self.segment(1)
    }

    pub fn rkey(&self) -> Option<&str> {
        self.segment(2)
    }
}

impl fmt::Display for AtUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AtUri {
    type Error = ClientError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        AtUri::parse(&s)
    }
}

impl From<AtUri> for String {
    fn from(u: AtUri) -> Self {
        u.0
    }
}

// ── Cid ───────────────────────────────────────────────────────────────────────

/// Content identifier assigned by the server on write. Opaque, non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cid(String);

impl Cid {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Cid {
    type Error = ClientError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s.trim().is_empty() {
            return Err(ClientError::Decode("empty cid".into()));
        }
        Ok(Self(s))
    }
}

impl From<Cid> for String {
    fn from(c: Cid) -> Self {
        c.0
    }
}
