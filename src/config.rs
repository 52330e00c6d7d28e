//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory
//! (or an explicit path), then applies `HABITAT_HOST`, `HABITAT_LOG_LEVEL`
//! and `HABITAT_COOKIE` env overrides.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::AppError;

/// Default host and HTTP settings for the local user's PDS.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Host (optionally `host:port`) of the Habitat node serving the local user.
    pub default_host: String,
    /// URL scheme agents use. `https` everywhere except local test nodes.
    pub scheme: String,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

/// Where the `did` cookie comes from.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Raw `Cookie:` header. Takes precedence over `cookie_file`.
    pub cookie: Option<String>,
    /// File holding a `Cookie:` header (already `~`-expanded).
    pub cookie_file: Option<PathBuf>,
}

/// DID resolver backend selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolverKind {
    /// PLC directory + `did:web` well-known lookups.
    Plc,
    /// Empty in-memory resolver; only the local repo is reachable.
    Static,
}

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub kind: ResolverKind,
    /// Base URL of the PLC directory.
    pub plc_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct DebuggerConfig {
    /// Collections offered by the data debugger.
    pub lexicons: Vec<String>,
}

/// Fully-resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub client: ClientConfig,
    pub session: SessionConfig,
    pub resolver: ResolverConfig,
    pub debugger: DebuggerConfig,
}

/// Env-sourced overrides, applied after the TOML is parsed.
/// Tests pass these directly instead of mutating env vars.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub log_level: Option<String>,
    pub cookie: Option<String>,
}

impl Overrides {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HABITAT_HOST").ok(),
            log_level: env::var("HABITAT_LOG_LEVEL").ok(),
            cookie: env::var("HABITAT_COOKIE").ok(),
        }
    }
}

/// Raw TOML shape, the `serde` target before resolution.
#[derive(Deserialize, Default)]
struct RawConfig {
    #[serde(default)]
    client: RawClient,
    #[serde(default)]
    session: RawSession,
    #[serde(default)]
    resolver: RawResolver,
    #[serde(default)]
    debugger: RawDebugger,
}

#[derive(Deserialize)]
struct RawClient {
    #[serde(default = "default_host")]
    default_host: String,
    #[serde(default = "default_scheme")]
    scheme: String,
    #[serde(default = "default_client_timeout_seconds")]
    timeout_seconds: u64,
    #[serde(default = "default_log_level")]
    log_level: String,
}

impl Default for RawClient {
    fn default() -> Self {
        Self {
            default_host: default_host(),
            scheme: default_scheme(),
            timeout_seconds: default_client_timeout_seconds(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Deserialize, Default)]
struct RawSession {
    #[serde(default)]
    cookie: Option<String>,
    #[serde(default)]
    cookie_file: Option<String>,
}

#[derive(Deserialize)]
struct RawResolver {
    #[serde(default = "default_resolver_kind")]
    kind: String,
    #[serde(default = "default_plc_url")]
    plc_url: String,
    #[serde(default = "default_resolver_timeout_seconds")]
    timeout_seconds: u64,
}

impl Default for RawResolver {
    fn default() -> Self {
        Self {
            kind: default_resolver_kind(),
            plc_url: default_plc_url(),
            timeout_seconds: default_resolver_timeout_seconds(),
        }
    }
}

#[derive(Deserialize)]
struct RawDebugger {
    #[serde(default = "default_lexicons")]
    lexicons: Vec<String>,
}

impl Default for RawDebugger {
    fn default() -> Self {
        Self { lexicons: default_lexicons() }
    }
}

fn default_host() -> String { "localhost".to_string() }
fn default_scheme() -> String { "https".to_string() }
fn default_client_timeout_seconds() -> u64 { 30 }
fn default_log_level() -> String { "info".to_string() }
fn default_resolver_kind() -> String { "plc".to_string() }
fn default_plc_url() -> String { "https://plc.directory".to_string() }
fn default_resolver_timeout_seconds() -> u64 { 10 }
fn default_lexicons() -> Vec<String> { vec!["dev.eagraf.note".to_string()] }

/// Load config from the given path, or `config/default.toml`, then apply env-var overrides.
/// If no path is given and `config/default.toml` does not exist, built-in defaults are used.
pub fn load(config_path: Option<&str>) -> Result<Config, AppError> {
    let overrides = Overrides::from_env();
    match config_path {
        Some(p) => load_from(Path::new(p), &overrides),
        None => {
            let default_path = Path::new("config/default.toml");
            if default_path.exists() {
                load_from(default_path, &overrides)
            } else {
                resolve(RawConfig::default(), &overrides)
            }
        }
    }
}

/// Loader taking an explicit path and overrides.
pub fn load_from(path: &Path, overrides: &Overrides) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let parsed: RawConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    resolve(parsed, overrides)
}

fn resolve(parsed: RawConfig, overrides: &Overrides) -> Result<Config, AppError> {
    let c = parsed.client;

    let default_host = overrides.host.clone().unwrap_or(c.default_host);
    if default_host.trim().is_empty() {
        return Err(AppError::Config("client.default_host must not be empty".into()));
    }
    if c.scheme != "https" && c.scheme != "http" {
        return Err(AppError::Config(format!(
            "client.scheme must be \"https\" or \"http\", got {:?}",
            c.scheme
        )));
    }

    let kind = match parsed.resolver.kind.as_str() {
        "plc" => ResolverKind::Plc,
        "static" => ResolverKind::Static,
        other => return Err(AppError::Config(format!("unknown resolver kind: {other}"))),
    };

    Ok(Config {
        log_level: overrides.log_level.clone().unwrap_or(c.log_level),
        client: ClientConfig {
            default_host,
            scheme: c.scheme,
            timeout_seconds: c.timeout_seconds,
        },
        session: SessionConfig {
            cookie: overrides.cookie.clone().or(parsed.session.cookie),
            cookie_file: parsed.session.cookie_file.as_deref().map(expand_home),
        },
        resolver: ResolverConfig {
            kind,
            plc_url: parsed.resolver.plc_url.trim_end_matches('/').to_string(),
            timeout_seconds: parsed.resolver.timeout_seconds,
        },
        debugger: DebuggerConfig { lexicons: parsed.debugger.lexicons },
    })
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

// ── test helpers ──────────────────────────────────────────────────────────────

/// `Config` pointing at a local node: static resolver, plain HTTP, no cookie.
impl Config {
    pub fn test_default(default_host: &str) -> Self {
        Self {
            log_level: "info".into(),
            client: ClientConfig {
                default_host: default_host.into(),
                scheme: "http".into(),
                timeout_seconds: 5,
            },
            session: SessionConfig { cookie: None, cookie_file: None },
            resolver: ResolverConfig {
                kind: ResolverKind::Static,
                plc_url: "http://localhost:0".into(),
                timeout_seconds: 1,
            },
            debugger: DebuggerConfig { lexicons: default_lexicons() },
        }
    }
}
