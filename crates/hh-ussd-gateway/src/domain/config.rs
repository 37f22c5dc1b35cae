//! Gateway configuration with validation.
//!
//! Defaults match the carrier deployment; every field can be overridden
//! from the environment via [`GatewayConfig::from_env`].

use super::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Main gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP server configuration
    pub http: HttpConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Session lifetime configuration
    pub sessions: SessionConfig,
    /// Vote receipt configuration
    pub votes: VoteConfig,
    /// Chain integration settings (reported only)
    pub chain: ChainConfig,
    /// Timeout configuration
    pub timeouts: TimeoutConfig,
    /// Request limits
    pub limits: LimitsConfig,
}

impl GatewayConfig {
    /// Build configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Unparseable values are logged and the default is kept.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = parse_var(&lookup, "USSD_HOST") {
            config.http.host = host;
        }
        if let Some(port) = parse_var(&lookup, "USSD_PORT") {
            config.http.port = port;
        }

        if let Some(origins) = lookup("ALLOWED_ORIGINS") {
            let origins: Vec<String> = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
            if origins.is_empty() {
                warn!("ALLOWED_ORIGINS is empty, keeping default allowlist");
            } else {
                config.cors.allowed_origins = origins;
            }
        }

        if let Some(secs) = parse_var(&lookup, "SESSION_TTL_SECS") {
            config.sessions.max_idle_secs = secs;
        }
        if let Some(secs) = parse_var(&lookup, "SESSION_SWEEP_SECS") {
            config.sessions.sweep_interval_secs = secs;
        }

        if let Some(salt) = lookup("VOTE_SALT").filter(|s| !s.is_empty()) {
            config.votes.salt = Some(salt);
        }

        if let Some(rpc) = lookup("POLYGON_RPC").filter(|s| !s.is_empty()) {
            config.chain.polygon_rpc = rpc;
        }
        // The key itself is never stored.
        config.chain.oracle_key_configured = lookup("PRIVATE_KEY").is_some_and(|k| !k.is_empty());

        config
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.port == 0 {
            return Err(ConfigError::InvalidPort("port cannot be 0".into()));
        }

        if self.sessions.max_idle_secs == 0 {
            return Err(ConfigError::InvalidSessions(
                "max_idle_secs cannot be 0".into(),
            ));
        }

        if self.sessions.sweep_interval_secs == 0 {
            return Err(ConfigError::InvalidSessions(
                "sweep_interval_secs cannot be 0".into(),
            ));
        }

        if self.timeouts.ussd_turn_ms == 0 || self.timeouts.default_ms == 0 {
            return Err(ConfigError::InvalidTimeout("timeouts cannot be 0".into()));
        }

        if self.limits.max_body_bytes == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_body_bytes cannot be 0".into(),
            ));
        }

        if self.cors.enabled && self.cors.allowed_origins.is_empty() {
            return Err(ConfigError::InvalidCors(
                "allowed_origins cannot be empty".into(),
            ));
        }

        Ok(())
    }

    /// Validate configuration for production readiness.
    ///
    /// Returns `Err` if no vote salt is configured.
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        self.validate()?;
        if self.votes.salt.is_none() {
            return Err(ConfigError::MissingVoteSalt);
        }
        Ok(())
    }

    /// Get HTTP server bind address
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key = key, value = %raw, "Ignoring unparseable environment value");
            None
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 8080)
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub enabled: bool,
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    /// Preflight cache, seconds
    pub max_age: u64,
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec!["http://localhost:3001".to_string()],
            allowed_methods: vec!["GET".to_string(), "POST".to_string(), "OPTIONS".to_string()],
            allowed_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
            max_age: 86400, // 24 hours
            allow_credentials: true,
        }
    }
}

/// Session lifetime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Sessions idle longer than this are evicted (default: 1 hour)
    pub max_idle_secs: u64,
    /// How often the reaper runs (default: 10 minutes)
    pub sweep_interval_secs: u64,
}

impl SessionConfig {
    pub fn max_idle(&self) -> Duration {
        Duration::from_secs(self.max_idle_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_idle_secs: 60 * 60,
            sweep_interval_secs: 10 * 60,
        }
    }
}

/// Vote receipt configuration
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VoteConfig {
    /// Receipt salt. `None` means a random per-process salt.
    #[serde(skip_serializing)]
    pub salt: Option<String>,
}

impl fmt::Debug for VoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoteConfig")
            .field("salt", &self.salt.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Chain integration settings.
///
/// Ledger submission is handled by the submission port; these values are
/// only reported at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Polygon JSON-RPC endpoint
    pub polygon_rpc: String,
    /// Whether an oracle wallet key was supplied
    pub oracle_key_configured: bool,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            polygon_rpc: "https://polygon-rpc.com".to_string(),
            oracle_key_configured: false,
        }
    }
}

/// Timeout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Budget for one USSD turn; carriers drop slower replies
    pub ussd_turn_ms: u64,
    /// Budget for every other request
    pub default_ms: u64,
}

impl TimeoutConfig {
    pub fn ussd_turn(&self) -> Duration {
        Duration::from_millis(self.ussd_turn_ms)
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_ms)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            ussd_turn_ms: 5_000,
            default_ms: 10_000,
        }
    }
}

/// Request limits configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Max request body size in bytes (default: 16 KiB)
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 16 * 1024,
        }
    }
}
