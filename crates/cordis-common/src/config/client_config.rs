//! Client configuration
//!
//! Loads configuration from environment variables (and a `.env` file when present).

use std::env;
use std::fmt;
use std::time::Duration;

use super::ReconnectPolicy;

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "production" | "prod" => Some(Self::Production),
            "development" | "dev" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Gateway client configuration
#[derive(Clone)]
pub struct ClientConfig {
    /// Bot token; never logged
    pub token: String,
    /// Intents bitmask sent with identify
    pub intents: u64,
    /// Well-known gateway URL used for every fresh session
    pub gateway_url: String,
    /// REST API base URL
    pub api_url: String,
    pub reconnect: ReconnectPolicy,
    /// Pause between READY being applied and listeners being released
    pub ready_settle: Duration,
    pub http_timeout: Duration,
    /// Give up on a connect attempt after this long
    pub connect_timeout: Duration,
    pub env: Environment,
}

// Default value functions
fn default_intents() -> u64 {
    // GUILDS | GUILD_MEMBERS | GUILD_MESSAGES | MESSAGE_CONTENT
    (1 << 0) | (1 << 1) | (1 << 9) | (1 << 15)
}

fn default_gateway_url() -> String {
    "wss://gateway.discord.gg/?v=10&encoding=json".to_string()
}

fn default_api_url() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_reconnect_delay_ms() -> u64 {
    5000
}

fn default_backoff_max_ms() -> u64 {
    60_000
}

fn default_ready_settle_ms() -> u64 {
    1000
}

fn default_http_timeout_ms() -> u64 {
    15_000
}

fn default_connect_timeout_ms() -> u64 {
    30_000
}

impl ClientConfig {
    /// Configuration with defaults for everything but the token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            intents: default_intents(),
            gateway_url: default_gateway_url(),
            api_url: default_api_url(),
            reconnect: ReconnectPolicy::Constant(Duration::from_millis(
                default_reconnect_delay_ms(),
            )),
            ready_settle: Duration::from_millis(default_ready_settle_ms()),
            http_timeout: Duration::from_millis(default_http_timeout_ms()),
            connect_timeout: Duration::from_millis(default_connect_timeout_ms()),
            env: Environment::default(),
        }
    }

    #[must_use]
    pub fn with_intents(mut self, intents: u64) -> Self {
        self.intents = intents;
        self
    }

    #[must_use]
    pub fn with_gateway_url(mut self, url: impl Into<String>) -> Self {
        self.gateway_url = url.into();
        self
    }

    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    #[must_use]
    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    #[must_use]
    pub fn with_ready_settle(mut self, settle: Duration) -> Self {
        self.ready_settle = settle;
        self
    }

    #[must_use]
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if `CORDIS_TOKEN` is missing or a value does not parse
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key/value source; `from_env` passes the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("CORDIS_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingVar("CORDIS_TOKEN"))?;

        let delay_ms = parse_or(&lookup, "CORDIS_RECONNECT_DELAY_MS", default_reconnect_delay_ms)?;
        let max_ms = parse_or(&lookup, "CORDIS_BACKOFF_MAX_MS", default_backoff_max_ms)?;
        let reconnect = match lookup("CORDIS_RECONNECT_POLICY") {
            Some(name) => ReconnectPolicy::from_name(
                &name,
                Duration::from_millis(delay_ms),
                Duration::from_millis(max_ms),
            )
            .ok_or(ConfigError::InvalidValue("CORDIS_RECONNECT_POLICY", name))?,
            None => ReconnectPolicy::Constant(Duration::from_millis(delay_ms)),
        };

        Ok(Self {
            token,
            intents: parse_or(&lookup, "CORDIS_INTENTS", default_intents)?,
            gateway_url: lookup("CORDIS_GATEWAY_URL").unwrap_or_else(default_gateway_url),
            api_url: lookup("CORDIS_API_URL").unwrap_or_else(default_api_url),
            reconnect,
            ready_settle: Duration::from_millis(parse_or(
                &lookup,
                "CORDIS_READY_SETTLE_MS",
                default_ready_settle_ms,
            )?),
            http_timeout: Duration::from_millis(parse_or(
                &lookup,
                "CORDIS_HTTP_TIMEOUT_MS",
                default_http_timeout_ms,
            )?),
            connect_timeout: Duration::from_millis(parse_or(
                &lookup,
                "CORDIS_CONNECT_TIMEOUT_MS",
                default_connect_timeout_ms,
            )?),
            env: lookup("APP_ENV")
                .and_then(|s| Environment::parse(&s))
                .unwrap_or_default(),
        })
    }
}

/// Parse an optional numeric variable, rejecting garbage instead of silently defaulting
fn parse_or<F>(lookup: &F, key: &'static str, default: fn() -> u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        None => Ok(default()),
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("token", &"[REDACTED]")
            .field("intents", &self.intents)
            .field("gateway_url", &self.gateway_url)
            .field("api_url", &self.api_url)
            .field("reconnect", &self.reconnect)
            .field("ready_settle", &self.ready_settle)
            .field("env", &self.env)
            .finish()
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
