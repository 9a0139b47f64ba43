//! Client configuration.

use cortex_agent_streaming::PreviewConfig;
use std::fmt;
use std::time::Duration;
use url::Url;

use crate::error::{ClientError, ClientResult};

/// Default hard deadline for one request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Default limit for delivering one progress preview.
pub const DEFAULT_PROGRESS_TIMEOUT: Duration = Duration::from_secs(5);

/// Environment variable holding the agent run URL.
pub const ENV_AGENT_ENDPOINT: &str = "AGENT_ENDPOINT";
/// Environment variable holding the access token.
pub const ENV_TOKEN: &str = "PAT";
/// Environment variable selecting OAuth tokens when truthy.
pub const ENV_USE_OAUTH: &str = "CORTEX_USE_OAUTH";
/// Environment variable overriding the timeout, in seconds.
pub const ENV_TIMEOUT_SECS: &str = "CORTEX_TIMEOUT_SECS";

/// How the bearer token should be interpreted by the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TokenType {
    /// Programmatic access token.
    #[default]
    ProgrammaticAccessToken,
    /// OAuth access token.
    OAuth,
}

impl TokenType {
    /// Value of the token type header.
    #[must_use]
    pub fn header_value(self) -> &'static str {
        match self {
            Self::ProgrammaticAccessToken => "PROGRAMMATIC_ACCESS_TOKEN",
            Self::OAuth => "OAUTH",
        }
    }
}

/// Configuration for [`CortexClient`](crate::CortexClient).
#[derive(Clone)]
pub struct ClientConfig {
    /// Agent run endpoint.
    pub agent_url: Url,
    /// Bearer token.
    pub token: String,
    /// Token type announced in the request headers.
    pub token_type: TokenType,
    /// Deadline for the whole request, streaming included.
    pub timeout: Duration,
    /// Limit for one progress sink call; does not count against `timeout`.
    pub progress_timeout: Duration,
    /// Progress preview budgets.
    pub preview: PreviewConfig,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("agent_url", &self.agent_url.as_str())
            .field("token", &"[redacted]")
            .field("token_type", &self.token_type)
            .field("timeout", &self.timeout)
            .field("progress_timeout", &self.progress_timeout)
            .field("preview", &self.preview)
            .finish()
    }
}

impl ClientConfig {
    /// Create a configuration for `agent_url` authenticated with `token`.
    pub fn new(agent_url: &str, token: impl Into<String>) -> ClientResult<Self> {
        let agent_url = Url::parse(agent_url)
            .map_err(|e| ClientError::configuration(format!("invalid agent url: {e}")))?;
        Ok(Self {
            agent_url,
            token: token.into(),
            token_type: TokenType::default(),
            timeout: DEFAULT_TIMEOUT,
            progress_timeout: DEFAULT_PROGRESS_TIMEOUT,
            preview: PreviewConfig::default(),
        })
    }

    /// Create from `AGENT_ENDPOINT`, `PAT`, `CORTEX_USE_OAUTH` and
    /// `CORTEX_TIMEOUT_SECS`.
    pub fn from_env() -> ClientResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ClientResult<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| {
                    ClientError::configuration(format!("{key} environment variable not set"))
                })
        };

        let mut config = Self::new(&required(ENV_AGENT_ENDPOINT)?, required(ENV_TOKEN)?)?;

        if lookup(ENV_USE_OAUTH).is_some_and(|v| is_truthy(&v)) {
            config.token_type = TokenType::OAuth;
        }

        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                ClientError::configuration(format!("{ENV_TIMEOUT_SECS} must be whole seconds"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Set the token type.
    #[must_use]
    pub fn with_token_type(mut self, token_type: TokenType) -> Self {
        self.token_type = token_type;
        self
    }

    /// Set the request deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the limit for one progress sink call.
    #[must_use]
    pub fn with_progress_timeout(mut self, timeout: Duration) -> Self {
        self.progress_timeout = timeout;
        self
    }

    /// Set the preview budgets.
    #[must_use]
    pub fn with_preview(mut self, preview: PreviewConfig) -> Self {
        self.preview = preview;
        self
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
