//! Engine-wide settings.
//!
//! Per-call overrides (HTTP timeout, credentials) come from resolved plugin
//! config; what lives here are the process-level defaults an embedding
//! service decides once at startup.

use std::time::Duration;

use skillet_sandbox::SandboxLimits;

/// Default timeout for outbound `api_call` requests; a plugin's resolved
/// config can override it per call with `timeout_ms`.
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 30_000;

pub const DEFAULT_USER_AGENT: &str = "Skillet/0.1";

#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Fallback timeout for upstream HTTP calls.
    pub http_timeout: Duration,
    /// Sent as the `User-Agent` header on every upstream call.
    pub user_agent: String,
    /// Resource caps applied to sandboxed script executions.
    pub sandbox: SandboxLimits,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            http_timeout: Duration::from_millis(DEFAULT_HTTP_TIMEOUT_MS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            sandbox: SandboxLimits::default(),
        }
    }
}

impl EngineSettings {
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_sandbox_limits(mut self, limits: SandboxLimits) -> Self {
        self.sandbox = limits;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_override_defaults() {
        let settings = EngineSettings::default()
            .with_http_timeout(Duration::from_secs(5))
            .with_user_agent("test-agent/1.0");
        assert_eq!(settings.http_timeout, Duration::from_secs(5));
        assert_eq!(settings.user_agent, "test-agent/1.0");
        assert_eq!(settings.sandbox, SandboxLimits::default());
    }
}
